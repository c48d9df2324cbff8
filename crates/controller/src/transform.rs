//! World transform of the controlled character.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale of the character.
///
/// Local axes follow the usual game convention: `+X` right, `+Y` up,
/// `+Z` forward. Collider and sensor lengths scale with `scale.x` only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Unrotated, unscaled transform at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Scale factor applied to collider and sensor lengths.
    #[inline]
    pub fn length_scale(&self) -> f32 {
        self.scale.x
    }

    /// Local point to world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Local direction to world space (rotation and scale, no translation).
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// World direction to local space. Zero scale axes are left unscaled.
    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * vector;
        Vec3::new(
            if self.scale.x != 0.0 { local.x / self.scale.x } else { local.x },
            if self.scale.y != 0.0 { local.y / self.scale.y } else { local.y },
            if self.scale.z != 0.0 { local.z / self.scale.z } else { local.z },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_axes_follow_rotation() {
        let transform = Transform::default().with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        assert_abs_diff_eq!(transform.up(), Vec3::Y, epsilon = 1e-6);
        assert_abs_diff_eq!(transform.forward(), Vec3::X, epsilon = 1e-6);
        assert_abs_diff_eq!(transform.right(), -Vec3::Z, epsilon = 1e-6);
    }

    #[test]
    fn test_vector_round_trip() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_z(0.3))
            .with_scale(Vec3::splat(2.0));
        let v = Vec3::new(0.5, -1.0, 4.0);
        let back = transform.inverse_transform_vector(transform.transform_vector(v));
        assert_abs_diff_eq!(back, v, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_point_applies_scale() {
        let transform = Transform::from_position(Vec3::Y).with_scale(Vec3::splat(2.0));
        assert_eq!(transform.transform_point(Vec3::Y), Vec3::new(0.0, 3.0, 0.0));
    }
}
