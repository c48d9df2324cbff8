//! Vector helpers used by the sensors and the momentum solver.
//!
//! All helpers are total: zero-length directions never produce NaN, they
//! simply contribute nothing.

use glam::Vec3;

/// Vectors shorter than this are treated as zero when normalizing.
const NORMALIZE_EPSILON: f32 = 1e-5;

/// Normalize `v`, or return zero if it is too short to have a direction.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let length = v.length();
    if length > NORMALIZE_EPSILON {
        v / length
    } else {
        Vec3::ZERO
    }
}

/// The part of `vector` that points along `direction`.
#[inline]
pub fn extract_dot_vector(vector: Vec3, direction: Vec3) -> Vec3 {
    let direction = normalize_or_zero(direction);
    direction * vector.dot(direction)
}

/// `vector` with its component along `direction` removed.
#[inline]
pub fn remove_dot_vector(vector: Vec3, direction: Vec3) -> Vec3 {
    vector - extract_dot_vector(vector, direction)
}

/// Project `vector` onto the plane with the given normal.
///
/// A zero normal leaves the vector untouched.
#[inline]
pub fn project_on_plane(vector: Vec3, plane_normal: Vec3) -> Vec3 {
    let length_squared = plane_normal.length_squared();
    if length_squared < f32::EPSILON {
        return vector;
    }
    vector - plane_normal * (vector.dot(plane_normal) / length_squared)
}

/// Unsigned angle between two vectors in degrees.
///
/// Returns 0 if either vector is (nearly) zero.
pub fn angle_degrees(from: Vec3, to: Vec3) -> f32 {
    let denominator = (from.length_squared() * to.length_squared()).sqrt();
    if denominator < 1e-15 {
        return 0.0;
    }
    let cos = (from.dot(to) / denominator).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Step `current` towards `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}

/// Clamp the length of `v` to `max_length`.
#[inline]
pub fn clamp_magnitude(v: Vec3, max_length: f32) -> Vec3 {
    let length_squared = v.length_squared();
    if length_squared > max_length * max_length {
        v * (max_length / length_squared.sqrt())
    } else {
        v
    }
}

/// Linear ramp from 0 to 1 over `duration` seconds. A zero duration is
/// already complete.
#[inline]
pub fn ramp(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_remove_dot_vector() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(remove_dot_vector(v, Vec3::Y), Vec3::new(3.0, 0.0, 0.0));
        // Direction length does not matter
        assert_eq!(remove_dot_vector(v, Vec3::Y * 10.0), Vec3::new(3.0, 0.0, 0.0));
        // Zero direction removes nothing
        assert_eq!(remove_dot_vector(v, Vec3::ZERO), v);
    }

    #[test]
    fn test_project_on_plane() {
        let v = Vec3::new(1.0, 1.0, 0.0);
        assert_eq!(project_on_plane(v, Vec3::Y), Vec3::X);
        assert_eq!(project_on_plane(v, Vec3::ZERO), v);
    }

    #[test]
    fn test_angle_degrees() {
        assert_eq!(angle_degrees(Vec3::Y, Vec3::Y), 0.0);
        assert_relative_eq!(angle_degrees(Vec3::Y, Vec3::X), 90.0, epsilon = 1e-4);
        assert_relative_eq!(angle_degrees(Vec3::Y, -Vec3::Y), 180.0, epsilon = 1e-4);
        let tilted = Vec3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(angle_degrees(tilted, Vec3::Y), 45.0, epsilon = 1e-4);
        assert_eq!(angle_degrees(Vec3::ZERO, Vec3::Y), 0.0);
    }

    #[test]
    fn test_move_towards_never_overshoots() {
        let v = move_towards(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        assert_relative_eq!(v.x, 3.0);

        let v = move_towards(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_clamp_magnitude() {
        let v = clamp_magnitude(Vec3::new(0.0, 0.0, 10.0), 4.0);
        assert_relative_eq!(v.length(), 4.0);
        assert_eq!(clamp_magnitude(Vec3::X, 4.0), Vec3::X);
    }

    #[test]
    fn test_ramp() {
        assert_eq!(ramp(0.05, 0.1), 0.5);
        assert_eq!(ramp(1.0, 0.1), 1.0);
        assert_eq!(ramp(-1.0, 0.1), 0.0);
        assert_eq!(ramp(0.0, 0.0), 1.0);
    }
}
