//! Probe results, contacts and the physics query interface.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::{Layer, LayerMask};

/// Result of a probe that hit something.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeHit {
    /// Distance from the probe origin to the hit point.
    pub distance: f32,

    /// World-space hit point.
    pub point: Vec3,

    /// Surface normal at the hit point, pointing away from the surface.
    pub normal: Vec3,
}

impl ProbeHit {
    pub fn new(distance: f32, point: Vec3, normal: Vec3) -> Self {
        Self {
            distance,
            point,
            normal,
        }
    }
}

/// A single contact reported by the host after moving the body.
///
/// The normal points from the touched surface towards the character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub point: Vec3,
    pub normal: Vec3,
}

impl ContactPoint {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self { point, normal }
    }
}

/// What the controller needs from the host's physics.
///
/// Implementations must be deterministic for identical inputs; the
/// controller calls [`PhysicsQuery::raycast`] at most twice per fixed tick.
pub trait PhysicsQuery {
    /// Cast a ray from `origin` along `direction` (unit length) up to
    /// `max_distance`, hitting only colliders whose layer is in `mask`.
    /// Returns the closest hit.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit>;

    /// Whether colliders on `a` and `b` are configured to never interact.
    fn ignores_layer_collision(&self, _a: Layer, _b: Layer) -> bool {
        false
    }
}

impl<P: PhysicsQuery + ?Sized> PhysicsQuery for &P {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        (**self).raycast(origin, direction, max_distance, mask)
    }

    fn ignores_layer_collision(&self, a: Layer, b: Layer) -> bool {
        (**self).ignores_layer_collision(a, b)
    }
}
