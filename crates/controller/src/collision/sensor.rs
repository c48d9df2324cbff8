//! Downward ground probe and feet-height correction.
//!
//! The character's capsule is shortened by a step margin and floats above the
//! ground. A single ray cast from the capsule center decides whether the
//! character is grounded; a second cast along the predicted horizontal motion
//! produces a vertical correction velocity that keeps the feet at the rest
//! height, so steps and slopes are climbed without the body bobbing.
//!
//! ```text
//!          ┌───┐  ◄─ capsule center (probe origin)
//!          │   │
//!          │   │  h·(1-r)/2
//!          └───┘
//!            ┆    h·r  (step margin)
//!  ──────────┴────────  ground at rest distance h·(1-r)/2 + h·r
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::remove_dot_vector;
use crate::transform::Transform;

use super::flags::{Layer, LayerMask};
use super::trace::{PhysicsQuery, ProbeHit};

/// Probe range is padded by this fraction to avoid losing ground contact to
/// rounding at exactly the rest distance.
const SAFETY_DISTANCE_FACTOR: f32 = 0.001;

/// Collider shape settings (unscaled, meters).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderSettings {
    /// Fraction of the height reserved as step margin below the capsule (0..=1).
    pub step_height_ratio: f32,

    /// Full character height including the step margin.
    pub collider_height: f32,

    /// Capsule diameter.
    pub collider_thickness: f32,

    /// Capsule center offset, in multiples of `collider_height`.
    pub collider_offset: Vec3,

    /// Log every probe at `trace` level.
    pub debug: bool,
}

impl Default for ColliderSettings {
    fn default() -> Self {
        Self {
            step_height_ratio: 0.1,
            collider_height: 2.0,
            collider_thickness: 1.0,
            collider_offset: Vec3::ZERO,
            debug: false,
        }
    }
}

/// Capsule dimensions derived from [`ColliderSettings`], in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDimensions {
    /// Capsule height including both caps.
    pub height: f32,
    pub radius: f32,
    /// Capsule center relative to the character origin.
    pub center: Vec3,
}

impl ColliderDimensions {
    pub fn from_settings(settings: &ColliderSettings) -> Self {
        let ratio = settings.step_height_ratio;
        let height = settings.collider_height * (1.0 - ratio);
        let center = settings.collider_offset * settings.collider_height
            + Vec3::new(0.0, ratio * height / 2.0, 0.0);

        // The caps can never be taller than the capsule itself
        let radius = (settings.collider_thickness / 2.0).min(height / 2.0);

        Self {
            height,
            radius,
            center,
        }
    }
}

/// Ground probe owned by the controller.
#[derive(Debug, Clone)]
pub struct GroundSensor {
    settings: ColliderSettings,
    dimensions: ColliderDimensions,

    /// Probe origin in local space (the capsule center).
    cast_origin: Vec3,
    cast_length: f32,
    base_range: f32,
    use_extended_range: bool,

    mask: LayerMask,
    /// Layer the mask was computed for; `None` forces a recompute.
    mask_layer: Option<Layer>,

    last_hit: Option<ProbeHit>,
    grounded: bool,
    adjustment_velocity: Vec3,
}

impl GroundSensor {
    pub fn new(settings: ColliderSettings, length_scale: f32) -> Self {
        let dimensions = ColliderDimensions::from_settings(&settings);
        let mut sensor = Self {
            settings,
            dimensions,
            cast_origin: Vec3::ZERO,
            cast_length: 0.0,
            base_range: 0.0,
            use_extended_range: true,
            mask: LayerMask::ALL,
            mask_layer: None,
            last_hit: None,
            grounded: false,
            adjustment_velocity: Vec3::ZERO,
        };
        sensor.recalibrate(length_scale);
        sensor
    }

    /// Recompute capsule dimensions and probe lengths from the settings.
    pub fn recalibrate(&mut self, length_scale: f32) {
        self.dimensions = ColliderDimensions::from_settings(&self.settings);
        self.cast_origin = self.dimensions.center;

        let length = self.rest_distance_unscaled();
        self.base_range = length * (1.0 + SAFETY_DISTANCE_FACTOR) * length_scale;
        self.cast_length = length * length_scale;
    }

    /// Cast downwards from the capsule center and update the grounded flag.
    ///
    /// The probe is extended by the step margin while extended range is on,
    /// so walking over a step edge does not drop contact for a tick.
    pub fn check_for_ground<P>(&mut self, transform: &Transform, layer: Layer, physics: &P)
    where
        P: PhysicsQuery + ?Sized,
    {
        if self.mask_layer != Some(layer) {
            self.recalculate_layer_mask(layer, physics);
        }

        self.adjustment_velocity = Vec3::ZERO;
        self.cast_length = if self.use_extended_range {
            self.base_range + self.step_margin(transform)
        } else {
            self.base_range
        };

        self.cast(transform, Vec3::ZERO, physics);
        self.grounded = self.last_hit.is_some();
    }

    /// Compute the vertical correction that settles the feet at rest height.
    ///
    /// While `grounded_state` the probe is re-cast from where the character
    /// will be after this tick's horizontal motion. Does nothing if no ground
    /// was found or `delta_time` is not positive.
    pub fn handle_feet_position<P>(
        &mut self,
        velocity: Vec3,
        grounded_state: bool,
        transform: &Transform,
        delta_time: f32,
        physics: &P,
    ) where
        P: PhysicsQuery + ?Sized,
    {
        if grounded_state {
            let displacement = remove_dot_vector(velocity, transform.up()) * delta_time;
            self.cast(transform, displacement, physics);
            self.grounded = self.last_hit.is_some();
        }

        if !self.grounded || delta_time <= 0.0 {
            return;
        }
        let Some(hit) = self.last_hit else {
            return;
        };

        let distance_to_go = self.rest_distance(transform) - hit.distance;
        self.adjustment_velocity = transform.up() * (distance_to_go / delta_time);
    }

    /// Velocity to hand to the body: `velocity` plus the feet correction.
    #[inline]
    pub fn body_velocity(&self, velocity: Vec3) -> Vec3 {
        velocity + self.adjustment_velocity
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Normal of the last probe hit, or zero if the last probe missed.
    #[inline]
    pub fn ground_normal(&self) -> Vec3 {
        self.last_hit.map_or(Vec3::ZERO, |hit| hit.normal)
    }

    /// Distance from the probe origin to the ground, if the last probe hit.
    #[inline]
    pub fn ground_distance(&self) -> Option<f32> {
        self.last_hit.map(|hit| hit.distance)
    }

    #[inline]
    pub fn adjustment_velocity(&self) -> Vec3 {
        self.adjustment_velocity
    }

    /// Select the probe length for the next [`GroundSensor::check_for_ground`].
    #[inline]
    pub fn set_extended_range(&mut self, extended: bool) {
        self.use_extended_range = extended;
    }

    /// Current probe length (scaled).
    #[inline]
    pub fn cast_length(&self) -> f32 {
        self.cast_length
    }

    #[inline]
    pub fn layer_mask(&self) -> LayerMask {
        self.mask
    }

    #[inline]
    pub fn dimensions(&self) -> ColliderDimensions {
        self.dimensions
    }

    #[inline]
    pub fn settings(&self) -> &ColliderSettings {
        &self.settings
    }

    #[inline]
    pub fn step_height_ratio(&self) -> f32 {
        self.settings.step_height_ratio
    }

    /// Change the step margin (clamped to 0..=1) and recalibrate.
    pub fn set_step_height_ratio(&mut self, ratio: f32, length_scale: f32) {
        self.settings.step_height_ratio = ratio.clamp(0.0, 1.0);
        self.recalibrate(length_scale);
    }

    /// Distance from probe origin to ground when the feet are at rest.
    pub fn rest_distance(&self, transform: &Transform) -> f32 {
        self.rest_distance_unscaled() * transform.length_scale()
    }

    fn rest_distance_unscaled(&self) -> f32 {
        let height = self.settings.collider_height;
        let ratio = self.settings.step_height_ratio;
        height * (1.0 - ratio) * 0.5 + height * ratio
    }

    fn step_margin(&self, transform: &Transform) -> f32 {
        self.settings.collider_height * transform.length_scale() * self.settings.step_height_ratio
    }

    fn cast<P>(&mut self, transform: &Transform, offset: Vec3, physics: &P)
    where
        P: PhysicsQuery + ?Sized,
    {
        let origin = transform.transform_point(self.cast_origin) + offset;
        let direction = -transform.up();
        self.last_hit = physics.raycast(origin, direction, self.cast_length, self.mask);

        if self.settings.debug {
            log::trace!(
                "ground probe from {:?} len={:.3} -> {:?}",
                origin,
                self.cast_length,
                self.last_hit
            );
        }
    }

    fn recalculate_layer_mask<P>(&mut self, layer: Layer, physics: &P)
    where
        P: PhysicsQuery + ?Sized,
    {
        self.mask = LayerMask::for_layer(layer, physics);
        self.mask_layer = Some(layer);
        log::debug!("ground probe mask for layer {} = {:#010x}", layer.0, self.mask.0);
    }
}
