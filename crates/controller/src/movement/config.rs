//! Controller tuning values.
//!
//! All values use metric units (meters, seconds, degrees) unless noted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("max_speed must be positive, got {0}")]
    NonPositiveMaxSpeed(f32),
}

/// Tuning for the momentum solver and the locomotion states.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // ========================================================================
    // Ground Movement
    // ========================================================================
    /// Target speed of input-driven movement (meters/second).
    pub movement_speed: f32,

    /// Seconds from standing still to full `movement_speed`. Zero is instant.
    pub time_to_reach_speed: f32,

    /// Hard cap for both momentum and final velocity (meters/second).
    pub max_speed: f32,

    // ========================================================================
    // Air Control
    // ========================================================================
    /// How fast horizontal momentum follows input while airborne.
    pub air_control_rate: f32,

    /// Air control multiplier once horizontal momentum already exceeds
    /// `movement_speed`.
    pub air_control_overspeed_factor: f32,

    // ========================================================================
    // Friction and Gravity
    // ========================================================================
    /// Linear horizontal decay while airborne (meters/second²).
    pub air_friction: f32,

    /// Linear horizontal decay while grounded (meters/second²).
    pub ground_friction: f32,

    /// Gravity acceleration (meters/second²).
    pub gravity: f32,

    /// Extra downhill acceleration while forced sliding (meters/second²).
    pub forced_slide_gravity: f32,

    /// Steepest walkable ground (degrees from up).
    pub slope_limit: f32,

    // ========================================================================
    // Frames
    // ========================================================================
    /// Store momentum relative to the character's rotation, so turning the
    /// character turns its momentum with it.
    pub use_local_momentum: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            movement_speed: 7.0,
            time_to_reach_speed: 0.1,
            max_speed: 30.0,

            air_control_rate: 2.0,
            air_control_overspeed_factor: 0.25,

            air_friction: 0.5,
            ground_friction: 100.0,
            gravity: 30.0,
            forced_slide_gravity: 5.0,
            slope_limit: 30.0,

            use_local_momentum: false,
        }
    }
}

impl ControllerConfig {
    /// Low gravity, long acceleration and generous air control.
    pub fn floaty() -> Self {
        Self {
            time_to_reach_speed: 0.3,
            air_control_rate: 6.0,
            air_friction: 0.1,
            ground_friction: 20.0,
            gravity: 12.0,
            ..Default::default()
        }
    }

    /// Instant acceleration, heavy gravity and little air control.
    pub fn snappy() -> Self {
        Self {
            movement_speed: 9.0,
            time_to_reach_speed: 0.0,
            air_control_rate: 1.0,
            air_control_overspeed_factor: 0.1,
            ground_friction: 200.0,
            gravity: 45.0,
            ..Default::default()
        }
    }

    /// Check every value for sanity.
    ///
    /// A `slope_limit` of 90 degrees or more is accepted, but it means no
    /// ground is ever too steep, so it is logged as a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("movement_speed", self.movement_speed),
            ("time_to_reach_speed", self.time_to_reach_speed),
            ("air_control_rate", self.air_control_rate),
            ("air_control_overspeed_factor", self.air_control_overspeed_factor),
            ("air_friction", self.air_friction),
            ("ground_friction", self.ground_friction),
            ("gravity", self.gravity),
            ("forced_slide_gravity", self.forced_slide_gravity),
            ("slope_limit", self.slope_limit),
        ];

        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !self.max_speed.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "max_speed",
                value: self.max_speed,
            });
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::NonPositiveMaxSpeed(self.max_speed));
        }

        if self.slope_limit >= 90.0 {
            log::warn!(
                "slope_limit {} >= 90 degrees: no ground will ever count as too steep",
                self.slope_limit
            );
        }

        Ok(())
    }
}
