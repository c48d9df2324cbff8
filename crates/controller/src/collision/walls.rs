//! Contact-based ceiling and wall detection.
//!
//! Unlike the ground probe this is event driven: the host reports the
//! contacts produced when it moved the body, and the detector classifies the
//! first one by its angle to "down". Flags stay raised until the momentum
//! solver has corrected for them and resets them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::angle_degrees;

use super::trace::ContactPoint;

/// Angle limits (degrees) for contact classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSettings {
    /// Contacts whose normal is within this angle of "down" are ceilings.
    pub ceiling_angle_limit: f32,

    /// Contacts strictly between this angle and `180 - limit` from "down"
    /// are walls.
    pub wall_angle_limit: f32,

    /// Log each classified contact at `trace` level.
    pub debug: bool,
}

impl Default for WallSettings {
    fn default() -> Self {
        Self {
            ceiling_angle_limit: 10.0,
            wall_angle_limit: 85.0,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WallDetector {
    settings: WallSettings,
    ceiling_hit: bool,
    wall_hit: bool,
    wall_normal: Vec3,
}

impl WallDetector {
    pub fn new(settings: WallSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Classify the contacts of one collision callback.
    ///
    /// An empty contact list only clears the ceiling flag.
    pub fn on_collision(&mut self, contacts: &[ContactPoint], up: Vec3) {
        let Some(first) = contacts.first() else {
            self.ceiling_hit = false;
            return;
        };

        let angle = angle_degrees(-up, first.normal);
        let wall_limit = self.settings.wall_angle_limit;

        self.ceiling_hit = angle < self.settings.ceiling_angle_limit;
        self.wall_hit = angle > wall_limit && angle < 180.0 - wall_limit;
        self.wall_normal = first.normal;

        if self.settings.debug {
            log::trace!(
                "contact at {:?} normal={:?} angle={:.1} ceiling={} wall={}",
                first.point,
                first.normal,
                angle,
                self.ceiling_hit,
                self.wall_hit
            );
        }
    }

    #[inline]
    pub fn hit_ceiling(&self) -> bool {
        self.ceiling_hit
    }

    #[inline]
    pub fn hit_wall(&self) -> bool {
        self.wall_hit
    }

    /// Normal of the last classified contact.
    #[inline]
    pub fn wall_normal(&self) -> Vec3 {
        self.wall_normal
    }

    pub fn reset_ceiling(&mut self) {
        self.ceiling_hit = false;
    }

    pub fn reset_wall(&mut self) {
        self.wall_hit = false;
    }
}
