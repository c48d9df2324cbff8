//! Ground and wall sensing.
//!
//! The controller never touches geometry directly. It asks the host through
//! [`PhysicsQuery`] and receives contacts as [`ContactPoint`] lists.
//!
//! # Key Types
//!
//! - [`GroundSensor`]: downward probe deciding grounded/normal/distance and the
//!   feet-height correction
//! - [`WallDetector`]: classifies reported contacts into ceiling and wall hits
//! - [`LayerMask`]: which physics layers a probe may hit

mod flags;
mod sensor;
mod trace;
mod walls;

pub use flags::{Layer, LayerMask, LAYER_COUNT};
pub use sensor::{ColliderDimensions, ColliderSettings, GroundSensor};
pub use trace::{ContactPoint, PhysicsQuery, ProbeHit};
pub use walls::{WallDetector, WallSettings};
