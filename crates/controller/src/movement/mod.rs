//! Character movement.
//!
//! This module implements the locomotion core:
//!
//! - Four ground-contact states (grounded, falling, rising, forced sliding)
//!   driven by a [`crate::StateMachine`]
//! - A momentum solver with gravity, air control, linear friction and slope
//!   sliding
//! - Pluggable [`MovementMechanic`]s, with [`JumpMechanic`] as the built-in
//!   one
//!
//! # Design
//!
//! [`CharacterController`] owns the state machine and a [`Motor`]. The motor
//! is the context every state hook and transition predicate receives, so all
//! mutation of momentum goes through one place.
//!
//! Given the same sequence of inputs, timesteps and physics answers, the
//! controller produces the same velocities.

mod config;
mod controller;
mod jump;
mod locomotion;
mod mechanic;
mod motor;
mod state;

pub use config::{ConfigError, ControllerConfig};
pub use controller::{CharacterController, ControllerBuilder};
pub use jump::{JumpConfig, JumpMechanic, JumpingState};
pub use locomotion::{FallingState, ForcedSlidingState, GroundedState, RisingState};
pub use mechanic::{MovementMechanic, TickContext};
pub use motor::Motor;
pub use state::{CameraBasis, ControllerEvent, InputProvider, InputState, StateId};
