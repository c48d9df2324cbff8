//! Nubi Character Controller
//!
//! An engine-independent third-person character controller. The controller
//! keeps its own momentum, probes the ground through a narrow physics
//! interface and hands a final velocity back to whatever body the host moves.
//!
//! # Architecture
//!
//! The crate is split into three layers:
//!
//! - **State machine**: a generic guarded-transition graph driving
//!   `enter`/`update`/`fixed_update`/`exit` hooks
//! - **Collision**: the ground sensor and the contact-based wall/ceiling
//!   detector, both talking to the host through [`PhysicsQuery`]
//! - **Movement**: the momentum solver, the locomotion states and pluggable
//!   [`MovementMechanic`]s such as [`JumpMechanic`]
//!
//! # Clocks
//!
//! Hosts drive two clocks. [`CharacterController::update`] runs at frame rate:
//! it evaluates transitions and samples input. [`CharacterController::fixed_update`]
//! runs at the physics rate: it integrates momentum and returns the velocity
//! the body should move with. Transitions never happen inside a fixed tick.

pub mod collision;
pub mod math;
pub mod movement;
pub mod state_machine;
pub mod transform;

// Re-export commonly used types
pub use collision::{
    ColliderDimensions, ColliderSettings, ContactPoint, GroundSensor, Layer, LayerMask,
    PhysicsQuery, ProbeHit, WallDetector, WallSettings,
};
pub use movement::{
    CameraBasis, CharacterController, ConfigError, ControllerBuilder, ControllerConfig,
    ControllerEvent, InputProvider, InputState, JumpConfig, JumpMechanic, Motor, MovementMechanic,
    StateId, TickContext,
};
pub use state_machine::{State, StateMachine};
pub use transform::Transform;
