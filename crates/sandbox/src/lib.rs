//! Nubi Sandbox
//!
//! A headless host for `nubi-controller`. It plays the part of the game
//! engine:
//!
//! - a parry3d [`CollisionWorld`] of box brushes answering ground probes
//! - a [`KinematicBody`] that moves with the controller's velocity and
//!   reports contacts back
//! - a fixed-timestep [`Scheduler`] interleaving physics steps and frames
//! - RON [`Scenario`] files with a scripted input timeline
//!
//! ```text
//!  frame ─┬─► fixed_update ─► body.step ─► on_collision   (0..8 times)
//!         └─► update(input script)
//! ```

pub mod body;
pub mod input;
pub mod level;
pub mod scenario;
pub mod simulation;
pub mod world;

pub use body::KinematicBody;
pub use input::{InputKey, InputScript};
pub use level::{BrushDesc, Level, LevelDesc, SpawnPoint, STANDING_HEIGHT};
pub use scenario::{Scenario, ScenarioError};
pub use simulation::{RunSummary, Scheduler, Simulation, StateChange, Timing};
pub use world::{Brush, CollisionWorld, Contact};
