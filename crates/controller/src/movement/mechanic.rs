//! Pluggable movement mechanics.
//!
//! A mechanic contributes its own state(s) and transitions to the shared
//! state machine and can rewrite intermediate solver values through the
//! `handle_*` hooks. Mechanics run in registration order for every hook, and
//! each one sees the values left by the previous one.

use std::any::Any;
use std::fmt;

use glam::Vec3;

use crate::state_machine::StateMachine;

use super::motor::Motor;
use super::state::{InputState, StateId};

/// Per-tick values handed to [`MovementMechanic::handle_momentum`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// The character's up axis (world space).
    pub up: Vec3,
    /// Fixed timestep (seconds).
    pub dt: f32,
}

/// A behavior plugged into the controller.
///
/// All hooks default to no-ops. `state` is the state that was current when
/// the fixed tick started.
pub trait MovementMechanic: Any + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Install this mechanic's states and transitions.
    ///
    /// `slot` is the mechanic's index in the controller; predicates and
    /// states use it to find the mechanic again through
    /// [`Motor::mechanic`].
    fn register(&self, slot: usize, machine: &mut StateMachine<StateId, Motor>);

    /// Called once per variable-rate update, after transitions.
    fn handle_input(&mut self, _input: &InputState) {}

    /// Adjust vertical momentum right after gravity was applied.
    fn handle_gravity(&mut self, _vertical: &mut Vec3, _state: StateId) {}

    /// Adjust the air control rate before it is used.
    fn handle_air_control_rate(&mut self, _rate: &mut f32, _state: StateId) {}

    /// Adjust the friction before it is applied.
    fn handle_friction(&mut self, _friction: &mut f32, _state: StateId) {}

    /// Rewrite total momentum after friction.
    fn handle_momentum(&mut self, _momentum: &mut Vec3, _ctx: &TickContext, _state: StateId) {}

    /// Rewrite the input-driven velocity before momentum is added.
    fn handle_velocity(&mut self, _velocity: &mut Vec3, _state: StateId) {}

    /// Called at the very end of every fixed tick.
    fn handle_fixed_update(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
