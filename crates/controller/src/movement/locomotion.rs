//! The four core locomotion states and their transition table.

use crate::state_machine::{State, StateMachine};

use super::motor::Motor;
use super::state::StateId;

#[derive(Debug, Default)]
pub struct GroundedState;

impl State<Motor> for GroundedState {
    fn enter(&mut self, motor: &mut Motor) {
        motor.on_ground_contact_regained();
    }
}

#[derive(Debug, Default)]
pub struct FallingState;

impl State<Motor> for FallingState {
    fn enter(&mut self, motor: &mut Motor) {
        motor.on_ground_contact_lost_falling();
    }
}

#[derive(Debug, Default)]
pub struct ForcedSlidingState;

impl State<Motor> for ForcedSlidingState {
    fn enter(&mut self, motor: &mut Motor) {
        motor.on_ground_contact_lost();
    }
}

#[derive(Debug, Default)]
pub struct RisingState;

impl State<Motor> for RisingState {
    fn enter(&mut self, motor: &mut Motor) {
        motor.on_ground_contact_lost();
    }
}

fn grounded(motor: &Motor) -> bool {
    motor.is_sensor_grounded()
}

fn walkable(motor: &Motor) -> bool {
    motor.is_sensor_grounded() && !motor.is_ground_too_steep()
}

fn steep(motor: &Motor) -> bool {
    motor.is_sensor_grounded() && motor.is_ground_too_steep()
}

/// Install the core states and the transitions between them.
///
/// Transitions are listed per source state in priority order.
pub(crate) fn register(machine: &mut StateMachine<StateId, Motor>) {
    use StateId::*;

    machine.add_state(Grounded, GroundedState);
    machine.add_state(Falling, FallingState);
    machine.add_state(ForcedSliding, ForcedSlidingState);
    machine.add_state(Rising, RisingState);

    machine.at(Grounded, Rising, |m: &Motor| m.is_rising() && !grounded(m));
    machine.at(Grounded, ForcedSliding, steep);
    machine.at(Grounded, Falling, |m: &Motor| !grounded(m));

    machine.at(Falling, ForcedSliding, steep);
    machine.at(Falling, Grounded, walkable);

    machine.at(ForcedSliding, Grounded, walkable);
    machine.at(ForcedSliding, Falling, |m: &Motor| m.is_falling() && !grounded(m));

    machine.at(Rising, Grounded, walkable);
    machine.at(Rising, ForcedSliding, steep);
    machine.at(Rising, Falling, Motor::is_falling);
}
