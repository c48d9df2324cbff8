//! Jump mechanic.
//!
//! Tracks jump key edges once per variable-rate update. A fresh press (or a
//! key held since the last reset) enters [`StateId::Jumping`] from the ground
//! unless the input is locked. Entering adds `jump_speed` along up once and
//! locks the input so a held key cannot retrigger. While jumping, every fixed
//! tick replaces the vertical momentum with exactly `jump_speed`, giving a
//! constant ascent until the key is released or `jump_duration` runs out.

use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::remove_dot_vector;
use crate::state_machine::{State, StateMachine};

use super::mechanic::{MovementMechanic, TickContext};
use super::motor::Motor;
use super::state::{ControllerEvent, InputState, StateId};

/// Jump tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Vertical speed held during the jump (meters/second).
    pub jump_speed: f32,

    /// Longest time the key can sustain a jump (seconds).
    pub jump_duration: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_speed: 10.0,
            jump_duration: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JumpMechanic {
    pub config: JumpConfig,

    /// Key is held right now.
    is_pressed: bool,
    /// Key went down since the last reset.
    was_pressed: bool,
    /// Key went up (or was auto-released) since the last reset.
    was_let_go: bool,
    /// Set when a jump starts, cleared on release.
    input_locked: bool,
    /// Seconds spent in the current jump.
    timer: f32,
}

impl JumpMechanic {
    pub fn new(config: JumpConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Feed the raw key state for this update.
    pub fn handle_key(&mut self, pressed: bool) {
        self.was_pressed = false;
        self.was_let_go = false;

        if !self.is_pressed && pressed {
            self.was_pressed = true;
        }

        if self.is_pressed && !pressed {
            self.was_let_go = true;
            self.input_locked = false;
        }

        // Held past the duration: release automatically
        if self.is_pressed && pressed && self.timer >= self.config.jump_duration {
            self.was_let_go = true;
            self.input_locked = false;
            self.timer = 0.0;
        }

        self.is_pressed = pressed;
    }

    /// A jump may start this update.
    pub fn wants_to_jump(&self) -> bool {
        (self.is_pressed || self.was_pressed) && !self.input_locked
    }

    /// The current jump should end this update.
    pub fn wants_to_stop(&self) -> bool {
        self.was_let_go
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.input_locked
    }

    /// Seconds spent in the current jump.
    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Apply the initial impulse and lock the input.
    pub fn start(&mut self, momentum: &mut Vec3, up: Vec3) {
        *momentum += up * self.config.jump_speed;
        self.input_locked = true;
        self.timer = 0.0;
    }

    /// Hold vertical speed at exactly `jump_speed`.
    fn sustain(&mut self, momentum: &mut Vec3, ctx: &TickContext) {
        self.timer += ctx.dt;
        *momentum = remove_dot_vector(*momentum, ctx.up) + ctx.up * self.config.jump_speed;
    }
}

impl MovementMechanic for JumpMechanic {
    fn name(&self) -> &'static str {
        "jump"
    }

    fn register(&self, slot: usize, machine: &mut StateMachine<StateId, Motor>) {
        machine.add_state(StateId::Jumping, JumpingState { slot });

        machine.at(StateId::Jumping, StateId::Falling, move |motor: &Motor| {
            motor
                .mechanic::<JumpMechanic>(slot)
                .is_some_and(JumpMechanic::wants_to_stop)
        });

        for from in [StateId::Grounded, StateId::ForcedSliding] {
            machine.at(from, StateId::Jumping, move |motor: &Motor| {
                motor
                    .mechanic::<JumpMechanic>(slot)
                    .is_some_and(JumpMechanic::wants_to_jump)
            });
        }
    }

    fn handle_input(&mut self, input: &InputState) {
        self.handle_key(input.jump);
    }

    fn handle_momentum(&mut self, momentum: &mut Vec3, ctx: &TickContext, state: StateId) {
        if state == StateId::Jumping {
            self.sustain(momentum, ctx);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// State contributed by [`JumpMechanic`].
#[derive(Debug)]
pub struct JumpingState {
    slot: usize,
}

impl State<Motor> for JumpingState {
    fn enter(&mut self, motor: &mut Motor) {
        motor.on_ground_contact_lost();

        let up = motor.up();
        let mut momentum = motor.momentum();
        let Some(jump) = motor.mechanic_mut::<JumpMechanic>(self.slot) else {
            return;
        };
        jump.start(&mut momentum, up);
        motor.set_momentum(momentum);

        log::debug!("jump started with momentum {momentum:?}");
        motor.push_event(ControllerEvent::Jumped { momentum });
    }
}
