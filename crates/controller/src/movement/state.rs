//! Locomotion state keys, input and events.

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Key of a locomotion state in the controller's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    /// Standing or walking on walkable ground.
    Grounded,
    /// Airborne with momentum pointing down (or level).
    Falling,
    /// On ground steeper than the slope limit.
    ForcedSliding,
    /// Airborne with momentum pointing up.
    Rising,
    /// Contributed by [`super::JumpMechanic`].
    Jumping,
    /// Contributed by a third-party mechanic.
    Custom(&'static str),
}

impl StateId {
    /// The four states every controller has, whatever its mechanics.
    pub const CORE: [StateId; 4] = [
        StateId::Grounded,
        StateId::Falling,
        StateId::ForcedSliding,
        StateId::Rising,
    ];
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Grounded => f.write_str("grounded"),
            StateId::Falling => f.write_str("falling"),
            StateId::ForcedSliding => f.write_str("forced-sliding"),
            StateId::Rising => f.write_str("rising"),
            StateId::Jumping => f.write_str("jumping"),
            StateId::Custom(name) => f.write_str(name),
        }
    }
}

/// Source of player input, queried once per variable-rate update.
pub trait InputProvider {
    /// Move stick / WASD, x = right, y = forward. Values longer than 1 are
    /// normalized by the controller.
    fn move_axis(&self) -> Vec2;

    /// Whether the jump key is currently held.
    fn jump_held(&self) -> bool;
}

/// One frame of input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub move_axis: Vec2,
    pub jump: bool,
}

impl InputState {
    pub fn new(move_axis: Vec2, jump: bool) -> Self {
        Self { move_axis, jump }
    }

    /// Capture the current state of any provider.
    pub fn sample<I: InputProvider + ?Sized>(input: &I) -> Self {
        Self {
            move_axis: input.move_axis(),
            jump: input.jump_held(),
        }
    }
}

impl InputProvider for InputState {
    fn move_axis(&self) -> Vec2 {
        self.move_axis
    }

    fn jump_held(&self) -> bool {
        self.jump
    }
}

/// Camera axes used to turn 2D input into a world direction.
///
/// Both axes are flattened onto the character's horizontal plane before use,
/// so a pitched camera still walks the character along the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBasis {
    pub right: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    pub fn new(right: Vec3, forward: Vec3) -> Self {
        Self { right, forward }
    }

    /// Basis of a camera looking along `forward` with the given up vector.
    pub fn looking(forward: Vec3, up: Vec3) -> Self {
        Self {
            right: up.cross(forward),
            forward,
        }
    }
}

/// Something the host may want to react to (sound, camera shake, UI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// Entered [`StateId::Grounded`]; `velocity` is the world momentum at
    /// the moment of landing.
    Landed { velocity: Vec3 },

    /// A jump started; `momentum` is the world momentum after the impulse.
    Jumped { momentum: Vec3 },

    /// The state machine switched states during an update.
    StateChanged { from: StateId, to: StateId },
}
