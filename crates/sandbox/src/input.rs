//! Scripted player input.
//!
//! A scenario drives the character with a timeline of keyframes instead of a
//! keyboard. Each keyframe holds until the next one starts.

use glam::Vec2;
use nubi_controller::InputState;
use serde::{Deserialize, Serialize};

/// Input held from `at` seconds until the next keyframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputKey {
    pub at: f32,
    /// x = right, y = forward.
    pub move_axis: Vec2,
    pub jump: bool,
}

impl InputKey {
    pub fn new(at: f32, move_axis: Vec2, jump: bool) -> Self {
        Self { at, move_axis, jump }
    }

    fn state(&self) -> InputState {
        InputState::new(self.move_axis, self.jump)
    }
}

/// Time-keyed input timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputScript {
    keys: Vec<InputKey>,
}

impl InputScript {
    /// Script from keyframes in any order.
    pub fn new(mut keys: Vec<InputKey>) -> Self {
        keys.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { keys }
    }

    /// Add a keyframe, keeping the timeline sorted.
    pub fn push(&mut self, key: InputKey) {
        let index = self.keys.partition_point(|k| k.at <= key.at);
        self.keys.insert(index, key);
    }

    pub fn keys(&self) -> &[InputKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Input held at `time`. Before the first keyframe nothing is pressed.
    pub fn sample(&self, time: f32) -> InputState {
        let index = self.keys.partition_point(|k| k.at <= time);
        index
            .checked_sub(1)
            .map(|i| self.keys[i].state())
            .unwrap_or_default()
    }

    /// Time of the last keyframe.
    pub fn end(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.at)
    }
}
