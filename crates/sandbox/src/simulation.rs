//! Headless simulation loop.
//!
//! Drives one character through a level the way an engine would: every
//! rendered frame first runs the fixed physics steps the accumulator owes,
//! then the variable-rate controller update. Given the same scenario the run
//! is bit-for-bit reproducible.

use glam::Vec3;
use nubi_controller::{CharacterController, ControllerEvent, StateId};
use serde::{Deserialize, Serialize};

use crate::body::KinematicBody;
use crate::input::InputScript;
use crate::level::Level;

/// Frame and physics rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Rendered frames per second.
    pub frame_rate: u32,

    /// Physics steps per second.
    pub fixed_rate: u32,

    /// Most physics steps run in one frame; time beyond that is dropped.
    pub max_fixed_steps: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            fixed_rate: 50,
            max_fixed_steps: 8,
        }
    }
}

impl Timing {
    /// Seconds per rendered frame.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate as f32
    }

    /// Seconds per physics step.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.fixed_rate as f32
    }

    pub fn is_valid(&self) -> bool {
        self.frame_rate > 0 && self.fixed_rate > 0 && self.max_fixed_steps > 0
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Fixed-timestep accumulator.
#[derive(Debug, Clone)]
pub struct Scheduler {
    fixed_dt: f32,
    max_steps: u32,
    accumulator: f32,
    /// Total seconds thrown away because a frame owed too many steps.
    dropped: f32,
}

impl Scheduler {
    pub fn new(timing: &Timing) -> Self {
        Self {
            fixed_dt: timing.fixed_dt(),
            max_steps: timing.max_fixed_steps,
            accumulator: 0.0,
            dropped: 0.0,
        }
    }

    /// Add a frame's worth of time and return how many fixed steps to run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_steps {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if self.accumulator >= self.fixed_dt {
            let excess = self.accumulator - self.accumulator % self.fixed_dt;
            log::warn!(
                "frame owed more than {} fixed steps, dropping {:.3}s",
                self.max_steps,
                excess
            );
            self.accumulator -= excess;
            self.dropped += excess;
        }

        steps
    }

    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Time carried over to the next frame.
    #[inline]
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    pub fn dropped(&self) -> f32 {
        self.dropped
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// A state change with the simulation time it was reported at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateChange {
    pub time: f32,
    pub from: StateId,
    pub to: StateId,
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub final_position: Vec3,
    pub final_state: Option<StateId>,
    pub landings: u32,
    pub jumps: u32,
    /// Fixed steps whose contacts touched a ceiling.
    pub ceiling_hits: u32,
    /// Fixed steps whose contacts touched a wall.
    pub wall_hits: u32,
    /// Fastest body velocity handed out by the controller.
    pub max_speed: f32,
    pub timeline: Vec<StateChange>,
}

/// One character in one level.
#[derive(Debug)]
pub struct Simulation {
    /// Rendered frames so far.
    pub frame: u64,

    /// Fixed steps so far.
    pub ticks: u64,

    pub level: Level,
    pub controller: CharacterController,
    pub body: KinematicBody,

    timing: Timing,
    scheduler: Scheduler,
    input: InputScript,
    time: f32,
    summary: RunSummary,
}

impl Simulation {
    pub fn new(
        controller: CharacterController,
        body: KinematicBody,
        level: Level,
        timing: Timing,
        input: InputScript,
    ) -> Self {
        Self {
            frame: 0,
            ticks: 0,
            level,
            controller,
            body,
            scheduler: Scheduler::new(&timing),
            timing,
            input,
            time: 0.0,
            summary: RunSummary::default(),
        }
    }

    /// Seconds of simulated frame time.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Advance by one rendered frame.
    pub fn frame(&mut self) {
        let frame_dt = self.timing.frame_dt();
        let fixed_dt = self.scheduler.fixed_dt();

        let steps = self.scheduler.advance(frame_dt);
        for _ in 0..steps {
            self.fixed_step(fixed_dt);
        }

        let input = self.input.sample(self.time);
        self.controller.update(frame_dt, &input);

        self.time += frame_dt;
        self.frame += 1;
        self.record_events();
    }

    fn fixed_step(&mut self, dt: f32) {
        let velocity = self.controller.fixed_update(dt, &self.level.collision);
        let contacts = self.body.step(velocity, dt, &self.level.collision);
        self.controller.set_position(self.body.position);

        if !contacts.is_empty() {
            self.controller.on_collision(&contacts);
            let walls = self.controller.walls();
            self.summary.ceiling_hits += u32::from(walls.hit_ceiling());
            self.summary.wall_hits += u32::from(walls.hit_wall());
        }

        self.ticks += 1;
        self.summary.max_speed = self.summary.max_speed.max(velocity.length());

        log::debug!(
            "tick {} {}: pos {:?} vel {:?} momentum {:?}",
            self.ticks,
            self.controller.state(),
            self.body.position,
            velocity,
            self.controller.momentum()
        );
    }

    fn record_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                ControllerEvent::Landed { velocity } => {
                    self.summary.landings += 1;
                    log::info!("t={:.3} landed at {:.2} m/s", self.time, velocity.length());
                }
                ControllerEvent::Jumped { momentum } => {
                    self.summary.jumps += 1;
                    log::info!("t={:.3} jumped, momentum {momentum:?}", self.time);
                }
                ControllerEvent::StateChanged { from, to } => {
                    self.summary.timeline.push(StateChange {
                        time: self.time,
                        from,
                        to,
                    });
                    log::info!("t={:.3} {from} -> {to}", self.time);
                }
            }
        }
    }

    /// Run whole frames until `duration` seconds have passed.
    pub fn run_for(&mut self, duration: f32) -> RunSummary {
        let frames = (duration * self.timing.frame_rate as f32).ceil() as u64;
        for _ in 0..frames {
            self.frame();
        }
        self.summary()
    }

    /// Run whole frames until at least `ticks` fixed steps have happened.
    pub fn run_ticks(&mut self, ticks: u64) -> RunSummary {
        let target = self.ticks + ticks;
        while self.ticks < target {
            self.frame();
        }
        self.summary()
    }

    /// Summary of everything so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frame,
            ticks: self.ticks,
            final_position: self.body.position,
            final_state: Some(self.controller.state()),
            ..self.summary.clone()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputKey;
    use approx::assert_relative_eq;
    use glam::Vec2;
    use nubi_controller::{
        ColliderDimensions, ColliderSettings, ControllerConfig, JumpConfig, JumpMechanic, Layer,
        Transform,
    };

    fn create_simulation(input: InputScript) -> Simulation {
        let level = Level::test_course();
        let transform = Transform::from_position(level.spawn.position);
        let controller = CharacterController::builder(ControllerConfig::default())
            .transform(transform)
            .mechanic(JumpMechanic::new(JumpConfig::default()))
            .build();
        let dims = ColliderDimensions::from_settings(&ColliderSettings::default());
        let body = KinematicBody::new(&transform, dims, Layer::DEFAULT);
        Simulation::new(controller, body, level, Timing::default(), input)
    }

    #[test]
    fn test_scheduler_steps() {
        let timing = Timing {
            frame_rate: 50,
            fixed_rate: 100,
            max_fixed_steps: 8,
        };
        let mut scheduler = Scheduler::new(&timing);
        assert_eq!(scheduler.advance(timing.frame_dt()), 2);
        assert!(scheduler.pending() < scheduler.fixed_dt());
    }

    #[test]
    fn test_scheduler_carries_remainder() {
        let mut scheduler = Scheduler::new(&Timing::default());
        let frame_dt = Timing::default().frame_dt();

        // 60 frames at 60 Hz owe 50 steps at 50 Hz
        let steps: u32 = (0..60).map(|_| scheduler.advance(frame_dt)).sum();
        assert!((49..=50).contains(&steps), "{steps} steps");
        assert_eq!(scheduler.dropped(), 0.0);
    }

    #[test]
    fn test_scheduler_drops_excess() {
        let mut scheduler = Scheduler::new(&Timing::default());
        assert_eq!(scheduler.advance(1.0), 8);
        assert!(scheduler.pending() < scheduler.fixed_dt());
        assert_relative_eq!(scheduler.dropped(), 1.0 - 8.0 * 0.02, epsilon = 0.021);
    }

    #[test]
    fn test_timing_validity() {
        assert!(Timing::default().is_valid());
        let timing = Timing {
            fixed_rate: 0,
            ..Default::default()
        };
        assert!(!timing.is_valid());
    }

    #[test]
    fn test_frame_advances_counters() {
        let mut sim = create_simulation(InputScript::default());
        sim.frame();
        assert_eq!(sim.frame, 1);
        sim.frame();
        assert_eq!(sim.frame, 2);
        assert!(sim.ticks >= 1);
    }

    #[test]
    fn test_movement_input() {
        let script = InputScript::new(vec![InputKey::new(0.0, Vec2::Y, false)]);
        let mut sim = create_simulation(script);
        let start = sim.body.position;

        let summary = sim.run_for(1.0);
        let distance = (summary.final_position - start).length();

        assert!(distance > 3.0, "moved {distance}");
        assert_eq!(summary.final_state, Some(StateId::Grounded));
        assert_eq!(summary.landings, 1);
    }

    #[test]
    fn test_determinism() {
        let keys = (0..20)
            .map(|i| {
                let axis = Vec2::new((i % 3) as f32 - 1.0, (i % 2) as f32);
                InputKey::new(i as f32 * 0.15, axis, i % 5 == 0)
            })
            .collect();
        let script = InputScript::new(keys);

        let first = create_simulation(script.clone()).run_for(3.0);
        let second = create_simulation(script).run_for(3.0);

        assert_eq!(first, second);
        assert!(first.jumps > 0);
    }
}
