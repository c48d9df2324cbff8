//! Character controller.
//!
//! This is the main entry point. The host drives two clocks: call
//! [`CharacterController::update`] once per rendered frame and
//! [`CharacterController::fixed_update`] once per physics step, then move the
//! body with the returned velocity and report contacts back through
//! [`CharacterController::on_collision`].

use glam::Vec3;

use crate::collision::{
    ColliderSettings, ContactPoint, GroundSensor, Layer, PhysicsQuery, WallDetector, WallSettings,
};
use crate::state_machine::StateMachine;
use crate::transform::Transform;

use super::config::{ConfigError, ControllerConfig};
use super::locomotion;
use super::mechanic::MovementMechanic;
use super::motor::Motor;
use super::state::{CameraBasis, ControllerEvent, InputProvider, InputState, StateId};

/// Builder for [`CharacterController`].
///
/// # Example
///
/// ```
/// use nubi_controller::{CharacterController, ControllerConfig, JumpConfig, JumpMechanic};
///
/// let controller = CharacterController::builder(ControllerConfig::default())
///     .mechanic(JumpMechanic::new(JumpConfig::default()))
///     .build();
/// assert_eq!(controller.state(), nubi_controller::StateId::Falling);
/// ```
#[derive(Debug)]
pub struct ControllerBuilder {
    config: ControllerConfig,
    collider: ColliderSettings,
    walls: WallSettings,
    transform: Transform,
    camera: Option<CameraBasis>,
    layer: Layer,
    mechanics: Vec<Box<dyn MovementMechanic>>,
}

impl ControllerBuilder {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            collider: ColliderSettings::default(),
            walls: WallSettings::default(),
            transform: Transform::default(),
            camera: None,
            layer: Layer::DEFAULT,
            mechanics: Vec::new(),
        }
    }

    pub fn collider(mut self, collider: ColliderSettings) -> Self {
        self.collider = collider;
        self
    }

    pub fn walls(mut self, walls: WallSettings) -> Self {
        self.walls = walls;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn camera(mut self, camera: CameraBasis) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Append a mechanic. Mechanics run in the order they are added.
    pub fn mechanic<M: MovementMechanic>(self, mechanic: M) -> Self {
        self.boxed_mechanic(Box::new(mechanic))
    }

    pub fn boxed_mechanic(mut self, mechanic: Box<dyn MovementMechanic>) -> Self {
        self.mechanics.push(mechanic);
        self
    }

    /// Validate the configuration, then build.
    pub fn try_build(self) -> Result<CharacterController, ConfigError> {
        self.config.validate()?;
        Ok(self.build())
    }

    /// Build without validating the configuration.
    pub fn build(self) -> CharacterController {
        let mut motor = Motor::new(self.config, self.collider, self.walls, self.transform);
        motor.camera = self.camera;
        motor.layer = self.layer;
        motor.mechanics = self.mechanics;

        let mut machine = StateMachine::new();
        locomotion::register(&mut machine);
        for (slot, mechanic) in motor.mechanics.iter().enumerate() {
            mechanic.register(slot, &mut machine);
            log::debug!("mechanic '{}' registered in slot {slot}", mechanic.name());
        }

        machine.set_state(StateId::Falling, &mut motor);

        CharacterController { machine, motor }
    }
}

/// Kinematic character controller.
#[derive(Debug)]
pub struct CharacterController {
    machine: StateMachine<StateId, Motor>,
    motor: Motor,
}

impl CharacterController {
    pub fn builder(config: ControllerConfig) -> ControllerBuilder {
        ControllerBuilder::new(config)
    }

    /// Controller with default collider and no mechanics.
    pub fn new(config: ControllerConfig) -> Self {
        Self::builder(config).build()
    }

    // ========================================================================
    // Clocks
    // ========================================================================

    /// Variable-rate update: evaluate transitions, then sample input.
    ///
    /// Transitions see the input of the previous update.
    pub fn update<I>(&mut self, dt: f32, input: &I)
    where
        I: InputProvider + ?Sized,
    {
        self.motor.advance_time(dt);

        let from = self.state();
        if let Some(to) = self.machine.update(&mut self.motor) {
            log::debug!("state {from} -> {to} at t={:.3}", self.motor.time());
            self.motor
                .push_event(ControllerEvent::StateChanged { from, to });
        }

        let input = InputState::sample(input);
        for mechanic in &mut self.motor.mechanics {
            mechanic.handle_input(&input);
        }
        self.motor.sample_input(input.move_axis);
    }

    /// Fixed-rate update: integrate momentum and return the velocity the
    /// body should move with during this step.
    pub fn fixed_update<P>(&mut self, dt: f32, physics: &P) -> Vec3
    where
        P: PhysicsQuery + ?Sized,
    {
        self.machine.fixed_update(&mut self.motor);
        let state = self.state();
        self.motor.fixed_tick(state, dt, physics)
    }

    /// Report the contacts produced by the last body move.
    pub fn on_collision(&mut self, contacts: &[ContactPoint]) {
        self.motor.on_collision(contacts);
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn state(&self) -> StateId {
        self.machine.current().unwrap_or(StateId::Falling)
    }

    #[inline]
    pub fn is_in(&self, state: StateId) -> bool {
        self.machine.is_in(state)
    }

    /// In [`StateId::Grounded`].
    pub fn is_grounded(&self) -> bool {
        self.is_in(StateId::Grounded)
    }

    /// Non-zero move input while grounded.
    pub fn is_moving(&self) -> bool {
        self.motor.direction() != glam::Vec2::ZERO && self.is_grounded()
    }

    pub fn is_ground_too_steep(&self) -> bool {
        self.motor.is_ground_too_steep()
    }

    /// Momentum in world space.
    pub fn momentum(&self) -> Vec3 {
        self.motor.momentum()
    }

    /// Replace momentum, given in world space.
    pub fn set_momentum(&mut self, momentum: Vec3) {
        self.motor.set_momentum(momentum);
    }

    /// Momentum as stored (local space with `use_local_momentum`).
    pub fn local_momentum(&self) -> Vec3 {
        self.motor.local_momentum()
    }

    /// Velocity of the last fixed tick, without the feet correction.
    pub fn velocity(&self) -> Vec3 {
        self.motor.velocity()
    }

    pub fn movement_velocity(&self) -> Vec3 {
        self.motor.movement_velocity()
    }

    /// Take all events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        self.motor.drain_events().collect()
    }

    // ========================================================================
    // Host Plumbing
    // ========================================================================

    pub fn transform(&self) -> &Transform {
        &self.motor.transform
    }

    /// Replace the transform. Sensor lengths follow a change of scale.
    pub fn set_transform(&mut self, transform: Transform) {
        let rescaled = transform.length_scale() != self.motor.transform.length_scale();
        self.motor.transform = transform;
        if rescaled {
            self.motor.sensor.recalibrate(transform.length_scale());
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.motor.transform.position = position;
    }

    pub fn set_camera(&mut self, camera: Option<CameraBasis>) {
        self.motor.camera = camera;
    }

    #[inline]
    pub fn layer(&self) -> Layer {
        self.motor.layer
    }

    /// Move the character to another physics layer. The ground probe mask
    /// is rebuilt on the next fixed tick.
    pub fn set_layer(&mut self, layer: Layer) {
        self.motor.layer = layer;
    }

    pub fn set_step_height_ratio(&mut self, ratio: f32) {
        let scale = self.motor.transform.length_scale();
        self.motor.sensor.set_step_height_ratio(ratio, scale);
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.motor.config
    }

    pub fn sensor(&self) -> &GroundSensor {
        &self.motor.sensor
    }

    pub fn walls(&self) -> &WallDetector {
        &self.motor.walls
    }

    pub fn motor(&self) -> &Motor {
        &self.motor
    }

    /// First mechanic of type `T`.
    pub fn mechanic<T: MovementMechanic>(&self) -> Option<&T> {
        self.motor
            .mechanics
            .iter()
            .find_map(|mechanic| mechanic.as_any().downcast_ref::<T>())
    }

    pub fn mechanic_mut<T: MovementMechanic>(&mut self) -> Option<&mut T> {
        self.motor
            .mechanics
            .iter_mut()
            .find_map(|mechanic| mechanic.as_any_mut().downcast_mut::<T>())
    }
}
