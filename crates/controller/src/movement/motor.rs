//! Momentum solver.
//!
//! [`Motor`] owns everything the locomotion states, transition predicates and
//! mechanics need to look at: configuration, transform, sensors, input and
//! momentum. The state machine is kept outside of it so state hooks can take
//! `&mut Motor` without aliasing the machine that calls them.
//!
//! # Fixed tick
//!
//! ```text
//! check ground ─► integrate momentum ─► velocity = input (grounded only)
//!       + momentum ─► clamp ─► feet correction ─► body velocity
//! ```
//!
//! Momentum integration splits momentum into vertical and horizontal parts,
//! applies gravity, air control, forced sliding and friction, lets mechanics
//! rewrite the result, then corrects for slopes, ceilings and walls.

use glam::{Vec2, Vec3};

use crate::collision::{
    ColliderSettings, ContactPoint, GroundSensor, Layer, PhysicsQuery, WallDetector, WallSettings,
};
use crate::math::{
    angle_degrees, clamp_magnitude, extract_dot_vector, move_towards, normalize_or_zero,
    project_on_plane, ramp, remove_dot_vector,
};
use crate::transform::Transform;

use super::config::ControllerConfig;
use super::mechanic::{MovementMechanic, TickContext};
use super::state::{CameraBasis, ControllerEvent, StateId};

/// The falling walk-off reconciliation ramps speed this many times slower.
const FALLING_RAMP_FACTOR: f32 = 20.0;

/// Solver state shared by the controller's states and mechanics.
#[derive(Debug)]
pub struct Motor {
    pub(crate) config: ControllerConfig,
    pub(crate) transform: Transform,
    pub(crate) camera: Option<CameraBasis>,
    pub(crate) layer: Layer,
    pub(crate) sensor: GroundSensor,
    pub(crate) walls: WallDetector,
    pub(crate) mechanics: Vec<Box<dyn MovementMechanic>>,

    /// Stored in local space when `config.use_local_momentum` is set.
    momentum: Vec3,

    /// Last sampled move input, length <= 1.
    direction: Vec2,
    last_time_moved: f32,
    time: f32,

    /// Velocity of the last fixed tick, without the feet correction.
    velocity: Vec3,
    movement_velocity: Vec3,

    events: Vec<ControllerEvent>,
}

impl Motor {
    pub fn new(
        config: ControllerConfig,
        collider: ColliderSettings,
        walls: WallSettings,
        transform: Transform,
    ) -> Self {
        let sensor = GroundSensor::new(collider, transform.length_scale());
        Self {
            config,
            transform,
            camera: None,
            layer: Layer::DEFAULT,
            sensor,
            walls: WallDetector::new(walls),
            mechanics: Vec::new(),
            momentum: Vec3::ZERO,
            direction: Vec2::ZERO,
            last_time_moved: 0.0,
            time: 0.0,
            velocity: Vec3::ZERO,
            movement_velocity: Vec3::ZERO,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }

    #[inline]
    pub fn sensor(&self) -> &GroundSensor {
        &self.sensor
    }

    #[inline]
    pub fn walls(&self) -> &WallDetector {
        &self.walls
    }

    /// Seconds of variable-rate time seen so far.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Last sampled move input.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Momentum in world space.
    pub fn momentum(&self) -> Vec3 {
        if self.config.use_local_momentum {
            self.transform.transform_vector(self.momentum)
        } else {
            self.momentum
        }
    }

    /// Replace momentum, given in world space.
    pub fn set_momentum(&mut self, momentum: Vec3) {
        self.momentum = if self.config.use_local_momentum {
            self.transform.inverse_transform_vector(momentum)
        } else {
            momentum
        };
    }

    /// Momentum exactly as stored: local space when
    /// `use_local_momentum` is set, world space otherwise.
    #[inline]
    pub fn local_momentum(&self) -> Vec3 {
        self.momentum
    }

    /// Velocity handed to the body on the last fixed tick, without the feet
    /// correction.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Input-driven velocity computed on the last fixed tick.
    #[inline]
    pub fn movement_velocity(&self) -> Vec3 {
        self.movement_velocity
    }

    /// Momentum points up.
    pub fn is_rising(&self) -> bool {
        self.momentum().dot(self.up()) > 0.0
    }

    /// Momentum points down.
    pub fn is_falling(&self) -> bool {
        self.momentum().dot(self.up()) < 0.0
    }

    /// The last ground probe hit something.
    #[inline]
    pub fn is_sensor_grounded(&self) -> bool {
        self.sensor.is_grounded()
    }

    /// No ground, or ground steeper than the slope limit.
    pub fn is_ground_too_steep(&self) -> bool {
        !self.sensor.is_grounded()
            || angle_degrees(self.sensor.ground_normal(), self.up()) > self.config.slope_limit
    }

    /// Typed access to the mechanic registered in `slot`.
    pub fn mechanic<T: MovementMechanic>(&self, slot: usize) -> Option<&T> {
        self.mechanics
            .get(slot)
            .and_then(|mechanic| mechanic.as_any().downcast_ref::<T>())
    }

    pub fn mechanic_mut<T: MovementMechanic>(&mut self, slot: usize) -> Option<&mut T> {
        self.mechanics
            .get_mut(slot)
            .and_then(|mechanic| mechanic.as_any_mut().downcast_mut::<T>())
    }

    /// Queue an event for the host.
    pub fn push_event(&mut self, event: ControllerEvent) {
        self.events.push(event);
    }

    pub(crate) fn drain_events(&mut self) -> std::vec::Drain<'_, ControllerEvent> {
        self.events.drain(..)
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub(crate) fn advance_time(&mut self, dt: f32) {
        self.time += dt;
    }

    /// Store the move input for the next ticks and restart the speed ramp
    /// when movement starts from standstill.
    pub(crate) fn sample_input(&mut self, axis: Vec2) {
        let previous = self.direction;
        self.direction = if axis.length() > 1.0 {
            axis.normalize()
        } else {
            axis
        };

        if previous == Vec2::ZERO && self.direction != Vec2::ZERO {
            self.last_time_moved = self.time;
        }
    }

    /// World direction of the current input, length <= 1.
    pub fn movement_direction(&self) -> Vec3 {
        let (right, forward) = match self.camera {
            Some(camera) => {
                let up = self.up();
                (
                    normalize_or_zero(project_on_plane(camera.right, up)),
                    normalize_or_zero(project_on_plane(camera.forward, up)),
                )
            }
            None => (self.transform.right(), self.transform.forward()),
        };

        let direction = right * self.direction.x + forward * self.direction.y;
        clamp_magnitude(direction, 1.0)
    }

    /// Input-driven velocity right now, including the speed ramp.
    pub fn current_movement_velocity(&self) -> Vec3 {
        self.movement_direction() * self.ramped_speed(self.config.time_to_reach_speed)
    }

    fn ramped_speed(&self, ramp_time: f32) -> f32 {
        self.config.movement_speed * ramp(self.time - self.last_time_moved, ramp_time)
    }

    // ========================================================================
    // Ground Contact
    // ========================================================================

    /// Blend the current input velocity into momentum when leaving the
    /// ground, so horizontal speed does not jump.
    pub fn on_ground_contact_lost(&mut self) {
        let desired = self.current_movement_velocity();
        self.add_reconciled(desired);
    }

    /// Walk-off variant: the input velocity is rebuilt with a much slower
    /// ramp, so stepping off a ledge right after starting to move carries
    /// little speed.
    pub fn on_ground_contact_lost_falling(&mut self) {
        let speed = self.ramped_speed(self.config.time_to_reach_speed * FALLING_RAMP_FACTOR);
        let desired = normalize_or_zero(self.current_movement_velocity()) * speed;
        self.add_reconciled(desired);
    }

    pub fn on_ground_contact_regained(&mut self) {
        let velocity = self.momentum();
        log::debug!("landed with momentum {velocity:?}");
        self.push_event(ControllerEvent::Landed { velocity });
    }

    fn add_reconciled(&mut self, desired: Vec3) {
        let momentum = self.momentum();
        self.set_momentum(momentum + reconcile_with_momentum(momentum, desired));
    }

    // ========================================================================
    // Collisions
    // ========================================================================

    pub(crate) fn on_collision(&mut self, contacts: &[ContactPoint]) {
        let up = self.up();
        self.walls.on_collision(contacts, up);
    }

    // ========================================================================
    // Fixed Tick
    // ========================================================================

    /// Run one physics tick in `state` and return the body velocity.
    pub(crate) fn fixed_tick<P>(&mut self, state: StateId, dt: f32, physics: &P) -> Vec3
    where
        P: PhysicsQuery + ?Sized,
    {
        self.sensor.check_for_ground(&self.transform, self.layer, physics);
        self.integrate_momentum(state, dt);

        let grounded = state == StateId::Grounded;
        let mut velocity = if grounded {
            self.current_movement_velocity()
        } else {
            Vec3::ZERO
        };
        for mechanic in &mut self.mechanics {
            mechanic.handle_velocity(&mut velocity, state);
        }
        velocity += self.momentum();

        let max_speed = self.config.max_speed;
        let momentum = clamp_magnitude(self.momentum(), max_speed);
        self.set_momentum(momentum);
        let velocity = clamp_magnitude(velocity, max_speed);

        self.sensor.set_extended_range(grounded);
        self.sensor
            .handle_feet_position(velocity, grounded, &self.transform, dt, physics);
        let body_velocity = self.sensor.body_velocity(velocity);

        self.velocity = velocity;
        self.movement_velocity = self.current_movement_velocity();

        for mechanic in &mut self.mechanics {
            mechanic.handle_fixed_update();
        }

        body_velocity
    }

    /// Advance momentum by one tick of gravity, steering, friction and
    /// collision corrections.
    pub(crate) fn integrate_momentum(&mut self, state: StateId, dt: f32) {
        let up = self.up();
        let desired = self.current_movement_velocity();
        let momentum = self.momentum();

        let mut vertical = extract_dot_vector(momentum, up);
        let mut horizontal = momentum - vertical;

        vertical -= up * (self.config.gravity * dt);
        for mechanic in &mut self.mechanics {
            mechanic.handle_gravity(&mut vertical, state);
        }

        // Standing on ground never accumulates fall speed
        if state == StateId::Grounded && vertical.dot(up) < 0.0 {
            vertical = Vec3::ZERO;
        }

        if state != StateId::Grounded {
            horizontal = self.apply_air_control(horizontal, desired, state, dt);
        }

        if state == StateId::ForcedSliding {
            horizontal += self.slide_steering(desired) * dt;
        }

        horizontal = self.apply_friction(horizontal, state, dt);

        let mut momentum = horizontal + vertical;
        let ctx = TickContext { up, dt };
        for mechanic in &mut self.mechanics {
            mechanic.handle_momentum(&mut momentum, &ctx, state);
        }

        if state == StateId::ForcedSliding {
            momentum = self.slide_down_slope(momentum, dt);
        }

        if self.walls.hit_ceiling() && momentum.dot(up) > 0.0 {
            momentum = remove_dot_vector(momentum, up);
            self.walls.reset_ceiling();
        }

        let into_wall = -self.walls.wall_normal();
        if self.walls.hit_wall() && momentum.dot(into_wall) > 0.0 {
            momentum = remove_dot_vector(momentum, into_wall);
            self.walls.reset_wall();
        }

        self.set_momentum(momentum);
    }

    fn apply_air_control(
        &mut self,
        horizontal: Vec3,
        mut desired: Vec3,
        state: StateId,
        dt: f32,
    ) -> Vec3 {
        let mut rate = self.config.air_control_rate;
        for mechanic in &mut self.mechanics {
            mechanic.handle_air_control_rate(&mut rate, state);
        }

        let speed = self.config.movement_speed;
        if horizontal.length() > speed {
            // Already faster than input allows: input may steer, not
            // accelerate further along the current heading
            let heading = normalize_or_zero(horizontal);
            if desired.dot(heading) > 0.0 {
                desired = remove_dot_vector(desired, heading);
            }
            horizontal + desired * (dt * rate * self.config.air_control_overspeed_factor)
        } else {
            clamp_magnitude(horizontal + desired * (dt * rate), speed)
        }
    }

    /// Input velocity with its downhill component removed.
    fn slide_steering(&self, desired: Vec3) -> Vec3 {
        let downhill = normalize_or_zero(project_on_plane(self.sensor.ground_normal(), self.up()));
        remove_dot_vector(desired, downhill)
    }

    fn apply_friction(&mut self, horizontal: Vec3, state: StateId, dt: f32) -> Vec3 {
        let mut friction = match state {
            StateId::Grounded => self.config.ground_friction,
            _ => self.config.air_friction,
        };
        for mechanic in &mut self.mechanics {
            mechanic.handle_friction(&mut friction, state);
        }

        move_towards(horizontal, Vec3::ZERO, friction * dt)
    }

    /// Keep momentum on the slope plane, never upwards, and accelerate it
    /// downhill.
    fn slide_down_slope(&self, momentum: Vec3, dt: f32) -> Vec3 {
        let up = self.up();
        let normal = self.sensor.ground_normal();

        let mut momentum = project_on_plane(momentum, normal);
        if momentum.dot(up) > 0.0 {
            momentum = remove_dot_vector(momentum, up);
        }

        let slide_direction = normalize_or_zero(project_on_plane(-up, normal));
        momentum + slide_direction * (self.config.forced_slide_gravity * dt)
    }
}

/// Part of `desired` that is not already covered by `momentum`.
///
/// If momentum already moves at least as fast in the desired direction, the
/// desired velocity is dropped; if it moves slower, only the difference is
/// kept. Momentum pointing away leaves `desired` untouched.
fn reconcile_with_momentum(momentum: Vec3, desired: Vec3) -> Vec3 {
    if momentum.length_squared() <= 0.0 {
        return desired;
    }

    let direction = normalize_or_zero(desired);
    let projected = direction * momentum.dot(direction);
    let alignment = normalize_or_zero(projected).dot(direction);

    if alignment > 0.0 && projected.length_squared() >= desired.length_squared() {
        Vec3::ZERO
    } else if alignment > 0.0 {
        desired - projected
    } else {
        desired
    }
}
