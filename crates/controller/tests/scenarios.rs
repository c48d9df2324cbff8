//! End-to-end locomotion scenarios against analytic ground planes.

use approx::assert_relative_eq;
use glam::{Vec2, Vec3};
use nubi_controller::{
    CameraBasis, CharacterController, ContactPoint, ControllerConfig, ControllerEvent, InputState,
    JumpConfig, JumpMechanic, Layer, LayerMask, PhysicsQuery, ProbeHit, StateId, Transform,
};

const DT: f32 = 0.02;

/// Infinite plane on the default layer.
struct Plane {
    point: Vec3,
    normal: Vec3,
    /// Layer that never collides with the plane's layer.
    ignored_by: Option<Layer>,
}

impl Plane {
    fn flat() -> Self {
        Self {
            point: Vec3::ZERO,
            normal: Vec3::Y,
            ignored_by: None,
        }
    }

    fn tilted_45() -> Self {
        Self {
            point: Vec3::ZERO,
            normal: Vec3::new(1.0, 1.0, 0.0).normalize(),
            ignored_by: None,
        }
    }
}

impl PhysicsQuery for Plane {
    fn raycast(&self, origin: Vec3, direction: Vec3, max: f32, mask: LayerMask) -> Option<ProbeHit> {
        if !mask.contains(Layer::DEFAULT) {
            return None;
        }
        let denom = direction.dot(self.normal);
        if denom >= 0.0 {
            return None;
        }
        let distance = (self.point - origin).dot(self.normal) / denom;
        (0.0..=max)
            .contains(&distance)
            .then(|| ProbeHit::new(distance, origin + direction * distance, self.normal))
    }

    fn ignores_layer_collision(&self, a: Layer, b: Layer) -> bool {
        self.ignored_by == Some(a) && b == Layer::DEFAULT
    }
}

/// Minimal host: moves the character with the returned velocity, no contacts.
struct Host {
    controller: CharacterController,
    ground: Plane,
    events: Vec<ControllerEvent>,
}

impl Host {
    /// Probe origin sits 0.09 above the position; rest distance is 1.1.
    const REST_HEIGHT: f32 = 1.01;

    fn new(config: ControllerConfig, ground: Plane) -> Self {
        let controller = CharacterController::builder(config)
            .transform(Transform::from_position(Vec3::new(0.0, Self::REST_HEIGHT, 0.0)))
            .mechanic(JumpMechanic::new(JumpConfig::default()))
            .build();
        Self {
            controller,
            ground,
            events: Vec::new(),
        }
    }

    fn step(&mut self, input: &InputState) {
        let velocity = self.controller.fixed_update(DT, &self.ground);
        let position = self.controller.transform().position + velocity * DT;
        self.controller.set_position(position);
        self.controller.update(DT, input);
        self.events.extend(self.controller.drain_events());
    }

    fn position(&self) -> Vec3 {
        self.controller.transform().position
    }

    /// `(from, to)` of every state change so far.
    fn state_changes(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                ControllerEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    fn landings(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ControllerEvent::Landed { .. }))
            .count()
    }

    /// Land on flat ground, then get knocked upwards until `Rising`.
    fn launched(config: ControllerConfig) -> Self {
        let mut host = Self::new(config, Plane::flat());
        host.step(&idle());
        assert_eq!(host.controller.state(), StateId::Grounded);

        host.controller.set_momentum(Vec3::new(0.0, 15.0, 0.0));
        for _ in 0..5 {
            host.step(&idle());
            if host.controller.state() == StateId::Rising {
                break;
            }
        }
        assert_eq!(host.controller.state(), StateId::Rising);
        host
    }
}

fn idle() -> InputState {
    InputState::default()
}

fn jump_held() -> InputState {
    InputState::new(Vec2::ZERO, true)
}

#[test]
fn test_lands_within_one_update() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    assert_eq!(host.controller.state(), StateId::Falling);

    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Grounded);
    assert!(matches!(host.events[0], ControllerEvent::Landed { .. }));
    assert_eq!(
        host.events[1],
        ControllerEvent::StateChanged {
            from: StateId::Falling,
            to: StateId::Grounded
        }
    );
}

#[test]
fn test_standing_keeps_rest_height() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    for _ in 0..50 {
        host.step(&idle());
    }

    assert_eq!(host.controller.state(), StateId::Grounded);
    assert_relative_eq!(host.position().y, Host::REST_HEIGHT, epsilon = 1e-3);
    assert_eq!(host.controller.momentum(), Vec3::ZERO);
}

#[test]
fn test_walking_reaches_movement_speed() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());

    let forward = InputState::new(Vec2::new(0.0, 1.0), false);
    for _ in 0..30 {
        host.step(&forward);
    }

    assert!(host.controller.is_moving());
    assert_relative_eq!(host.controller.velocity().z, 7.0, epsilon = 1e-3);
    assert_relative_eq!(host.controller.movement_velocity().z, 7.0, epsilon = 1e-3);
    assert!(host.position().z > 2.0);
}

#[test]
fn test_jump_sets_exact_vertical_speed() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());
    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Grounded);

    // The key is sampled after transitions, so the jump starts one update later
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Grounded);
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Jumping);
    assert_eq!(host.controller.momentum().y, 10.0);
    assert!(host
        .events
        .iter()
        .any(|event| matches!(event, ControllerEvent::Jumped { .. })));
}

#[test]
fn test_held_jump_ends_after_duration() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());
    host.step(&jump_held());
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Jumping);

    let mut steps = 0;
    while host.controller.state() == StateId::Jumping && steps < 50 {
        host.step(&jump_held());
        steps += 1;
        if host.controller.state() == StateId::Jumping {
            assert_relative_eq!(host.controller.momentum().y, 10.0, epsilon = 1e-4);
        }
    }

    // 0.2 s of jumping at 0.02 s ticks, plus the update that applies it
    assert!((10..=13).contains(&steps), "jump lasted {steps} steps");
    assert_eq!(host.controller.state(), StateId::Falling);
    let jump = host.controller.mechanic::<JumpMechanic>().unwrap();
    assert!(!jump.is_locked());
}

#[test]
fn test_released_jump_ends_early() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());
    host.step(&jump_held());
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Jumping);

    host.step(&idle());
    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Falling);
}

#[test]
fn test_forced_slide_moves_downhill() {
    let config = ControllerConfig {
        slope_limit: 30.0,
        forced_slide_gravity: 5.0,
        ..Default::default()
    };
    let mut host = Host::new(config, Plane::tilted_45());
    let start = host.position();

    let mut visited_slide = false;
    for _ in 0..50 {
        host.step(&idle());
        visited_slide |= host.controller.state() == StateId::ForcedSliding;
    }

    assert!(visited_slide);
    let displacement = host.position() - start;
    let downhill = Vec3::new(1.0, -1.0, 0.0).normalize();
    assert!(displacement.dot(downhill) > 0.5, "displacement {displacement:?}");
    assert!(host.controller.momentum().y <= 0.0);
}

#[test]
fn test_ignored_layer_is_never_ground() {
    let ground = Plane {
        ignored_by: Some(Layer(9)),
        ..Plane::flat()
    };
    let mut host = Host::new(ControllerConfig::default(), ground);
    host.controller.set_layer(Layer(9));

    for _ in 0..5 {
        host.step(&idle());
    }
    assert_eq!(host.controller.state(), StateId::Falling);

    // Back on the default layer the same floor is found again
    host.controller.set_layer(Layer::DEFAULT);
    host.controller.set_position(Vec3::new(0.0, Host::REST_HEIGHT, 0.0));
    host.controller.set_momentum(Vec3::ZERO);
    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Grounded);
}

#[test]
fn test_upward_knock_rises_then_lands() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());
    host.controller.set_momentum(Vec3::new(0.0, 15.0, 0.0));

    for _ in 0..80 {
        host.step(&idle());
    }

    use StateId::*;
    assert_eq!(
        host.state_changes(),
        vec![
            (Falling, Grounded),
            (Grounded, Rising),
            (Rising, Falling),
            (Falling, Grounded),
        ]
    );
    assert_eq!(host.landings(), 2);
    assert_relative_eq!(host.position().y, Host::REST_HEIGHT, epsilon = 1e-2);
    assert_eq!(host.controller.momentum(), Vec3::ZERO);
}

#[test]
fn test_rising_onto_walkable_ground_lands() {
    let mut host = Host::launched(ControllerConfig::default());
    assert!(host.controller.momentum().y > 0.0);

    host.controller.set_position(Vec3::new(0.0, Host::REST_HEIGHT, 0.0));
    host.step(&idle());

    assert_eq!(host.controller.state(), StateId::Grounded);
    assert_eq!(
        host.state_changes().last(),
        Some(&(StateId::Rising, StateId::Grounded))
    );
    assert_eq!(host.landings(), 2);
}

#[test]
fn test_rising_onto_steep_ground_slides() {
    let mut host = Host::launched(ControllerConfig::default());
    host.ground = Plane::tilted_45();

    host.controller.set_position(Vec3::new(0.0, Host::REST_HEIGHT, 0.0));
    host.step(&idle());

    assert_eq!(host.controller.state(), StateId::ForcedSliding);
    assert_eq!(
        host.state_changes().last(),
        Some(&(StateId::Rising, StateId::ForcedSliding))
    );
}

#[test]
fn test_ceiling_turns_rise_into_fall() {
    let mut host = Host::launched(ControllerConfig::default());
    let head = host.position() + Vec3::Y * 2.0;

    host.controller.on_collision(&[ContactPoint::new(head, -Vec3::Y)]);
    assert!(host.controller.walls().hit_ceiling());

    // The contact removes all upward momentum on the next tick
    host.step(&idle());
    assert_eq!(host.controller.momentum().y, 0.0);
    assert!(!host.controller.walls().hit_ceiling());

    // Gravity alone would need more than 20 ticks to turn the rise around
    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Falling);
    assert_eq!(
        host.state_changes().last(),
        Some(&(StateId::Rising, StateId::Falling))
    );
}

#[test]
fn test_jump_out_of_forced_slide() {
    let mut host = Host::new(ControllerConfig::default(), Plane::tilted_45());
    for _ in 0..10 {
        host.step(&idle());
    }
    assert_eq!(host.controller.state(), StateId::ForcedSliding);

    host.step(&jump_held());
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Jumping);
    let jumped = host.events.iter().find_map(|event| match *event {
        ControllerEvent::Jumped { momentum } => Some(momentum),
        _ => None,
    });
    assert!(jumped.is_some_and(|momentum| momentum.y > 0.0), "{jumped:?}");

    // Holding the key runs the jump to its full duration
    let mut steps = 0;
    while host.controller.state() == StateId::Jumping && steps < 50 {
        host.step(&jump_held());
        steps += 1;
    }
    assert!((10..=13).contains(&steps), "jump lasted {steps} steps");
    assert_relative_eq!(host.controller.momentum().y, 10.0, epsilon = 1e-4);

    use StateId::*;
    assert_eq!(
        host.state_changes(),
        vec![
            (Falling, ForcedSliding),
            (ForcedSliding, Jumping),
            (Jumping, Falling),
        ]
    );
}

#[test]
fn test_released_slide_jump_falls() {
    let mut host = Host::new(ControllerConfig::default(), Plane::tilted_45());
    for _ in 0..10 {
        host.step(&idle());
    }
    host.step(&jump_held());
    host.step(&jump_held());
    assert_eq!(host.controller.state(), StateId::Jumping);

    host.step(&idle());
    host.step(&idle());
    assert_eq!(host.controller.state(), StateId::Falling);
    assert_eq!(
        host.state_changes().last(),
        Some(&(StateId::Jumping, StateId::Falling))
    );
}

#[test]
fn test_camera_steers_walking() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    host.step(&idle());

    // Camera turned to look along +X
    host.controller.set_camera(Some(CameraBasis::new(Vec3::NEG_Z, Vec3::X)));
    let forward = InputState::new(Vec2::new(0.0, 1.0), false);
    for _ in 0..30 {
        host.step(&forward);
    }
    assert_relative_eq!(host.controller.velocity().x, 7.0, epsilon = 1e-3);
    assert_relative_eq!(host.controller.velocity().z, 0.0, epsilon = 1e-3);

    // Without a camera input follows the character's own axes
    host.controller.set_camera(None);
    host.step(&forward);
    assert_relative_eq!(host.controller.velocity().z, 7.0, epsilon = 1e-3);
}

#[test]
fn test_state_changes_form_unbroken_chain() {
    let mut host = Host::new(ControllerConfig::default(), Plane::flat());
    let walk_jump = InputState::new(Vec2::new(0.7, 0.7), true);
    let walk = InputState::new(Vec2::new(0.7, 0.7), false);
    for tick in 0..300 {
        let input = match tick % 60 {
            10..=25 => walk_jump,
            26..=40 => walk,
            _ => idle(),
        };
        host.step(&input);
    }

    let changes = host.state_changes();
    let mut current = StateId::Falling;
    for &(from, to) in &changes {
        assert_eq!(from, current);
        assert_ne!(from, to);
        current = to;
    }
    assert_eq!(current, host.controller.state());
    assert!(changes.len() > 4);
}
