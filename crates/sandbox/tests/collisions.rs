//! Full host loop against parry3d geometry: landing, walls, ceilings and
//! slopes.

use approx::assert_relative_eq;
use glam::{Vec2, Vec3};
use nubi_controller::{Layer, StateId};
use nubi_sandbox::{
    BrushDesc, InputKey, InputScript, LevelDesc, Scenario, SpawnPoint, STANDING_HEIGHT,
};

fn floor() -> BrushDesc {
    BrushDesc {
        center: Vec3::new(0.0, -0.5, 0.0),
        half_extents: Vec3::new(20.0, 0.5, 20.0),
        ..Default::default()
    }
}

fn scenario(level: LevelDesc, keys: Vec<InputKey>) -> Scenario {
    Scenario {
        name: "test".to_string(),
        level,
        input: InputScript::new(keys),
        ..Default::default()
    }
}

#[test]
fn test_drop_onto_floor() {
    let mut scenario = scenario(LevelDesc::Flat, Vec::new());
    scenario.spawn = Some(SpawnPoint {
        position: Vec3::new(0.0, 4.0, 0.0),
        facing: 0.0,
    });

    let mut sim = scenario.build().unwrap();
    let summary = sim.run_for(2.0);

    assert_eq!(summary.final_state, Some(StateId::Grounded));
    assert_eq!(summary.landings, 1);
    assert_relative_eq!(summary.final_position.y, STANDING_HEIGHT, epsilon = 1e-2);
    assert_eq!(sim.controller.momentum(), Vec3::ZERO);
}

#[test]
fn test_wall_blocks_walking() {
    let wall = BrushDesc {
        center: Vec3::new(3.0, 2.0, 0.0),
        half_extents: Vec3::new(0.5, 2.0, 5.0),
        ..Default::default()
    };
    let level = LevelDesc::Custom {
        brushes: vec![floor(), wall],
        ignore: Vec::new(),
    };
    let mut sim = scenario(level, vec![InputKey::new(0.2, Vec2::X, false)])
        .build()
        .unwrap();
    let summary = sim.run_for(2.0);

    // Capsule radius 0.5 against the face at x = 2.5
    assert!(summary.final_position.x <= 2.0 + 1e-2, "x = {}", summary.final_position.x);
    assert!(summary.final_position.x > 1.9);
    assert!(summary.wall_hits > 0);
    assert_eq!(summary.ceiling_hits, 0);
    assert_eq!(summary.final_state, Some(StateId::Grounded));

    let walls = sim.controller.walls();
    assert!(walls.hit_wall());
    assert_relative_eq!(walls.wall_normal().x, -1.0, epsilon = 1e-3);
}

#[test]
fn test_ceiling_caps_jump() {
    // Capsule top rests at 2.0; the slab's underside is at 2.3
    let slab = BrushDesc {
        center: Vec3::new(0.0, 2.55, 0.0),
        half_extents: Vec3::new(5.0, 0.25, 5.0),
        ..Default::default()
    };
    let level = LevelDesc::Custom {
        brushes: vec![floor(), slab],
        ignore: Vec::new(),
    };
    let keys = vec![
        InputKey::new(0.3, Vec2::ZERO, true),
        InputKey::new(0.45, Vec2::ZERO, false),
    ];
    let mut sim = scenario(level, keys).build().unwrap();

    let mut highest = f32::MIN;
    for _ in 0..90 {
        sim.frame();
        highest = highest.max(sim.body.position.y);
    }
    let summary = sim.summary();

    assert_eq!(summary.jumps, 1);
    assert!(summary.ceiling_hits > 0);
    assert!(highest < STANDING_HEIGHT + 0.3 + 1e-2, "highest {highest}");
    assert_eq!(summary.final_state, Some(StateId::Grounded));
}

#[test]
fn test_steep_slope_slides_downhill() {
    let mut sim = scenario(LevelDesc::Slope { angle: 45.0 }, Vec::new())
        .build()
        .unwrap();
    let start = sim.body.position;

    let mut states = Vec::new();
    for _ in 0..60 {
        sim.frame();
        states.push(sim.controller.state());
    }

    // The ramp rises towards +X
    let downhill = Vec3::new(-1.0, -1.0, 0.0).normalize();
    let displacement = sim.body.position - start;
    assert!(displacement.dot(downhill) > 1.0, "displacement {displacement:?}");
    assert!(!states.contains(&StateId::Grounded));
}

#[test]
fn test_gentle_slope_is_walkable() {
    let mut sim = scenario(LevelDesc::Slope { angle: 20.0 }, Vec::new())
        .build()
        .unwrap();
    let summary = sim.run_for(1.5);

    assert_eq!(summary.final_state, Some(StateId::Grounded));
    assert!(!sim.controller.is_ground_too_steep());
    // Standing still on a walkable slope does not creep
    let before = sim.body.position;
    sim.run_for(0.5);
    assert!((sim.body.position - before).length() < 1e-2);
}

#[test]
fn test_ignored_layer_falls_through() {
    let ghost_floor = BrushDesc {
        layer: Layer(9),
        ..floor()
    };
    let level = LevelDesc::Custom {
        brushes: vec![ghost_floor],
        ignore: vec![(Layer(8), Layer(9))],
    };
    let mut scenario = scenario(level, Vec::new());
    scenario.layer = Layer(8);

    let mut sim = scenario.build().unwrap();
    let summary = sim.run_for(1.0);

    assert_eq!(summary.final_state, Some(StateId::Falling));
    assert!(summary.final_position.y < -1.0);
    assert_eq!(summary.landings, 0);
}
