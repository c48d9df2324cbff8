//! Level descriptions and the built-in test levels.

use glam::{EulerRot, Quat, Vec3};
use nubi_controller::Layer;
use serde::{Deserialize, Serialize};

use crate::world::CollisionWorld;

/// Height of the character origin above flat ground at rest, for the default
/// collider.
pub const STANDING_HEIGHT: f32 = 1.01;

/// A box brush as written in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushDesc {
    pub center: Vec3,
    pub half_extents: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub layer: Layer,
}

impl Default for BrushDesc {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(0.5),
            rotation: Vec3::ZERO,
            layer: Layer::DEFAULT,
        }
    }
}

impl BrushDesc {
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }
}

/// Which level to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum LevelDesc {
    /// Large flat floor.
    #[default]
    Flat,
    /// Single ramp tilted by `angle` degrees, rising towards +X.
    Slope { angle: f32 },
    /// Floor, walls, ramps and a low ceiling.
    TestCourse,
    Custom {
        brushes: Vec<BrushDesc>,
        /// Layer pairs that never collide.
        #[serde(default)]
        ignore: Vec<(Layer, Layer)>,
    },
}

impl LevelDesc {
    pub fn build(&self) -> Level {
        match self {
            Self::Flat => Level::flat(),
            Self::Slope { angle } => Level::slope(*angle),
            Self::TestCourse => Level::test_course(),
            Self::Custom { brushes, ignore } => {
                let mut level = Level::new("custom");
                for brush in brushes {
                    level.collision.add_oriented_box(
                        brush.center,
                        brush.half_extents,
                        brush.quat(),
                        brush.layer,
                    );
                }
                for &(a, b) in ignore {
                    level.collision.ignore_layer_collision(a, b, true);
                }
                level
            }
        }
    }
}

/// Where the character starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Position in world space.
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, STANDING_HEIGHT, 0.0),
            facing: 0.0,
        }
    }
}

impl SpawnPoint {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.facing)
    }
}

/// A level: collision geometry plus a spawn point.
#[derive(Debug)]
pub struct Level {
    pub name: String,
    pub collision: CollisionWorld,
    pub spawn: SpawnPoint,
}

impl Level {
    /// Create an empty level.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collision: CollisionWorld::new(),
            spawn: SpawnPoint::default(),
        }
    }

    /// Flat floor with its top at y=0.
    pub fn flat() -> Self {
        let mut level = Self::new("flat");
        add_floor(&mut level.collision, 0.0);
        level
    }

    /// A 40 m ramp through the origin tilted by `angle` degrees, with a flat
    /// run-out at its low end.
    pub fn slope(angle: f32) -> Self {
        let mut level = Self::new("slope");
        let rotation = Quat::from_rotation_z(angle.to_radians());
        let half_length = 20.0;

        // Shift down so the top face passes through the origin
        let center = -(rotation * Vec3::new(0.0, 0.5, 0.0));
        level.collision.add_oriented_box(
            center,
            Vec3::new(half_length, 0.5, half_length),
            rotation,
            Layer::DEFAULT,
        );

        let low_end = -half_length * angle.to_radians().sin();
        add_floor(&mut level.collision, low_end);

        level.spawn.position = Vec3::new(0.0, STANDING_HEIGHT + 1.0, 0.0);
        level
    }

    /// A small course covering the common contact cases.
    pub fn test_course() -> Self {
        let mut level = Self::new("test_course");
        let world = &mut level.collision;

        add_floor(world, 0.0);

        // Walls
        let wall_height = 5.0;
        let wall_thickness = 0.5;
        let arena_size = 30.0;

        // North wall
        world.add_box(
            Vec3::new(0.0, wall_height / 2.0, -arena_size),
            Vec3::new(arena_size, wall_height / 2.0, wall_thickness),
            Layer::DEFAULT,
        );

        // South wall
        world.add_box(
            Vec3::new(0.0, wall_height / 2.0, arena_size),
            Vec3::new(arena_size, wall_height / 2.0, wall_thickness),
            Layer::DEFAULT,
        );

        // East wall
        world.add_box(
            Vec3::new(arena_size, wall_height / 2.0, 0.0),
            Vec3::new(wall_thickness, wall_height / 2.0, arena_size),
            Layer::DEFAULT,
        );

        // West wall
        world.add_box(
            Vec3::new(-arena_size, wall_height / 2.0, 0.0),
            Vec3::new(wall_thickness, wall_height / 2.0, arena_size),
            Layer::DEFAULT,
        );

        // Walkable 20 degree ramp
        world.add_oriented_box(
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(4.0, 0.5, 3.0),
            Quat::from_rotation_z(20f32.to_radians()),
            Layer::DEFAULT,
        );

        // Too steep to stand on
        world.add_oriented_box(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(4.0, 0.5, 3.0),
            Quat::from_rotation_z(-50f32.to_radians()),
            Layer::DEFAULT,
        );

        // Low step the sensor climbs
        world.add_box(
            Vec3::new(0.0, 0.075, 10.0),
            Vec3::new(2.0, 0.075, 2.0),
            Layer::DEFAULT,
        );

        // Ceiling slab, 2.5 m above the floor
        world.add_box(
            Vec3::new(10.0, 2.75, 10.0),
            Vec3::new(3.0, 0.25, 3.0),
            Layer::DEFAULT,
        );

        level
    }
}

fn add_floor(world: &mut CollisionWorld, top: f32) {
    world.add_box(
        Vec3::new(0.0, top - 0.5, 0.0),
        Vec3::new(50.0, 0.5, 50.0),
        Layer::DEFAULT,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nubi_controller::{LayerMask, PhysicsQuery};

    fn ground_below(level: &Level, at: Vec3) -> nubi_controller::ProbeHit {
        level
            .collision
            .raycast(at, -Vec3::Y, 100.0, LayerMask::ALL)
            .unwrap()
    }

    #[test]
    fn test_level_creation() {
        let level = Level::new("test");
        assert_eq!(level.name, "test");
        assert_eq!(level.collision.brush_count(), 0);
    }

    #[test]
    fn test_flat_floor_top() {
        let level = Level::flat();
        let hit = ground_below(&level, Vec3::new(3.0, 5.0, -2.0));
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_slope_passes_through_origin() {
        let level = Level::slope(45.0);
        let hit = ground_below(&level, Vec3::new(0.0, 5.0, 0.0));

        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-4);
        let angle = hit.normal.angle_between(Vec3::Y).to_degrees();
        assert_relative_eq!(angle, 45.0, epsilon = 1e-2);
        // Rises towards +X, so the normal leans back towards -X
        assert!(hit.normal.x < 0.0);
    }

    #[test]
    fn test_test_course() {
        let level = Level::test_course();
        assert!(level.collision.brush_count() > 5);

        let hit = ground_below(&level, level.spawn.position);
        assert_relative_eq!(hit.distance, STANDING_HEIGHT, epsilon = 1e-4);
    }

    #[test]
    fn test_custom_level() {
        let desc = LevelDesc::Custom {
            brushes: vec![BrushDesc {
                center: Vec3::new(0.0, -0.5, 0.0),
                half_extents: Vec3::new(5.0, 0.5, 5.0),
                layer: Layer(8),
                ..Default::default()
            }],
            ignore: vec![(Layer(8), Layer::DEFAULT)],
        };
        let level = desc.build();

        assert_eq!(level.collision.brush_count(), 1);
        assert!(level.collision.ignores_layer_collision(Layer::DEFAULT, Layer(8)));
    }

    #[test]
    fn test_level_desc_from_ron() {
        let desc: LevelDesc = ron::from_str("Slope(angle: 30.0)").unwrap();
        assert_eq!(desc, LevelDesc::Slope { angle: 30.0 });

        let brush: BrushDesc = ron::from_str("(center: (1.0, 2.0, 3.0), rotation: (0.0, 0.0, 15.0))").unwrap();
        assert_eq!(brush.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(brush.half_extents, Vec3::splat(0.5));
        assert_relative_eq!(
            brush.quat().angle_between(Quat::IDENTITY).to_degrees(),
            15.0,
            epsilon = 1e-3
        );
    }
}
