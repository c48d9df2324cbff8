//! Static collision geometry.
//!
//! The collision world stores box brushes on physics layers and answers the
//! controller's ground probes. It also produces the contact list the body
//! reports after each move.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use nubi_controller::{ContactPoint, Layer, LayerMask, PhysicsQuery, ProbeHit};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::{self, Ray};
use parry3d::shape::SharedShape;

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct Brush {
    pub id: u32,
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    pub layer: Layer,
}

/// Contact between a probe shape and one brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub brush: u32,
    /// World-space point on the brush surface.
    pub point: Vec3,
    /// Brush surface normal, pointing towards the probe shape.
    pub normal: Vec3,
    /// Penetration depth; negative while the shapes are still apart.
    pub depth: f32,
}

impl From<Contact> for ContactPoint {
    fn from(contact: Contact) -> Self {
        ContactPoint::new(contact.point, contact.normal)
    }
}

/// The collision world containing all brushes.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    brushes: Vec<Brush>,
    next_id: u32,
    /// Layer pairs that never interact, stored both ways round.
    ignored_pairs: HashSet<(Layer, Layer)>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis-aligned box.
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, layer: Layer) -> u32 {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, layer)
    }

    /// Add a rotated box.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        layer: Layer,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.brushes.push(Brush {
            id,
            shape,
            transform: isometry(center, rotation),
            layer,
        });

        id
    }

    /// Make layers `a` and `b` ignore (or stop ignoring) each other.
    pub fn ignore_layer_collision(&mut self, a: Layer, b: Layer, ignore: bool) {
        if ignore {
            self.ignored_pairs.insert((a, b));
            self.ignored_pairs.insert((b, a));
        } else {
            self.ignored_pairs.remove(&(a, b));
            self.ignored_pairs.remove(&(b, a));
        }
    }

    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Contacts between `shape` placed at `transform` and every brush that
    /// `layer` collides with, within `prediction` distance.
    ///
    /// Contacts come back in brush order.
    pub fn contacts(
        &self,
        shape: &SharedShape,
        transform: &Isometry<Real>,
        layer: Layer,
        prediction: f32,
    ) -> Vec<Contact> {
        self.brushes
            .iter()
            .filter(|brush| !self.ignores_layer_collision(layer, brush.layer))
            .filter_map(|brush| {
                let contact = query::contact(
                    transform,
                    shape.as_ref(),
                    &brush.transform,
                    brush.shape.as_ref(),
                    prediction,
                )
                .ok()??;

                Some(Contact {
                    brush: brush.id,
                    point: to_glam(contact.point2.coords),
                    normal: to_glam(*contact.normal2),
                    depth: -contact.dist,
                })
            })
            .collect()
    }
}

impl PhysicsQuery for CollisionWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let ray = Ray::new(
            Point::new(origin.x, origin.y, origin.z),
            Vector::new(dir.x, dir.y, dir.z),
        );

        self.brushes
            .iter()
            .filter(|brush| mask.contains(brush.layer))
            .filter_map(|brush| {
                brush
                    .shape
                    .cast_ray_and_get_normal(&brush.transform, &ray, max_distance, true)
            })
            .min_by(|a, b| a.time_of_impact.total_cmp(&b.time_of_impact))
            .map(|hit| {
                let distance = hit.time_of_impact;
                ProbeHit::new(distance, origin + dir * distance, to_glam(hit.normal))
            })
    }

    fn ignores_layer_collision(&self, a: Layer, b: Layer) -> bool {
        self.ignored_pairs.contains(&(a, b))
    }
}

/// Parry isometry for a glam position and rotation.
pub fn isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let (axis, angle) = rotation.to_axis_angle();
    let scaled_axis = axis * angle;
    Isometry::new(
        Vector::new(position.x, position.y, position.z),
        Vector::new(scaled_axis.x, scaled_axis.y, scaled_axis.z),
    )
}

#[inline]
fn to_glam(v: Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ============================================================================
// Tests
// ============================================================================
