//! Kinematic capsule body.
//!
//! Stands in for an engine rigid body with gravity disabled and rotation
//! frozen: the controller sets its velocity every fixed tick, the body moves,
//! gets pushed out of whatever it sank into and reports what it touched.

use glam::{Quat, Vec3};
use nubi_controller::{ColliderDimensions, ContactPoint, Layer, Transform};
use parry3d::shape::SharedShape;

use crate::world::{isometry, CollisionWorld};

/// Contacts closer than this count as touching.
const CONTACT_PREDICTION: f32 = 0.01;

/// Depenetration passes per step.
const MAX_DEPENETRATION_ITERATIONS: usize = 4;

#[derive(Debug, Clone)]
pub struct KinematicBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub layer: Layer,
    velocity: Vec3,
    shape: SharedShape,
    /// Capsule center relative to `position`.
    center: Vec3,
}

impl KinematicBody {
    /// Capsule body matching the controller's collider.
    pub fn new(transform: &Transform, dimensions: ColliderDimensions, layer: Layer) -> Self {
        let scale = transform.length_scale();
        let radius = dimensions.radius * scale;
        let half_segment = (dimensions.height * scale / 2.0 - radius).max(0.0);

        Self {
            position: transform.position,
            rotation: transform.rotation,
            layer,
            velocity: Vec3::ZERO,
            shape: SharedShape::capsule_y(half_segment, radius),
            center: dimensions.center * scale,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// World-space capsule center.
    pub fn center(&self) -> Vec3 {
        self.position + self.rotation * self.center
    }

    /// Move with `velocity` for `dt`, resolve penetrations and return the
    /// contacts touching the body afterwards.
    ///
    /// Velocity into a touched surface is removed, so the body slides along
    /// walls instead of sticking to them.
    pub fn step(&mut self, velocity: Vec3, dt: f32, world: &CollisionWorld) -> Vec<ContactPoint> {
        self.velocity = velocity;
        self.position += velocity * dt;

        for _ in 0..MAX_DEPENETRATION_ITERATIONS {
            let contacts = self.query(world);
            let Some(deepest) = contacts
                .iter()
                .filter(|contact| contact.depth > 0.0)
                .max_by(|a, b| a.depth.total_cmp(&b.depth))
            else {
                break;
            };
            self.position += deepest.normal * deepest.depth;
        }

        let contacts = self.query(world);
        for contact in &contacts {
            let into = self.velocity.dot(contact.normal);
            if into < 0.0 {
                self.velocity -= contact.normal * into;
            }
        }

        if !contacts.is_empty() {
            log::trace!("body at {:?} touching {} brushes", self.position, contacts.len());
        }

        contacts.into_iter().map(ContactPoint::from).collect()
    }

    fn query(&self, world: &CollisionWorld) -> Vec<crate::world::Contact> {
        let transform = isometry(self.center(), self.rotation);
        world.contacts(&self.shape, &transform, self.layer, CONTACT_PREDICTION)
    }
}
