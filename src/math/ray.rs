//! Ray type and operations

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
        }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB slab test that also reports the outward normal of the face the ray
    /// enters through. Returns Some((t_near, t_far, normal)).
    ///
    /// A ray starting inside the box reports the face of the slab it would
    /// have entered last, with t_near clamped to 0.
    pub fn entry_face(&self, aabb: &Aabb) -> Option<(f32, f32, Vec3)> {
        let t1 = (aabb.min - self.origin) * self.inv_direction;
        let t2 = (aabb.max - self.origin) * self.inv_direction;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_near = t_min.x.max(t_min.y).max(t_min.z);
        let t_far = t_max.x.min(t_max.y).min(t_max.z);

        if !(t_near <= t_far && t_far >= 0.0) {
            return None;
        }

        let normal = if t_min.x >= t_min.y && t_min.x >= t_min.z {
            Vec3::new(-self.direction.x.signum(), 0.0, 0.0)
        } else if t_min.y >= t_min.z {
            Vec3::new(0.0, -self.direction.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, -self.direction.z.signum())
        };

        Some((t_near.max(0.0), t_far, normal))
    }
}
