//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{hittable::HitRecord, MaterialRef};
use prism_math::{Aabb, Interval, Ray, Vec3};

/// Padding given to a triangle's box along any axis it is flat in.
const TRIANGLE_BOX_PAD: f64 = 1e-4;

/// A single triangle.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length, zero when degenerate)
    normal: Vec3,
    material: MaterialRef,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    ///
    /// The outward normal follows the winding `v0 -> v1 -> v2`
    /// (counter-clockwise seen from the front).
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: MaterialRef) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self::with_normal(v0, v1, v2, normal, material)
    }

    /// Create a triangle with a pre-computed normal (for smooth shading).
    pub fn with_normal(v0: Vec3, v1: Vec3, v2: Vec3, normal: Vec3, material: MaterialRef) -> Self {
        let bbox = Aabb::surrounding_point(&Aabb::from_points(v0, v1), v2)
            .padded(2.0 * TRIANGLE_BOX_PAD);

        Self {
            v0,
            v1,
            v2,
            normal: normal.normalize_or_zero(),
            material,
            bbox,
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Möller-Trumbore intersection. `u, v` are the barycentric weights of
    /// `v1` and `v2`.
    pub(crate) fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        Some(HitRecord::new(ray, t, self.normal, self.material.as_ref()).with_uv((u, v)))
    }

    pub(crate) fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
