//! Axis-aligned rectangles and the box built from six of them.

use crate::{
    hittable::{HitRecord, Hittable, HittableList},
    MaterialRef,
};
use prism_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// Half-thickness given to a rectangle's box along its normal axis.
const RECT_BOX_PAD: f64 = 1e-3;

/// Plane a rectangle lies in. The remaining axis is its normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    /// `(a, b, k)` axis indices: the two in-plane axes and the normal axis.
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::XZ => (0, 2, 1),
            Plane::YZ => (1, 2, 0),
        }
    }
}

/// Rectangle `[a0, a1] x [b0, b1]` in `plane`, at offset `k` along the normal axis.
pub struct AaRect {
    plane: Plane,
    a: Interval,
    b: Interval,
    k: f64,
    /// +1 for a normal along the positive axis, -1 when flipped
    facing: f64,
    material: MaterialRef,
}

impl AaRect {
    pub fn new(
        plane: Plane,
        a0: f64,
        a1: f64,
        b0: f64,
        b1: f64,
        k: f64,
        material: MaterialRef,
    ) -> Self {
        Self {
            plane,
            a: Interval::new(a0.min(a1), a0.max(a1)),
            b: Interval::new(b0.min(b1), b0.max(b1)),
            k,
            facing: 1.0,
            material,
        }
    }

    /// Same rectangle with its outward normal along the negative axis.
    pub fn flipped(mut self) -> Self {
        self.facing = -self.facing;
        self
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    fn outward_normal(&self) -> Vec3 {
        let (_, _, k_axis) = self.plane.axes();
        let mut normal = Vec3::ZERO;
        normal[k_axis] = self.facing;
        normal
    }

    pub(crate) fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let (a_axis, b_axis, k_axis) = self.plane.axes();

        let t = (self.k - ray.origin[k_axis]) / ray.direction[k_axis];
        if !ray_t.contains(t) {
            return None;
        }

        // A ray parallel to the plane yields NaN here, which `contains` rejects
        let a = ray.origin[a_axis] + t * ray.direction[a_axis];
        let b = ray.origin[b_axis] + t * ray.direction[b_axis];
        if !self.a.contains(a) || !self.b.contains(b) {
            return None;
        }

        let u = (a - self.a.min) / self.a.size();
        let v = (b - self.b.min) / self.b.size();
        Some(
            HitRecord::new(ray, t, self.outward_normal(), self.material.as_ref())
                .with_uv((u, v)),
        )
    }

    pub(crate) fn bounding_box(&self) -> Aabb {
        let (a_axis, b_axis, k_axis) = self.plane.axes();
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;

        min[a_axis] = self.a.min;
        max[a_axis] = self.a.max;
        min[b_axis] = self.b.min;
        max[b_axis] = self.b.max;
        min[k_axis] = self.k;
        max[k_axis] = self.k;

        Aabb::from_points(min, max).padded(2.0 * RECT_BOX_PAD)
    }
}

/// Closed axis-aligned box made of six rectangles.
pub struct Cuboid {
    min: Vec3,
    max: Vec3,
    sides: HittableList,
}

impl Cuboid {
    /// Box spanning the two opposite corners `p0` and `p1`.
    pub fn new(p0: Vec3, p1: Vec3, material: MaterialRef) -> Self {
        let min = p0.min(p1);
        let max = p0.max(p1);

        let rect = |plane, a0, a1, b0, b1, k| AaRect::new(plane, a0, a1, b0, b1, k, material.clone());

        let faces = [
            rect(Plane::XY, min.x, max.x, min.y, max.y, max.z),
            rect(Plane::XY, min.x, max.x, min.y, max.y, min.z).flipped(),
            rect(Plane::XZ, min.x, max.x, min.z, max.z, max.y),
            rect(Plane::XZ, min.x, max.x, min.z, max.z, min.y).flipped(),
            rect(Plane::YZ, min.y, max.y, min.z, max.z, max.x),
            rect(Plane::YZ, min.y, max.y, min.z, max.z, min.x).flipped(),
        ];
        let sides = faces
            .into_iter()
            .map(|face| Hittable::from(face).into_ref())
            .collect();

        Self { min, max, sides }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub(crate) fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.sides.hit(ray, ray_t, rng)
    }

    /// `[min, max]`, padded like the sides where the box is flat.
    pub(crate) fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.min, self.max).padded(2.0 * RECT_BOX_PAD)
    }
}
