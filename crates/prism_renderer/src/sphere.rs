//! Sphere primitive for ray tracing.

use crate::{hittable::HitRecord, Material, MaterialRef};
use prism_math::{Aabb, Interval, Ray, Vec3};
use std::f64::consts::PI;

/// A static sphere primitive.
pub struct Sphere {
    center: Vec3,
    radius: f64,
    material: MaterialRef,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero, and a
    /// zero-radius sphere is never hit.
    pub fn new(center: Vec3, radius: f64, material: MaterialRef) -> Self {
        let radius = radius.max(0.0);
        let bbox = sphere_box(center, radius);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub(crate) fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        hit_sphere(self.center, self.radius, self.material.as_ref(), ray, ray_t)
    }

    pub(crate) fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

pub(crate) fn sphere_box(center: Vec3, radius: f64) -> Aabb {
    let rvec = Vec3::splat(radius);
    Aabb::from_points(center - rvec, center + rvec)
}

/// Ray/sphere intersection shared by the static and moving spheres.
///
/// Solves `|O + tD - C|^2 = r^2` with the half-b form of the quadratic:
/// `a = D.D`, `h = oc.D`, `c = oc.oc - r^2`, discriminant `h^2 - ac`.
pub(crate) fn hit_sphere<'a>(
    center: Vec3,
    radius: f64,
    material: &'a dyn Material,
    ray: &Ray,
    ray_t: Interval,
) -> Option<HitRecord<'a>> {
    // Degenerate sphere has no surface
    if radius <= 0.0 {
        return None;
    }

    let oc = ray.origin - center;
    let a = ray.direction.length_squared();
    let h = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (-h - sqrtd) / a;
    if !ray_t.contains(root) {
        root = (-h + sqrtd) / a;
        if !ray_t.contains(root) {
            return None;
        }
    }

    let p = ray.at(root);
    let outward_normal = (p - center) / radius;
    Some(HitRecord::new(ray, root, outward_normal, material).with_uv(sphere_uv(outward_normal)))
}

/// Get the UV coordinates for a point on the unit sphere.
///
/// theta: angle down from -Y, phi: angle around Y from -X.
pub(crate) fn sphere_uv(p: Vec3) -> (f64, f64) {
    let theta = (-p.y).acos();
    let phi = (-p.z).atan2(p.x) + PI;

    (phi / (2.0 * PI), theta / PI)
}
