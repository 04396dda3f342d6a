//! Homogeneous participating medium bounded by a convex shape.

use crate::{
    hittable::{BuildError, BuildResult, HitRecord, HittableRef},
    MaterialRef,
};
use prism_math::{Aabb, Interval, Ray, Vec3};
use rand::distributions::{Distribution, Open01};
use rand::RngCore;

/// Offset past the entry point when searching for the exit point.
const EXIT_SEARCH_EPSILON: f64 = 0.001;

/// Constant-density volume such as smoke or fog.
///
/// The boundary must be convex: a ray is assumed to enter and leave it at
/// most once. Scattering distance inside follows an exponential
/// distribution with rate `density`.
pub struct ConstantMedium {
    boundary: HittableRef,
    neg_inv_density: f64,
    phase_function: MaterialRef,
}

impl ConstantMedium {
    /// Create a medium inside `boundary`.
    ///
    /// A density of zero gives a medium that never scatters. Negative or
    /// NaN densities are rejected.
    pub fn new(
        boundary: HittableRef,
        density: f64,
        phase_function: MaterialRef,
    ) -> BuildResult<Self> {
        if density.is_nan() || density < 0.0 {
            return Err(BuildError::InvalidDensity(density));
        }

        Ok(Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function,
        })
    }

    pub fn boundary(&self) -> &HittableRef {
        &self.boundary
    }

    pub(crate) fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let entry = self.boundary.hit(ray, Interval::UNIVERSE, rng)?;
        let exit = self.boundary.hit(
            ray,
            Interval::new(entry.t + EXIT_SEARCH_EPSILON, f64::INFINITY),
            rng,
        )?;

        let mut t1 = entry.t.max(ray_t.min);
        let t2 = exit.t.min(ray_t.max);
        if t1 >= t2 {
            return None;
        }

        // Never scatter behind the ray origin
        t1 = t1.max(0.0);

        let ray_length = ray.direction.length();
        let distance_inside_boundary = (t2 - t1) * ray_length;
        let u: f64 = Open01.sample(rng);
        let hit_distance = self.neg_inv_density * u.ln();

        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t1 + hit_distance / ray_length;
        Some(HitRecord {
            p: ray.at(t),
            // Arbitrary: a volume scatter has no surface orientation
            normal: Vec3::X,
            material: self.phase_function.as_ref(),
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        })
    }

    pub(crate) fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.boundary.bounding_box(time0, time1)
    }
}
