//! Material collaborator contract.
//!
//! Shading lives outside this crate. The intersection core only stores a
//! reference to the material of whatever was hit and hands it back in the
//! [`HitRecord`]; it never calls into it.

use crate::hittable::HitRecord;
use prism_math::{Ray, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Shared handle to a material, so many primitives can use one instance.
pub type MaterialRef = Arc<dyn Material>;

/// Outcome of a successful scatter event.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// Color attenuation applied to light arriving along `scattered`
    pub attenuation: Color,
    /// The continuation ray
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `Some` with attenuation and scattered ray, or `None` if the
    /// ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore)
        -> Option<ScatterResult>;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emitted(&self, _u: f64, _v: f64, _p: Vec3) -> Color {
        Color::ZERO
    }
}
