//! Prism renderer - ray/scene intersection core for CPU path tracing.
//!
//! An external integrator builds an immutable [`Hittable`] tree once
//! (primitives, transform decorators, then a [`BvhNode`] or
//! [`HittableList`] root), shares it across worker threads, and writes
//! per-tile results into a [`Film`] that is finally written as PPM.

mod aa_rect;
mod bvh;
mod camera;
mod constant_medium;
mod film;
mod hittable;
mod material;
mod moving_sphere;
pub mod ppm;
mod settings;
mod sphere;
pub mod stats;
mod transform;
mod triangle;

pub use aa_rect::{AaRect, Cuboid, Plane};
pub use bvh::{BvhNode, SplitAxis};
pub use camera::Camera;
pub use constant_medium::ConstantMedium;
pub use film::{Film, FilmError, FilmResult, FilmTile};
pub use hittable::{BuildError, BuildResult, HitRecord, Hittable, HittableList, HittableRef};
pub use material::{Color, Material, MaterialRef, ScatterResult};
pub use moving_sphere::MovingSphere;
pub use settings::{RenderSettings, SettingsError};
pub use sphere::Sphere;
pub use transform::{Rotate, Translate};
pub use triangle::Triangle;

/// Re-export the math types from prism_math
pub use prism_math::{Aabb, Interval, Quat, Ray, Vec3};
