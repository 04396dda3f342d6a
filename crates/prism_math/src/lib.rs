//! Prism math - value types shared by the intersection engine.
//!
//! Everything here is plain `Copy` data: rays, parameter intervals and
//! axis-aligned bounding boxes, all in double precision.

// Re-export glam for callers that need more than the aliases below
pub use glam;

/// 3D vector / point type used throughout prism.
pub type Vec3 = glam::DVec3;

/// Rotation type used by the transform decorators.
pub type Quat = glam::DQuat;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::TransformAabb;
