//! Bounding boxes under rigid transforms.
//!
//! Boxes are rebuilt from all eight transformed corners.

use crate::{Aabb, Quat, Vec3};

/// Extension trait for transforms that can carry an [`Aabb`] into another space.
pub trait TransformAabb {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl TransformAabb for Quat {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        bound_corners(aabb, |corner| *self * corner)
    }
}

fn bound_corners(aabb: &Aabb, f: impl Fn(Vec3) -> Vec3) -> Aabb {
    let [first, rest @ ..] = aabb.corners().map(f);
    let start = Aabb::from_points(first, first);

    rest.into_iter()
        .fold(start, |acc, corner| Aabb::surrounding_point(&acc, corner))
}
