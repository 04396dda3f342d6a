use crate::Vec3;

/// A ray in 3D space with origin, direction, and time.
///
/// Rays represent a line starting at `origin` and traveling in `direction`.
/// The direction is not required to be normalized. The `time` field selects
/// the instant at which moving geometry is sampled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f64,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Create a ray at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Same ray with a different origin, keeping direction and time.
    #[inline]
    pub fn with_origin(&self, origin: Vec3) -> Self {
        Self { origin, ..*self }
    }
}
