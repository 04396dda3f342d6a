//! Sphere whose center moves linearly over a time interval.

use crate::{
    hittable::{BuildError, BuildResult, HitRecord},
    sphere::{hit_sphere, sphere_box},
    MaterialRef,
};
use prism_math::{Aabb, Interval, Ray, Vec3};

/// A sphere moving from `center0` at `time0` to `center1` at `time1`.
///
/// The center is extrapolated linearly for ray times outside the interval.
pub struct MovingSphere {
    center0: Vec3,
    center1: Vec3,
    time0: f64,
    time1: f64,
    radius: f64,
    material: MaterialRef,
}

impl MovingSphere {
    /// Create a moving sphere. Fails unless `time1 > time0`.
    pub fn new(
        center0: Vec3,
        center1: Vec3,
        time0: f64,
        time1: f64,
        radius: f64,
        material: MaterialRef,
    ) -> BuildResult<Self> {
        // Written negated so NaN times are rejected too
        if !(time1 > time0) {
            return Err(BuildError::InvalidTimeInterval { time0, time1 });
        }

        Ok(Self {
            center0,
            center1,
            time0,
            time1,
            radius: radius.max(0.0),
            material,
        })
    }

    /// Sphere center at the given time.
    pub fn center(&self, time: f64) -> Vec3 {
        self.center0
            + ((time - self.time0) / (self.time1 - self.time0)) * (self.center1 - self.center0)
    }

    pub(crate) fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        hit_sphere(
            self.center(ray.time),
            self.radius,
            self.material.as_ref(),
            ray,
            ray_t,
        )
    }

    /// Union of the sphere's boxes at `time0` and `time1`.
    ///
    /// Conservative for linear motion, not tight at intermediate times.
    pub(crate) fn bounding_box(&self, time0: f64, time1: f64) -> Aabb {
        let box0 = sphere_box(self.center(time0), self.radius);
        let box1 = sphere_box(self.center(time1), self.radius);
        Aabb::surrounding(&box0, &box1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::absorb;
    use crate::Sphere;

    fn moving() -> MovingSphere {
        MovingSphere::new(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(2.0, 0.0, -5.0),
            0.0,
            1.0,
            0.5,
            absorb(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_time_interval() {
        let err = MovingSphere::new(Vec3::ZERO, Vec3::X, 1.0, 1.0, 1.0, absorb())
            .err()
            .unwrap();
        assert_eq!(
            err,
            BuildError::InvalidTimeInterval {
                time0: 1.0,
                time1: 1.0
            }
        );

        assert!(MovingSphere::new(Vec3::ZERO, Vec3::X, 2.0, 1.0, 1.0, absorb()).is_err());
        assert!(MovingSphere::new(Vec3::ZERO, Vec3::X, 0.0, f64::NAN, 1.0, absorb()).is_err());
    }

    #[test]
    fn test_center_interpolates() {
        let sphere = moving();
        assert_eq!(sphere.center(0.0), Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(sphere.center(0.5), Vec3::new(1.0, 0.0, -5.0));
        assert_eq!(sphere.center(1.0), Vec3::new(2.0, 0.0, -5.0));
    }

    #[test]
    fn test_matches_static_sphere_at_endpoints() {
        let sphere = moving();
        let at_start = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 0.5, absorb());
        let at_end = Sphere::new(Vec3::new(2.0, 0.0, -5.0), 0.5, absorb());
        let range = Interval::new(0.001, f64::INFINITY);

        for origin in [Vec3::ZERO, Vec3::new(1.8, 0.1, 0.0), Vec3::new(0.3, -0.2, 1.0)] {
            for (time, reference) in [(0.0, &at_start), (1.0, &at_end)] {
                let target = reference.center() + Vec3::new(0.1, 0.05, 0.0);
                let ray = Ray::new(origin, target - origin, time);

                let a = sphere.hit(&ray, range);
                let b = reference.hit(&ray, range);
                match (a, b) {
                    (Some(a), Some(b)) => {
                        assert_eq!(a.t, b.t);
                        assert_eq!(a.p, b.p);
                        assert_eq!(a.normal, b.normal);
                        assert_eq!(a.front_face, b.front_face);
                    }
                    (None, None) => {}
                    _ => panic!("moving and static sphere disagree at time {time}"),
                }
            }
        }
    }

    #[test]
    fn test_hit_depends_on_ray_time() {
        let sphere = moving();
        let range = Interval::new(0.001, f64::INFINITY);
        let origin = Vec3::new(2.0, 0.0, 0.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);

        assert!(sphere.hit(&Ray::new(origin, direction, 0.0), range).is_none());
        assert!(sphere.hit(&Ray::new(origin, direction, 1.0), range).is_some());
    }

    #[test]
    fn test_bounding_box_covers_both_endpoints() {
        let bbox = moving().bounding_box(0.0, 1.0);

        assert_eq!(bbox.minimum(), Vec3::new(-0.5, -0.5, -5.5));
        assert_eq!(bbox.maximum(), Vec3::new(2.5, 0.5, -4.5));
    }
}
