//! Transform decorators: wrap a child node and test it in its own space.
//!
//! A decorator maps the incoming world ray into object space, lets the child
//! produce an object-space record, and maps that record back. The child is
//! shared, so the same geometry can be instanced under several transforms.

use crate::hittable::{HitRecord, Hittable, HittableRef};
use prism_math::{Aabb, Quat, Ray, TransformAabb, Vec3};

/// The two stages of a transformed hit test.
pub(crate) trait ObjectTransform {
    fn child(&self) -> &Hittable;

    /// World-space ray to object-space ray.
    fn to_object(&self, ray: &Ray) -> Ray;

    /// Object-space record back to world space. `object_ray` is the ray the
    /// child was tested against.
    fn to_world<'a>(&self, rec: HitRecord<'a>, object_ray: &Ray) -> HitRecord<'a>;
}

/// Moves its child by a fixed offset.
pub struct Translate {
    child: HittableRef,
    offset: Vec3,
}

impl Translate {
    pub fn new(child: HittableRef, offset: Vec3) -> Self {
        Self { child, offset }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub(crate) fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.child
            .bounding_box(time0, time1)
            .map(|bbox| bbox.translate(self.offset))
    }
}

impl ObjectTransform for Translate {
    fn child(&self) -> &Hittable {
        &self.child
    }

    fn to_object(&self, ray: &Ray) -> Ray {
        ray.with_origin(ray.origin - self.offset)
    }

    fn to_world<'a>(&self, mut rec: HitRecord<'a>, object_ray: &Ray) -> HitRecord<'a> {
        rec.p += self.offset;
        // Orientation is judged against the moved ray, not the world ray
        let outward = rec.outward_normal();
        rec.set_face_normal(object_ray, outward);
        rec
    }
}

/// Rotates its child about the origin.
pub struct Rotate {
    child: HittableRef,
    rotation: Quat,
    inverse: Quat,
}

impl Rotate {
    /// Rotate `child` by `rotation`, which is normalized first.
    pub fn new(child: HittableRef, rotation: Quat) -> Self {
        let rotation = rotation.normalize();
        Self {
            child,
            rotation,
            inverse: rotation.inverse(),
        }
    }

    /// Rotate by `degrees` about `axis`. The axis need not be unit length
    /// but must be non-zero.
    pub fn from_axis_angle(child: HittableRef, axis: Vec3, degrees: f64) -> Self {
        Self::new(
            child,
            Quat::from_axis_angle(axis.normalize(), degrees.to_radians()),
        )
    }

    /// Rotate by `degrees` about the Y axis.
    pub fn y(child: HittableRef, degrees: f64) -> Self {
        Self::from_axis_angle(child, Vec3::Y, degrees)
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Box of all eight rotated corners of the child's box.
    pub(crate) fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.child
            .bounding_box(time0, time1)
            .map(|bbox| self.rotation.transform_aabb(&bbox))
    }
}

impl ObjectTransform for Rotate {
    fn child(&self) -> &Hittable {
        &self.child
    }

    fn to_object(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.inverse * ray.origin,
            self.inverse * ray.direction,
            ray.time,
        )
    }

    fn to_world<'a>(&self, mut rec: HitRecord<'a>, _object_ray: &Ray) -> HitRecord<'a> {
        // Rotation preserves dot products, so front_face carries over
        rec.p = self.rotation * rec.p;
        rec.normal = self.rotation * rec.normal;
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{absorb, approx_eq};
    use crate::{Cuboid, HittableList, Interval, Sphere};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sphere(center: Vec3, radius: f64) -> HittableRef {
        Hittable::from(Sphere::new(center, radius, absorb())).into_ref()
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-9
    }

    fn range() -> Interval {
        Interval::new(0.001, f64::INFINITY)
    }

    #[test]
    fn test_translate_moves_hit_point() {
        let moved = Hittable::from(Translate::new(
            sphere(Vec3::ZERO, 1.0),
            Vec3::new(0.0, 0.0, -5.0),
        ));
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = moved.hit(&ray, range(), &mut rng).unwrap();
        assert!(approx_eq(rec.t, 4.0));
        assert!(close(rec.p, Vec3::new(0.0, 0.0, -4.0)));
        assert!(close(rec.normal, Vec3::Z));
        assert!(rec.front_face);
    }

    #[test]
    fn test_translate_keeps_back_face_from_inside() {
        let moved = Hittable::from(Translate::new(
            sphere(Vec3::ZERO, 1.0),
            Vec3::new(10.0, 0.0, 0.0),
        ));
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new_simple(Vec3::new(10.0, 0.0, 0.0), Vec3::X);

        let rec = moved.hit(&ray, range(), &mut rng).unwrap();
        assert!(!rec.front_face);
        assert!(close(rec.p, Vec3::new(11.0, 0.0, 0.0)));
        assert!(close(rec.outward_normal(), Vec3::X));
    }

    #[test]
    fn test_translate_bounding_box() {
        let moved = Translate::new(sphere(Vec3::ZERO, 1.0), Vec3::new(1.0, 2.0, 3.0));
        let bbox = moved.bounding_box(0.0, 1.0).unwrap();

        assert_eq!(bbox.minimum(), Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(bbox.maximum(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_transform_of_boxless_child_has_no_box() {
        let empty = Hittable::from(HittableList::new()).into_ref();

        assert!(Translate::new(empty.clone(), Vec3::ONE)
            .bounding_box(0.0, 1.0)
            .is_none());
        assert!(Rotate::y(empty, 30.0).bounding_box(0.0, 1.0).is_none());
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        // +X maps to -Z under a quarter turn about Y
        let rotated = Hittable::from(Rotate::y(sphere(Vec3::new(3.0, 0.0, 0.0), 1.0), 90.0));
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = rotated.hit(&ray, range(), &mut rng).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-9);
        assert!(close(rec.p, Vec3::new(0.0, 0.0, -2.0)));
        assert!(close(rec.normal, Vec3::Z));
        assert!(rec.front_face);

        let behind = Ray::new_simple(Vec3::ZERO, Vec3::X);
        assert!(rotated.hit(&behind, range(), &mut rng).is_none());
    }

    #[test]
    fn test_rotate_bounding_box_uses_all_corners() {
        let cube = Hittable::from(Cuboid::new(Vec3::splat(-1.0), Vec3::splat(1.0), absorb()));
        let rotated = Rotate::y(cube.into_ref(), 45.0);
        let bbox = rotated.bounding_box(0.0, 1.0).unwrap();

        let diag = 2.0f64.sqrt();
        assert!(close(bbox.minimum(), Vec3::new(-diag, -1.0, -diag)));
        assert!(close(bbox.maximum(), Vec3::new(diag, 1.0, diag)));
    }

    #[test]
    fn test_rotated_hits_stay_inside_box() {
        let cube = Hittable::from(Cuboid::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, 0.5),
            absorb(),
        ));
        let rotated = Rotate::from_axis_angle(cube.into_ref(), Vec3::new(1.0, 1.0, 0.0), 37.0);
        let bbox = rotated.bounding_box(0.0, 1.0).unwrap();
        let slack = Aabb::new(bbox.x.expand(1e-6), bbox.y.expand(1e-6), bbox.z.expand(1e-6));
        let node = Hittable::from(rotated);
        let mut rng = StdRng::seed_from_u64(11);

        // The box center is the rotated cube center, so every ray hits
        let target = bbox.centroid();
        for i in 0..64 {
            let angle = i as f64 * 0.3;
            let origin = target + Vec3::new(angle.cos(), 0.3 * angle.sin(), angle.sin()) * 8.0;
            let ray = Ray::new_simple(origin, target - origin);

            let rec = node.hit(&ray, range(), &mut rng).unwrap();
            assert!(slack.contains_point(rec.p), "{:?} escapes {:?}", rec.p, bbox);
        }
    }

    #[test]
    fn test_translate_of_rotate() {
        let cube = Hittable::from(Cuboid::new(Vec3::splat(-0.5), Vec3::splat(0.5), absorb()));
        let rotated = Hittable::from(Rotate::y(cube.into_ref(), 45.0)).into_ref();
        let placed = Hittable::from(Translate::new(rotated, Vec3::new(0.0, 0.0, -10.0)));
        let mut rng = StdRng::seed_from_u64(3);

        // A 45 degree cube presents its vertical edge to the viewer; the
        // face beside it recedes one unit in z per unit in x
        let ray = Ray::new_simple(Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = placed.hit(&ray, range(), &mut rng).unwrap();
        let edge = 0.5 * 2.0f64.sqrt();
        assert!((rec.t - (10.0 - edge + 0.1)).abs() < 1e-9);
        assert!(rec.front_face);
        assert!(close(rec.normal, Vec3::new(1.0, 0.0, 1.0).normalize()));
    }

    proptest! {
        #[test]
        fn translated_sphere_hit_follows_offset(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            z in -100.0f64..100.0,
        ) {
            let offset = Vec3::new(x, y, z);
            let moved = Hittable::from(Translate::new(sphere(Vec3::ZERO, 1.0), offset));
            let mut rng = StdRng::seed_from_u64(0);
            let ray = Ray::new_simple(offset + Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

            let rec = moved.hit(&ray, range(), &mut rng).unwrap();
            prop_assert!((rec.t - 4.0).abs() < 1e-9);
            prop_assert!((rec.p - (offset + Vec3::Z)).length() < 1e-9);
            prop_assert!(rec.front_face);
        }
    }
}
