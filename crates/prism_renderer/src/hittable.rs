//! Hittable sum type, HitRecord and HittableList.
//!
//! Every scene node is a variant of [`Hittable`]. Nodes are shared through
//! [`HittableRef`] handles so the same primitive can sit in several
//! aggregates at once, and nothing is mutated after the tree is built.
//! That is what lets any number of worker threads call [`Hittable::hit`]
//! concurrently without locks.

use crate::{
    aa_rect::{AaRect, Cuboid},
    bvh::BvhNode,
    constant_medium::ConstantMedium,
    moving_sphere::MovingSphere,
    sphere::Sphere,
    stats,
    transform::{ObjectTransform, Rotate, Translate},
    triangle::Triangle,
    Material,
};
use prism_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling a scene, before any ray is traced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Invalid time interval: time1 ({time1}) must be greater than time0 ({time0})")]
    InvalidTimeInterval { time0: f64, time1: f64 },

    #[error("Object {index} has no bounding box")]
    MissingBoundingBox { index: usize },

    #[error("Cannot build a BVH from zero objects")]
    EmptyObjectList,

    #[error("Invalid medium density: {0}")]
    InvalidDensity(f64),
}

/// Result type for scene construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// Record of a ray-object intersection.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// UV texture coordinates
    pub u: f64,
    pub v: f64,
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record at parameter `t`, orienting `outward_normal` against the ray.
    pub fn new(ray: &Ray, t: f64, outward_normal: Vec3, material: &'a dyn Material) -> Self {
        let mut rec = Self {
            p: ray.at(t),
            normal: outward_normal,
            material,
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// The geometric outward normal, undoing the flip from [`Self::set_face_normal`].
    pub fn outward_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }

    #[inline]
    pub(crate) fn with_uv(mut self, (u, v): (f64, f64)) -> Self {
        self.u = u;
        self.v = v;
        self
    }
}

impl fmt::Debug for HitRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitRecord")
            .field("p", &self.p)
            .field("normal", &self.normal)
            .field("u", &self.u)
            .field("v", &self.v)
            .field("t", &self.t)
            .field("front_face", &self.front_face)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a scene node.
pub type HittableRef = Arc<Hittable>;

/// Anything a ray can intersect.
pub enum Hittable {
    Sphere(Sphere),
    MovingSphere(MovingSphere),
    ConstantMedium(ConstantMedium),
    Rect(AaRect),
    Triangle(Triangle),
    Cuboid(Cuboid),
    List(HittableList),
    Bvh(BvhNode),
    Translate(Translate),
    Rotate(Rotate),
}

impl Hittable {
    /// Test if a ray hits this object within `ray_t`.
    ///
    /// Transform decorators map the ray into object space, test their child
    /// there, and map the record back. `rng` is only drawn from by
    /// participating media; pass one generator per worker thread.
    pub fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        match self {
            Hittable::Sphere(sphere) => {
                stats::record_primitive_test();
                sphere.hit(ray, ray_t)
            }
            Hittable::MovingSphere(sphere) => {
                stats::record_primitive_test();
                sphere.hit(ray, ray_t)
            }
            Hittable::Rect(rect) => {
                stats::record_primitive_test();
                rect.hit(ray, ray_t)
            }
            Hittable::Triangle(triangle) => {
                stats::record_primitive_test();
                triangle.hit(ray, ray_t)
            }
            Hittable::ConstantMedium(medium) => medium.hit(ray, ray_t, rng),
            Hittable::Cuboid(cuboid) => cuboid.hit(ray, ray_t, rng),
            Hittable::List(list) => list.hit(ray, ray_t, rng),
            Hittable::Bvh(node) => node.hit(ray, ray_t, rng),
            Hittable::Translate(translate) => hit_transformed(translate, ray, ray_t, rng),
            Hittable::Rotate(rotate) => hit_transformed(rotate, ray, ray_t, rng),
        }
    }

    /// Bounding box over the shutter interval `[time0, time1]`.
    ///
    /// `None` only when an aggregate has nothing to bound.
    pub fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        match self {
            Hittable::Sphere(sphere) => Some(sphere.bounding_box()),
            Hittable::MovingSphere(sphere) => Some(sphere.bounding_box(time0, time1)),
            Hittable::Rect(rect) => Some(rect.bounding_box()),
            Hittable::Triangle(triangle) => Some(triangle.bounding_box()),
            Hittable::ConstantMedium(medium) => medium.bounding_box(time0, time1),
            Hittable::Cuboid(cuboid) => Some(cuboid.bounding_box()),
            Hittable::List(list) => list.bounding_box(time0, time1),
            Hittable::Bvh(node) => Some(node.bounding_box()),
            Hittable::Translate(translate) => translate.bounding_box(time0, time1),
            Hittable::Rotate(rotate) => rotate.bounding_box(time0, time1),
        }
    }

    /// Move this node behind a shared handle.
    pub fn into_ref(self) -> HittableRef {
        Arc::new(self)
    }
}

/// World-space hit through an object-space transform.
fn hit_transformed<'a, T: ObjectTransform>(
    transform: &'a T,
    ray: &Ray,
    ray_t: Interval,
    rng: &mut dyn RngCore,
) -> Option<HitRecord<'a>> {
    let object_ray = transform.to_object(ray);
    transform
        .child()
        .hit(&object_ray, ray_t, rng)
        .map(|rec| transform.to_world(rec, &object_ray))
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Hittable {
                fn from(value: $ty) -> Self {
                    Hittable::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant! {
    Sphere => Sphere,
    MovingSphere => MovingSphere,
    ConstantMedium => ConstantMedium,
    Rect => AaRect,
    Triangle => Triangle,
    Cuboid => Cuboid,
    List => HittableList,
    Bvh => BvhNode,
    Translate => Translate,
    Rotate => Rotate,
}

/// An ordered list of hittable objects.
#[derive(Clone, Default)]
pub struct HittableList {
    objects: Vec<HittableRef>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: HittableRef) {
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The shared handles, in insertion order.
    pub fn objects(&self) -> &[HittableRef] {
        &self.objects
    }

    /// Closest hit over all children.
    pub fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let mut closest: Option<HitRecord<'a>> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far), rng) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }

    /// Union of all children's boxes.
    ///
    /// `None` if the list is empty or any child has no box.
    pub fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        if self.objects.is_empty() {
            return None;
        }

        self.objects.iter().try_fold(Aabb::EMPTY, |acc, object| {
            object
                .bounding_box(time0, time1)
                .map(|b| Aabb::surrounding(&acc, &b))
        })
    }
}

impl FromIterator<HittableRef> for HittableList {
    fn from_iter<I: IntoIterator<Item = HittableRef>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}
