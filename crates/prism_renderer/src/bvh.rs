//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over shared scene nodes. Every node's box bounds both of its
//! children, so a ray that misses a node's box cannot hit anything beneath
//! it and the whole subtree is skipped.

use crate::{
    hittable::{BuildError, BuildResult, HitRecord, Hittable, HittableList, HittableRef},
    stats,
};
use prism_math::{Aabb, Interval, Ray};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::cmp::Ordering;
use std::sync::Arc;

/// How the split axis is picked at each level of construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitAxis {
    /// x, y, z, x, ... by depth
    #[default]
    Cycle,
    /// Axis along which the span's bounds are longest
    LongestExtent,
    /// Uniformly random per level, from a seeded generator
    Random { seed: u64 },
}

/// Internal BVH node.
///
/// A span of one object stores it as both children; `hit` tests it once.
pub struct BvhNode {
    left: HittableRef,
    right: HittableRef,
    bbox: Aabb,
}

/// An object paired with its precomputed box.
type Entry = (HittableRef, Aabb);

impl BvhNode {
    /// Build a BVH over `objects` for the shutter interval `[time0, time1]`.
    pub fn new(objects: &[HittableRef], time0: f64, time1: f64) -> BuildResult<Self> {
        Self::with_split(objects, time0, time1, SplitAxis::default())
    }

    /// Build a BVH over the contents of a list.
    pub fn from_list(list: &HittableList, time0: f64, time1: f64) -> BuildResult<Self> {
        Self::new(list.objects(), time0, time1)
    }

    /// Build with an explicit split-axis strategy.
    ///
    /// Fails if `objects` is empty or any object has no bounding box.
    pub fn with_split(
        objects: &[HittableRef],
        time0: f64,
        time1: f64,
        split: SplitAxis,
    ) -> BuildResult<Self> {
        if objects.is_empty() {
            return Err(BuildError::EmptyObjectList);
        }

        let mut entries = objects
            .iter()
            .enumerate()
            .map(|(index, object)| {
                object
                    .bounding_box(time0, time1)
                    .map(|bbox| (object.clone(), bbox))
                    .ok_or(BuildError::MissingBoundingBox { index })
            })
            .collect::<BuildResult<Vec<Entry>>>()?;

        let mut chooser = AxisChooser::new(split);
        let node = Self::build(&mut entries, 0, &mut chooser);

        log::info!(
            "Built BVH over {} objects (depth {}, {:?} split)",
            objects.len(),
            node.depth(),
            split
        );

        Ok(node)
    }

    /// Recursive construction over a non-empty span.
    fn build(entries: &mut [Entry], depth: usize, chooser: &mut AxisChooser) -> Self {
        if let [(only, bbox)] = &*entries {
            return Self {
                left: only.clone(),
                right: only.clone(),
                bbox: *bbox,
            };
        }

        let axis = chooser.choose(depth, entries);
        let compare = |a: &Entry, b: &Entry| box_compare(&a.1, &b.1, axis);

        match &*entries {
            [a, b] => {
                let (first, second) = if compare(a, b) == Ordering::Greater {
                    (b, a)
                } else {
                    (a, b)
                };
                Self {
                    left: first.0.clone(),
                    right: second.0.clone(),
                    bbox: Aabb::surrounding(&first.1, &second.1),
                }
            }
            _ => {
                entries.sort_by(compare);
                let mid = entries.len() / 2;
                let (lower, upper) = entries.split_at_mut(mid);

                let left = Self::build(lower, depth + 1, chooser);
                let right = Self::build(upper, depth + 1, chooser);
                let bbox = Aabb::surrounding(&left.bbox, &right.bbox);

                Self {
                    left: Hittable::from(left).into_ref(),
                    right: Hittable::from(right).into_ref(),
                    bbox,
                }
            }
        }
    }

    /// Closest hit beneath this node.
    ///
    /// The right subtree is searched only up to the left subtree's hit.
    pub fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        stats::record_bvh_node_test();
        if !self.bbox.hit(ray, ray_t) {
            stats::record_bvh_box_rejection();
            return None;
        }

        let left = self.left.hit(ray, ray_t, rng);
        if Arc::ptr_eq(&self.left, &self.right) {
            return left;
        }

        let right_max = left.as_ref().map_or(ray_t.max, |rec| rec.t);
        let right = self.right.hit(ray, ray_t.with_max(right_max), rng);

        right.or(left)
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn left(&self) -> &HittableRef {
        &self.left
    }

    pub fn right(&self) -> &HittableRef {
        &self.right
    }

    /// Number of BVH levels, counting this node as one.
    pub fn depth(&self) -> usize {
        let child_depth = |child: &HittableRef| match child.as_ref() {
            Hittable::Bvh(node) => node.depth(),
            _ => 0,
        };
        1 + child_depth(&self.left).max(child_depth(&self.right))
    }
}

/// Order two boxes by their minimum along `axis`.
fn box_compare(a: &Aabb, b: &Aabb, axis: usize) -> Ordering {
    a.axis_interval(axis)
        .min
        .total_cmp(&b.axis_interval(axis).min)
}

enum AxisChooser {
    Cycle,
    LongestExtent,
    Random(StdRng),
}

impl AxisChooser {
    fn new(split: SplitAxis) -> Self {
        match split {
            SplitAxis::Cycle => AxisChooser::Cycle,
            SplitAxis::LongestExtent => AxisChooser::LongestExtent,
            SplitAxis::Random { seed } => AxisChooser::Random(StdRng::seed_from_u64(seed)),
        }
    }

    fn choose(&mut self, depth: usize, entries: &[Entry]) -> usize {
        match self {
            AxisChooser::Cycle => depth % 3,
            AxisChooser::LongestExtent => entries
                .iter()
                .fold(Aabb::EMPTY, |acc, (_, bbox)| Aabb::surrounding(&acc, bbox))
                .longest_axis(),
            AxisChooser::Random(rng) => rng.gen_range(0..3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::absorb;
    use crate::{ConstantMedium, Cuboid, Sphere, Vec3};
    use rand::rngs::StdRng;

    fn sphere(center: Vec3, radius: f64) -> HittableRef {
        Hittable::from(Sphere::new(center, radius, absorb())).into_ref()
    }

    fn sphere_grid(n: usize) -> Vec<HittableRef> {
        (0..n)
            .map(|i| {
                let x = (i % 8) as f64 * 3.0;
                let y = ((i / 8) % 8) as f64 * 3.0;
                let z = -10.0 - (i / 64) as f64 * 3.0;
                sphere(Vec3::new(x, y, z), 1.0)
            })
            .collect()
    }

    /// Distinct leaves under `node`.
    fn leaf_count(node: &BvhNode) -> u64 {
        let count = |child: &HittableRef| match child.as_ref() {
            Hittable::Bvh(inner) => leaf_count(inner),
            _ => 1,
        };
        if Arc::ptr_eq(node.left(), node.right()) {
            count(node.left())
        } else {
            count(node.left()) + count(node.right())
        }
    }

    /// Leaves whose every enclosing box the ray enters within `ray_t`.
    fn reachable_leaves(node: &BvhNode, ray: &Ray, ray_t: Interval) -> u64 {
        if !node.bounding_box().hit(ray, ray_t) {
            return 0;
        }
        let count = |child: &HittableRef| match child.as_ref() {
            Hittable::Bvh(inner) => reachable_leaves(inner, ray, ray_t),
            _ => 1,
        };
        if Arc::ptr_eq(node.left(), node.right()) {
            count(node.left())
        } else {
            count(node.left()) + count(node.right())
        }
    }

    /// Every internal box bounds both children's boxes.
    fn assert_boxes_nest(node: &BvhNode) {
        for child in [node.left(), node.right()] {
            let child_box = child.bounding_box(0.0, 1.0).unwrap();
            let union = Aabb::surrounding(&node.bounding_box(), &child_box);
            assert_eq!(union, node.bounding_box());

            if let Hittable::Bvh(inner) = child.as_ref() {
                assert_boxes_nest(inner);
            }
        }
    }

    #[test]
    fn test_bvh_empty_is_error() {
        let err = BvhNode::new(&[], 0.0, 1.0).err();
        assert_eq!(err, Some(BuildError::EmptyObjectList));
    }

    #[test]
    fn test_bvh_missing_box_reports_index() {
        let objects = vec![
            sphere(Vec3::ZERO, 1.0),
            sphere(Vec3::X, 1.0),
            Hittable::from(HittableList::new()).into_ref(),
        ];

        let err = BvhNode::new(&objects, 0.0, 1.0).err();
        assert_eq!(err, Some(BuildError::MissingBoundingBox { index: 2 }));
    }

    #[test]
    fn test_bvh_single_object() {
        let bvh = BvhNode::new(&[sphere(Vec3::new(0.0, 0.0, -1.0), 0.5)], 0.0, 1.0).unwrap();
        assert!(Arc::ptr_eq(bvh.left(), bvh.right()));
        assert_eq!(bvh.depth(), 1);

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng);
        assert!((rec.unwrap().t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bvh_two_objects_ordered_by_axis() {
        let near = sphere(Vec3::new(-3.0, 0.0, 0.0), 1.0);
        let far = sphere(Vec3::new(3.0, 0.0, 0.0), 1.0);

        let bvh = BvhNode::new(&[far.clone(), near.clone()], 0.0, 1.0).unwrap();
        assert!(Arc::ptr_eq(bvh.left(), &near));
        assert!(Arc::ptr_eq(bvh.right(), &far));
    }

    #[test]
    fn test_bvh_boxes_nest_for_all_strategies() {
        let objects = sphere_grid(100);

        for split in [
            SplitAxis::Cycle,
            SplitAxis::LongestExtent,
            SplitAxis::Random { seed: 17 },
        ] {
            let bvh = BvhNode::with_split(&objects, 0.0, 1.0, split).unwrap();
            assert_boxes_nest(&bvh);
            assert!(bvh.depth() <= 8, "{split:?} depth {}", bvh.depth());
        }
    }

    #[test]
    fn test_bvh_matches_linear_list() {
        let objects = sphere_grid(150);
        let list: HittableList = objects.iter().cloned().collect();
        let bvh = BvhNode::new(&objects, 0.0, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(23);
        let range = Interval::new(0.001, f64::INFINITY);

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-5.0..25.0),
                rng.gen_range(-5.0..25.0),
                rng.gen_range(0.0..5.0),
            );
            let direction = Vec3::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                -1.0,
            );
            let ray = Ray::new_simple(origin, direction);

            let expected = list.hit(&ray, range, &mut rng).map(|rec| rec.t);
            let actual = bvh.hit(&ray, range, &mut rng).map(|rec| rec.t);
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn test_bvh_prunes_missed_subtrees() {
        let objects = sphere_grid(128);
        let bvh = BvhNode::new(&objects, 0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        // Aimed away from the whole scene
        stats::reset();
        let away = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.hit(&away, Interval::new(0.001, f64::INFINITY), &mut rng).is_none());

        let counters = stats::snapshot();
        assert_eq!(counters.primitive_tests, 0);
        assert_eq!(counters.bvh_node_tests, 1);
        assert_eq!(counters.bvh_box_rejections, 1);

        // Straight down one column of spheres
        stats::reset();
        let column = Ray::new_simple(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&column, Interval::new(0.001, f64::INFINITY), &mut rng);
        assert!((rec.unwrap().t - 9.0).abs() < 1e-9);

        let counters = stats::snapshot();
        assert!(counters.primitive_tests >= 1);
        assert!(
            counters.primitive_tests < objects.len() as u64 / 4,
            "{counters}"
        );
    }

    #[test]
    fn test_bvh_never_tests_leaves_of_missed_subtrees() {
        // Two clusters far apart on x; the first split separates them
        let cluster = |offset: f64| {
            (0..16).map(move |i| {
                let center = Vec3::new(offset + (i % 4) as f64, (i / 4) as f64, -10.0);
                sphere(center, 0.4)
            })
        };
        let objects: Vec<HittableRef> = cluster(0.0).chain(cluster(100.0)).collect();
        let bvh = BvhNode::new(&objects, 0.0, 1.0).unwrap();

        let (Hittable::Bvh(near), Hittable::Bvh(far)) = (bvh.left().as_ref(), bvh.right().as_ref())
        else {
            panic!("root children should be subtrees");
        };
        assert_eq!(leaf_count(near), 16);
        assert_eq!(leaf_count(far), 16);
        assert!(far.bounding_box().minimum().x > 50.0);

        let mut rng = StdRng::seed_from_u64(0);
        let range = Interval::new(0.001, f64::INFINITY);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(reachable_leaves(far, &ray, range), 0);

        stats::reset();
        let rec = bvh.hit(&ray, range, &mut rng).unwrap();
        assert!((rec.t - 14.6).abs() < 1e-9);

        let counters = stats::snapshot();
        let reachable = reachable_leaves(&bvh, &ray, range);
        assert!(counters.primitive_tests >= 1);
        assert!(counters.primitive_tests <= reachable, "{counters}");
        assert!(reachable < leaf_count(near));
        // The far subtree is rejected at its own root
        assert!(counters.bvh_box_rejections >= 1);
    }

    #[test]
    fn test_bvh_primitive_tests_bounded_by_reachable_leaves() {
        let objects = sphere_grid(128);
        let bvh = BvhNode::new(&objects, 0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(31);
        let range = Interval::new(0.001, f64::INFINITY);

        for _ in 0..300 {
            let origin = Vec3::new(
                rng.gen_range(-5.0..25.0),
                rng.gen_range(-5.0..25.0),
                rng.gen_range(0.0..5.0),
            );
            let direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..0.2),
            );
            let ray = Ray::new_simple(origin, direction);

            stats::reset();
            let _ = bvh.hit(&ray, range, &mut rng);
            let tested = stats::snapshot().primitive_tests;

            assert!(tested <= reachable_leaves(&bvh, &ray, range), "{ray:?}");
        }
    }

    #[test]
    fn test_bvh_finds_flat_cuboid() {
        let flat = Cuboid::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0), absorb());
        let objects = vec![
            Hittable::from(flat).into_ref(),
            sphere(Vec3::new(10.0, 0.0, 0.0), 1.0),
            sphere(Vec3::new(20.0, 0.0, 0.0), 1.0),
        ];
        let list: HittableList = objects.iter().cloned().collect();
        let bvh = BvhNode::new(&objects, 0.0, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(2);
        let range = Interval::new(0.001, f64::INFINITY);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));

        let expected = list.hit(&ray, range, &mut rng).map(|rec| rec.t);
        assert_eq!(expected, Some(5.0));
        assert_eq!(bvh.hit(&ray, range, &mut rng).map(|rec| rec.t), expected);
    }

    #[test]
    fn test_single_medium_leaf_tested_once() {
        let boundary = sphere(Vec3::ZERO, 1.0);
        let medium = Hittable::from(ConstantMedium::new(boundary, 1.0, absorb()).unwrap());
        let bvh = BvhNode::new(&[medium.into_ref()], 0.0, 1.0).unwrap();

        stats::reset();
        let mut rng = StdRng::seed_from_u64(4);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let _ = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng);

        // One medium test touches its boundary sphere twice
        assert_eq!(stats::snapshot().primitive_tests, 2);
    }
}
