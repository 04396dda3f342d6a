//! Per-thread intersection counters.
//!
//! Each worker thread owns its counters, so recording is a plain
//! thread-local increment with no synchronization. Read them back with
//! [`snapshot`] on the thread that did the work.

use std::cell::Cell;
use std::fmt::Display;

/// Counts of intersection work done on the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitCounters {
    /// Leaf primitive intersection tests (spheres, rectangles, triangles)
    pub primitive_tests: u64,
    /// BVH nodes visited
    pub bvh_node_tests: u64,
    /// BVH nodes whose box the ray missed, pruning the subtree
    pub bvh_box_rejections: u64,
}

impl HitCounters {
    /// Counters accumulated between `earlier` and `self`.
    ///
    /// Saturates at zero if the counters were reset in between.
    pub fn since(&self, earlier: &HitCounters) -> HitCounters {
        HitCounters {
            primitive_tests: self.primitive_tests.saturating_sub(earlier.primitive_tests),
            bvh_node_tests: self.bvh_node_tests.saturating_sub(earlier.bvh_node_tests),
            bvh_box_rejections: self.bvh_box_rejections.saturating_sub(earlier.bvh_box_rejections),
        }
    }
}

impl Display for HitCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} primitive tests; {} bvh nodes visited; {} bvh boxes rejected",
            self.primitive_tests, self.bvh_node_tests, self.bvh_box_rejections
        )
    }
}

thread_local! {
    static COUNTERS: Cell<HitCounters> = const {
        Cell::new(HitCounters {
            primitive_tests: 0,
            bvh_node_tests: 0,
            bvh_box_rejections: 0,
        })
    };
}

#[inline]
fn update(f: impl FnOnce(&mut HitCounters)) {
    COUNTERS.with(|c| {
        let mut counters = c.get();
        f(&mut counters);
        c.set(counters);
    });
}

#[inline]
pub(crate) fn record_primitive_test() {
    update(|c| c.primitive_tests += 1);
}

#[inline]
pub(crate) fn record_bvh_node_test() {
    update(|c| c.bvh_node_tests += 1);
}

#[inline]
pub(crate) fn record_bvh_box_rejection() {
    update(|c| c.bvh_box_rejections += 1);
}

/// Current counters for this thread.
pub fn snapshot() -> HitCounters {
    COUNTERS.with(Cell::get)
}

/// Zero this thread's counters.
pub fn reset() {
    COUNTERS.with(|c| c.set(HitCounters::default()));
}

/// Log this thread's counters at debug level.
pub fn log_thread_stats() {
    log::debug!(
        "{:?}: {}",
        std::thread::current().id(),
        snapshot()
    );
}
