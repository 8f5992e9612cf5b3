//! Device selection policies (spec.md §4.9, component C9).
//!
//! Grounded on `original_source/include/xkrt/routing/{router,
//! router-random, router-affinity, router-cfs}.hpp`. Every router must
//! satisfy the invariant spec.md §4.9 states explicitly: the returned
//! device id is always one of the candidates it was given.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::driver::Topology;
use crate::error::DeviceGlobalId;
use crate::task::Task;

/// Chooses a device for a task among `candidates`. Implementations must
/// return an id drawn from `candidates`; violating that is a routing
/// bug (`result ∈ valid`, spec.md §4.9).
pub trait Router: Send + Sync {
    fn route(&self, task: &Task, candidates: &[DeviceGlobalId]) -> DeviceGlobalId;
}

/// Picks uniformly among the candidates. Grounded on
/// `router-random.hpp`.
#[derive(Debug, Default)]
pub struct RandomRouter;

impl Router for RandomRouter {
    fn route(&self, _task: &Task, candidates: &[DeviceGlobalId]) -> DeviceGlobalId {
        debug_assert!(!candidates.is_empty());
        let i = rand::thread_rng().gen_range(0..candidates.len());
        candidates[i]
    }
}

/// Completely-fair-scheduler-style router: tracks a running load
/// counter per device and always routes to whichever candidate
/// currently has the least outstanding work, breaking ties by
/// [`Topology`] distance to the task's device hint when one is present.
/// Grounded on `router-cfs.hpp`.
pub struct CfsRouter {
    load: Vec<AtomicUsize>,
}

impl CfsRouter {
    pub fn new(ndevices: usize) -> Self {
        CfsRouter {
            load: (0..ndevices).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn note_assigned(&self, device: DeviceGlobalId) {
        self.load[device as usize].fetch_add(1, Ordering::AcqRel);
    }

    pub fn note_completed(&self, device: DeviceGlobalId) {
        self.load[device as usize].fetch_sub(1, Ordering::AcqRel);
    }

    fn route_with_topology(&self, task: &Task, candidates: &[DeviceGlobalId], topology: &dyn Topology) -> DeviceGlobalId {
        debug_assert!(!candidates.is_empty());
        let hint = task.device_info().and_then(|d| d.preferred);
        let min_load = candidates
            .iter()
            .map(|d| self.load[*d as usize].load(Ordering::Acquire))
            .min()
            .unwrap();

        candidates
            .iter()
            .filter(|d| self.load[**d as usize].load(Ordering::Acquire) == min_load)
            .min_by_key(|d| match hint {
                Some(h) => topology.distance(h, **d),
                None => 0,
            })
            .copied()
            .unwrap()
    }
}

impl Router for CfsRouter {
    fn route(&self, task: &Task, candidates: &[DeviceGlobalId]) -> DeviceGlobalId {
        self.route_with_topology(task, candidates, &crate::driver::FlatTopology::default())
    }
}
