//! Thread teams (spec.md §4.5, component C5).
//!
//! Grounded on `original_source/include/xkrt/team/team.h` and
//! `src/team/team.cc`: a team binds a set of worker threads to places
//! (devices or the whole machine) under a binding mode, and offers a
//! private barrier plus a bounded block-cyclic parallel-for split
//! across its members.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;

use parking_lot::{Condvar, Mutex};

use crate::error::DeviceGlobalId;

/// Binding granularity: threads are placed per-device or across the
/// whole machine irrespective of device boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Device,
    Machine,
}

/// Binding mode: whether consecutive team members land on the same
/// place (`Compact`) or are striped across all places (`Spread`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    Compact,
    Spread,
}

/// The three binding combinations spec.md §4.5 requires a team to
/// support, plus an escape hatch for caller-supplied placement.
#[derive(Debug, Clone)]
pub enum Binding {
    CompactDevice,
    SpreadMachine,
    Explicit(Vec<DeviceGlobalId>),
}

impl Binding {
    /// Computes a `thread index -> device` assignment for `nthreads`
    /// team members over `ndevices` devices, `nthreads_per_device`
    /// threads bound to each device under compact placement.
    pub fn assign(&self, nthreads: usize, ndevices: usize, nthreads_per_device: usize) -> Vec<DeviceGlobalId> {
        match self {
            Binding::CompactDevice => (0..nthreads)
                .map(|i| ((i / nthreads_per_device.max(1)) % ndevices.max(1)) as DeviceGlobalId)
                .collect(),
            Binding::SpreadMachine => (0..nthreads).map(|i| (i % ndevices.max(1)) as DeviceGlobalId).collect(),
            Binding::Explicit(v) => v.clone(),
        }
    }

    pub fn mode(&self) -> BindingMode {
        match self {
            Binding::CompactDevice => BindingMode::Compact,
            Binding::SpreadMachine => BindingMode::Spread,
            Binding::Explicit(_) => BindingMode::Compact,
        }
    }

    pub fn place(&self) -> Place {
        match self {
            Binding::CompactDevice => Place::Device,
            Binding::SpreadMachine => Place::Machine,
            Binding::Explicit(_) => Place::Device,
        }
    }
}

/// A bounded block-cyclic parallel-for split across `nmembers` team
/// threads: the iteration space `[0, total)` is cut into blocks of
/// `block_size`, handed out in cyclic order (member `m` takes blocks
/// `m, m + nmembers, m + 2*nmembers, ...`), with at most `capacity`
/// blocks claimed-but-unreleased at any time so no single member can
/// run arbitrarily far ahead of the rest (bounding peak working-set
/// footprint across the team).
pub struct ParallelFor {
    total: usize,
    block_size: usize,
    next_block: AtomicUsize,
    in_flight: Mutex<usize>,
    capacity: usize,
    cv: Condvar,
}

impl ParallelFor {
    pub fn new(total: usize, block_size: usize, capacity: usize) -> Self {
        ParallelFor {
            total,
            block_size: block_size.max(1),
            next_block: AtomicUsize::new(0),
            in_flight: Mutex::new(0),
            capacity: capacity.max(1),
            cv: Condvar::new(),
        }
    }

    fn nblocks(&self) -> usize {
        (self.total + self.block_size - 1) / self.block_size
    }

    fn block_range(&self, block: usize) -> (usize, usize) {
        let start = block * self.block_size;
        let end = (start + self.block_size).min(self.total);
        (start, end)
    }

    /// Claims the next block for `self` member, blocking until the
    /// in-flight ring has room. Returns `None` once all blocks have
    /// been claimed.
    pub fn claim(&self) -> Option<(usize, usize)> {
        let block = self.next_block.fetch_add(1, Ordering::AcqRel);
        if block >= self.nblocks() {
            return None;
        }
        let mut guard = self.in_flight.lock();
        while *guard >= self.capacity {
            self.cv.wait(&mut guard);
        }
        *guard += 1;
        Some(self.block_range(block))
    }

    /// Releases a previously claimed block, making room in the ring.
    pub fn release(&self) {
        let mut guard = self.in_flight.lock();
        *guard -= 1;
        self.cv.notify_one();
    }
}

/// A team of worker threads sharing a binding and a private barrier.
/// Grounded on `src/team/team.cc`'s `team_t`.
pub struct Team {
    pub binding: Binding,
    pub device_of: Vec<DeviceGlobalId>,
    barrier: Barrier,
}

impl Team {
    pub fn new(binding: Binding, nthreads: usize, ndevices: usize, nthreads_per_device: usize) -> Self {
        let device_of = binding.assign(nthreads, ndevices, nthreads_per_device);
        Team {
            binding,
            device_of,
            barrier: Barrier::new(nthreads),
        }
    }

    pub fn size(&self) -> usize {
        self.device_of.len()
    }

    pub fn device_for(&self, member: usize) -> DeviceGlobalId {
        self.device_of[member]
    }

    /// Blocks until every team member has reached this point. The
    /// barrier is private to the team and may be reused across
    /// successive parallel regions.
    pub fn barrier_wait(&self) {
        self.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_device_groups_contiguous_threads_per_device() {
        let b = Binding::CompactDevice;
        let assign = b.assign(8, 2, 4);
        assert_eq!(assign, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn spread_machine_stripes_threads_across_devices() {
        let b = Binding::SpreadMachine;
        let assign = b.assign(8, 2, 4);
        assert_eq!(assign, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn parallel_for_claims_every_block_exactly_once() {
        let pf = ParallelFor::new(10, 3, 2);
        let mut seen = Vec::new();
        while let Some((s, e)) = pf.claim() {
            seen.push((s, e));
            pf.release();
        }
        assert_eq!(seen, vec![(0, 3), (3, 6), (6, 9), (9, 10)]);
    }

    #[test]
    fn parallel_for_ring_never_exceeds_capacity() {
        let pf = ParallelFor::new(100, 1, 4);
        let mut claimed = 0;
        while claimed < 4 {
            assert!(pf.claim().is_some());
            claimed += 1;
        }
        assert_eq!(*pf.in_flight.lock(), 4);
    }
}
