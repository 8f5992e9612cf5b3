//! Coherency tracking for interval regions, backed by a [`KhpTree`]
//! over the global interval arena.

use parking_lot::Mutex;

use super::DeviceSet;
use crate::error::DeviceGlobalId;
use crate::khp::{BoxShape, KhpTree};
use crate::region::Interval;

#[derive(Default)]
pub struct IntervalCoherency {
    tree: Mutex<KhpTree<Interval, DeviceSet>>,
}

impl IntervalCoherency {
    pub fn new() -> Self {
        IntervalCoherency::default()
    }

    pub fn who_owns(&self, region: Interval) -> Vec<(Interval, DeviceSet)> {
        let tree = self.tree.lock();
        let mut out = Vec::new();
        tree.intersect(&region, |b, p| {
            out.push((*b, *p));
            true
        });
        out
    }

    /// Sub-regions of `region` that `device` does not yet own, each
    /// paired with a source device to copy from (`None` if the
    /// sub-region has no recorded owner at all — uninitialized memory).
    pub fn fetch_plan(&self, region: Interval, device: DeviceGlobalId) -> Vec<(Interval, Option<DeviceGlobalId>)> {
        let owned = self.who_owns(region);
        let mut gaps = vec![region];
        let mut plan = Vec::new();

        for (leaf, set) in &owned {
            gaps = gaps
                .into_iter()
                .flat_map(|g| if g.intersects(leaf) { g.subtract(leaf) } else { vec![g] })
                .collect();
            if !set.contains(device) {
                if let Some(inter) = region.intersection(leaf) {
                    plan.push((inter, set.any_owner()));
                }
            }
        }
        for gap in gaps {
            plan.push((gap, None));
        }
        plan
    }

    pub fn mark_fetched(&self, region: Interval, device: DeviceGlobalId) {
        let mut tree = self.tree.lock();
        tree.update_or_insert(region, DeviceSet::empty(), |set| super::apply_read_completion(set, device), |_, _| {});
        drop(tree);
        self.compact();
    }

    pub fn complete_write(&self, region: Interval, device: DeviceGlobalId) {
        let mut tree = self.tree.lock();
        tree.insert(region, DeviceSet::single(device), |_, _| {}, |_, _| {});
        drop(tree);
        self.compact();
    }

    pub fn complete_read(&self, region: Interval, device: DeviceGlobalId) {
        self.mark_fetched(region, device);
    }

    /// Merges adjacent leaves carrying an identical device set so the
    /// tree does not accumulate one leaf per historical fetch (spec.md
    /// §4.7 "contiguous-fetch merge policy").
    fn compact(&self) {
        let mut tree = self.tree.lock();
        let mut leaves: Vec<(Interval, DeviceSet)> = tree.leaves().to_vec();
        leaves.sort_by_key(|(b, _)| b.start);

        let mut merged: Vec<(Interval, DeviceSet)> = Vec::with_capacity(leaves.len());
        for (region, set) in leaves {
            if let Some(last) = merged.last_mut() {
                if last.0.end == region.start && last.1 == set {
                    last.0 = Interval::new(last.0.start, region.end);
                    continue;
                }
            }
            merged.push((region, set));
        }

        tree.clear();
        for (region, set) in merged {
            tree.insert(region, set, |_, _| {}, |_, _| {});
        }
    }
}
