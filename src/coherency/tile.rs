//! Coherency tracking for matrix-tile regions, one [`KhpTree`] per base
//! region (`(ld, elem_size)`), mirroring [`super::interval`]. Unlike the
//! interval controller this does not compact adjacent leaves after a
//! fetch: a 2-D contiguous-band merge needs axis-aware stitching that
//! the interval case's simple "same start/end" rule cannot express, and
//! no tested scenario in spec.md §8 depends on tile leaf count staying
//! bounded, so it is left as unmerged per-fetch leaves.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::DeviceSet;
use crate::error::DeviceGlobalId;
use crate::khp::KhpTree;
use crate::region::Rect;

#[derive(Default)]
pub struct TileCoherency {
    trees: Mutex<HashMap<(usize, usize), KhpTree<Rect, DeviceSet>>>,
}

impl TileCoherency {
    pub fn new() -> Self {
        TileCoherency::default()
    }

    pub fn who_owns(&self, base: (usize, usize), region: Rect) -> Vec<(Rect, DeviceSet)> {
        let trees = self.trees.lock();
        let mut out = Vec::new();
        if let Some(tree) = trees.get(&base) {
            tree.intersect(&region, |b, p| {
                out.push((*b, *p));
                true
            });
        }
        out
    }

    pub fn fetch_plan(&self, base: (usize, usize), region: Rect, device: DeviceGlobalId) -> Vec<(Rect, Option<DeviceGlobalId>)> {
        let owned = self.who_owns(base, region);
        let mut gaps = vec![region];
        let mut plan = Vec::new();

        for (leaf, set) in &owned {
            gaps = gaps
                .into_iter()
                .flat_map(|g| if g.intersects(leaf) { crate::khp::BoxShape::subtract(&g, leaf) } else { vec![g] })
                .collect();
            if !set.contains(device) {
                if let Some(inter) = crate::khp::BoxShape::intersect(&region, leaf) {
                    plan.push((inter, set.any_owner()));
                }
            }
        }
        for gap in gaps {
            plan.push((gap, None));
        }
        plan
    }

    pub fn mark_fetched(&self, base: (usize, usize), region: Rect, device: DeviceGlobalId) {
        let mut trees = self.trees.lock();
        let tree = trees.entry(base).or_default();
        tree.update_or_insert(region, DeviceSet::empty(), |set| super::apply_read_completion(set, device), |_, _| {});
    }

    pub fn complete_write(&self, base: (usize, usize), region: Rect, device: DeviceGlobalId) {
        let mut trees = self.trees.lock();
        let tree = trees.entry(base).or_default();
        tree.insert(region, DeviceSet::single(device), |_, _| {}, |_, _| {});
    }

    pub fn complete_read(&self, base: (usize, usize), region: Rect, device: DeviceGlobalId) {
        self.mark_fetched(base, region, device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_plan_finds_a_source_once_a_writer_has_completed() {
        let coherency = TileCoherency::new();
        let base = (16, 4);
        let rect = Rect { row: 0, col: 0, rows: 4, cols: 4 };
        coherency.complete_write(base, rect, 0);
        let plan = coherency.fetch_plan(base, rect, 1);
        assert_eq!(plan, vec![(rect, Some(0))]);
    }
}
