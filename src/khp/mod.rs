//! KHP-tree: an ordered, self-balancing K-dimensional partition tree
//! storing disjoint leaf hyperrects that collectively cover the union
//! of all inserted regions (spec.md §4.2, component C2).
//!
//! This is the structure shared by the dependency domains (C6) and the
//! coherency controller (C7): each keeps its own payload type per leaf
//! (bucket state for C6, a `DeviceSet` for C7) over the same splitting
//! discipline.
//!
//! # Realization note
//!
//! The source maintains this as a pointer-linked binary tree with
//! optional red/black balancing (spec.md: "Optional red/black balancing
//! per axis for O(log n) depth" — explicitly optional). Per
//! `DESIGN_NOTES` §9 ("intrusive doubly-linked lists … represent as
//! arena + index"), this port keeps the leaves in a flat `Vec` (a
//! trivial arena addressed by position) rather than hand-rolling pointer
//! nodes; balancing is not implemented since the spec marks it optional,
//! and the leaf-disjointness and hook-firing contracts — the properties
//! §8 actually tests — do not depend on tree shape.

mod boxshape;

pub use boxshape::BoxShape;

/// A K-d partition tree over leaves of shape `B`, each carrying a
/// payload `P`.
#[derive(Debug, Clone)]
pub struct KhpTree<B, P> {
    leaves: Vec<(B, P)>,
}

impl<B, P> Default for KhpTree<B, P> {
    fn default() -> Self {
        KhpTree { leaves: Vec::new() }
    }
}

impl<B, P> KhpTree<B, P>
where
    B: BoxShape,
    P: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[(B, P)] {
        &self.leaves
    }

    pub fn clear(&mut self) {
        self.leaves.clear();
    }

    /// Split every leaf that only partially overlaps `region` into an
    /// inside part and one or more outside parts, so that afterwards
    /// every leaf is either fully inside or fully outside `region`.
    /// `on_shrink` fires once per outside part produced by a split.
    fn ensure_boundary(&mut self, region: &B, on_shrink: &mut dyn FnMut(&B, &P)) {
        let old = std::mem::take(&mut self.leaves);
        self.leaves.reserve(old.len());
        for (b, p) in old {
            if !region.intersects(&b) || region.contains(&b) {
                self.leaves.push((b, p));
                continue;
            }
            if let Some(inside) = b.intersect(region) {
                self.leaves.push((inside, p.clone()));
            }
            for outside in b.subtract(region) {
                on_shrink(&outside, &p);
                self.leaves.push((outside, p.clone()));
            }
        }
    }

    /// Insert `region` with `payload`, replacing whatever was
    /// previously recorded there. Leaves that only partially overlapped
    /// `region` are split first so the pieces outside `region` keep
    /// their previous payload (`on_shrink`); the pieces that end up
    /// fully inside `region` are discarded and replaced by one new leaf
    /// covering exactly `region` (`on_insert`).
    pub fn insert(
        &mut self,
        region: B,
        payload: P,
        mut on_insert: impl FnMut(&B, &P),
        mut on_shrink: impl FnMut(&B, &P),
    ) {
        self.ensure_boundary(&region, &mut on_shrink);
        self.leaves.retain(|(b, _)| !region.contains(b));
        on_insert(&region, &payload);
        self.leaves.push((region, payload));
    }

    /// Visit every leaf whose rect intersects `region`. The visitor
    /// returns `false` to stop early.
    pub fn intersect(&self, region: &B, mut visitor: impl FnMut(&B, &P) -> bool) {
        for (b, p) in &self.leaves {
            if region.intersects(b) {
                if !visitor(b, p) {
                    return;
                }
            }
        }
    }

    /// Ensure `region` is fully covered by leaves (creating new ones
    /// from `default` over any gap), then mutate every leaf now fully
    /// inside `region` in place with `f`. Used for owner-set unions
    /// (concurrent-writer completion, fetch-completion) where existing
    /// coverage must be merged into rather than replaced.
    pub fn update_or_insert(
        &mut self,
        region: B,
        default: P,
        mut f: impl FnMut(&mut P),
        mut on_shrink: impl FnMut(&B, &P),
    ) {
        self.ensure_boundary(&region, &mut on_shrink);

        let covered: Vec<B> = self
            .leaves
            .iter()
            .filter(|(b, _)| region.contains(b))
            .map(|(b, _)| *b)
            .collect();

        for (b, p) in self.leaves.iter_mut() {
            if region.contains(b) {
                f(p);
            }
        }

        let mut gaps = vec![region];
        for c in &covered {
            gaps = gaps
                .into_iter()
                .flat_map(|g| {
                    if g.intersects(c) {
                        g.subtract(c)
                    } else {
                        vec![g]
                    }
                })
                .collect();
        }

        for gap in gaps {
            let mut p = default.clone();
            f(&mut p);
            self.leaves.push((gap, p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Interval;

    #[test]
    fn insert_then_intersect_finds_leaf() {
        let mut tree: KhpTree<Interval, u32> = KhpTree::new();
        tree.insert(Interval::new(0, 10), 1, |_, _| {}, |_, _| {});
        let mut seen = Vec::new();
        tree.intersect(&Interval::new(5, 6), |_, p| {
            seen.push(*p);
            true
        });
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn overlapping_insert_splits_old_leaf_and_keeps_its_payload_outside() {
        let mut tree: KhpTree<Interval, u32> = KhpTree::new();
        tree.insert(Interval::new(0, 10), 1, |_, _| {}, |_, _| {});
        tree.insert(Interval::new(4, 6), 2, |_, _| {}, |_, _| {});

        let mut got = Vec::new();
        tree.intersect(&Interval::new(0, 10), |b, p| {
            got.push((*b, *p));
            true
        });
        got.sort_by_key(|(b, _)| b.start);

        assert_eq!(
            got,
            vec![
                (Interval::new(0, 4), 1),
                (Interval::new(4, 6), 2),
                (Interval::new(6, 10), 1),
            ]
        );
    }

    #[test]
    fn update_or_insert_unions_into_existing_and_fills_gaps() {
        let mut tree: KhpTree<Interval, u32> = KhpTree::new();
        tree.insert(Interval::new(0, 5), 0b01, |_, _| {}, |_, _| {});
        tree.update_or_insert(
            Interval::new(0, 10),
            0,
            |p| *p |= 0b10,
            |_, _| {},
        );

        let mut got = Vec::new();
        tree.intersect(&Interval::new(0, 10), |b, p| {
            got.push((*b, *p));
            true
        });
        got.sort_by_key(|(b, _)| b.start);
        assert_eq!(got, vec![(Interval::new(0, 5), 0b11), (Interval::new(5, 10), 0b10)]);
    }

    #[test]
    fn leaves_stay_disjoint_after_many_inserts() {
        let mut tree: KhpTree<Interval, u32> = KhpTree::new();
        for i in 0..20u64 {
            tree.insert(Interval::new(i, i + 3), i as u32, |_, _| {}, |_, _| {});
        }
        let leaves = tree.leaves();
        for i in 0..leaves.len() {
            for j in (i + 1)..leaves.len() {
                assert!(
                    !leaves[i].0.intersects(&leaves[j].0),
                    "leaves must remain disjoint: {:?} vs {:?}",
                    leaves[i].0,
                    leaves[j].0
                );
            }
        }
    }
}
