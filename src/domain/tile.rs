//! Dependency domain for matrix-tile regions, one [`KhpTree`] per base
//! region — tiles sharing `(leading_dimension, element_size)` (spec.md
//! §4.1).

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{link, Bucket};
use crate::khp::KhpTree;
use crate::region::Rect;
use crate::task::AccessRef;

#[derive(Default)]
pub struct TileDomain {
    trees: Mutex<HashMap<(usize, usize), KhpTree<Rect, Bucket>>>,
}

impl TileDomain {
    pub fn new() -> Self {
        TileDomain::default()
    }

    pub fn resolve(&self, base: (usize, usize), rect: Rect, access: AccessRef) {
        let mut trees = self.trees.lock();
        let tree = trees.entry(base).or_default();
        tree.update_or_insert(
            rect,
            Bucket::new(),
            |bucket| link(bucket, access.clone()),
            |_, _| {},
        );
    }

    pub fn base_count(&self) -> usize {
        self.trees.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, StorageOrder, Tile};
    use crate::task::{Access, AccessMode, Task, TaskFlags, FORMAT_NULL};

    #[test]
    fn distinct_base_regions_get_distinct_trees() {
        let domain = TileDomain::new();
        let tile_a = Tile::new(0, 0, 4, 4, 16, 4, StorageOrder::RowMajor);
        let tile_b = Tile::new(0, 0, 4, 4, 32, 8, StorageOrder::RowMajor);

        let t1 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Tile(tile_a), AccessMode::WRITE)], None);
        domain.resolve((16, 4), Rect { row: 0, col: 0, rows: 4, cols: 4 }, AccessRef::new(t1, 0));

        let t2 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Tile(tile_b), AccessMode::WRITE)], None);
        domain.resolve((32, 8), Rect { row: 0, col: 0, rows: 4, cols: 4 }, AccessRef::new(t2, 0));

        assert_eq!(domain.base_count(), 2);
    }
}
