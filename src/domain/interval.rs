//! Dependency domain for interval regions, backed by a single
//! [`KhpTree`] over the global interval arena (spec.md §4.1: intervals
//! all share one base region).

use parking_lot::Mutex;

use super::{link, Bucket};
use crate::khp::KhpTree;
use crate::region::Interval;
use crate::task::AccessRef;

#[derive(Default)]
pub struct IntervalDomain {
    tree: Mutex<KhpTree<Interval, Bucket>>,
}

impl IntervalDomain {
    pub fn new() -> Self {
        IntervalDomain::default()
    }

    pub fn resolve(&self, region: Interval, access: AccessRef) {
        let mut tree = self.tree.lock();
        tree.update_or_insert(
            region,
            Bucket::new(),
            |bucket| link(bucket, access.clone()),
            |_, _| {},
        );
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.lock().leaves().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use crate::task::{Access, AccessMode, Task, TaskFlags, FORMAT_NULL};

    #[test]
    fn overlapping_resolutions_share_a_split_leaf() {
        let domain = IntervalDomain::new();
        let t1 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Interval(Interval::new(0, 10)), AccessMode::WRITE)], None);
        domain.resolve(Interval::new(0, 10), AccessRef::new(t1, 0));

        let t2 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Interval(Interval::new(4, 6)), AccessMode::READ)], None);
        domain.resolve(Interval::new(4, 6), AccessRef::new(t2, 0));

        assert_eq!(domain.leaf_count(), 3);
    }
}
