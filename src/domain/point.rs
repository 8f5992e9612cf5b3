//! Dependency domain for point regions: one bucket per opaque key,
//! stored in a plain hash map (spec.md §4.6; point regions have no
//! useful notion of partial overlap, so no KHP-tree is needed).

use parking_lot::Mutex;
use std::collections::HashMap;

use super::{link, Bucket};
use crate::task::AccessRef;

#[derive(Default)]
pub struct PointDomain {
    buckets: Mutex<HashMap<u64, Bucket>>,
}

impl PointDomain {
    pub fn new() -> Self {
        PointDomain::default()
    }

    pub fn resolve(&self, key: u64, access: AccessRef) {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key).or_insert_with(Bucket::new);
        link(bucket, access);
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Point, Region};
    use crate::task::{Access, AccessMode, Task, TaskFlags, FORMAT_NULL};

    #[test]
    fn distinct_keys_get_distinct_buckets() {
        let domain = PointDomain::new();
        let t1 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Point(Point::new(1)), AccessMode::WRITE)], None);
        let t2 = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![Access::new(Region::Point(Point::new(2)), AccessMode::WRITE)], None);
        domain.resolve(1, crate::task::AccessRef::new(t1, 0));
        domain.resolve(2, crate::task::AccessRef::new(t2, 0));
        assert_eq!(domain.len(), 2);
    }
}
