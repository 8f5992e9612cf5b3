//! Task data accesses (spec.md §3 "Access", component C3/C6).
//!
//! An [`Access`] names a region, the mode the task touches it in, its
//! concurrency class against sibling accesses to the same base region,
//! and its scope. Accesses are plain data stored on the owning
//! [`crate::task::Task`]; dependency resolution is driven through
//! [`AccessRef`], a lightweight `(task, index)` handle, since the task
//! that owns an access does not yet exist (as an `Arc`) at the point the
//! access list itself is built.

use std::sync::Arc;

use crate::region::Region;
use crate::task::Task;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMode: u8 {
        const READ     = 1 << 0;
        const WRITE    = 1 << 1;
        /// No actual data movement is implied; only ordering.
        const VIRTUAL  = 1 << 2;
        /// Completion of this access is reported separately from the
        /// task's own completion (paired with `TaskFlags::DETACHABLE`).
        const DETACHED = 1 << 3;
    }
}

impl AccessMode {
    pub const RW: AccessMode = AccessMode::READ.union(AccessMode::WRITE);

    pub fn is_write(self) -> bool {
        self.contains(AccessMode::WRITE)
    }

    pub fn is_read(self) -> bool {
        self.contains(AccessMode::READ)
    }
}

/// How this access may interleave with sibling accesses to the same
/// base region that are concurrent with it in program order (spec.md
/// §4.6 "three-bucket" domain semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concurrency {
    /// Must be ordered against every prior access (the common case).
    Sequential,
    /// Commutes with other commutative accesses of the same kind (e.g.
    /// concurrent reductions into disjoint accumulators).
    Commutative,
    /// May run fully concurrently with any other concurrent access.
    Concurrent,
}

/// Whether this access's region is shared coherency state across the
/// whole domain, or private to a single task subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Unified,
    NonUnified,
}

#[derive(Debug, Clone)]
pub struct Access {
    pub region: Region,
    pub mode: AccessMode,
    pub concurrency: Concurrency,
    pub scope: Scope,
}

impl Access {
    pub fn new(region: Region, mode: AccessMode) -> Self {
        Access {
            region,
            mode,
            concurrency: Concurrency::Sequential,
            scope: Scope::Unified,
        }
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

/// A handle to one access of a task, used by the dependency domains and
/// the engine so they never need to hold a raw index into someone
/// else's vector without the owning task alongside it.
#[derive(Debug, Clone)]
pub struct AccessRef {
    pub task: Arc<Task>,
    pub index: usize,
}

impl AccessRef {
    pub fn new(task: Arc<Task>, index: usize) -> Self {
        AccessRef { task, index }
    }

    pub fn access(&self) -> &Access {
        &self.task.accesses[self.index]
    }

    pub fn region(&self) -> &Region {
        &self.access().region
    }

    pub fn mode(&self) -> AccessMode {
        self.access().mode
    }

    pub fn concurrency(&self) -> Concurrency {
        self.access().concurrency
    }
}

impl PartialEq for AccessRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.task, &other.task) && self.index == other.index
    }
}

impl Eq for AccessRef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rw_combines_read_and_write_bits() {
        assert!(AccessMode::RW.is_read());
        assert!(AccessMode::RW.is_write());
    }
}
