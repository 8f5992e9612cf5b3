//! Task formats: a table mapping `format_id -> per-target entry points`
//! plus an optional target-suggestion function (spec.md §4.3).
//!
//! Grounded on `original_source/include/xkrt/task/format.h`. Format id
//! `0` is reserved as the "null format": a body-less task used as a
//! synthetic join node by the dependency domains (§4.6).

use std::sync::Arc;

use crate::task::{Access, Task, TaskFlags};

pub type FormatId = u16;

/// Sentinel id for the null (body-less, join-node) format.
pub const FORMAT_NULL: FormatId = 0;

/// Execution target kind, one per accelerator vendor plus the host.
/// Grounded on `original_source/include/xkrt/task/format.h`'s
/// `xkrt_task_format_target_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Target {
    Host = 0,
    Cuda = 1,
    Ze = 2,
    Cl = 3,
    Hip = 4,
    Sycl = 5,
}

pub const TARGET_COUNT: usize = 6;

impl Target {
    pub const ALL: [Target; TARGET_COUNT] = [
        Target::Host,
        Target::Cuda,
        Target::Ze,
        Target::Cl,
        Target::Hip,
        Target::Sycl,
    ];

    pub fn index(self) -> usize {
        self as u8 as usize
    }
}

/// Capability a running task body is given: access to itself and to a
/// handful of engine operations (spawning children, extending its own
/// completion horizon). Implemented by the task engine (C10); kept as a
/// trait here so `task` does not depend on `engine`.
pub trait TaskContext: Send + Sync {
    /// The task currently executing.
    fn task(&self) -> &Arc<Task>;

    /// Extend this task's completion horizon past body-return (only
    /// meaningful if the task carries the `DETACHABLE` flag).
    fn detach_incr(&self);

    /// Signal one outstanding detached event has completed.
    fn detach_decr(&self);

    /// Spawns a child of the currently executing task: resolved against
    /// the same dependency domains as any other task, with `task()`
    /// registered as its parent so the running task's completion waits
    /// on it (`cc`, spec.md §4.3). Lets a task body recurse (e.g. a
    /// divide-and-conquer kernel spawning its own sub-problems) without
    /// reaching for the engine directly.
    fn spawn(&self, format: FormatId, flags: TaskFlags, accesses: Vec<Access>, args: Option<Box<dyn std::any::Any + Send + Sync>>) -> Arc<Task>;
}

pub type BodyFn = dyn Fn(&dyn TaskContext) + Send + Sync;
pub type SuggestFn = dyn Fn(&Task) -> Option<Target> + Send + Sync;

/// A single registered task format: its per-target bodies and an
/// optional suggestion function.
#[derive(Clone)]
pub struct Format {
    pub label: String,
    entries: [Option<Arc<BodyFn>>; TARGET_COUNT],
    pub suggest: Option<Arc<SuggestFn>>,
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format")
            .field("label", &self.label)
            .field(
                "targets",
                &Target::ALL
                    .iter()
                    .filter(|t| self.entries[t.index()].is_some())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Format {
    pub fn new(label: impl Into<String>) -> Self {
        Format {
            label: label.into(),
            entries: Default::default(),
            suggest: None,
        }
    }

    pub fn with_entry(mut self, target: Target, f: impl Fn(&dyn TaskContext) + Send + Sync + 'static) -> Self {
        self.entries[target.index()] = Some(Arc::new(f));
        self
    }

    pub fn with_suggest(mut self, f: impl Fn(&Task) -> Option<Target> + Send + Sync + 'static) -> Self {
        self.suggest = Some(Arc::new(f));
        self
    }

    pub fn entry(&self, target: Target) -> Option<&Arc<BodyFn>> {
        self.entries[target.index()].as_ref()
    }

    pub fn has_entry(&self, target: Target) -> bool {
        self.entries[target.index()].is_some()
    }
}

/// Registry of all formats registered with a `Runtime`. Format ids are
/// dense and assigned at registration; id `0` is reserved for the null
/// format (spec.md §4.3).
#[derive(Debug, Default)]
pub struct FormatTable {
    formats: Vec<Format>,
}

impl FormatTable {
    pub fn new() -> Self {
        let mut table = FormatTable { formats: Vec::new() };
        // Null format occupies id 0.
        table.formats.push(Format::new("null"));
        table
    }

    pub fn register(&mut self, format: Format) -> FormatId {
        let id = self.formats.len() as FormatId;
        self.formats.push(format);
        id
    }

    pub fn get(&self, id: FormatId) -> Option<&Format> {
        self.formats.get(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_format_occupies_id_zero() {
        let table = FormatTable::new();
        assert_eq!(table.get(FORMAT_NULL).unwrap().label, "null");
    }

    #[test]
    fn registration_assigns_dense_ids() {
        let mut table = FormatTable::new();
        let a = table.register(Format::new("a"));
        let b = table.register(Format::new("b"));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }
}
