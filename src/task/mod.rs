//! Task object model (spec.md §3, §4.3, component C3).
//!
//! Grounded on `original_source/include/xkrt/task/task.h`. The C
//! original lays a task out as a fixed header followed by optional
//! tail blocks (dependency-info, device-info, domain block, argument
//! blob) sized and placed by a precomputed layout so one `malloc` can
//! serve the whole record. This realization (DESIGN NOTES §9) instead
//! gives every task an `Arc`-owned header with `Option`al tail fields;
//! there is no separate arena, and a `Weak<Task>` stands in for the
//! original's raw parent pointer.

pub mod access;
pub mod flags;
pub mod format;
pub mod state;

use std::any::Any;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::DeviceGlobalId;
use crate::region::Region;
pub use access::{Access, AccessMode, AccessRef, Concurrency, Scope};
pub use flags::TaskFlags;
pub use format::{FormatId, Target, FORMAT_NULL};
pub use state::TaskState;

static NEXT_TASK_ID: AtomicUsize = AtomicUsize::new(1);

/// Debug/logging identity only; carries no safety meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    fn next() -> TaskId {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a moldable task (`TaskFlags::MOLDABLE`) may be split before it
/// enters `DATA_FETCHING` (spec.md §4.3, Open Question resolved in
/// DESIGN.md: split granularity is declared per region class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPolicy {
    NoSplit,
    /// Halve an interval's region at its midpoint.
    Halves,
    /// Quarter a tile along both axes.
    Quadrant,
    HalvesHorizontal,
    HalvesVertical,
    /// Consults the task's own [`Task::custom_split`] closure, set via
    /// [`Task::set_custom_split`]. Supported for every region class
    /// (spec.md §9 Open Question: `custom` is fully implemented
    /// regardless of region shape, unlike `quadrant`/`halves_*`).
    Custom,
}

/// A caller-supplied split rule for `SplitPolicy::Custom`. Given the
/// region being split, returns the sub-regions to recurse into; an
/// empty or single-element result is treated as "do not split further".
pub type CustomSplitFn = dyn Fn(&Region) -> Vec<Region> + Send + Sync;

/// Optional tail block present only on a `MOLDABLE` task.
#[derive(Debug, Clone, Copy)]
pub struct MoldableInfo {
    pub policy: SplitPolicy,
    /// Recursion stops once a split piece's region volume falls at or
    /// below this count.
    pub min_volume: usize,
}

/// Optional tail block present only on a `DEVICE` task: the caller's
/// placement hint. The engine may override it via the router (C9) if
/// absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceInfo {
    pub preferred: Option<DeviceGlobalId>,
}

/// A task object (spec.md §3). Shared via `Arc`; children hold a
/// `Weak` back-reference to their parent to avoid an ownership cycle.
pub struct Task {
    pub id: TaskId,
    pub format: FormatId,
    pub flags: TaskFlags,
    pub parent: Option<Weak<Task>>,

    /// Predecessor counter. Starts at 1 (a guard unit held by the
    /// spawner) plus one unit per unresolved predecessor edge found
    /// during dependency resolution; the guard unit is released once
    /// resolution finishes, so a task with no predecessors still
    /// transitions cleanly (spec.md §4.3, simplification documented in
    /// DESIGN.md).
    wc: AtomicUsize,
    /// Number of not-yet-completed children.
    cc: AtomicUsize,
    /// Number of not-yet-fulfilled detached completions.
    dc: AtomicUsize,

    state: AtomicU8,
    successors: Mutex<Vec<Arc<Task>>>,

    /// Set once this task's own work (body execution, or for a
    /// moldable-split container, the split itself) has finished. A
    /// task is ready to be marked `Completed` once this is set *and*
    /// `cc` has reached zero — whichever of the two happens last is
    /// responsible for calling completion (component C10).
    body_done: std::sync::atomic::AtomicBool,

    pub accesses: Vec<Access>,
    device_info: Mutex<Option<DeviceInfo>>,
    moldable: Mutex<Option<MoldableInfo>>,
    custom_split: Mutex<Option<Arc<CustomSplitFn>>>,
    assigned_target: Mutex<Option<Target>>,

    /// Opaque argument blob handed to the task body; downcast by the
    /// body itself (it alone knows the format's argument type).
    pub args: Option<Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("flags", &self.flags)
            .field("state", &self.state())
            .field("wc", &self.wc.load(Ordering::Relaxed))
            .field("cc", &self.cc.load(Ordering::Relaxed))
            .field("dc", &self.dc.load(Ordering::Relaxed))
            .finish()
    }
}

impl Task {
    /// Constructs a task in `Allocated` state with `wc` holding only the
    /// spawner's guard unit. Dependency resolution (C6) adds one unit
    /// of `wc` per live predecessor edge it discovers, then releases the
    /// guard via [`Task::release_guard`].
    pub fn new(
        format: FormatId,
        flags: TaskFlags,
        parent: Option<Weak<Task>>,
        accesses: Vec<Access>,
        args: Option<Box<dyn Any + Send + Sync>>,
    ) -> Arc<Task> {
        debug_assert!(flags.is_valid(), "DOMAIN and DEVICE are mutually exclusive");
        Arc::new(Task {
            id: TaskId::next(),
            format,
            flags,
            parent,
            wc: AtomicUsize::new(1),
            cc: AtomicUsize::new(0),
            dc: AtomicUsize::new(0),
            state: AtomicU8::new(TaskState::Allocated as u8),
            successors: Mutex::new(Vec::new()),
            body_done: std::sync::atomic::AtomicBool::new(false),
            accesses,
            device_info: Mutex::new(None),
            moldable: Mutex::new(None),
            custom_split: Mutex::new(None),
            assigned_target: Mutex::new(None),
            args,
        })
    }

    pub fn device_info(&self) -> Option<DeviceInfo> {
        *self.device_info.lock()
    }

    pub fn set_device_info(&self, info: Option<DeviceInfo>) {
        *self.device_info.lock() = info;
    }

    pub fn moldable(&self) -> Option<MoldableInfo> {
        *self.moldable.lock()
    }

    pub fn set_moldable(&self, info: Option<MoldableInfo>) {
        *self.moldable.lock() = info;
    }

    /// Installs the split rule consulted when this task carries
    /// `SplitPolicy::Custom`. No-op for any other policy.
    pub fn set_custom_split(&self, f: impl Fn(&Region) -> Vec<Region> + Send + Sync + 'static) {
        *self.custom_split.lock() = Some(Arc::new(f));
    }

    pub fn custom_split(&self) -> Option<Arc<CustomSplitFn>> {
        self.custom_split.lock().clone()
    }

    pub fn state(&self) -> TaskState {
        match self.state.load(Ordering::Acquire) {
            0 => TaskState::Allocated,
            1 => TaskState::Ready,
            2 => TaskState::DataFetching,
            3 => TaskState::DataFetched,
            4 => TaskState::Executing,
            5 => TaskState::Completed,
            _ => TaskState::Deallocated,
        }
    }

    /// Advances the state machine, panicking if `next` is not the
    /// immediate successor of the current state — a violation of this
    /// invariant is a scheduler bug, not a recoverable error.
    pub fn advance_state(&self, next: TaskState) {
        let cur = self.state();
        assert!(
            cur.can_advance_to(next),
            "illegal task state transition {} -> {}",
            cur,
            next
        );
        self.state.store(next as u8, Ordering::Release);
    }

    /// Adds one unit to the predecessor counter. Called once per live
    /// predecessor edge discovered during resolution (C6).
    pub fn wc_incr(&self) {
        self.wc.fetch_add(1, Ordering::AcqRel);
    }

    /// Releases one unit of the predecessor counter (either the
    /// spawner's guard, or a predecessor's completion). Returns `true`
    /// iff this was the unit that brought the counter to zero, i.e. the
    /// task is now ready to commit.
    pub fn wc_decr(&self) -> bool {
        self.wc.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Releases the spawner's guard unit set at construction. Returns
    /// `true` iff the task had no live predecessors and is ready to
    /// commit immediately.
    pub fn release_guard(&self) -> bool {
        self.wc_decr()
    }

    pub fn cc_incr(&self) {
        self.cc.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns `true` iff this was the last outstanding child.
    pub fn cc_decr(&self) -> bool {
        self.cc.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn cc_is_zero(&self) -> bool {
        self.cc.load(Ordering::Acquire) == 0
    }

    /// Marks this task's own work as finished. Returns `true` iff `cc`
    /// is already zero, meaning the caller should proceed straight to
    /// completing the task rather than waiting on outstanding children.
    pub fn mark_body_done(&self) -> bool {
        self.body_done.store(true, Ordering::Release);
        self.cc_is_zero()
    }

    pub fn is_body_done(&self) -> bool {
        self.body_done.load(Ordering::Acquire)
    }

    pub fn detach_incr(&self) {
        debug_assert!(self.flags.contains(TaskFlags::DETACHABLE));
        self.dc.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns `true` iff this was the last outstanding detached event.
    pub fn detach_decr(&self) -> bool {
        self.dc.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn dc_is_zero(&self) -> bool {
        self.dc.load(Ordering::Acquire) == 0
    }

    /// Registers `successor` to be notified when `self` completes. Must
    /// be called before `self` reaches `Completed`; callers serialize
    /// this against completion via the same domain lock that decides
    /// completion order.
    pub fn push_successor(&self, successor: Arc<Task>) {
        self.successors.lock().push(successor);
    }

    pub fn take_successors(&self) -> Vec<Arc<Task>> {
        std::mem::take(&mut *self.successors.lock())
    }

    pub fn assigned_target(&self) -> Option<Target> {
        *self.assigned_target.lock()
    }

    pub fn set_assigned_target(&self, target: Target) {
        *self.assigned_target.lock() = Some(target);
    }

    pub fn parent(&self) -> Option<Arc<Task>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_join_node(&self) -> bool {
        self.format == FORMAT_NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wc_guard_releases_to_zero_with_no_predecessors() {
        let t = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![], None);
        assert!(t.release_guard());
    }

    #[test]
    fn wc_guard_holds_while_predecessor_edges_are_live() {
        let t = Task::new(FORMAT_NULL, TaskFlags::DEPENDENT, None, vec![], None);
        t.wc_incr();
        assert!(!t.release_guard());
        assert!(t.wc_decr());
    }

    #[test]
    fn state_machine_rejects_illegal_jumps() {
        let t = Task::new(FORMAT_NULL, TaskFlags::empty(), None, vec![], None);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            t.advance_state(TaskState::Executing);
        }));
        assert!(res.is_err());
    }

    #[test]
    fn cc_decr_reports_last_child() {
        let t = Task::new(FORMAT_NULL, TaskFlags::empty(), None, vec![], None);
        t.cc_incr();
        t.cc_incr();
        assert!(!t.cc_decr());
        assert!(t.cc_decr());
    }
}
