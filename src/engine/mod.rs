//! Task engine (spec.md §4.10, component C10): spawn, dependency
//! resolution, commit, moldable-split, device dispatch, and completion.
//!
//! Grounded on `original_source/src/task/task.cc` and
//! `src/task/commit.cc`. The pipeline a task passes through:
//!
//! 1. **spawn** — allocate the task, link each access against its
//!    region's dependency domain (C6), incrementing `wc` once per live
//!    predecessor edge found.
//! 2. **commit** — once `wc` reaches zero, advance `Allocated -> Ready`.
//!    A moldable task that should still be split recurses into child
//!    tasks here instead of proceeding to execution.
//! 3. **dispatch** — pick a device (C9's router), mark the coherency
//!    state of each access's replica set, advance through
//!    `DataFetching -> DataFetched`.
//! 4. **execute** — submit the task body to that device's command
//!    queue (C8) as a `KernelLaunch`, advance to `Executing`.
//! 5. **complete** — on launch completion, apply the write/read
//!    coherency update rule per access, advance to `Completed`, and
//!    cascade: release one `wc` unit from every successor (committing
//!    any that reach zero), and one `cc` unit from the parent
//!    (completing it too if its own body is already done).
//!
//! The host driver (the only backend this crate ships) completes every
//! command synchronously inside `launch`, so steps 3-5 above run
//! inline within `commit` with no separate polling loop required; an
//! asynchronous backend would instead have a worker thread call
//! `CommandQueue::progress` periodically (component C4's progress
//! loop does exactly that, see `thread::Thread::find_task`).
//!
//! Fetch (step 3, spec.md §4.7): `fetch_replicas` asks the owning
//! coherency controller for the not-yet-valid subset of each read
//! access's region against the routed device, and for any sub-region
//! with a live source elsewhere, submits a real `Copy1D`/`Copy2D` on
//! the destination device's own queue before recording the new
//! ownership — region addresses double as byte offsets into every
//! device's `MemoryArea`, the same convention `runtime::file_io` uses
//! for its buffer-offset accesses. Point regions carry no byte length
//! (`Region::len` is fixed at 1), so a point "fetch" only updates
//! ownership; there is nothing to copy.

mod domains;

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::config::Config;
use crate::device::{DeviceSet, Router, HOST_DEVICE};
use crate::driver::Driver;
use crate::error::DeviceGlobalId;
use crate::queue::{Command, CommandQueue};
use crate::task::access::AccessRef;
use crate::task::format::{FormatTable, Target};
use crate::task::{Access, DeviceInfo, FormatId, MoldableInfo, SplitPolicy, Task, TaskFlags, TaskState};

use domains::{Coherencies, Domains};

pub use crate::task::format::Format;

pub struct Engine {
    pub formats: RwLock<FormatTable>,
    domains: Domains,
    coherencies: Coherencies,
    pub devices: DeviceSet,
    router: Box<dyn Router>,
    queues: Vec<CommandQueue>,
    pub config: Config,
    /// Back-reference to the `Arc` this engine is held by, so a command
    /// completion callback (which must be `'static`, since an
    /// asynchronous driver may invoke it from a background thread long
    /// after `dispatch` returns) can reach the engine without an
    /// ownership cycle (DESIGN NOTES §9: weak back-references in place
    /// of raw pointers).
    self_weak: Weak<Engine>,
}

impl Engine {
    pub fn new(devices: DeviceSet, router: Box<dyn Router>, drivers: Vec<Arc<dyn Driver>>, config: Config) -> Arc<Self> {
        assert_eq!(devices.len(), drivers.len(), "one driver per device is required");
        let queues: Vec<CommandQueue> = drivers
            .into_iter()
            .map(|d| CommandQueue::new(d, 256, config.stream_concurrency.max(1)))
            .collect();
        Arc::new_cyclic(|self_weak| Engine {
            formats: RwLock::new(FormatTable::new()),
            domains: Domains::default(),
            coherencies: Coherencies::default(),
            devices,
            router,
            queues,
            config,
            self_weak: self_weak.clone(),
        })
    }

    pub fn register_format(&self, format: Format) -> FormatId {
        self.formats.write().register(format)
    }

    /// Spawns a task: resolves each access against its region's
    /// dependency domain, then commits it immediately if it has no
    /// live predecessor. The parent, if any, is whatever task this OS
    /// thread is presently running a body for (thread-local; see
    /// `thread::current_task`).
    pub fn spawn(
        &self,
        format: FormatId,
        flags: TaskFlags,
        accesses: Vec<Access>,
        args: Option<Box<dyn std::any::Any + Send + Sync>>,
        device_info: Option<DeviceInfo>,
        moldable: Option<MoldableInfo>,
    ) -> Arc<Task> {
        let parent = crate::thread::current_task();
        self.spawn_with_parent(parent, format, flags, accesses, args, device_info, moldable)
    }

    /// Spawns a task explicitly parented to `parent`, bypassing the
    /// thread-local lookup `spawn` uses. Lets a running task's own
    /// [`TaskContext::spawn`] register itself as the new task's parent
    /// even when its body is not running inside a
    /// `thread::Thread::scoped_current` block (the synchronous host
    /// driver dispatches bodies inline, not through that scaffolding).
    pub(crate) fn spawn_with_parent(
        &self,
        parent: Option<Arc<Task>>,
        format: FormatId,
        flags: TaskFlags,
        accesses: Vec<Access>,
        args: Option<Box<dyn std::any::Any + Send + Sync>>,
        device_info: Option<DeviceInfo>,
        moldable: Option<MoldableInfo>,
    ) -> Arc<Task> {
        let parent_weak = parent.as_ref().map(Arc::downgrade);

        let task = Task::new(format, flags, parent_weak, accesses, args);
        task.set_device_info(device_info);
        task.set_moldable(moldable);

        if let Some(p) = &parent {
            p.cc_incr();
        }

        self.resolve_accesses(&task);

        if task.release_guard() {
            self.commit(task.clone());
        }
        task
    }

    fn resolve_accesses(&self, task: &Arc<Task>) {
        for (index, access) in task.accesses.iter().enumerate() {
            let access_ref = AccessRef::new(task.clone(), index);
            match &access.region {
                crate::region::Region::Point(p) => self.domains.point.resolve(p.key, access_ref),
                crate::region::Region::Interval(i) => self.domains.interval.resolve(*i, access_ref),
                crate::region::Region::Tile(t) => {
                    let base = (t.ld, t.elem_size);
                    let (first, second) = t.decompose();
                    self.domains.tile.resolve(base, first, access_ref.clone());
                    if let Some(second) = second {
                        self.domains.tile.resolve(base, second, access_ref);
                    }
                }
            }
        }
    }

    /// Advances a task whose `wc` has reached zero from `Allocated`
    /// through to either a moldable split or full dispatch+execution.
    fn commit(&self, task: Arc<Task>) {
        task.advance_state(TaskState::Ready);

        if task.is_join_node() {
            // Synthetic join nodes carry no body and no accesses of
            // their own; they exist purely to collapse fan-in (C6).
            self.finish_without_body(task);
            return;
        }

        if let Some(children) = self.try_split(&task) {
            for child in children {
                task.cc_incr();
                self.resolve_accesses(&child);
                if child.release_guard() {
                    self.commit(child);
                }
            }
            self.finish_without_body(task);
            return;
        }

        let device = self.route(&task);
        self.fetch_replicas(&task, device);
        task.advance_state(TaskState::DataFetching);
        task.advance_state(TaskState::DataFetched);
        self.dispatch(task, device);
    }

    /// A task whose own work needs no execution step (a join node, or
    /// a moldable container that only spawned children) goes straight
    /// to the completion cascade once its children (if any) are done.
    /// Still has to pass through every intermediate state on the way:
    /// `advance_state` only allows stepping one state at a time, and
    /// this is called right after `commit` advanced the task to just
    /// `Ready`.
    fn finish_without_body(&self, task: Arc<Task>) {
        task.advance_state(TaskState::DataFetching);
        task.advance_state(TaskState::DataFetched);
        task.advance_state(TaskState::Executing);
        if task.mark_body_done() {
            self.complete(task);
        }
    }

    /// Splits `task` into children per its `MoldableInfo`, if it still
    /// exceeds `min_volume`. Simplification: a moldable task with more
    /// than one access is split independently per access, rather than
    /// producing children that each carry one subdivided region plus
    /// every other access held whole — the common moldable task (a
    /// single kernel over one region) is unaffected.
    fn try_split(&self, task: &Arc<Task>) -> Option<Vec<Arc<Task>>> {
        let info = task.moldable()?;
        if info.policy == SplitPolicy::NoSplit {
            return None;
        }
        if task.accesses.iter().all(|a| a.region.len() <= info.min_volume) {
            return None;
        }

        let custom = task.custom_split();
        let mut children = Vec::new();
        for access in &task.accesses {
            let pieces = match (info.policy, &custom) {
                (SplitPolicy::Custom, Some(f)) => f(&access.region),
                (SplitPolicy::Custom, None) => vec![access.region.clone()],
                _ => split_region(&access.region, info.policy),
            };
            if pieces.len() <= 1 {
                return None;
            }
            for region in pieces {
                let mut split_access = access.clone();
                split_access.region = region;
                let mut flags = task.flags;
                flags.remove(TaskFlags::MOLDABLE);
                let child = Task::new(task.format, flags, Some(Arc::downgrade(task)), vec![split_access], None);
                child.set_moldable(Some(MoldableInfo { policy: SplitPolicy::NoSplit, ..info }));
                children.push(child);
            }
        }
        Some(children)
    }

    fn route(&self, task: &Task) -> DeviceGlobalId {
        if let Some(DeviceInfo { preferred: Some(d) }) = task.device_info() {
            return d;
        }
        if task.flags.contains(TaskFlags::DEVICE) {
            let candidates = self.devices.ids_for_target_not(Target::Host);
            assert!(!candidates.is_empty(), "a DEVICE task was spawned with no accelerator devices configured");
            return self.router.route(task, &candidates);
        }
        HOST_DEVICE
    }

    /// Brings `device`'s replica of every read access up to date before
    /// dispatch (spec.md §4.7 `fetch`): ask the owning coherency
    /// controller which sub-regions `device` does not already hold a
    /// valid copy of, and for each one that has a live source
    /// elsewhere, submit a real `Copy1D`/`Copy2D` on `device`'s own
    /// queue before recording the new ownership. A sub-region with no
    /// recorded owner at all is uninitialized memory: nothing to copy,
    /// only bookkeeping to update.
    ///
    /// Every device's `MemoryArea` is addressed by the same flat
    /// coordinate space a region's own numeric key already uses (the
    /// convention `runtime::file_io`'s buffer-offset accesses rely on
    /// too), so a region's address doubles as the byte offset to copy
    /// at on both ends without a separate registration step.
    fn fetch_replicas(&self, task: &Task, device: DeviceGlobalId) {
        for access in &task.accesses {
            if access.mode.contains(crate::task::AccessMode::VIRTUAL) || !access.mode.is_read() {
                continue;
            }
            match &access.region {
                crate::region::Region::Point(p) => {
                    // Points carry no byte length (`Region::len` is
                    // fixed at 1 for a point and the key is an opaque
                    // identifier, not necessarily a copyable address),
                    // so there is nothing to move; fetch degenerates to
                    // recording ownership once the device doesn't
                    // already have it.
                    if !self.coherencies.point.who_owns(p.key).contains(device) {
                        self.coherencies.point.mark_fetched(p.key, device);
                    }
                }
                crate::region::Region::Interval(i) => self.fetch_interval(*i, device),
                crate::region::Region::Tile(t) => {
                    let base = (t.ld, t.elem_size);
                    let (first, second) = t.decompose();
                    self.fetch_tile_rect(base, first, t.order, t.elem_size, device);
                    if let Some(second) = second {
                        self.fetch_tile_rect(base, second, t.order, t.elem_size, device);
                    }
                }
            }
        }
    }

    fn fetch_interval(&self, region: crate::region::Interval, device: DeviceGlobalId) {
        for (sub, source) in self.coherencies.interval.fetch_plan(region, device) {
            if sub.is_empty() {
                continue;
            }
            if let Some(src) = source {
                let src_buf = self.devices.get(src).expect("fetch source device must exist").memory.buffer();
                let dst_buf = self.devices.get(device).expect("fetch destination device must exist").memory.buffer();
                let offset = sub.start as usize;
                self.run_copy_inline(
                    device,
                    Command::Copy1D {
                        src: src_buf,
                        src_offset: offset,
                        dst: dst_buf,
                        dst_offset: offset,
                        len: sub.len(),
                    },
                );
            }
            self.coherencies.interval.mark_fetched(sub, device);
        }
    }

    fn fetch_tile_rect(
        &self,
        base: (usize, usize),
        rect: crate::region::Rect,
        order: crate::region::StorageOrder,
        elem_size: usize,
        device: DeviceGlobalId,
    ) {
        let ld = base.0;
        for (sub, source) in self.coherencies.tile.fetch_plan(base, rect, device) {
            if sub.rows == 0 || sub.cols == 0 {
                continue;
            }
            if let Some(src) = source {
                let src_buf = self.devices.get(src).expect("fetch source device must exist").memory.buffer();
                let dst_buf = self.devices.get(device).expect("fetch destination device must exist").memory.buffer();
                // `Copy2D` walks `rows` strides of `src_ld`/`dst_ld`
                // elements, copying `cols` contiguous elements each.
                // Column-major storage packs elements column-by-column
                // (offset = col*ld + row), which is the same shape with
                // the rectangle's row/col axes swapped.
                let (offset_elems, outer, inner) = match order {
                    crate::region::StorageOrder::RowMajor => (sub.row * ld + sub.col, sub.rows, sub.cols),
                    crate::region::StorageOrder::ColumnMajor => (sub.col * ld + sub.row, sub.cols, sub.rows),
                };
                let offset = offset_elems * elem_size;
                self.run_copy_inline(
                    device,
                    Command::Copy2D {
                        src: src_buf,
                        src_offset: offset,
                        src_ld: ld,
                        dst: dst_buf,
                        dst_offset: offset,
                        dst_ld: ld,
                        elem_size,
                        rows: outer,
                        cols: inner,
                    },
                );
            }
            self.coherencies.tile.mark_fetched(base, sub, device);
        }
    }

    /// Submits a copy command on `device`'s queue and drains it before
    /// returning. The host driver executes every command synchronously
    /// inline, so this is enough to guarantee the bytes are in place
    /// before the coherency update that follows each call site; an
    /// asynchronous backend would instead need its own progress loop to
    /// have drained the command by here.
    fn run_copy_inline(&self, device: DeviceGlobalId, command: Command) {
        let queue = &self.queues[device as usize];
        queue.submit(command, vec![]).expect("command ring exhausted");
        queue.launch_ready().expect("host driver launch cannot fail");
        queue.progress();
    }

    fn apply_completion_coherency(&self, task: &Task, device: DeviceGlobalId) {
        for access in &task.accesses {
            if access.mode.contains(crate::task::AccessMode::VIRTUAL) {
                continue;
            }
            let is_write = access.mode.is_write();
            match &access.region {
                crate::region::Region::Point(p) => {
                    if is_write {
                        self.coherencies.point.complete_write(p.key, device);
                    } else {
                        self.coherencies.point.complete_read(p.key, device);
                    }
                }
                crate::region::Region::Interval(i) => {
                    if is_write {
                        self.coherencies.interval.complete_write(*i, device);
                    } else {
                        self.coherencies.interval.complete_read(*i, device);
                    }
                }
                crate::region::Region::Tile(t) => {
                    let base = (t.ld, t.elem_size);
                    let (first, second) = t.decompose();
                    for rect in std::iter::once(first).chain(second) {
                        if is_write {
                            self.coherencies.tile.complete_write(base, rect, device);
                        } else {
                            self.coherencies.tile.complete_read(base, rect, device);
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&self, task: Arc<Task>, device: DeviceGlobalId) {
        task.set_assigned_target(self.devices.get(device).expect("routed device must exist").target);
        task.advance_state(TaskState::Executing);

        let formats = self.formats.read();
        let format = formats.get(task.format).expect("task carries an unregistered format id");
        let target = task.assigned_target().unwrap();
        let body = format.entry(target).cloned();
        drop(formats);

        let engine_weak = self.self_weak.clone();
        let task_for_cb = task.clone();
        let callback: crate::queue::CompletionCallback = Box::new(move || {
            if let Some(engine) = engine_weak.upgrade() {
                engine.on_task_executed(task_for_cb, device);
            }
        });

        match body {
            Some(body) => {
                let ctx: Arc<dyn crate::task::format::TaskContext> = Arc::new(EngineTaskContext {
                    task: task.clone(),
                    engine: self.self_weak.clone(),
                });
                let queue = &self.queues[device as usize];
                queue
                    .submit(Command::KernelLaunch { ctx, body }, vec![callback])
                    .expect("command ring exhausted");
                queue.launch_ready().expect("host driver launch cannot fail");
                queue.progress();
            }
            None => {
                // No body registered for this target: treat as an
                // immediate no-op execution (host-only null formats).
                drop(callback);
                self.on_task_executed(task, device);
            }
        }
    }

    fn on_task_executed(&self, task: Arc<Task>, device: DeviceGlobalId) {
        self.apply_completion_coherency(&task, device);
        if task.flags.contains(TaskFlags::DETACHABLE) && !task.dc_is_zero() {
            // Completion deferred until the body's own detach_decr
            // calls drain the counter; the last one calls complete().
            return;
        }
        if task.mark_body_done() {
            self.complete(task);
        }
    }

    /// Completes `task`: advances it to `Completed`, releases one `wc`
    /// unit from each successor (committing it if that was its last),
    /// and one `cc` unit from the parent (completing it too if its own
    /// body was already finished).
    fn complete(&self, task: Arc<Task>) {
        task.advance_state(TaskState::Completed);

        for successor in task.take_successors() {
            if successor.wc_decr() {
                self.commit(successor);
            }
        }

        if let Some(parent) = task.parent() {
            if parent.cc_decr() && parent.is_body_done() {
                self.complete(parent);
            }
        }
    }

    /// Called by a detachable task's body once all of its detached
    /// events have fired, to complete a task that [`Engine::dispatch`]
    /// left hanging open.
    pub fn detach_fulfilled(&self, task: Arc<Task>) {
        if task.mark_body_done() {
            self.complete(task);
        }
    }

    pub fn queue_for(&self, device: DeviceGlobalId) -> &CommandQueue {
        &self.queues[device as usize]
    }
}

struct EngineTaskContext {
    task: Arc<Task>,
    engine: Weak<Engine>,
}

impl crate::task::format::TaskContext for EngineTaskContext {
    fn task(&self) -> &Arc<Task> {
        &self.task
    }

    fn detach_incr(&self) {
        self.task.detach_incr();
    }

    fn detach_decr(&self) {
        self.task.detach_decr();
    }

    fn spawn(
        &self,
        format: FormatId,
        flags: TaskFlags,
        accesses: Vec<Access>,
        args: Option<Box<dyn std::any::Any + Send + Sync>>,
    ) -> Arc<Task> {
        let engine = self.engine.upgrade().expect("engine dropped while one of its task bodies is still running");
        engine.spawn_with_parent(Some(self.task.clone()), format, flags, accesses, args, None, None)
    }
}

/// Splits a region in two (or four, for a tile quadrant) per the
/// requested moldable policy (spec.md §4.3, Open Question resolved in
/// DESIGN.md: split granularity is declared per region class). Points
/// cannot be split; requesting it is a programmer error.
fn split_region(region: &crate::region::Region, policy: SplitPolicy) -> Vec<crate::region::Region> {
    use crate::region::{Region, Tile};

    match (region, policy) {
        (Region::Interval(i), SplitPolicy::Halves) => {
            let mid = i.start + (i.end - i.start) / 2;
            if mid == i.start || mid == i.end {
                vec![region.clone()]
            } else {
                vec![
                    Region::Interval(crate::region::Interval::new(i.start, mid)),
                    Region::Interval(crate::region::Interval::new(mid, i.end)),
                ]
            }
        }
        (Region::Tile(t), SplitPolicy::HalvesHorizontal) => halves_tile(t, true),
        (Region::Tile(t), SplitPolicy::HalvesVertical) => halves_tile(t, false),
        (Region::Tile(t), SplitPolicy::Quadrant) => {
            let mut out = halves_tile(t, true);
            out = out.into_iter().flat_map(|r| match r {
                Region::Tile(t) => halves_tile(&t, false),
                other => vec![other],
            }).collect();
            out
        }
        (Region::Point(_), _) => panic!("point regions cannot be split"),
        // `NoSplit` and `Custom` are both handled by `try_split` before
        // reaching here; any other (region, policy) pairing this match
        // doesn't recognize is treated as a no-op split.
        _ => vec![region.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, RandomRouter};
    use crate::driver::HostDriver;
    use crate::region::{Interval, Region};
    use crate::task::{Access, AccessMode, FORMAT_NULL};
    use std::sync::atomic::{AtomicUsize as StdAtomicUsize, Ordering as StdOrdering};

    fn host_only_engine() -> Arc<Engine> {
        let devices = DeviceSet::new(vec![Device::host(1 << 20)]);
        let drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(HostDriver::new())];
        Engine::new(devices, Box::new(RandomRouter), drivers, Config::default())
    }

    #[test]
    fn independent_tasks_both_run_to_completion() {
        let engine = host_only_engine();
        let ran = Arc::new(StdAtomicUsize::new(0));

        let fmt = {
            let ran = ran.clone();
            engine.register_format(
                Format::new("noop").with_entry(Target::Host, move |_ctx| {
                    ran.fetch_add(1, StdOrdering::SeqCst);
                }),
            )
        };

        let access = Access::new(Region::Interval(Interval::new(0, 8)), AccessMode::RW);
        let t1 = engine.spawn(fmt, TaskFlags::DEPENDENT, vec![access], None, None, None);
        let t2 = engine.spawn(
            fmt,
            TaskFlags::DEPENDENT,
            vec![Access::new(Region::Interval(Interval::new(100, 108)), AccessMode::RW)],
            None,
            None,
            None,
        );

        assert_eq!(t1.state(), TaskState::Completed);
        assert_eq!(t2.state(), TaskState::Completed);
        assert_eq!(ran.load(StdOrdering::SeqCst), 2);
    }

    #[test]
    fn a_sequential_write_after_write_runs_in_order() {
        let engine = host_only_engine();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let fmt = {
            let order = order.clone();
            engine.register_format(Format::new("record").with_entry(Target::Host, move |_ctx| {
                order.lock().push(());
            }))
        };

        let region = Region::Interval(Interval::new(0, 16));
        let first = engine.spawn(fmt, TaskFlags::DEPENDENT, vec![Access::new(region.clone(), AccessMode::RW)], None, None, None);
        let second = engine.spawn(fmt, TaskFlags::DEPENDENT, vec![Access::new(region, AccessMode::RW)], None, None, None);

        assert_eq!(first.state(), TaskState::Completed);
        assert_eq!(second.state(), TaskState::Completed);
        assert_eq!(order.lock().len(), 2);
    }

    #[test]
    fn a_custom_split_policy_recurses_using_the_tasks_own_rule() {
        let engine = host_only_engine();
        let leaves = Arc::new(StdAtomicUsize::new(0));

        let fmt = {
            let leaves = leaves.clone();
            engine.register_format(Format::new("leaf").with_entry(Target::Host, move |_ctx| {
                leaves.fetch_add(1, StdOrdering::SeqCst);
            }))
        };

        let region = Region::Interval(Interval::new(0, 4));
        let access = Access::new(region, AccessMode::RW);
        let task = Task::new(fmt, TaskFlags::DEPENDENT | TaskFlags::MOLDABLE, None, vec![access], None);
        task.set_moldable(Some(MoldableInfo {
            policy: SplitPolicy::Custom,
            min_volume: 1,
        }));
        task.set_custom_split(|region| match region {
            Region::Interval(i) => {
                let mid = i.start + (i.end - i.start) / 2;
                vec![
                    Region::Interval(Interval::new(i.start, mid)),
                    Region::Interval(Interval::new(mid, i.end)),
                ]
            }
            other => vec![other.clone()],
        });

        engine.resolve_accesses(&task);
        assert!(task.release_guard());
        engine.commit(task.clone());

        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(leaves.load(StdOrdering::SeqCst), 2);
    }

    #[test]
    fn a_body_less_join_task_completes_without_a_registered_format() {
        let engine = host_only_engine();
        let access = Access::new(Region::Interval(Interval::new(0, 4)), AccessMode::RW);
        let t = engine.spawn(FORMAT_NULL, TaskFlags::DEPENDENT, vec![access], None, None, None);
        assert_eq!(t.state(), TaskState::Completed);
    }
}

fn halves_tile(t: &crate::region::Tile, horizontal: bool) -> Vec<crate::region::Region> {
    use crate::region::{Region, Tile};
    if horizontal {
        let mid = t.cols / 2;
        if mid == 0 {
            return vec![Region::Tile(*t)];
        }
        vec![
            Region::Tile(Tile::new(t.origin_row, t.origin_col, t.rows, mid, t.ld, t.elem_size, t.order)),
            Region::Tile(Tile::new(t.origin_row, t.origin_col + mid, t.rows, t.cols - mid, t.ld, t.elem_size, t.order)),
        ]
    } else {
        let mid = t.rows / 2;
        if mid == 0 {
            return vec![Region::Tile(*t)];
        }
        vec![
            Region::Tile(Tile::new(t.origin_row, t.origin_col, mid, t.cols, t.ld, t.elem_size, t.order)),
            Region::Tile(Tile::new(t.origin_row + mid, t.origin_col, t.rows - mid, t.cols, t.ld, t.elem_size, t.order)),
        ]
    }
}
