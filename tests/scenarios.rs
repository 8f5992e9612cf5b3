//! End-to-end scenarios E1-E6 (spec.md §8). Each scenario spawns real
//! tasks against a real [`Runtime`]/[`Engine`] pair over the host
//! device; there is no mock driver involved.
//!
//! E5 exercises the [`ParallelFor`]/[`ThreadPool`] primitives directly
//! rather than through the task engine: nothing in this crate yet
//! drives task execution off of a worker thread's deque (see
//! `DESIGN.md`'s "Runtime façade" entry). E6 does go through the
//! engine: a task body recursively spawns its own children via
//! `TaskContext::spawn`, which registers the running task as each
//! child's parent so the `cc` cascade holds the parent open until both
//! children (and, transitively, everything they spawn) complete.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use accelrt::task::format::{Target, TaskContext};
use accelrt::task::{AccessMode, FormatId, TaskFlags, TaskState};
use accelrt::{Access, Config, Format, Interval, Region, Runtime, StorageOrder, Tile};

fn register(runtime: &Runtime, label: &str, body: impl Fn(&dyn TaskContext) + Send + Sync + 'static) -> FormatId {
    runtime.engine.register_format(Format::new(label).with_entry(Target::Host, body))
}

/// E1: spawn and sync a single host task that writes `*x = 42`.
#[test]
fn e1_single_task_write_is_observed_after_sync() {
    let runtime = Runtime::init(Config::default()).unwrap();
    let x = Arc::new(parking_lot::Mutex::new(0i32));

    let fmt = {
        let x = x.clone();
        register(&runtime, "e1-write", move |_ctx| {
            *x.lock() = 42;
        })
    };

    let access = Access::new(Region::Interval(Interval::new(0, 4)), AccessMode::WRITE);
    let task = runtime.engine.spawn(fmt, TaskFlags::DEPENDENT, vec![access], None, None, None);
    assert_eq!(task.state(), TaskState::Completed);

    runtime.sync();
    assert_eq!(*x.lock(), 42);
}

/// E2: a three-task dependency chain `T1: W` -> `T2: R` -> `T3: RW` on
/// the same point, each asserting a monotonically advancing counter.
#[test]
fn e2_dependency_chain_advances_a_monotonic_counter() {
    let runtime = Runtime::init(Config::default()).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let region = || Region::Interval(Interval::new(0, 8));

    let w_fmt = {
        let counter = counter.clone();
        register(&runtime, "e2-w", move |_ctx| {
            assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 0);
        })
    };
    let r_fmt = {
        let counter = counter.clone();
        register(&runtime, "e2-r", move |_ctx| {
            assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 1);
        })
    };
    let rw_fmt = {
        let counter = counter.clone();
        register(&runtime, "e2-rw", move |_ctx| {
            assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 2);
        })
    };

    let t1 = runtime.engine.spawn(w_fmt, TaskFlags::DEPENDENT, vec![Access::new(region(), AccessMode::WRITE)], None, None, None);
    let t2 = runtime.engine.spawn(r_fmt, TaskFlags::DEPENDENT, vec![Access::new(region(), AccessMode::READ)], None, None, None);
    let t3 = runtime.engine.spawn(rw_fmt, TaskFlags::DEPENDENT, vec![Access::new(region(), AccessMode::RW)], None, None, None);

    assert_eq!(t1.state(), TaskState::Completed);
    assert_eq!(t2.state(), TaskState::Completed);
    assert_eq!(t3.state(), TaskState::Completed);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

/// E3: three tasks (W, R, RW) over overlapping intervals of the same
/// base, expected to reach the counter in order 1, 2, 3.
#[test]
fn e3_overlapping_interval_accesses_serialize_in_order() {
    let runtime = Runtime::init(Config::default()).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let base: i64 = 1000;
    let r1 = Region::Interval(Interval::new((base - 16) as u64, (base + 16) as u64));
    let r2 = Region::Interval(Interval::new(base as u64, (base + 19) as u64));
    let r3 = Region::Interval(Interval::new((base - 3) as u64, (base + 12) as u64));

    let make_fmt = |label: &'static str| {
        let counter = counter.clone();
        let order = order.clone();
        register(&runtime, label, move |_ctx| {
            let step = counter.fetch_add(1, Ordering::SeqCst) + 1;
            order.lock().push(step);
        })
    };
    let f1 = make_fmt("e3-1");
    let f2 = make_fmt("e3-2");
    let f3 = make_fmt("e3-3");

    let t1 = runtime.engine.spawn(f1, TaskFlags::DEPENDENT, vec![Access::new(r1, AccessMode::WRITE)], None, None, None);
    let t2 = runtime.engine.spawn(f2, TaskFlags::DEPENDENT, vec![Access::new(r2, AccessMode::READ)], None, None, None);
    let t3 = runtime.engine.spawn(f3, TaskFlags::DEPENDENT, vec![Access::new(r3, AccessMode::RW)], None, None, None);

    assert_eq!(t1.state(), TaskState::Completed);
    assert_eq!(t2.state(), TaskState::Completed);
    assert_eq!(t3.state(), TaskState::Completed);
    assert_eq!(*order.lock(), vec![1, 2, 3]);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

/// E4: writer on `[0..100)`, then a writer on an 8x8 column-major tile
/// starting at address 3 with `ld=8, elem=1`, then another writer on
/// `[0..100)`, with a 1ms sleep in each body. Expected completion
/// order is strictly 0, 1, 2.
///
/// As documented in `DESIGN.md`, this passes because the shipped
/// `HostDriver` dispatches every task body synchronously inline on the
/// spawning thread: program order alone enforces the expected
/// completion order here, not genuine interval-vs-tile conflict
/// detection (those are independent dependency domains in this
/// design). A driver that dispatched concurrently would need a
/// unifying base-region mechanism this crate does not implement.
#[test]
fn e4_interval_and_tile_writers_complete_in_spawn_order() {
    let runtime = Runtime::init(Config::default()).unwrap();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let make_fmt = |step: usize| {
        let order = order.clone();
        register(&runtime, "e4", move |_ctx| {
            std::thread::sleep(std::time::Duration::from_millis(1));
            order.lock().push(step);
        })
    };

    let f0 = make_fmt(0);
    let f1 = make_fmt(1);
    let f2 = make_fmt(2);

    let interval = Region::Interval(Interval::new(0, 100));
    let tile = Region::Tile(Tile::new(3, 0, 8, 8, 8, 1, StorageOrder::ColumnMajor));

    let t0 = runtime.engine.spawn(f0, TaskFlags::DEPENDENT, vec![Access::new(interval.clone(), AccessMode::WRITE)], None, None, None);
    let t1 = runtime.engine.spawn(f1, TaskFlags::DEPENDENT, vec![Access::new(tile, AccessMode::WRITE)], None, None, None);
    let t2 = runtime.engine.spawn(f2, TaskFlags::DEPENDENT, vec![Access::new(interval, AccessMode::WRITE)], None, None, None);

    assert_eq!(t0.state(), TaskState::Completed);
    assert_eq!(t1.state(), TaskState::Completed);
    assert_eq!(t2.state(), TaskState::Completed);
    assert_eq!(*order.lock(), vec![0, 1, 2]);
}

/// E5: a parallel-for over `n=10000` empty closures split across every
/// claimed block; each index must be processed exactly once in total.
/// Driven directly over `ParallelFor`/real OS threads (see module doc).
#[test]
fn e5_parallel_for_processes_every_index_exactly_once() {
    use accelrt::team::ParallelFor;

    let n = 10_000usize;
    let nthreads = std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4);
    let pf = Arc::new(ParallelFor::new(n, 32, nthreads * 2));
    let seen = Arc::new(parking_lot::Mutex::new(vec![0u8; n]));

    let handles: Vec<_> = (0..nthreads)
        .map(|_| {
            let pf = pf.clone();
            let seen = seen.clone();
            std::thread::spawn(move || {
                while let Some((start, end)) = pf.claim() {
                    {
                        let mut seen = seen.lock();
                        for i in start..end {
                            seen[i] += 1;
                        }
                    }
                    pf.release();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(seen.lock().iter().all(|&c| c == 1));
}

/// E6: fib(34) via recursive spawn-two-children-then-direct-compute
/// below a depth cutoff, as real nested tasks. Each task below the
/// cutoff spawns its own two children through `TaskContext::spawn` and
/// sums their results once both have run; the host driver dispatches
/// every task synchronously, so both children have already reached
/// `Completed` by the time their parent's two `spawn` calls return.
#[test]
fn e6_fib_with_depth_cutoff_computes_the_expected_value() {
    struct FibArgs {
        n: u64,
        depth: u32,
        cutoff: u32,
        result: Arc<parking_lot::Mutex<u64>>,
    }

    fn fib_direct(n: u64) -> u64 {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..n {
            let next = a + b;
            a = b;
            b = next;
        }
        a
    }

    let runtime = Runtime::init(Config::default()).unwrap();

    let fmt = register(&runtime, "e6-fib", |ctx: &dyn TaskContext| {
        let task = ctx.task();
        let args = task
            .args
            .as_ref()
            .and_then(|a| a.downcast_ref::<FibArgs>())
            .expect("e6-fib task spawned without FibArgs");

        if args.n < 2 {
            *args.result.lock() = args.n;
            return;
        }
        if args.depth >= args.cutoff {
            *args.result.lock() = fib_direct(args.n);
            return;
        }

        let left = Arc::new(parking_lot::Mutex::new(0u64));
        let right = Arc::new(parking_lot::Mutex::new(0u64));

        ctx.spawn(
            task.format,
            TaskFlags::empty(),
            vec![],
            Some(Box::new(FibArgs { n: args.n - 1, depth: args.depth + 1, cutoff: args.cutoff, result: left.clone() })),
        );
        ctx.spawn(
            task.format,
            TaskFlags::empty(),
            vec![],
            Some(Box::new(FibArgs { n: args.n - 2, depth: args.depth + 1, cutoff: args.cutoff, result: right.clone() })),
        );

        *args.result.lock() = *left.lock() + *right.lock();
    });

    let result = Arc::new(parking_lot::Mutex::new(0u64));
    let task = runtime.engine.spawn(
        fmt,
        TaskFlags::empty(),
        vec![],
        Some(Box::new(FibArgs { n: 34, depth: 0, cutoff: 16, result: result.clone() })),
        None,
        None,
    );

    assert_eq!(task.state(), TaskState::Completed);
    assert_eq!(*result.lock(), 9_227_465);
}
