//! Runtime façade (spec.md §4.11, component C11): ties together the
//! task engine (C10), the worker thread pool (C4), and per-device teams
//! (C5) behind a single handle an embedder constructs once and holds
//! for the process's lifetime.
//!
//! Grounded on `original_source/src/runtime.cc`. Initialization order
//! mirrors the original: parse configuration, register the built-in
//! task formats, enumerate devices and bring up one driver+queue per
//! device, then build a team per device. `deinit` tears down in the
//! reverse order: teams first, then queues are drained, then the
//! engine itself drops.
//!
//! There is no process-wide singleton: `Runtime::init` returns an
//! owned `Arc<Runtime>` the embedder is responsible for holding and
//! sharing with whatever worker threads it spawns (spec.md §5 "no
//! global mutable state outside Runtime").
//!
//! Scope boundary: the host driver (the only backend this crate ships)
//! completes every command synchronously inside `Engine::dispatch`, so
//! a task's body already ran by the time `Engine::spawn` returns to its
//! caller. The [`ThreadPool`]/[`Team`] scaffolding this module builds
//! exists because spec.md's C4/C5 call for it and a real accelerator
//! driver would need somewhere to run its progress loop from, but
//! nothing in this crate currently pulls tasks off of it — there is no
//! multi-threaded task-body execution loop wired up yet.

use std::sync::Arc;

use crate::config::Config;
use crate::device::{Device, DeviceSet, RandomRouter};
use crate::driver::Driver;
use crate::engine::Engine;
use crate::error::Result;
use crate::task::format::FormatId;
use crate::team::{Binding, Team};
use crate::thread::ThreadPool;

mod file_io;

pub use file_io::FileRwArgs;

/// Per-device memory budget used when no driver-reported capacity is
/// available (the host device has no hardware limit of its own; this
/// just bounds the `MemoryArea` backing it).
const HOST_MEMORY_CAPACITY: usize = 1 << 30;

pub struct Runtime {
    pub engine: Arc<Engine>,
    pub threads: ThreadPool,
    pub teams: Vec<Team>,
    pub config: Config,
    pub file_read_format: FormatId,
    pub file_write_format: FormatId,
    #[cfg(feature = "stats")]
    pub stats: crate::stats::Stats,
}

impl Runtime {
    /// Brings up a runtime with the given configuration: registers the
    /// built-in formats, enumerates devices (today: the host device
    /// only, since this crate ships no accelerator driver), and builds
    /// one compact-bound team over the available CPU parallelism.
    pub fn init(config: Config) -> Result<Arc<Runtime>> {
        let devices = DeviceSet::new(vec![Device::host(HOST_MEMORY_CAPACITY)]);
        let drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(crate::driver::HostDriver::new())];
        let engine = Engine::new(devices, Box::new(RandomRouter), drivers, config.clone());

        let file_read_format = engine.register_format(file_io::file_read_format());
        let file_write_format = engine.register_format(file_io::file_write_format());

        let nthreads = config.nthreads_per_device.max(1) * engine.devices.len();
        let threads = ThreadPool::new(nthreads.max(1));
        let team = Team::new(Binding::CompactDevice, nthreads.max(1), engine.devices.len(), config.nthreads_per_device.max(1));

        Ok(Arc::new(Runtime {
            engine,
            threads,
            teams: vec![team],
            config,
            file_read_format,
            file_write_format,
            #[cfg(feature = "stats")]
            stats: crate::stats::Stats::default(),
        }))
    }

    /// Logs a snapshot of the accumulated counters via `tracing::warn!`.
    /// No-op unless built with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn report_stats(&self) {
        self.stats.report(&[
            (self.file_read_format, "file_read_async"),
            (self.file_write_format, "file_write_async"),
        ]);
    }

    /// Nested taskwait: blocks until every device queue has drained its
    /// pending commands. With the synchronous host driver this is a
    /// formality (every command already completed inline), but an
    /// asynchronous backend would have in-flight work here.
    pub fn sync(&self) {
        for device in self.engine.devices.ids() {
            self.engine.queue_for(device).wait_all();
        }
    }

    /// Tears the runtime down in the reverse of init order: stop
    /// accepting new work on the thread pool, drain every device queue,
    /// then let `Arc<Engine>` drop once the caller releases its last
    /// handle.
    pub fn deinit(&self) {
        self.threads.request_stop();
        self.sync();
    }

    pub fn spawn_file_read(&self, args: FileRwArgs) -> Arc<crate::task::Task> {
        #[cfg(feature = "stats")]
        {
            self.stats.record_committed(self.file_read_format);
            self.stats.memory.record_alloc(args.len);
        }
        let task = self.engine.spawn(
            self.file_read_format,
            crate::task::TaskFlags::DEPENDENT,
            vec![args.access()],
            Some(Box::new(args)),
            None,
            None,
        );
        #[cfg(feature = "stats")]
        if task.state() == crate::task::TaskState::Completed {
            self.stats.record_completed(self.file_read_format);
        }
        task
    }

    pub fn spawn_file_write(&self, args: FileRwArgs) -> Arc<crate::task::Task> {
        #[cfg(feature = "stats")]
        {
            self.stats.record_committed(self.file_write_format);
            self.stats.memory.record_free(args.len);
        }
        let task = self.engine.spawn(
            self.file_write_format,
            crate::task::TaskFlags::DEPENDENT,
            vec![args.access()],
            Some(Box::new(args)),
            None,
            None,
        );
        #[cfg(feature = "stats")]
        if task.state() == crate::task::TaskState::Completed {
            self.stats.record_completed(self.file_write_format);
        }
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_brings_up_a_single_host_device() {
        let runtime = Runtime::init(Config::default()).unwrap();
        assert_eq!(runtime.engine.devices.len(), 1);
        assert_eq!(runtime.teams.len(), 1);
    }

    #[test]
    fn sync_and_deinit_do_not_panic_with_no_outstanding_work() {
        let runtime = Runtime::init(Config::default()).unwrap();
        runtime.sync();
        runtime.deinit();
    }

    #[cfg(feature = "stats")]
    #[test]
    fn file_read_updates_the_committed_and_completed_counters() {
        use crate::driver::FdQueue;
        use parking_lot::Mutex;
        use std::io::Write;

        let dir = std::env::temp_dir();
        let path = dir.join(format!("accelrt_stats_test_{:?}.bin", std::thread::current().id()));
        std::fs::File::create(&path).unwrap().write_all(&[1u8; 4]).unwrap();

        let runtime = Runtime::init(Config::default()).unwrap();
        let fd = Arc::new(FdQueue::open(&path).unwrap());
        let dst = Arc::new(Mutex::new(vec![0u8; 4]));
        runtime.spawn_file_read(FileRwArgs {
            fd,
            buffer: dst,
            buffer_offset: 0,
            file_offset: 0,
            len: 4,
            write: false,
        });

        let counters = runtime.stats.counters_for(runtime.file_read_format);
        assert_eq!(counters.committed.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(counters.completed.load(std::sync::atomic::Ordering::Relaxed), 1);

        std::fs::remove_file(&path).ok();
    }
}
