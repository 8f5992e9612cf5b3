//! Device command queue (spec.md §4.8, component C8).
//!
//! Grounded on `original_source/include/xkrt/driver/{queue,command}.h`.
//! Commands pass through two logical sections of a bounded ring: newly
//! submitted commands sit in `ready` until a driver accepts them via
//! `launch`, then move to `pending` until the driver reports completion
//! through `progress`/`wait_all`/`wait_one` (component C8's four
//! driver-supplied operations, defined on [`crate::driver::Driver`]).
//! Each command carries a bounded array of completion callbacks so
//! several observers (coherency update, successor release, a caller's
//! own future) can all be notified once, without per-command heap
//! growth beyond a small fixed cap.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::device::memory::Buffer;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::task::format::{BodyFn, TaskContext};

pub type CommandId = u64;

/// Maximum completion observers a single command may carry. Exceeding
/// this is a caller bug (too many independent parties waiting on one
/// command), not a runtime condition to recover from.
pub const MAX_CALLBACKS: usize = 4;

pub type CompletionCallback = Box<dyn FnOnce() + Send>;

pub enum Command {
    Copy1D {
        src: Buffer,
        src_offset: usize,
        dst: Buffer,
        dst_offset: usize,
        len: usize,
    },
    Copy2D {
        src: Buffer,
        src_offset: usize,
        src_ld: usize,
        dst: Buffer,
        dst_offset: usize,
        dst_ld: usize,
        elem_size: usize,
        rows: usize,
        cols: usize,
    },
    KernelLaunch {
        ctx: Arc<dyn TaskContext>,
        body: Arc<BodyFn>,
    },
    FileRw {
        buffer: Buffer,
        buffer_offset: usize,
        file_offset: u64,
        len: usize,
        write: bool,
        fd: std::sync::Arc<crate::driver::FdQueue>,
    },
}

struct Submitted {
    id: CommandId,
    command: Command,
    callbacks: Vec<CompletionCallback>,
}

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

pub struct CommandQueue {
    driver: Arc<dyn Driver>,
    ready: ArrayQueue<Submitted>,
    pending: parking_lot::Mutex<HashMap<CommandId, Vec<CompletionCallback>>>,
    pending_capacity: usize,
}

impl CommandQueue {
    pub fn new(driver: Arc<dyn Driver>, ready_capacity: usize, pending_capacity: usize) -> Self {
        CommandQueue {
            driver,
            ready: ArrayQueue::new(ready_capacity.max(1)),
            pending: parking_lot::Mutex::new(HashMap::new()),
            pending_capacity: pending_capacity.max(1),
        }
    }

    /// Enqueues `command` into the ready section with up to
    /// [`MAX_CALLBACKS`] completion observers. Fails if the ring is
    /// full (back-pressure: callers should retry after a `progress`
    /// call drains some pending commands).
    pub fn submit(&self, command: Command, callbacks: Vec<CompletionCallback>) -> Result<CommandId> {
        if callbacks.len() > MAX_CALLBACKS {
            return Err(Error::fatal(format!(
                "command carries {} completion callbacks, at most {MAX_CALLBACKS} are supported",
                callbacks.len()
            )));
        }
        let id = NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed);
        self.ready
            .push(Submitted { id, command, callbacks })
            .map_err(|_| Error::resource_exhausted("command ring is full"))?;
        Ok(id)
    }

    /// Moves ready commands into `pending` by handing them to the
    /// driver's `launch`, up to the pending section's capacity. Returns
    /// the number of commands launched.
    pub fn launch_ready(&self) -> Result<usize> {
        let mut launched = 0;
        loop {
            if self.pending.lock().len() >= self.pending_capacity {
                break;
            }
            let Some(submitted) = self.ready.pop() else { break };
            self.driver.launch(submitted.id, &submitted.command)?;
            self.pending.lock().insert(submitted.id, submitted.callbacks);
            launched += 1;
        }
        Ok(launched)
    }

    /// Polls the driver for completions, firing and removing each
    /// completed command's callbacks. Non-blocking. Returns the number
    /// of commands completed.
    pub fn progress(&self) -> usize {
        let done = self.driver.progress();
        let mut fired = 0;
        for id in done {
            if let Some(callbacks) = self.pending.lock().remove(&id) {
                for cb in callbacks {
                    cb();
                }
                fired += 1;
            }
        }
        fired
    }

    /// Blocks until every pending command has completed.
    pub fn wait_all(&self) {
        self.driver.wait_all();
        while !self.pending.lock().is_empty() {
            self.progress();
        }
    }

    /// Blocks until at least one pending command completes, firing its
    /// callbacks. Returns `false` if nothing was pending.
    pub fn wait_one(&self) -> bool {
        let Some(id) = self.driver.wait_one() else { return false };
        if let Some(callbacks) = self.pending.lock().remove(&id) {
            for cb in callbacks {
                cb();
            }
        }
        true
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }
}

/// A plain FIFO used by components that need ordering but not the
/// ready/pending split (e.g. a per-device drain list during `deinit`).
pub type Fifo<T> = VecDeque<T>;
