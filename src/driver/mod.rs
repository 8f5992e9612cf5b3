//! Driver ABI and topology collaborator (spec.md §6, ambient to C8/C9).
//!
//! Grounded on `original_source/include/xkrt/driver/driver.h`: every
//! backend — host, CUDA, Level Zero, OpenCL, HIP, SYCL — exposes the
//! same four operations a command queue drives it through. Vendor
//! backends are out of tree; this crate ships only [`HostDriver`], a
//! synchronous reference implementation that other drivers are meant
//! to be benchmarked and tested against, exactly as the source's host
//! backend serves (`src/driver/host/`).

mod fdqueue;
mod host;

pub use fdqueue::FdQueue;
pub use host::HostDriver;

use crate::error::Result;
use crate::queue::{Command, CommandId};

/// The four operations a command queue (C8) needs from a backend.
/// `launch` submits one command asynchronously; `progress` is a
/// non-blocking poll for completions; `wait_all`/`wait_one` block.
pub trait Driver: Send + Sync {
    fn launch(&self, id: CommandId, command: &Command) -> Result<()>;
    fn progress(&self) -> Vec<CommandId>;
    fn wait_all(&self);
    /// Blocks until at least one in-flight command completes, or
    /// returns `None` immediately if nothing is in flight.
    fn wait_one(&self) -> Option<CommandId>;
}

/// Machine topology as seen by the router (C9): device count and an
/// optional affinity distance function. The trivial default reports a
/// single host device and no useful affinity, matching `config::Config`
/// with no accelerators configured.
pub trait Topology: Send + Sync {
    fn ndevices(&self) -> usize;

    /// Relative affinity cost between two devices, lower is closer.
    /// The default topology treats every pair as equidistant.
    fn distance(&self, _a: u32, _b: u32) -> u32 {
        1
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTopology {
    pub ndevices: usize,
}

impl Topology for FlatTopology {
    fn ndevices(&self) -> usize {
        self.ndevices.max(1)
    }
}
