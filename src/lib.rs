//! A heterogeneous task-based runtime: dependency resolution, memory
//! coherency, and device scheduling across CPU and accelerator targets.
//!
//! A task is spawned with a list of [`task::Access`]es naming the
//! regions of memory it touches; the dependency domains (C6) resolve
//! those accesses against whatever already touched the same regions,
//! wiring predecessor/successor edges accordingly, while the coherency
//! controllers (C7) track which devices hold a valid replica of each
//! region. Once a task's predecessors have all completed, the engine
//! (C10) routes it to a device, fetches what it needs, and dispatches
//! its body through that device's command queue (C8).
//!
//! [`runtime::Runtime::init`] is the usual entry point: it brings up a
//! device set (the host device today; see `driver` for where an
//! accelerator driver would plug in), registers the built-in task
//! formats, and returns an owned handle the embedder holds for the
//! runtime's lifetime. There is no global mutable state outside it.

pub mod coherency;
pub mod config;
pub mod device;
pub mod domain;
pub mod driver;
pub mod engine;
pub mod error;
pub mod khp;
pub mod queue;
pub mod region;
pub mod runtime;
#[cfg(feature = "stats")]
pub mod stats;
pub mod task;
pub mod team;
pub mod thread;

pub use config::Config;
pub use engine::{Engine, Format};
pub use error::{DeviceGlobalId, Error, Result};
pub use region::{BaseKey, Interval, Point, Rect, Region, StorageOrder, Tile};
pub use runtime::Runtime;
pub use task::{Access, AccessMode, Task, TaskFlags, TaskState};
