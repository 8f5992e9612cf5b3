//! Crate-wide error type.
//!
//! Mirrors the error taxonomy of spec.md §7: configuration, resource
//! exhaustion, driver, dependency-graph (debug-only) and fatal errors.
//! Only `init`, `deinit`, `sync` and `memory_*` are fallible by contract;
//! `spawn` panics on programmer error (missing format entry) rather than
//! returning a `Result`, matching the "fatal error" classification.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A device-global id, used to tag `Driver` errors without requiring the
/// error type to be generic over every driver implementation.
pub type DeviceGlobalId = u32;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid environment variable or malformed driver descriptor,
    /// surfaced at `Runtime::init`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Device memory allocation failure, full command queue, or a full
    /// completion-callback list on a command.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A vendor driver call failed; attached to the command that
    /// triggered it and fired through its completion callback.
    #[error("driver error on device {device}: {message}")]
    Driver {
        device: DeviceGlobalId,
        message: String,
    },

    /// Dependency-graph invariant violated (cycle, double-completion).
    /// Only ever constructed in debug builds; release builds do not
    /// check for this condition (spec.md §7: "release builds treat them
    /// as undefined and unlocked").
    #[error("dependency graph error: {0}")]
    DependencyGraph(String),

    /// Unreachable runtime state: null format invoked as a body, or no
    /// target entry for a task's assigned target.
    #[error("fatal runtime error: {0}")]
    Fatal(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Error::ResourceExhausted(msg.into())
    }

    pub fn driver(device: DeviceGlobalId, msg: impl Into<String>) -> Self {
        Error::Driver {
            device,
            message: msg.into(),
        }
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Error::Fatal(msg.into())
    }

    /// Construct a `DependencyGraph` error, but only materialize it in
    /// debug builds. In release builds this returns `None` — callers
    /// are expected to treat the violated invariant as undefined
    /// behavior that they simply do not check for, per spec.md §7.
    pub fn dependency_graph_debug_only(msg: impl Into<String>) -> Option<Self> {
        if cfg!(debug_assertions) {
            Some(Error::DependencyGraph(msg.into()))
        } else {
            None
        }
    }
}
