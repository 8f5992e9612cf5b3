//! Environment-variable configuration, read once at `Runtime::init`.
//!
//! Configuration parsing is named as an external collaborator in
//! spec.md §1, but the ambient concern of "some config layer exists and
//! has documented defaults" is carried regardless (see `SPEC_FULL.md`
//! §1). Every field defaults to a value that lets the runtime start
//! unconfigured, per spec.md §6.

use crate::error::{Error, Result};

/// Verbosity threshold for `tracing` filtering decisions made by the
/// embedder; the crate itself never installs a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub verbosity: Verbosity,
    /// Merge contiguous sub-fetches of the same `(src, dst)` pair into a
    /// single command (spec.md §4.7 "Merge policy").
    pub merge_transfers: bool,
    /// Guard against writes past the end of host-registered memory.
    pub protect_registered_memory_overflow: bool,
    /// Fraction of each device's memory the runtime may allocate, 0..=100.
    pub gpu_mem_percent: u8,
    /// Hard cap on the number of accelerator devices to enumerate.
    pub ngpus: Option<usize>,
    /// Whether peer-to-peer (device-to-device) transfers are attempted
    /// before falling back to a host-staged copy.
    pub use_p2p: bool,
    /// Worker threads to bind per accelerator device.
    pub nthreads_per_device: usize,
    /// Concurrent in-flight commands per device queue/stream.
    pub stream_concurrency: usize,
    /// Number of hardware streams/queues created per device per kind.
    pub streams_per_device: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: Verbosity::Warn,
            merge_transfers: true,
            protect_registered_memory_overflow: true,
            gpu_mem_percent: 90,
            ngpus: None,
            use_p2p: true,
            nthreads_per_device: 1,
            stream_concurrency: 4,
            streams_per_device: 1,
        }
    }
}

impl Config {
    /// Parse configuration from the environment, falling back to
    /// defaults for any variable that is unset. Returns a
    /// `Configuration` error if a set variable cannot be parsed.
    pub fn from_env() -> Result<Config> {
        let mut cfg = Config::default();

        if let Ok(v) = std::env::var("XKRT_VERBOSE") {
            cfg.verbosity = parse_verbosity(&v)?;
        }
        if let Ok(v) = std::env::var("XKRT_MERGE_TRANSFERS") {
            cfg.merge_transfers = parse_bool("XKRT_MERGE_TRANSFERS", &v)?;
        }
        if let Ok(v) = std::env::var("XKRT_PROTECT_REGISTERED_MEMORY_OVERFLOW") {
            cfg.protect_registered_memory_overflow =
                parse_bool("XKRT_PROTECT_REGISTERED_MEMORY_OVERFLOW", &v)?;
        }
        if let Ok(v) = std::env::var("XKRT_GPU_MEM_PERCENT") {
            let pct: u8 = v
                .parse()
                .map_err(|_| Error::configuration(format!("XKRT_GPU_MEM_PERCENT: not a u8: {v}")))?;
            if pct > 100 {
                return Err(Error::configuration("XKRT_GPU_MEM_PERCENT: must be 0..=100"));
            }
            cfg.gpu_mem_percent = pct;
        }
        if let Ok(v) = std::env::var("XKRT_NGPUS") {
            let n: usize = v
                .parse()
                .map_err(|_| Error::configuration(format!("XKRT_NGPUS: not a usize: {v}")))?;
            cfg.ngpus = Some(n);
        }
        if let Ok(v) = std::env::var("XKRT_USE_P2P") {
            cfg.use_p2p = parse_bool("XKRT_USE_P2P", &v)?;
        }
        if let Ok(v) = std::env::var("XKRT_NTHREADS_PER_DEVICE") {
            cfg.nthreads_per_device = v.parse().map_err(|_| {
                Error::configuration(format!("XKRT_NTHREADS_PER_DEVICE: not a usize: {v}"))
            })?;
        }
        if let Ok(v) = std::env::var("XKRT_STREAM_CONCURRENCY") {
            cfg.stream_concurrency = v.parse().map_err(|_| {
                Error::configuration(format!("XKRT_STREAM_CONCURRENCY: not a usize: {v}"))
            })?;
        }
        if let Ok(v) = std::env::var("XKRT_STREAMS_PER_DEVICE") {
            cfg.streams_per_device = v.parse().map_err(|_| {
                Error::configuration(format!("XKRT_STREAMS_PER_DEVICE: not a usize: {v}"))
            })?;
        }

        Ok(cfg)
    }
}

fn parse_bool(name: &str, v: &str) -> Result<bool> {
    match v.trim() {
        "1" | "true" | "TRUE" | "yes" | "on" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "off" => Ok(false),
        other => Err(Error::configuration(format!(
            "{name}: not a boolean: {other}"
        ))),
    }
}

fn parse_verbosity(v: &str) -> Result<Verbosity> {
    match v.trim() {
        "0" => Ok(Verbosity::Error),
        "1" => Ok(Verbosity::Warn),
        "2" => Ok(Verbosity::Info),
        "3" => Ok(Verbosity::Debug),
        "4" => Ok(Verbosity::Trace),
        other => Err(Error::configuration(format!(
            "XKRT_VERBOSE: expected 0..=4, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_total() {
        let cfg = Config::default();
        assert_eq!(cfg.gpu_mem_percent, 90);
        assert!(cfg.merge_transfers);
        assert_eq!(cfg.ngpus, None);
    }

    #[test]
    fn rejects_out_of_range_percent() {
        std::env::set_var("XKRT_GPU_MEM_PERCENT", "101");
        let result = Config::from_env();
        std::env::remove_var("XKRT_GPU_MEM_PERCENT");
        assert!(result.is_err());
    }

    #[test]
    fn accepts_boolean_spellings() {
        assert!(parse_bool("x", "true").unwrap());
        assert!(parse_bool("x", "1").unwrap());
        assert!(!parse_bool("x", "off").unwrap());
        assert!(parse_bool("x", "nope").is_err());
    }
}
