//! Lightweight atomic counters, gated behind the `stats` feature
//! (mirrors the source project's `XKRT_SUPPORT_STATS` compile-time
//! guard). Grounded on `original_source/src/stats/stats.cc`: per-format
//! task counters plus aggregate memory counters, reported through
//! `tracing` rather than the original's custom logger macro.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::task::FormatId;

#[derive(Debug, Default)]
pub struct TaskCounters {
    pub committed: AtomicUsize,
    pub completed: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MemoryCounters {
    pub allocated_total: AtomicUsize,
    pub allocated_currently: AtomicUsize,
    pub freed: AtomicUsize,
}

impl MemoryCounters {
    pub fn record_alloc(&self, bytes: usize) {
        self.allocated_total.fetch_add(bytes, Ordering::Relaxed);
        self.allocated_currently.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_free(&self, bytes: usize) {
        self.freed.fetch_add(bytes, Ordering::Relaxed);
        self.allocated_currently.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Process-wide stats accumulator. Unlike the engine/runtime types,
/// this is meant to be embedded as a field of whatever owns it (a
/// `Runtime` in practice) rather than constructed fresh per call.
#[derive(Default)]
pub struct Stats {
    pub memory: MemoryCounters,
    per_format: RwLock<Vec<Arc<TaskCounters>>>,
}

impl Stats {
    pub fn counters_for(&self, format: FormatId) -> Arc<TaskCounters> {
        {
            let guard = self.per_format.read();
            if let Some(counters) = guard.get(format as usize) {
                return counters.clone();
            }
        }
        let mut guard = self.per_format.write();
        while guard.len() <= format as usize {
            guard.push(Arc::new(TaskCounters::default()));
        }
        guard[format as usize].clone()
    }

    pub fn record_committed(&self, format: FormatId) {
        self.counters_for(format).committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, format: FormatId) {
        self.counters_for(format).completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Emits a human-readable summary via `tracing::warn!`, matching the
    /// original's choice of the warn level for end-of-run stats so they
    /// show up without enabling debug logging.
    pub fn report(&self, labels: &[(FormatId, &str)]) {
        tracing::warn!("----------------- STATS -----------------");
        tracing::warn!(
            allocated_total = self.memory.allocated_total.load(Ordering::Relaxed),
            allocated_currently = self.memory.allocated_currently.load(Ordering::Relaxed),
            freed = self.memory.freed.load(Ordering::Relaxed),
            "memory"
        );
        let guard = self.per_format.read();
        for (id, label) in labels {
            if let Some(counters) = guard.get(*id as usize) {
                let committed = counters.committed.load(Ordering::Relaxed);
                if committed == 0 {
                    continue;
                }
                tracing::warn!(
                    format = label,
                    committed,
                    completed = counters.completed.load(Ordering::Relaxed),
                    "task format"
                );
            }
        }
        tracing::warn!("-----------------------------------------");
    }
}
