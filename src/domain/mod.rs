//! Dependency domains (spec.md §4.6, component C6).
//!
//! Grounded on `original_source/include/xkrt/memory/access/point/dependency-map.hpp`
//! and the interval/tile analogues referenced from it. Every domain —
//! point, interval, tile — shares the same "three bucket" resolution
//! rule against the region(s) an incoming access overlaps:
//!
//! - `last_seq_write`: at most one in-flight sequential writer.
//! - `last_conc_writes`: writers concurrent (or commutative) with each
//!   other, but not with sequential readers or writers.
//! - `last_seq_reads`: sequential readers, concurrent with each other.
//!
//! A new sequential write depends on everything in all three buckets
//! and replaces them. A new concurrent/commutative write depends on the
//! sequential writer (if any) and the sequential readers, and joins
//! `last_conc_writes`. A new sequential read depends on the sequential
//! writer (if any) and the concurrent writers, and joins
//! `last_seq_reads`.
//!
//! When a multi-way fan-in would otherwise be wired directly (a
//! concurrent write arriving after several sequential reads, or a
//! sequential read arriving after several concurrent writes), the
//! resolved predecessors are first collapsed into one synthetic
//! "join" task (`task::FORMAT_NULL`) so the new access carries a single
//! predecessor edge rather than one per conflicting access (spec.md
//! §4.6, Open Question: synthetic join-node policy, decided — see
//! DESIGN.md).

pub mod interval;
pub mod point;
pub mod tile;

use std::sync::Arc;

use crate::task::{AccessRef, Task, TaskFlags, TaskState, FORMAT_NULL};

/// The three-bucket resolution state attached to one base-region leaf
/// (a point, or a KHP-tree leaf region for intervals/tiles).
#[derive(Debug, Default, Clone)]
pub struct Bucket {
    last_seq_write: Option<AccessRef>,
    last_conc_writes: Vec<AccessRef>,
    last_seq_reads: Vec<AccessRef>,
}

impl Bucket {
    pub fn new() -> Self {
        Bucket::default()
    }
}

fn wire_edge(predecessor: &Arc<Task>, successor: &Arc<Task>) {
    if Arc::ptr_eq(predecessor, successor) {
        return;
    }
    if predecessor.state() == crate::task::TaskState::Completed {
        return;
    }
    successor.wc_incr();
    predecessor.push_successor(successor.clone());
}

/// Collapses `preds` into a single predecessor task: the lone task
/// itself if there is only one, or a freshly synthesized join node
/// wired to depend on all of them otherwise.
fn collapse(preds: &[AccessRef]) -> Option<Arc<Task>> {
    match preds.len() {
        0 => None,
        1 => Some(preds[0].task.clone()),
        _ => {
            let join = Task::new(FORMAT_NULL, TaskFlags::empty(), None, vec![], None);
            for p in preds {
                wire_edge(&p.task, &join);
            }
            // `wire_edge` skips preds already `Completed`, so if every
            // one of them was, the join's guard is the only thing
            // holding `wc` above zero. Nothing will ever call
            // `Engine::commit` on this join (it was never spawned
            // through the engine), so releasing the guard down to zero
            // here must finish the join in place rather than leave a
            // task wired to a successor's `wc` that never drains.
            if join.release_guard() {
                complete_vacuous_join(&join);
            }
            Some(join)
        }
    }
}

/// Drives a synthetic join straight to `Completed` when [`collapse`]
/// finds it has no live predecessor left to wait on. Safe only before
/// the join has been wired to any successor: it carries no registered
/// successors and no parent at this point, so there is nothing for the
/// completion cascade to do beyond the state transition itself.
fn complete_vacuous_join(join: &Arc<Task>) {
    join.advance_state(TaskState::Ready);
    join.advance_state(TaskState::DataFetching);
    join.advance_state(TaskState::DataFetched);
    join.advance_state(TaskState::Executing);
    join.advance_state(TaskState::Completed);
}

/// Resolves `access` against `bucket`, wiring predecessor edges (via
/// [`collapse`] where fan-in exceeds one) and updating the bucket to
/// reflect `access` as the new most-recent operation. Must be called
/// with the bucket's region locked against concurrent resolution of
/// overlapping accesses.
pub fn link(bucket: &mut Bucket, access: AccessRef) {
    let successor = access.task.clone();

    if access.mode().is_write() {
        match access.concurrency() {
            crate::task::Concurrency::Sequential => {
                let mut preds: Vec<AccessRef> = Vec::new();
                if let Some(w) = bucket.last_seq_write.take() {
                    preds.push(w);
                }
                preds.append(&mut bucket.last_conc_writes);
                preds.append(&mut bucket.last_seq_reads);
                for p in &preds {
                    wire_edge(&p.task, &successor);
                }
                bucket.last_seq_write = Some(access);
            }
            crate::task::Concurrency::Concurrent | crate::task::Concurrency::Commutative => {
                // "conc-W-after-seq-R": collapse any outstanding
                // sequential readers into one join edge instead of one
                // edge per reader.
                if let Some(w) = bucket.last_seq_write.clone() {
                    wire_edge(&w.task, &successor);
                }
                let reads = std::mem::take(&mut bucket.last_seq_reads);
                if let Some(join) = collapse(&reads) {
                    wire_edge(&join, &successor);
                }
                bucket.last_conc_writes.push(access);
            }
        }
    } else {
        let mut direct_write: Option<AccessRef> = bucket.last_seq_write.clone();
        let conc = std::mem::take(&mut bucket.last_conc_writes);
        if let Some(w) = direct_write.take() {
            wire_edge(&w.task, &successor);
        }
        if let Some(join) = collapse(&conc) {
            wire_edge(&join, &successor);
        }
        bucket.last_seq_reads.push(access);
    }
}
