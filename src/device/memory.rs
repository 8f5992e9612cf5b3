//! Per-device memory area: a single backing byte buffer plus an
//! address-ordered free-chunk list (spec.md §4.9, component C9).
//!
//! Grounded on `original_source/include/xkrt/memory/memory-area.hpp`,
//! which keeps free chunks on an intrusive doubly-linked list. Per
//! DESIGN NOTES §9 ("represent as arena + index instead of intrusive
//! pointer lists") this keeps them in a plain `Vec<Chunk>`; spec.md §9's
//! Open Question on free-chunk ordering is resolved (see DESIGN.md) as
//! address order, which is what makes the adjacency-merge in
//! [`MemoryArea::free`] a simple neighbor check.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// The byte store backing one device's allocations, shared with
/// [`crate::queue::Command`] copy operations so a host-backend copy can
/// run as a plain slice copy.
pub type Buffer = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    offset: usize,
    len: usize,
}

pub struct MemoryArea {
    buffer: Buffer,
    capacity: usize,
    free: Mutex<Vec<Chunk>>,
}

impl MemoryArea {
    pub fn new(capacity: usize) -> Self {
        MemoryArea {
            buffer: Arc::new(Mutex::new(vec![0u8; capacity])),
            capacity,
            free: Mutex::new(vec![Chunk { offset: 0, len: capacity }]),
        }
    }

    pub fn buffer(&self) -> Buffer {
        self.buffer.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First-fit allocation over the address-ordered free list.
    pub fn alloc(&self, len: usize) -> Result<usize> {
        let mut free = self.free.lock();
        let idx = free
            .iter()
            .position(|c| c.len >= len)
            .ok_or_else(|| Error::resource_exhausted(format!("no free chunk of at least {len} bytes")))?;

        let chunk = free[idx];
        if chunk.len == len {
            free.remove(idx);
        } else {
            free[idx] = Chunk {
                offset: chunk.offset + len,
                len: chunk.len - len,
            };
        }
        Ok(chunk.offset)
    }

    /// Returns `[offset, offset+len)` to the free list, merging with an
    /// address-adjacent neighbor on either side.
    pub fn free(&self, offset: usize, len: usize) {
        let mut free = self.free.lock();
        let pos = free.iter().position(|c| c.offset > offset).unwrap_or(free.len());
        free.insert(pos, Chunk { offset, len });

        if pos + 1 < free.len() && free[pos].offset + free[pos].len == free[pos + 1].offset {
            free[pos].len += free[pos + 1].len;
            free.remove(pos + 1);
        }
        if pos > 0 && free[pos - 1].offset + free[pos - 1].len == free[pos].offset {
            free[pos - 1].len += free[pos].len;
            free.remove(pos);
        }
    }

    pub fn free_bytes(&self) -> usize {
        self.free.lock().iter().map(|c| c.len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_free_restores_full_capacity() {
        let area = MemoryArea::new(1024);
        let a = area.alloc(256).unwrap();
        let b = area.alloc(256).unwrap();
        assert_eq!(area.free_bytes(), 512);
        area.free(a, 256);
        area.free(b, 256);
        assert_eq!(area.free_bytes(), 1024);
    }

    #[test]
    fn adjacent_frees_merge_into_one_chunk() {
        let area = MemoryArea::new(100);
        let a = area.alloc(50).unwrap();
        let b = area.alloc(50).unwrap();
        area.free(a, 50);
        area.free(b, 50);
        // a single 100-byte allocation must now succeed again.
        assert!(area.alloc(100).is_ok());
    }

    #[test]
    fn exhausted_area_reports_resource_exhausted() {
        let area = MemoryArea::new(10);
        area.alloc(10).unwrap();
        assert!(area.alloc(1).is_err());
    }
}
