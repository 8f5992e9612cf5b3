//! Built-in `file_read_async`/`file_write_async` task formats (spec.md
//! §6 "File I/O collaborator", supplemented from
//! `original_source/src/file/readwrite.cc`).
//!
//! The vendor-agnostic async-io-uring-style collaborator spec.md §6
//! names is explicitly out of scope for this crate; what ships instead
//! is a host-target task body that performs a positioned
//! `FdQueue::read_at`/`write_at` synchronously, the same way every
//! other host-target body runs to completion inline. A task spawned
//! against either format carries its [`FileRwArgs`] as its argument
//! blob and a single access over the touched byte range of its buffer,
//! so ordinary dependency resolution (C6) still serializes it against
//! any other access to that same buffer.

use std::sync::Arc;

use crate::device::memory::Buffer;
use crate::driver::FdQueue;
use crate::engine::Format;
use crate::region::{Interval, Region};
use crate::task::{Access, AccessMode};
use crate::task::format::{Target, TaskContext};

pub struct FileRwArgs {
    pub fd: Arc<FdQueue>,
    pub buffer: Buffer,
    pub buffer_offset: usize,
    pub file_offset: u64,
    pub len: usize,
    /// `true` writes `buffer`'s bytes to the file; `false` reads the
    /// file into `buffer`.
    pub write: bool,
}

impl FileRwArgs {
    /// The access this I/O touches: a write into the buffer range for a
    /// read (the buffer gets new bytes), a read of the buffer range for
    /// a write (the file observes its current bytes).
    pub fn access(&self) -> Access {
        let region = Region::Interval(Interval::new(
            self.buffer_offset as u64,
            (self.buffer_offset + self.len) as u64,
        ));
        let mode = if self.write { AccessMode::READ } else { AccessMode::WRITE };
        Access::new(region, mode)
    }
}

fn run(ctx: &dyn TaskContext) {
    let task = ctx.task();
    let args = task
        .args
        .as_ref()
        .and_then(|a| a.downcast_ref::<FileRwArgs>())
        .expect("file_read_async/file_write_async task spawned without FileRwArgs");
    if args.write {
        let buf = args.buffer.lock();
        args.fd.write_at(args.file_offset, &buf[args.buffer_offset..args.buffer_offset + args.len]);
    } else {
        let mut buf = args.buffer.lock();
        args.fd.read_at(args.file_offset, &mut buf[args.buffer_offset..args.buffer_offset + args.len]);
    }
}

pub fn file_read_format() -> Format {
    Format::new("file_read_async").with_entry(Target::Host, run)
}

pub fn file_write_format() -> Format {
    Format::new("file_write_async").with_entry(Target::Host, run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::runtime::Runtime;
    use parking_lot::Mutex;
    use std::io::Write;

    #[test]
    fn file_write_then_read_round_trips_through_a_real_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("accelrt_test_{:?}.bin", std::thread::current().id()));
        std::fs::File::create(&path).unwrap().write_all(&[0u8; 8]).unwrap();

        let runtime = Runtime::init(Config::default()).unwrap();
        let fd = Arc::new(FdQueue::open(&path).unwrap());

        let src = Arc::new(Mutex::new(vec![9u8, 8, 7, 6]));
        let write_task = runtime.spawn_file_write(FileRwArgs {
            fd: fd.clone(),
            buffer: src,
            buffer_offset: 0,
            file_offset: 0,
            len: 4,
            write: true,
        });
        assert_eq!(write_task.state(), crate::task::TaskState::Completed);

        let dst = Arc::new(Mutex::new(vec![0u8; 4]));
        let read_task = runtime.spawn_file_read(FileRwArgs {
            fd,
            buffer: dst.clone(),
            buffer_offset: 0,
            file_offset: 0,
            len: 4,
            write: false,
        });
        assert_eq!(read_task.state(), crate::task::TaskState::Completed);
        assert_eq!(*dst.lock(), vec![9, 8, 7, 6]);

        std::fs::remove_file(&path).ok();
    }
}
