//! The host backend: a synchronous reference [`Driver`] implementation.
//!
//! Grounded on `original_source/src/driver/host/`. Every command
//! completes the instant it is launched — there is no asynchronous
//! device behind it — so `progress`/`wait_all`/`wait_one` only ever
//! drain a backlog that `launch` has already finished filling.

use parking_lot::Mutex;

use crate::error::Result;
use crate::queue::{Command, CommandId};

use super::Driver;

#[derive(Default)]
pub struct HostDriver {
    completed: Mutex<Vec<CommandId>>,
}

impl HostDriver {
    pub fn new() -> Self {
        HostDriver::default()
    }

    fn run(&self, command: &Command) {
        match command {
            Command::Copy1D { src, src_offset, dst, dst_offset, len } => {
                let src = src.lock();
                let mut dst = dst.lock();
                dst[*dst_offset..*dst_offset + len].copy_from_slice(&src[*src_offset..*src_offset + len]);
            }
            Command::Copy2D {
                src,
                src_offset,
                src_ld,
                dst,
                dst_offset,
                dst_ld,
                elem_size,
                rows,
                cols,
            } => {
                let src = src.lock();
                let mut dst = dst.lock();
                let row_bytes = cols * elem_size;
                for r in 0..*rows {
                    let s = src_offset + r * src_ld * elem_size;
                    let d = dst_offset + r * dst_ld * elem_size;
                    dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
                }
            }
            Command::KernelLaunch { ctx, body } => {
                body(ctx.as_ref());
            }
            Command::FileRw { buffer, buffer_offset, file_offset, len, write, fd } => {
                if *write {
                    fd.write_at(*file_offset, &buffer.lock()[*buffer_offset..*buffer_offset + len]);
                } else {
                    let mut buf = buffer.lock();
                    fd.read_at(*file_offset, &mut buf[*buffer_offset..*buffer_offset + len]);
                }
            }
        }
    }
}

impl Driver for HostDriver {
    fn launch(&self, id: CommandId, command: &Command) -> Result<()> {
        self.run(command);
        self.completed.lock().push(id);
        Ok(())
    }

    fn progress(&self) -> Vec<CommandId> {
        std::mem::take(&mut *self.completed.lock())
    }

    fn wait_all(&self) {
        // Every launch already ran synchronously; nothing to wait for.
    }

    fn wait_one(&self) -> Option<CommandId> {
        self.completed.lock().pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex as PMutex;

    #[test]
    fn copy_1d_moves_bytes_between_buffers() {
        let driver = HostDriver::new();
        let src = Arc::new(PMutex::new(vec![1u8, 2, 3, 4]));
        let dst = Arc::new(PMutex::new(vec![0u8; 4]));
        driver
            .launch(
                1,
                &Command::Copy1D {
                    src: src.clone(),
                    src_offset: 0,
                    dst: dst.clone(),
                    dst_offset: 0,
                    len: 4,
                },
            )
            .unwrap();
        assert_eq!(*dst.lock(), vec![1, 2, 3, 4]);
        assert_eq!(driver.progress(), vec![1]);
    }
}
