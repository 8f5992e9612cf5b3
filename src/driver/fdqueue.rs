//! Synchronous file I/O collaborator (spec.md §6 "File I/O
//! collaborator"), grounded on `original_source/src/file/readwrite.cc`.
//! Built-in task formats that read or write files go through this
//! rather than calling `pread`/`pwrite` directly, so tests can swap in
//! an in-memory file without touching the filesystem.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{Error, Result};

pub struct FdQueue {
    file: Mutex<File>,
}

impl FdQueue {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| Error::fatal(format!("failed to open file: {e}")))?;
        Ok(FdQueue { file: Mutex::new(file) })
    }

    /// Writes `data` at `offset`. Panics on I/O failure: a built-in
    /// file-rw task format has no recovery path once its backing
    /// descriptor is bad, matching `xkrt_exit_on_error` in the original
    /// file collaborator.
    pub fn write_at(&self, offset: u64, data: &[u8]) {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset)).expect("seek failed");
        file.write_all(data).expect("write failed");
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset)).expect("seek failed");
        file.read_exact(buf).expect("read failed");
    }
}
