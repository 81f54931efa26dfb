//! In-memory download sink.

use super::{DownloadResult, DownloadSink, DownloadedFile};
use std::cell::RefCell;

/// Keeps delivered files in memory, for tests and embedding hosts that
/// handle the bytes themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RefCell<Vec<DownloadedFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<DownloadedFile> {
        self.files.borrow().clone()
    }

    pub fn last(&self) -> Option<DownloadedFile> {
        self.files.borrow().last().cloned()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, file: &DownloadedFile) -> DownloadResult<()> {
        self.files.borrow_mut().push(file.clone());
        Ok(())
    }
}
