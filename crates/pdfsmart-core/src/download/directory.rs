//! Directory download sink for native platforms.

use super::{DownloadError, DownloadResult, DownloadSink, DownloadedFile, sanitize_filename};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes downloaded files into a directory.
pub struct DirectorySink {
    base_path: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing into `base_path`, creating it if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> DownloadResult<Self> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                DownloadError::Io(format!("Failed to create download directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Where a file with this server-provided name will be written.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.base_path.join(sanitize_filename(filename))
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file: &DownloadedFile) -> DownloadResult<()> {
        let path = self.path_for(&file.filename);
        fs::write(&path, &file.bytes).map_err(|e| {
            DownloadError::Io(format!("Failed to write {}: {}", path.display(), e))
        })?;
        log::info!("Saved {} ({} bytes)", path.display(), file.bytes.len());
        Ok(())
    }
}
