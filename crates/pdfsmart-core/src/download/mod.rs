//! Shared file-download convention.
//!
//! Every binary the backend returns (compiled documents, tool outputs) is named
//! from its `content-disposition` header when present, otherwise from a caller
//! supplied default, and then handed to a [`DownloadSink`].

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod directory;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use memory::MemorySink;

#[cfg(not(target_arch = "wasm32"))]
pub use directory::DirectorySink;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserSink;

use crate::backend::BinaryResponse;
use thiserror::Error;

/// Download errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Browser error: {0}")]
    Browser(String),
}

/// Result type for download delivery.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// A named binary ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl DownloadedFile {
    /// Name a backend response, falling back to `default_name`.
    pub fn from_response(response: BinaryResponse, default_name: &str) -> Self {
        Self {
            filename: resolve_filename(response.content_disposition.as_deref(), default_name),
            bytes: response.bytes,
            content_type: response.content_type,
        }
    }
}

/// Where downloaded files end up.
pub trait DownloadSink {
    fn deliver(&self, file: &DownloadedFile) -> DownloadResult<()>;
}

impl<T: DownloadSink + ?Sized> DownloadSink for std::rc::Rc<T> {
    fn deliver(&self, file: &DownloadedFile) -> DownloadResult<()> {
        (**self).deliver(file)
    }
}

/// Extract the file name from a `content-disposition` header value.
///
/// Takes whatever follows `filename=` up to the next `;`, with quotes removed.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let raw = rest.split(';').next().unwrap_or_default();
    let name: String = raw.chars().filter(|c| *c != '"').collect();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// File name for a response: header-derived, else `default_name`.
pub fn resolve_filename(content_disposition: Option<&str>, default_name: &str) -> String {
    content_disposition
        .and_then(filename_from_content_disposition)
        .unwrap_or_else(|| default_name.to_string())
}

/// Fallback name for a session's compiled document.
pub fn default_export_filename(session_id: &str) -> String {
    format!("document_{}.pdf", session_id)
}

/// Make a server-provided name safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_matches(|c| c == '.' || c == ' ');
    if safe.is_empty() {
        "download".to_string()
    } else {
        safe.to_string()
    }
}
