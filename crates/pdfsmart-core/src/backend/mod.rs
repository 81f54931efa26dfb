//! Document-processing backend seam.
//!
//! The backend owns every PDF operation. The controller only pushes per-page
//! canvas state, pulls the compiled document, and posts tool forms.

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{BackendCall, RecordingBackend};

use crate::BoxFuture;
use crate::sync::CanvasPayload;
use crate::tools::{Tool, ToolForm};
use thiserror::Error;

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Backend error: {0}")]
    Other(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// A binary response body plus the headers needed to name it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryResponse {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

/// Per-page canvas endpoint.
pub fn canvas_path(session_id: &str, page_index: usize) -> String {
    format!("/api/documents/{}/pages/{}/canvas", session_id, page_index)
}

/// Compiled document endpoint.
pub fn download_path(session_id: &str) -> String {
    format!("/api/documents/{}/download", session_id)
}

/// Tool endpoint.
pub fn tool_path(tool: Tool) -> String {
    format!("/api/tools/{}", tool.endpoint())
}

/// Trait for the remote document-processing service.
pub trait Backend {
    /// Persist one page's annotation state.
    fn save_page_canvas<'a>(
        &'a self,
        session_id: &'a str,
        page_index: usize,
        payload: &'a CanvasPayload,
    ) -> BoxFuture<'a, BackendResult<()>>;

    /// Fetch the compiled document of a session.
    fn download_document<'a>(&'a self, session_id: &'a str)
    -> BoxFuture<'a, BackendResult<BinaryResponse>>;

    /// Post a multipart form to a tool endpoint.
    fn run_tool<'a>(&'a self, tool: Tool, form: ToolForm)
    -> BoxFuture<'a, BackendResult<BinaryResponse>>;
}
