//! PDF Smart Editor Core Library
//!
//! The editing-session controller behind the browser PDF annotator: session
//! identity, page navigation, undo/redo over the drawing surface, dirty-state
//! tracking and the save/export protocol with the document-processing backend.

pub mod backend;
pub mod config;
pub mod download;
pub mod editor;
pub mod history;
pub mod navigator;
pub mod scene;
pub mod session;
pub mod sync;
pub mod tools;

pub use backend::{Backend, BackendError, BinaryResponse, HttpBackend, RecordingBackend};
pub use config::EditorConfig;
pub use download::{DownloadSink, DownloadedFile, MemorySink, resolve_filename};
#[cfg(not(target_arch = "wasm32"))]
pub use download::DirectorySink;
#[cfg(target_arch = "wasm32")]
pub use download::BrowserSink;
pub use editor::{Editor, LogNotifier, Notifier};
pub use history::{HistoryPhase, HistoryStack, Snapshot};
pub use navigator::PageNavigator;
pub use scene::{Background, MemoryScene, SceneAdapter, SceneError, SceneEvent};
pub use session::{SessionState, SourceDocument};
pub use sync::{CanvasPayload, ExportOutcome, SaveOutcome, SyncEngine, SyncError};
pub use tools::{FormFile, NumberPosition, Rotation, Tool, ToolError, ToolForm, ToolRunner};

use std::future::Future;
use std::pin::Pin;

/// Boxed future for the async seams.
///
/// Not `Send`: the controller runs on a single-threaded event loop (the
/// browser, or a current-thread runtime natively).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
