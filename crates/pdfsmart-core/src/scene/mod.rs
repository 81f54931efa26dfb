//! Drawing surface abstraction.
//!
//! The live drawing engine is an external collaborator. The controller only
//! needs full-state (de)serialization, read access to the object records,
//! background detach/reattach and a raster render; mutation notifications are
//! queued by the adapter and polled with [`SceneAdapter::drain_events`].

mod memory;

pub use memory::MemoryScene;

use crate::BoxFuture;
use thiserror::Error;

/// Scene adapter errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Scene error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        SceneError::Serialization(e.to_string())
    }
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Object mutation notifications emitted by the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    ObjectAdded,
    ObjectModified,
    ObjectRemoved,
}

/// The page background reference image attached to a scene.
///
/// The backend owns the authoritative page raster; this is only what the
/// surface displays behind the annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// Where the image came from (usually a data or object URL).
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// A mutable drawing surface holding the live objects of the current page.
pub trait SceneAdapter {
    /// Serialize the full object graph.
    fn to_json(&self) -> SceneResult<String>;

    /// Replace the object graph with a previously serialized one.
    ///
    /// May complete asynchronously and may queue mutation events while doing so.
    fn load_from_json<'a>(&'a mut self, json: &'a str) -> BoxFuture<'a, SceneResult<()>>;

    /// Serialized records of every drawing object, back to front.
    fn objects(&self) -> SceneResult<Vec<serde_json::Value>>;

    /// Current zoom factor of the surface.
    fn zoom(&self) -> f64;

    /// Apply a view zoom. Not a document edit: queues no event.
    fn set_zoom(&mut self, zoom: f64);

    /// Detach the background image, if any.
    fn take_background(&mut self) -> Option<Background>;

    /// Attach (or clear) the background image.
    fn set_background(&mut self, background: Option<Background>);

    /// Schedule a re-render of the surface.
    fn request_render(&mut self);

    /// Render what is currently visible to PNG bytes.
    fn render_png(&mut self) -> SceneResult<Vec<u8>>;

    /// Take all mutation notifications queued since the last call.
    fn drain_events(&mut self) -> Vec<SceneEvent>;
}
