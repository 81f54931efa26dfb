//! Save/export synchronization with the document-processing backend.

use crate::backend::{Backend, BackendError};
use crate::download::{DownloadError, DownloadSink, DownloadedFile, default_export_filename};
use crate::scene::{SceneAdapter, SceneError, SceneResult};
use crate::session::SessionState;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Body of the per-page canvas request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasPayload {
    pub objects: Vec<serde_json::Value>,
    pub zoom: f64,
    /// Always empty: the backend composites onto its own page raster.
    pub background_image: String,
    /// Annotation-only raster as a PNG data URL.
    pub overlay_image: String,
}

/// What a save request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NoSession,
    /// A new document is being uploaded; the session is about to change.
    Uploading,
    NoScene,
    /// Nothing to save and the save was not forced.
    Clean,
}

/// What an export request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The compiled document was delivered under this file name.
    Exported(String),
    NoSession,
    /// A new document is being uploaded; nothing was requested.
    Uploading,
}

/// Pushes page state to the backend and pulls compiled documents.
pub struct SyncEngine<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> SyncEngine<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Build the canvas payload for the scene's current state.
    ///
    /// The background is detached while the overlay is rendered and put back
    /// afterwards, even if rendering failed.
    pub fn compose_payload(&self, scene: &mut dyn SceneAdapter) -> SceneResult<CanvasPayload> {
        let objects = scene.objects()?;
        let zoom = scene.zoom();

        let background = scene.take_background();
        scene.request_render();
        let overlay = scene.render_png();
        if background.is_some() {
            scene.set_background(background);
            scene.request_render();
        }
        let overlay = overlay?;

        Ok(CanvasPayload {
            objects,
            zoom,
            background_image: String::new(),
            overlay_image: format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&overlay)),
        })
    }

    /// Persist the current page.
    ///
    /// Skipped without a session or a scene, while an upload is in flight, and
    /// when clean unless `force` is set. The dirty flag is cleared only once the backend accepted the page.
    pub async fn save_changes(
        &self,
        session: &mut SessionState,
        scene: Option<&mut dyn SceneAdapter>,
        force: bool,
    ) -> SyncResult<SaveOutcome> {
        let Some(session_id) = session.session_id().map(str::to_owned) else {
            return Ok(SaveOutcome::NoSession);
        };
        if session.is_uploading() {
            log::debug!("Save of session {} skipped during upload", session_id);
            return Ok(SaveOutcome::Uploading);
        }
        let Some(scene) = scene else {
            return Ok(SaveOutcome::NoScene);
        };
        if !force && !session.is_dirty() {
            return Ok(SaveOutcome::Clean);
        }

        let page_index = session.current_page();
        let payload = self.compose_payload(scene)?;
        log::debug!(
            "Saving page {} of session {} ({} objects)",
            page_index,
            session_id,
            payload.objects.len()
        );

        self.backend
            .save_page_canvas(&session_id, page_index, &payload)
            .await?;

        session.mark_saved();
        log::info!("Saved page {} of session {}", page_index, session_id);
        Ok(SaveOutcome::Saved)
    }

    /// Save the current page, then fetch the compiled document and deliver it.
    ///
    /// The download is only requested once the save has resolved. A failed
    /// save stops the export.
    pub async fn export_pdf(
        &self,
        session: &mut SessionState,
        scene: Option<&mut dyn SceneAdapter>,
        sink: &dyn DownloadSink,
    ) -> SyncResult<ExportOutcome> {
        let Some(session_id) = session.session_id().map(str::to_owned) else {
            return Ok(ExportOutcome::NoSession);
        };
        if session.is_uploading() {
            log::debug!("Export of session {} skipped during upload", session_id);
            return Ok(ExportOutcome::Uploading);
        }

        self.save_changes(session, scene, true).await?;

        let response = self.backend.download_document(&session_id).await?;
        let file = DownloadedFile::from_response(response, &default_export_filename(&session_id));
        sink.deliver(&file)?;

        log::info!("Exported session {} as {}", session_id, file.filename);
        Ok(ExportOutcome::Exported(file.filename))
    }
}
