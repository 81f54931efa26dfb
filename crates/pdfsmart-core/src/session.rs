//! Editing session state.
//!
//! Holds the identity the backend assigned to the uploaded document and the
//! view/edit state around it. Page index changes go through
//! [`PageNavigator`](crate::PageNavigator), which bounds-checks them.

use crate::config::{DEFAULT_ZOOM, MIN_ZOOM};

/// The source file the user picked for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub size: u64,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Document identity plus view and dirty state for one editing session.
#[derive(Debug, Clone)]
pub struct SessionState {
    document: Option<SourceDocument>,
    session_id: Option<String>,
    page_count: usize,
    current_page: usize,
    zoom: f64,
    min_zoom: f64,
    default_zoom: f64,
    dirty: bool,
    uploading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(MIN_ZOOM, DEFAULT_ZOOM)
    }
}

impl SessionState {
    /// Create an empty session state with the given zoom floor and default.
    pub fn new(min_zoom: f64, default_zoom: f64) -> Self {
        let default_zoom = default_zoom.max(min_zoom);
        Self {
            document: None,
            session_id: None,
            page_count: 1,
            current_page: 0,
            zoom: default_zoom,
            min_zoom,
            default_zoom,
            dirty: false,
            uploading: false,
        }
    }

    /// Accept a new source document, abandoning the current session linkage.
    ///
    /// The backend session is created by the upload; see
    /// [`complete_upload`](Self::complete_upload).
    pub fn set_document(&mut self, document: Option<SourceDocument>) {
        if let Some(id) = &self.session_id {
            log::info!("Abandoning session {}", id);
        }
        self.document = document;
        self.session_id = None;
        self.page_count = 1;
        self.current_page = 0;
        self.dirty = false;
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    /// Mark an upload as in flight.
    pub fn begin_upload(&mut self) {
        self.uploading = true;
    }

    /// Store the identity the backend assigned after a successful upload.
    ///
    /// An empty identifier leaves the state without a session.
    pub fn complete_upload(&mut self, session_id: impl Into<String>, page_count: usize) {
        let session_id = session_id.into();
        self.uploading = false;
        self.page_count = page_count.max(1);
        self.current_page = 0;
        self.dirty = false;
        if session_id.is_empty() {
            log::warn!("Upload completed without a session identifier");
            self.session_id = None;
        } else {
            log::info!("Session {} opened ({} pages)", session_id, self.page_count);
            self.session_id = Some(session_id);
        }
    }

    /// Clear the upload flag after a failed upload.
    pub fn fail_upload(&mut self) {
        self.uploading = false;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Unchecked page setter; callers validate `index < page_count`.
    pub(crate) fn set_current_page(&mut self, index: usize) {
        debug_assert!(index < self.page_count);
        self.current_page = index;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to the minimum. There is no ceiling.
    ///
    /// Zoom is a view parameter: it never marks the session dirty.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.max(self.min_zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = self.default_zoom;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Only a successful save clears the dirty flag.
    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Save is offered only for a dirty, settled session.
    pub fn can_save(&self) -> bool {
        self.can_export() && self.dirty
    }

    /// Export is offered for any settled session, dirty or not.
    pub fn can_export(&self) -> bool {
        self.has_session() && !self.uploading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session(pages: usize) -> SessionState {
        let mut session = SessionState::default();
        session.set_document(Some(SourceDocument::new("report.pdf", 1024)));
        session.begin_upload();
        session.complete_upload("abc123", pages);
        session
    }

    #[test]
    fn test_defaults() {
        let session = SessionState::default();
        assert!(!session.has_session());
        assert_eq!(session.page_count(), 1);
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.zoom(), 1.0);
        assert!(!session.is_dirty());
        assert!(!session.can_save());
        assert!(!session.can_export());
    }

    #[test]
    fn test_zoom_clamps_to_floor_only() {
        let mut session = SessionState::default();
        session.set_zoom(0.3);
        assert_eq!(session.zoom(), 0.5);
        session.set_zoom(2.0);
        assert_eq!(session.zoom(), 2.0);
        session.set_zoom(40.0);
        assert_eq!(session.zoom(), 40.0);
        session.set_zoom(f64::NAN);
        assert_eq!(session.zoom(), 40.0);
        assert!(!session.is_dirty());

        session.reset_zoom();
        assert_eq!(session.zoom(), 1.0);
    }

    #[test]
    fn test_upload_lifecycle() {
        let mut session = SessionState::default();
        session.set_document(Some(SourceDocument::new("a.pdf", 10)));
        session.begin_upload();
        assert!(session.is_uploading());
        assert!(!session.can_export());

        session.complete_upload("sess-1", 0);
        assert!(!session.is_uploading());
        assert_eq!(session.session_id(), Some("sess-1"));
        assert_eq!(session.page_count(), 1);
        assert!(session.can_export());
    }

    #[test]
    fn test_failed_upload_leaves_no_session() {
        let mut session = SessionState::default();
        session.begin_upload();
        session.fail_upload();
        assert!(!session.is_uploading());
        assert!(!session.has_session());
    }

    #[test]
    fn test_empty_identifier_means_no_session() {
        let mut session = SessionState::default();
        session.complete_upload("", 4);
        assert!(!session.has_session());
    }

    #[test]
    fn test_save_needs_dirty_export_does_not() {
        let mut session = open_session(3);
        assert!(session.can_export());
        assert!(!session.can_save());
        session.mark_dirty();
        assert!(session.can_save());
        session.begin_upload();
        assert!(!session.can_save());
        assert!(!session.can_export());
    }

    #[test]
    fn test_set_document_abandons_session() {
        let mut session = open_session(5);
        session.set_current_page(3);
        session.mark_dirty();

        session.set_document(Some(SourceDocument::new("other.pdf", 2048)));
        assert!(!session.has_session());
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.page_count(), 1);
        assert!(!session.is_dirty());
        assert_eq!(session.document().unwrap().name, "other.pdf");
    }
}
