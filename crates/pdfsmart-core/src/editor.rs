//! The editing-session controller.
//!
//! [`Editor`] is constructed once at the application root and handed to
//! whatever drives it (UI event loop, shortcut dispatch, CLI). It owns the
//! session state, the history stack and the bound scene, and routes save and
//! export through the [`SyncEngine`].

use crate::backend::Backend;
use crate::config::EditorConfig;
use crate::download::DownloadSink;
use crate::history::HistoryStack;
use crate::navigator::PageNavigator;
use crate::scene::{SceneAdapter, SceneResult};
use crate::session::{SessionState, SourceDocument};
use crate::sync::{ExportOutcome, SaveOutcome, SyncEngine, SyncResult};
use std::sync::Arc;

/// Shown when a save fails.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save changes.";

/// Shown when an export fails.
pub const EXPORT_FAILED_MESSAGE: &str = "Failed to export PDF.";

/// Receives user-visible notifications.
pub trait Notifier {
    /// A blocking failure message.
    fn notify_failure(&self, message: &str);

    fn notify_success(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_failure(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Editing-session state object.
pub struct Editor<S: SceneAdapter, B: Backend> {
    config: EditorConfig,
    session: SessionState,
    history: HistoryStack,
    scene: Option<S>,
    sync: SyncEngine<B>,
    sink: Box<dyn DownloadSink>,
    notifier: Box<dyn Notifier>,
}

impl<S: SceneAdapter, B: Backend> Editor<S, B> {
    pub fn new(config: EditorConfig, backend: Arc<B>, sink: Box<dyn DownloadSink>) -> Self {
        Self {
            session: SessionState::new(config.min_zoom, config.default_zoom),
            history: HistoryStack::with_limit(config.history_limit),
            scene: None,
            sync: SyncEngine::new(backend),
            sink,
            notifier: Box::new(LogNotifier),
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn scene(&self) -> Option<&S> {
        self.scene.as_ref()
    }

    /// Direct access to the drawing surface, for user edits.
    ///
    /// Edits queue events; call [`pump_scene_events`](Self::pump_scene_events)
    /// to record them.
    pub fn scene_mut(&mut self) -> Option<&mut S> {
        self.scene.as_mut()
    }

    pub fn backend(&self) -> &Arc<B> {
        self.sync.backend()
    }

    // --- Document and scene lifecycle ---

    /// Attach the drawing surface, replacing any bound one.
    ///
    /// The history restarts from the scene's current state. Events already
    /// queued on the scene belong to its initial load and are dropped.
    pub fn bind_scene(&mut self, mut scene: S) -> SceneResult<()> {
        if self.scene.take().is_some() {
            self.history.reset();
        }
        self.history.bind(&scene)?;
        let dropped = scene.drain_events();
        if !dropped.is_empty() {
            log::debug!("Dropped {} events queued before binding", dropped.len());
        }
        scene.set_zoom(self.session.zoom());
        self.scene = Some(scene);
        Ok(())
    }

    /// Detach the drawing surface and forget its history.
    pub fn unbind_scene(&mut self) -> Option<S> {
        self.history.reset();
        self.scene.take()
    }

    /// Replace the source document.
    ///
    /// Tears down the current session, scene and history. A new session
    /// starts once the upload completes.
    pub fn set_document(&mut self, document: Option<SourceDocument>) {
        self.session.set_document(document);
        self.unbind_scene();
    }

    pub fn begin_upload(&mut self) {
        self.session.begin_upload();
    }

    pub fn complete_upload(&mut self, session_id: impl Into<String>, page_count: usize) {
        self.session.complete_upload(session_id, page_count);
    }

    pub fn fail_upload(&mut self) {
        self.session.fail_upload();
    }

    // --- History ---

    /// Turn queued scene notifications into a history entry.
    ///
    /// Everything queued since the last pump is one batch: the scene is
    /// snapshotted once and the session marked dirty. Returns the number of
    /// snapshots recorded (0 or 1).
    pub fn pump_scene_events(&mut self) -> SceneResult<usize> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(0);
        };

        let events = scene.drain_events();
        if events.is_empty() || !self.history.capture(&*scene)? {
            return Ok(0);
        }
        log::trace!("Captured {} scene events as one entry: {:?}", events.len(), events);
        self.session.mark_dirty();
        Ok(1)
    }

    pub fn can_undo(&self) -> bool {
        self.scene.is_some() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.scene.is_some() && self.history.can_redo()
    }

    /// Step back one history entry. Returns false at the baseline.
    pub async fn undo(&mut self) -> SceneResult<bool> {
        self.pump_scene_events()?;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let moved = self.history.undo(scene).await?;
        if moved {
            self.session.mark_dirty();
        }
        Ok(moved)
    }

    /// Step forward one history entry. Returns false at the tail.
    pub async fn redo(&mut self) -> SceneResult<bool> {
        self.pump_scene_events()?;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let moved = self.history.redo(scene).await?;
        if moved {
            self.session.mark_dirty();
        }
        Ok(moved)
    }

    // --- Navigation ---

    pub fn next_page(&mut self) -> bool {
        PageNavigator::next(&mut self.session)
    }

    pub fn previous_page(&mut self) -> bool {
        PageNavigator::previous(&mut self.session)
    }

    pub fn go_to_page(&mut self, index: usize) -> bool {
        PageNavigator::go_to(&mut self.session, index)
    }

    pub fn page_label(&self) -> String {
        PageNavigator::label(&self.session)
    }

    // --- Zoom ---

    /// Set the zoom factor (clamped to the configured minimum).
    pub fn set_zoom(&mut self, zoom: f64) {
        self.session.set_zoom(zoom);
        self.apply_zoom();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.session.zoom() + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.session.zoom() - self.config.zoom_step);
    }

    pub fn reset_zoom(&mut self) {
        self.session.reset_zoom();
        self.apply_zoom();
    }

    fn apply_zoom(&mut self) {
        let zoom = self.session.zoom();
        if let Some(scene) = self.scene.as_mut() {
            scene.set_zoom(zoom);
            scene.request_render();
        }
    }

    // --- Sync ---

    /// Save the current page if it has unsaved edits.
    ///
    /// Failures are reported through the notifier and leave the session dirty.
    pub async fn save_changes(&mut self) -> SyncResult<SaveOutcome> {
        let result = self.try_save().await;
        if let Err(e) = &result {
            log::error!("Save failed: {}", e);
            self.notifier.notify_failure(SAVE_FAILED_MESSAGE);
        }
        result
    }

    async fn try_save(&mut self) -> SyncResult<SaveOutcome> {
        self.pump_scene_events()?;
        let scene = self
            .scene
            .as_mut()
            .map(|scene| scene as &mut dyn SceneAdapter);
        self.sync.save_changes(&mut self.session, scene, false).await
    }

    /// Save the current page, then download the compiled document.
    pub async fn export_pdf(&mut self) -> SyncResult<ExportOutcome> {
        let result = self.try_export().await;
        if let Err(e) = &result {
            log::error!("Export failed: {}", e);
            self.notifier.notify_failure(EXPORT_FAILED_MESSAGE);
        }
        result
    }

    async fn try_export(&mut self) -> SyncResult<ExportOutcome> {
        self.pump_scene_events()?;
        let scene = self
            .scene
            .as_mut()
            .map(|scene| scene as &mut dyn SceneAdapter);
        self.sync
            .export_pdf(&mut self.session, scene, &*self.sink)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};
    use crate::download::MemorySink;
    use crate::BoxFuture;
    use crate::scene::{Background, MemoryScene, SceneError, SceneEvent};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingNotifier {
        failures: RefCell<Vec<String>>,
    }

    impl Notifier for Rc<RecordingNotifier> {
        fn notify_failure(&self, message: &str) {
            self.failures.borrow_mut().push(message.to_string());
        }
    }

    struct Fixture {
        editor: Editor<MemoryScene, RecordingBackend>,
        backend: Arc<RecordingBackend>,
        sink: Rc<MemorySink>,
        notifier: Rc<RecordingNotifier>,
    }

    fn fixture(pages: usize) -> Fixture {
        let backend = Arc::new(RecordingBackend::new());
        let sink = Rc::new(MemorySink::new());
        let notifier = Rc::new(RecordingNotifier::default());
        let mut editor = Editor::new(EditorConfig::default(), backend.clone(), Box::new(sink.clone()))
            .with_notifier(Box::new(notifier.clone()));
        editor.set_document(Some(SourceDocument::new("report.pdf", 2048)));
        editor.begin_upload();
        editor.complete_upload("sess-1", pages);
        editor.bind_scene(MemoryScene::new(8, 8)).unwrap();
        Fixture {
            editor,
            backend,
            sink,
            notifier,
        }
    }

    fn draw(editor: &mut Editor<MemoryScene, RecordingBackend>, n: usize) {
        for i in 0..n {
            editor
                .scene_mut()
                .unwrap()
                .add_object(json!({ "type": "path", "id": i }));
            editor.pump_scene_events().unwrap();
        }
    }

    #[test]
    fn test_bind_records_baseline() {
        let f = fixture(1);
        assert_eq!(f.editor.history().len(), 1);
        assert_eq!(f.editor.history().cursor(), 0);
        assert!(!f.editor.session().is_dirty());
        assert!(!f.editor.can_undo());
    }

    #[test]
    fn test_edits_capture_and_mark_dirty() {
        let mut f = fixture(1);
        draw(&mut f.editor, 3);
        assert_eq!(f.editor.history().len(), 4);
        assert_eq!(f.editor.history().cursor(), 3);
        assert!(f.editor.session().is_dirty());
    }

    #[test]
    fn test_batched_edits_become_one_entry() {
        let mut f = fixture(1);
        let scene = f.editor.scene_mut().unwrap();
        scene.add_object(json!({ "type": "path", "id": 1 }));
        scene.add_object(json!({ "type": "path", "id": 2 }));

        assert!(pollster::block_on(f.editor.undo()).unwrap());
        assert!(f.editor.scene().unwrap().is_empty());
        assert_eq!(f.editor.history().len(), 2);
        assert_eq!(f.editor.history().cursor(), 0);
        assert!(!f.editor.can_undo());

        assert!(pollster::block_on(f.editor.redo()).unwrap());
        assert_eq!(f.editor.scene().unwrap().len(), 2);
    }

    #[test]
    fn test_undo_redo_restore_scene() {
        let mut f = fixture(1);
        draw(&mut f.editor, 2);

        assert!(pollster::block_on(f.editor.undo()).unwrap());
        assert_eq!(f.editor.scene().unwrap().len(), 1);
        assert_eq!(f.editor.history().len(), 3);

        // Rehydration echoes must not become new entries.
        assert_eq!(f.editor.pump_scene_events().unwrap(), 0);
        assert_eq!(f.editor.history().len(), 3);

        assert!(pollster::block_on(f.editor.redo()).unwrap());
        assert_eq!(f.editor.scene().unwrap().len(), 2);
        assert!(!pollster::block_on(f.editor.redo()).unwrap());
    }

    #[test]
    fn test_undo_marks_dirty_after_save() {
        let mut f = fixture(1);
        draw(&mut f.editor, 1);
        pollster::block_on(f.editor.save_changes()).unwrap();
        assert!(!f.editor.session().is_dirty());

        assert!(pollster::block_on(f.editor.undo()).unwrap());
        assert!(f.editor.session().is_dirty());
        assert!(!pollster::block_on(f.editor.undo()).unwrap());
    }

    #[test]
    fn test_save_picks_up_pending_edits() {
        let mut f = fixture(1);
        f.editor
            .scene_mut()
            .unwrap()
            .add_object(json!({ "type": "text" }));

        let outcome = pollster::block_on(f.editor.save_changes()).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(f.editor.history().len(), 2);
        assert_eq!(f.backend.save_count(), 1);
    }

    #[test]
    fn test_clean_save_is_noop() {
        let mut f = fixture(1);
        let outcome = pollster::block_on(f.editor.save_changes()).unwrap();
        assert_eq!(outcome, SaveOutcome::Clean);
        assert!(f.backend.calls().is_empty());
    }

    #[test]
    fn test_failed_save_notifies_and_stays_dirty() {
        let mut f = fixture(1);
        draw(&mut f.editor, 1);
        f.backend.set_fail_saves(true);

        assert!(pollster::block_on(f.editor.save_changes()).is_err());
        assert!(f.editor.session().is_dirty());
        assert_eq!(*f.notifier.failures.borrow(), [SAVE_FAILED_MESSAGE]);

        f.backend.set_fail_saves(false);
        pollster::block_on(f.editor.save_changes()).unwrap();
        assert!(!f.editor.session().is_dirty());
    }

    #[test]
    fn test_export_delivers_to_sink() {
        let mut f = fixture(2);
        let outcome = pollster::block_on(f.editor.export_pdf()).unwrap();
        assert_eq!(outcome, ExportOutcome::Exported("document_sess-1.pdf".to_string()));
        assert_eq!(f.sink.files().len(), 1);
        assert!(matches!(
            f.backend.calls().as_slice(),
            [BackendCall::SaveCanvas { .. }, BackendCall::Download { .. }]
        ));
    }

    #[test]
    fn test_failed_export_notifies() {
        let mut f = fixture(1);
        f.backend.set_fail_downloads(true);
        assert!(pollster::block_on(f.editor.export_pdf()).is_err());
        assert_eq!(*f.notifier.failures.borrow(), [EXPORT_FAILED_MESSAGE]);
        assert!(f.sink.files().is_empty());
    }

    #[test]
    fn test_save_and_export_wait_for_upload() {
        let mut f = fixture(1);
        draw(&mut f.editor, 1);
        f.editor.begin_upload();

        let saved = pollster::block_on(f.editor.save_changes()).unwrap();
        assert_eq!(saved, SaveOutcome::Uploading);
        let exported = pollster::block_on(f.editor.export_pdf()).unwrap();
        assert_eq!(exported, ExportOutcome::Uploading);

        assert!(f.backend.calls().is_empty());
        assert!(f.sink.files().is_empty());
        assert!(f.notifier.failures.borrow().is_empty());
    }

    /// Scene whose serialization can be broken after it is bound.
    struct BrittleScene {
        inner: MemoryScene,
        broken: bool,
    }

    impl SceneAdapter for BrittleScene {
        fn to_json(&self) -> SceneResult<String> {
            if self.broken {
                return Err(SceneError::Other("serializer gone".to_string()));
            }
            self.inner.to_json()
        }

        fn load_from_json<'a>(&'a mut self, json: &'a str) -> BoxFuture<'a, SceneResult<()>> {
            self.inner.load_from_json(json)
        }

        fn objects(&self) -> SceneResult<Vec<serde_json::Value>> {
            self.inner.objects()
        }

        fn zoom(&self) -> f64 {
            self.inner.zoom()
        }

        fn set_zoom(&mut self, zoom: f64) {
            self.inner.set_zoom(zoom)
        }

        fn take_background(&mut self) -> Option<Background> {
            self.inner.take_background()
        }

        fn set_background(&mut self, background: Option<Background>) {
            self.inner.set_background(background)
        }

        fn request_render(&mut self) {
            self.inner.request_render()
        }

        fn render_png(&mut self) -> SceneResult<Vec<u8>> {
            self.inner.render_png()
        }

        fn drain_events(&mut self) -> Vec<SceneEvent> {
            self.inner.drain_events()
        }
    }

    #[test]
    fn test_unrecorded_edits_notify_on_save_and_export() {
        let backend = Arc::new(RecordingBackend::new());
        let notifier = Rc::new(RecordingNotifier::default());
        let mut editor = Editor::new(
            EditorConfig::default(),
            backend.clone(),
            Box::new(MemorySink::new()),
        )
        .with_notifier(Box::new(notifier.clone()));
        editor.complete_upload("sess-1", 1);
        editor
            .bind_scene(BrittleScene {
                inner: MemoryScene::new(4, 4),
                broken: false,
            })
            .unwrap();

        let scene = editor.scene_mut().unwrap();
        scene.inner.add_object(json!({ "type": "path" }));
        scene.broken = true;
        assert!(pollster::block_on(editor.save_changes()).is_err());

        editor
            .scene_mut()
            .unwrap()
            .inner
            .add_object(json!({ "type": "path" }));
        assert!(pollster::block_on(editor.export_pdf()).is_err());

        assert_eq!(
            *notifier.failures.borrow(),
            [SAVE_FAILED_MESSAGE, EXPORT_FAILED_MESSAGE]
        );
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_navigation_saves_nothing() {
        let mut f = fixture(3);
        draw(&mut f.editor, 1);
        assert!(f.editor.next_page());
        assert!(f.editor.next_page());
        assert!(!f.editor.next_page());
        assert_eq!(f.editor.page_label(), "Page 3 of 3");
        assert!(f.editor.go_to_page(0));
        assert!(!f.editor.go_to_page(3));
        assert!(f.backend.calls().is_empty());
        assert!(f.editor.session().is_dirty());
    }

    #[test]
    fn test_zoom_is_clamped_and_not_an_edit() {
        let mut f = fixture(1);
        f.editor.set_zoom(0.3);
        assert_eq!(f.editor.session().zoom(), 0.5);
        f.editor.set_zoom(2.0);
        assert_eq!(f.editor.session().zoom(), 2.0);
        assert_eq!(f.editor.scene().unwrap().zoom(), 2.0);

        f.editor.reset_zoom();
        f.editor.zoom_in();
        assert!((f.editor.session().zoom() - 1.1).abs() < 1e-9);
        for _ in 0..10 {
            f.editor.zoom_out();
        }
        assert_eq!(f.editor.session().zoom(), 0.5);

        assert_eq!(f.editor.history().len(), 1);
        assert!(!f.editor.session().is_dirty());
    }

    #[test]
    fn test_set_document_tears_down() {
        let mut f = fixture(4);
        draw(&mut f.editor, 2);
        f.editor.next_page();

        f.editor.set_document(Some(SourceDocument::new("other.pdf", 10)));
        assert!(!f.editor.session().has_session());
        assert_eq!(f.editor.session().current_page(), 0);
        assert!(f.editor.scene().is_none());
        assert!(f.editor.history().is_empty());
        assert!(!pollster::block_on(f.editor.undo()).unwrap());

        let outcome = pollster::block_on(f.editor.export_pdf()).unwrap();
        assert_eq!(outcome, ExportOutcome::NoSession);
    }

    #[test]
    fn test_history_limit_from_config() {
        let backend = Arc::new(RecordingBackend::new());
        let config = EditorConfig::default().with_history_limit(Some(3));
        let mut editor: Editor<MemoryScene, _> =
            Editor::new(config, backend, Box::new(MemorySink::new()));
        editor.bind_scene(MemoryScene::new(4, 4)).unwrap();
        draw(&mut editor, 5);
        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.history().cursor(), 2);
    }
}
