//! Applies shortcut actions to an editor.

use crate::shortcuts::EditorAction;
use pdfsmart_core::{Backend, Editor, SaveOutcome, SceneAdapter};

/// What dispatching an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The editor state changed or a request went out.
    Handled,
    /// Nothing to do (boundary reached, action disabled).
    Ignored,
    /// The action failed; the editor has already notified the user.
    Failed,
    /// The host should show its file picker.
    OpenRequested,
    /// The host should show the shortcut list.
    HelpRequested,
}

impl From<bool> for DispatchOutcome {
    fn from(changed: bool) -> Self {
        if changed {
            DispatchOutcome::Handled
        } else {
            DispatchOutcome::Ignored
        }
    }
}

/// Apply `action` to `editor`.
pub async fn dispatch<S, B>(editor: &mut Editor<S, B>, action: EditorAction) -> DispatchOutcome
where
    S: SceneAdapter,
    B: Backend,
{
    log::debug!("Dispatching {:?}", action);
    match action {
        EditorAction::Save => {
            // Disabled without a session, during an upload, and when clean.
            if let Err(e) = editor.pump_scene_events() {
                log::warn!("Could not record pending edits: {}", e);
            }
            if !editor.session().can_save() {
                return DispatchOutcome::Ignored;
            }
            match editor.save_changes().await {
                Ok(SaveOutcome::Saved) => DispatchOutcome::Handled,
                Ok(_) => DispatchOutcome::Ignored,
                Err(_) => DispatchOutcome::Failed,
            }
        }
        EditorAction::Undo => match editor.undo().await {
            Ok(moved) => moved.into(),
            Err(e) => {
                log::error!("Undo failed: {}", e);
                DispatchOutcome::Failed
            }
        },
        EditorAction::Redo => match editor.redo().await {
            Ok(moved) => moved.into(),
            Err(e) => {
                log::error!("Redo failed: {}", e);
                DispatchOutcome::Failed
            }
        },
        EditorAction::PreviousPage => editor.previous_page().into(),
        EditorAction::NextPage => editor.next_page().into(),
        EditorAction::ZoomIn => {
            editor.zoom_in();
            DispatchOutcome::Handled
        }
        EditorAction::ZoomOut => {
            editor.zoom_out();
            DispatchOutcome::Handled
        }
        EditorAction::Open => DispatchOutcome::OpenRequested,
        EditorAction::Help => DispatchOutcome::HelpRequested,
    }
}
