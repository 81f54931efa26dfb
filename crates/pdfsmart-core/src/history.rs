//! Linear undo/redo over full scene snapshots.
//!
//! The stack is an arena of serialized scene states addressed by a cursor. The
//! snapshot under the cursor is always the one currently materialized on the
//! scene. Capturing while the cursor is behind the tail drops everything after
//! it first; there is no branching history.
//!
//! Capture is gated by [`HistoryPhase`]: while an undo/redo rehydrates the
//! scene, the mutation events that rehydration produces must not be recorded
//! as new edits.

use crate::scene::{SceneAdapter, SceneResult};
use std::fmt;
use std::sync::Arc;

/// An immutable serialized scene state.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn new(json: impl Into<Arc<str>>) -> Self {
        Self(json.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// What the history stack is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPhase {
    /// Ready; mutation events are captured.
    #[default]
    Idle,
    /// Serializing the scene for a new entry.
    Capturing,
    /// Restoring the scene from an entry; captures are refused.
    Rehydrating,
}

/// Snapshot history with a cursor.
#[derive(Debug, Default)]
pub struct HistoryStack {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    phase: HistoryPhase,
    limit: Option<usize>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` snapshots (at least one).
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the materialized snapshot. Meaningless while empty.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> HistoryPhase {
        self.phase
    }

    /// The snapshot currently materialized on the scene.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn can_undo(&self) -> bool {
        self.phase == HistoryPhase::Idle && !self.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.phase == HistoryPhase::Idle && self.cursor + 1 < self.snapshots.len()
    }

    /// Record the baseline state of a freshly bound scene.
    ///
    /// Only acts on an empty history; returns true when a baseline was taken.
    pub fn bind(&mut self, scene: &dyn SceneAdapter) -> SceneResult<bool> {
        if !self.is_empty() {
            return Ok(false);
        }
        let json = scene.to_json()?;
        self.snapshots.push(Snapshot::new(json));
        self.cursor = 0;
        log::debug!("History baseline captured");
        Ok(true)
    }

    /// Record the scene's current state as a new entry.
    ///
    /// Returns false (and records nothing) unless the stack is idle.
    pub fn capture(&mut self, scene: &dyn SceneAdapter) -> SceneResult<bool> {
        if self.phase != HistoryPhase::Idle {
            log::debug!("Capture refused while {:?}", self.phase);
            return Ok(false);
        }

        self.phase = HistoryPhase::Capturing;
        let json = scene.to_json();
        self.phase = HistoryPhase::Idle;

        self.push(Snapshot::new(json?));
        Ok(true)
    }

    fn push(&mut self, snapshot: Snapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;

        if let Some(limit) = self.limit {
            if self.snapshots.len() > limit {
                let excess = self.snapshots.len() - limit;
                self.snapshots.drain(..excess);
                self.cursor -= excess;
            }
        }
    }

    /// Step back one entry, rehydrating the scene from it.
    ///
    /// Returns false at the first entry (or while another rehydration runs).
    pub async fn undo(&mut self, scene: &mut dyn SceneAdapter) -> SceneResult<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        self.rehydrate(scene, self.cursor - 1).await?;
        Ok(true)
    }

    /// Step forward one entry, rehydrating the scene from it.
    ///
    /// Returns false at the tail (or while another rehydration runs).
    pub async fn redo(&mut self, scene: &mut dyn SceneAdapter) -> SceneResult<bool> {
        if !self.can_redo() {
            return Ok(false);
        }
        self.rehydrate(scene, self.cursor + 1).await?;
        Ok(true)
    }

    async fn rehydrate(&mut self, scene: &mut dyn SceneAdapter, target: usize) -> SceneResult<()> {
        // Entered before the first await so no capture can slip in.
        self.phase = HistoryPhase::Rehydrating;

        let snapshot = self.snapshots[target].clone();
        let result = scene.load_from_json(snapshot.as_str()).await;

        // Events raised by the load are echoes of the restore, not edits.
        let echoed = scene.drain_events();
        log::debug!(
            "Rehydrated history entry {} ({} scene events discarded)",
            target,
            echoed.len()
        );

        match &result {
            Ok(()) => self.cursor = target,
            Err(e) => {
                log::warn!("Rehydrating entry {} failed: {}", target, e);
                self.restore_current(scene).await;
            }
        }
        scene.request_render();
        self.phase = HistoryPhase::Idle;
        result
    }

    /// Put the entry at the cursor back after a failed load left the scene
    /// half-replaced. If that fails too the scene is left as is.
    async fn restore_current(&mut self, scene: &mut dyn SceneAdapter) {
        let Some(snapshot) = self.snapshots.get(self.cursor).cloned() else {
            return;
        };
        let restored = scene.load_from_json(snapshot.as_str()).await;
        scene.drain_events();
        if let Err(e) = restored {
            log::error!("Scene no longer matches history entry {}: {}", self.cursor, e);
        }
    }

    /// Forget everything; the next bind records a new baseline.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
        self.phase = HistoryPhase::Idle;
    }
}
