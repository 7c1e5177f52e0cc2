//! # Selection Tracker
//!
//! Holds the single currently-selected node as a name-based `NodeId` and
//! reports changes. Selecting `None` means selecting the survey root;
//! selecting a node that no longer resolves is rejected silently and the
//! previous selection is retained.

use formcraft_model::{NodeId, SurveyDocument};

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: NodeId,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            current: NodeId::Survey,
        }
    }

    pub fn current(&self) -> &NodeId {
        &self.current
    }

    /// Change the selection.
    ///
    /// Returns the new selection if it actually changed; `None` when the
    /// target equals the current selection (idempotent selects do not
    /// re-notify) or when the target does not resolve against `doc`.
    pub fn select(&mut self, target: Option<NodeId>, doc: &SurveyDocument) -> Option<NodeId> {
        let target = target.unwrap_or(NodeId::Survey);
        if !doc.contains(&target) {
            tracing::debug!(?target, "rejecting selection of missing node");
            return None;
        }
        if target == self.current {
            return None;
        }
        self.current = target.clone();
        Some(target)
    }

    /// Force the selection without resolution checks. Used when restoring
    /// state (undo/redo, document replacement) where the caller already
    /// validated the target.
    pub fn reset(&mut self, target: NodeId) {
        self.current = target;
    }

    /// Whether `id` names the same underlying document node as the current
    /// selection.
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.current == *id
    }
}
