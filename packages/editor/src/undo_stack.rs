//! # Undo/Redo Manager
//!
//! Snapshot-based undo for the designer.
//!
//! ## Design
//!
//! - Each committed operation records one snapshot: the full document plus
//!   the selection that was current when the operation finished
//! - The latest snapshot lives in a separate `current` slot; the undo stack
//!   only holds *previous* states, so undo after N operations restores the
//!   state before the Nth, not the Nth itself
//! - Undo moves `current` to the redo stack and pops the undo stack into
//!   `current`; redo is the mirror image
//! - A new snapshot clears the redo stack
//! - Snapshots identical to `current` only refresh the recorded selection

use formcraft_model::{NodeId, SurveyDocument};

/// One restorable state: the document and the node selected at that time.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRedoItem {
    pub doc: SurveyDocument,
    pub selection: NodeId,
}

impl UndoRedoItem {
    pub fn new(doc: SurveyDocument, selection: NodeId) -> Self {
        Self { doc, selection }
    }
}

#[derive(Debug, Default)]
pub struct UndoRedoManager {
    /// Previous states, most recent last.
    undo_items: Vec<UndoRedoItem>,

    /// Undone states, most recent last.
    redo_items: Vec<UndoRedoItem>,

    /// The state the live document corresponds to right now.
    current: Option<UndoRedoItem>,

    /// Maximum number of undo levels (0 = unlimited).
    max_levels: usize,
}

impl UndoRedoManager {
    /// Create a manager with the default limit of 100 undo levels.
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_items: Vec::new(),
            redo_items: Vec::new(),
            current: None,
            max_levels,
        }
    }

    /// Record the state after a committed operation.
    ///
    /// The previous `current` moves onto the undo stack and any redo states
    /// are invalidated. If the document is unchanged (a pure selection move)
    /// only the recorded selection is refreshed, no level is consumed.
    pub fn set_current(&mut self, item: UndoRedoItem) {
        if let Some(current) = &mut self.current {
            if current.doc == item.doc {
                current.selection = item.selection;
                return;
            }
        }
        if let Some(previous) = self.current.replace(item) {
            self.undo_items.push(previous);
            if self.max_levels > 0 && self.undo_items.len() > self.max_levels {
                self.undo_items.remove(0);
            }
        }
        self.redo_items.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_items.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_items.is_empty()
    }

    /// Step back one state. Returns the state to restore, which has also
    /// become the new `current`.
    pub fn undo(&mut self) -> Option<UndoRedoItem> {
        let restored = self.undo_items.pop()?;
        if let Some(current) = self.current.replace(restored.clone()) {
            self.redo_items.push(current);
        }
        Some(restored)
    }

    /// Step forward one previously-undone state.
    pub fn redo(&mut self) -> Option<UndoRedoItem> {
        let restored = self.redo_items.pop()?;
        if let Some(current) = self.current.replace(restored.clone()) {
            self.undo_items.push(current);
        }
        Some(restored)
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_items.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_items.len()
    }

    /// Drop all history and start over from `initial` (document replaced).
    pub fn reset(&mut self, initial: UndoRedoItem) {
        self.undo_items.clear();
        self.redo_items.clear();
        self.current = Some(initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(names: &[&str]) -> SurveyDocument {
        let elements: Vec<_> = names
            .iter()
            .map(|n| json!({ "type": "text", "name": n }))
            .collect();
        SurveyDocument::from_json(json!({ "elements": elements })).unwrap()
    }

    #[test]
    fn test_fresh_manager_has_no_levels() {
        let manager = UndoRedoManager::new();
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_first_snapshot_is_not_undoable() {
        let mut manager = UndoRedoManager::new();
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::Survey));
        // There is no state before the initial one
        assert!(!manager.can_undo());
    }

    #[test]
    fn test_undo_restores_the_state_before_the_change() {
        let mut manager = UndoRedoManager::new();
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::Survey));
        manager.set_current(UndoRedoItem::new(
            doc(&["q1", "q2"]),
            NodeId::element("q2"),
        ));
        assert_eq!(manager.undo_levels(), 1);

        let restored = manager.undo().unwrap();
        assert_eq!(restored.doc, doc(&["q1"]));
        assert_eq!(restored.selection, NodeId::Survey);
        assert!(!manager.can_undo());
        assert!(manager.can_redo());

        let redone = manager.redo().unwrap();
        assert_eq!(redone.doc, doc(&["q1", "q2"]));
        assert_eq!(redone.selection, NodeId::element("q2"));
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_new_snapshot_clears_redo() {
        let mut manager = UndoRedoManager::new();
        manager.set_current(UndoRedoItem::new(doc(&[]), NodeId::Survey));
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::Survey));
        manager.undo();
        assert!(manager.can_redo());
        manager.set_current(UndoRedoItem::new(doc(&["q2"]), NodeId::Survey));
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_identical_document_refreshes_selection_only() {
        let mut manager = UndoRedoManager::new();
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::Survey));
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::element("q1")));
        assert!(!manager.can_undo());
        manager.set_current(UndoRedoItem::new(doc(&["q1", "q2"]), NodeId::Survey));
        let restored = manager.undo().unwrap();
        // The refreshed selection came along with the unchanged document
        assert_eq!(restored.selection, NodeId::element("q1"));
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut manager = UndoRedoManager::with_max_levels(2);
        manager.set_current(UndoRedoItem::new(doc(&[]), NodeId::Survey));
        for name in ["q1", "q2", "q3"] {
            let mut names = vec!["base"];
            names.push(name);
            manager.set_current(UndoRedoItem::new(doc(&names), NodeId::Survey));
        }
        assert_eq!(manager.undo_levels(), 2);
    }

    #[test]
    fn test_reset_drops_history() {
        let mut manager = UndoRedoManager::new();
        manager.set_current(UndoRedoItem::new(doc(&[]), NodeId::Survey));
        manager.set_current(UndoRedoItem::new(doc(&["q1"]), NodeId::Survey));
        manager.reset(UndoRedoItem::new(doc(&["fresh"]), NodeId::Survey));
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }
}
