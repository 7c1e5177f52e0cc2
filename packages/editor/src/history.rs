//! # Selection History Controller
//!
//! Bounded back/forward navigation over previously-selected nodes,
//! independent of undo/redo. Entries are `NodeId`s resolved on demand, so a
//! deleted node simply drops out of the list.

use formcraft_model::{NodeId, SurveyDocument};

#[derive(Debug, Default)]
pub struct SelectionHistoryController {
    items: Vec<NodeId>,
    /// Index of the current entry, -1 when the list is empty.
    position: isize,
}

impl SelectionHistoryController {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            position: -1,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.position > 0
    }

    pub fn has_next(&self) -> bool {
        self.position >= 0 && self.position < self.items.len() as isize - 1
    }

    /// Record a non-navigational selection change.
    ///
    /// Truncates any forward entries, moves an existing entry for the same
    /// node to the tail instead of duplicating it, and points `position` at
    /// the new tail.
    pub fn on_selection_changed(&mut self, selection: &NodeId) {
        self.items.truncate((self.position + 1) as usize);
        if let Some(existing) = self.items.iter().position(|id| id == selection) {
            self.items.remove(existing);
        }
        self.items.push(selection.clone());
        self.position = self.items.len() as isize - 1;
    }

    /// Step back. Returns the node to select; the caller must perform that
    /// selection as a navigational one (not recorded here).
    pub fn prev(&mut self) -> Option<NodeId> {
        if !self.has_prev() {
            return None;
        }
        self.position -= 1;
        Some(self.items[self.position as usize].clone())
    }

    /// Step forward; symmetric to [`prev`](Self::prev).
    pub fn next(&mut self) -> Option<NodeId> {
        if !self.has_next() {
            return None;
        }
        self.position += 1;
        Some(self.items[self.position as usize].clone())
    }

    /// Drop the whole history (the document was replaced).
    pub fn clear(&mut self) {
        self.items.clear();
        self.position = -1;
    }

    /// Remove every entry whose node no longer resolves and re-clamp the
    /// position. Covers descendants automatically: their ids stop resolving
    /// when the container goes away.
    pub fn purge_deleted(&mut self, doc: &SurveyDocument) {
        let current = if self.position >= 0 {
            Some(self.items[self.position as usize].clone())
        } else {
            None
        };
        self.items.retain(|id| doc.contains(id));
        self.position = match current.and_then(|c| self.items.iter().rposition(|id| *id == c)) {
            Some(index) => index as isize,
            None => self.items.len() as isize - 1,
        };
    }

    /// Rewrite entries after a rename so they keep pointing at the node
    /// under its new name.
    pub fn replace(&mut self, old: &NodeId, new: &NodeId) {
        for item in &mut self.items {
            if item == old {
                *item = new.clone();
            }
        }
    }

    pub fn has_in_history(&self, id: &NodeId) -> bool {
        self.items.iter().any(|item| item == id)
    }
}
