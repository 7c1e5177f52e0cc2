//! # Survey Designer
//!
//! The coordinator every editing surface talks to. It owns the document and
//! sequences each operation the same way:
//!
//! 1. mutate the document (plus any reference repair)
//! 2. move the selection and its navigation history
//! 3. record one undo snapshot and fire one `Modified` event
//!
//! Subscribers therefore always observe a consistent document whose undo
//! state already covers the change they are being told about.

use std::collections::HashSet;

use formcraft_model::{new_name, Element, NodeId, Page, SurveyDocument};
use serde_json::Value;

use crate::errors::DesignerError;
use crate::events::{DesignerEvent, EventChannel, ModifiedKind};
use crate::history::SelectionHistoryController;
use crate::operations::{self, DeleteOutcome};
use crate::repair::RepairEngine;
use crate::selection::SelectionTracker;
use crate::toolbox::QuestionToolbox;
use crate::undo_stack::{UndoRedoItem, UndoRedoManager};

pub struct SurveyDesigner {
    doc: SurveyDocument,
    selection: SelectionTracker,
    selection_history: SelectionHistoryController,
    undo_redo: UndoRedoManager,
    repair: RepairEngine,
    toolbox: QuestionToolbox,
    events: EventChannel<DesignerEvent>,
    /// Names promised to in-flight drag payloads but not yet in the document.
    pending_names: HashSet<String>,
}

impl SurveyDesigner {
    /// A designer over a fresh survey with one empty page.
    pub fn new() -> Self {
        let mut doc = SurveyDocument::default();
        doc.pages.push(Page::new("page1"));
        Self::from_document(doc)
    }

    pub fn from_json(value: Value) -> Result<Self, DesignerError> {
        Ok(Self::from_document(SurveyDocument::from_json(value)?))
    }

    pub fn from_json_text(text: &str) -> Result<Self, DesignerError> {
        Ok(Self::from_document(SurveyDocument::from_json_text(text)?))
    }

    fn from_document(doc: SurveyDocument) -> Self {
        let mut designer = Self {
            doc,
            selection: SelectionTracker::new(),
            selection_history: SelectionHistoryController::new(),
            undo_redo: UndoRedoManager::new(),
            repair: RepairEngine::new(),
            toolbox: QuestionToolbox::new(),
            events: EventChannel::new(),
            pending_names: HashSet::new(),
        };
        designer.install_initial_state();
        designer
    }

    fn install_initial_state(&mut self) {
        self.pending_names.clear();
        self.selection.reset(NodeId::Survey);
        self.selection_history.clear();
        self.selection_history.on_selection_changed(&NodeId::Survey);
        self.undo_redo
            .reset(UndoRedoItem::new(self.doc.clone(), NodeId::Survey));
    }

    /// Replace the document wholesale, dropping selection history and undo
    /// state.
    pub fn load_json_text(&mut self, text: &str) -> Result<(), DesignerError> {
        let doc = SurveyDocument::from_json_text(text)?;
        tracing::debug!(pages = doc.pages.len(), "loading survey");
        self.doc = doc;
        self.install_initial_state();
        self.events.fire(DesignerEvent::SurveyLoaded);
        self.events.fire(DesignerEvent::SelectionChanged {
            selection: NodeId::Survey,
        });
        Ok(())
    }

    pub fn save_json_text(&self) -> Result<String, DesignerError> {
        Ok(self.doc.to_json_text()?)
    }

    pub fn doc(&self) -> &SurveyDocument {
        &self.doc
    }

    pub fn events(&self) -> &EventChannel<DesignerEvent> {
        &self.events
    }

    pub fn toolbox(&self) -> &QuestionToolbox {
        &self.toolbox
    }

    pub fn toolbox_mut(&mut self) -> &mut QuestionToolbox {
        &mut self.toolbox
    }

    // ---- selection ----------------------------------------------------

    pub fn selected(&self) -> &NodeId {
        self.selection.current()
    }

    /// The page the selection lives on: the selected page itself, the page
    /// holding the selected element, or the first page for the survey root.
    pub fn current_page(&self) -> Option<&str> {
        match self.selection.current() {
            NodeId::Survey => self.doc.pages.first().map(|p| p.name.as_str()),
            NodeId::Page(name) => Some(name.as_str()),
            NodeId::Element(name) => self.doc.page_of(name),
            NodeId::Column { matrix, .. } | NodeId::Row { matrix, .. } => {
                self.doc.page_of(matrix)
            }
        }
    }

    /// Select a node (`None` selects the survey root). Recorded in the
    /// back/forward history; the undo snapshot's selection is refreshed so
    /// a later undo restores what was selected at that point.
    pub fn select(&mut self, target: Option<NodeId>) {
        if self.apply_selection(target, true) {
            self.undo_redo.set_current(UndoRedoItem::new(
                self.doc.clone(),
                self.selection.current().clone(),
            ));
        }
    }

    /// Perform a selection change and fire the event. Returns whether the
    /// selection actually moved.
    fn apply_selection(&mut self, target: Option<NodeId>, record_history: bool) -> bool {
        let Some(selection) = self.selection.select(target, &self.doc) else {
            return false;
        };
        if record_history {
            self.selection_history.on_selection_changed(&selection);
        }
        self.events
            .fire(DesignerEvent::SelectionChanged { selection });
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.selection_history.has_prev()
    }

    pub fn can_go_forward(&self) -> bool {
        self.selection_history.has_next()
    }

    /// Navigate to the previously selected node without adding a history
    /// entry.
    pub fn go_back(&mut self) -> bool {
        let Some(target) = self.selection_history.prev() else {
            return false;
        };
        self.apply_selection(Some(target), false)
    }

    pub fn go_forward(&mut self) -> bool {
        let Some(target) = self.selection_history.next() else {
            return false;
        };
        self.apply_selection(Some(target), false)
    }

    // ---- structural operations ----------------------------------------

    /// Append a new empty page. The selection stays where it is.
    pub fn add_page(&mut self) -> String {
        let name = operations::add_page(&mut self.doc);
        self.set_modified(ModifiedKind::PageAdded { name: name.clone() });
        name
    }

    /// Insert an element relative to `target` (defaults to the current
    /// selection) and select it.
    pub fn add_element(
        &mut self,
        element: Element,
        target: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<String, DesignerError> {
        let target = target.unwrap_or_else(|| self.selection.current().clone());
        // A survey target means "the page the UI is showing"
        let target = match target {
            NodeId::Survey => self
                .current_page()
                .map(NodeId::page)
                .unwrap_or(NodeId::Survey),
            other => other,
        };
        let name =
            operations::add_element(&mut self.doc, element, &target, index, &self.pending_names)?;
        self.pending_names.remove(&name);
        let page = self
            .doc
            .page_of(&name)
            .unwrap_or_default()
            .to_string();
        self.apply_selection(Some(NodeId::element(name.as_str())), true);
        self.set_modified(ModifiedKind::ElementAdded {
            name: name.clone(),
            page,
        });
        Ok(name)
    }

    /// Instantiate a toolbox item next to the current selection.
    pub fn add_from_toolbox(&mut self, item_name: &str) -> Result<String, DesignerError> {
        let element = self.toolbox.make_element(item_name)?;
        self.add_element(element, None, None)
    }

    /// Build the drag payload for a toolbox item: its template with a fresh
    /// name already assigned. The name is reserved until the payload is
    /// dropped (or the survey is replaced), so concurrent drags and adds
    /// cannot mint it again.
    pub fn json_for_new_element(&mut self, item_name: &str) -> Result<Value, DesignerError> {
        let mut element = self.toolbox.make_element(item_name)?;
        let mut used = self.doc.used_names();
        used.extend(self.pending_names.iter().cloned());
        let name = new_name(operations::prefix_for(&element), &used);
        element.name = name.clone();
        self.pending_names.insert(name);
        Ok(element.to_json()?)
    }

    /// Abandon a drag gesture: release the name reserved for its payload so
    /// later operations can mint it again.
    pub fn cancel_drag(&mut self, payload: &Value) {
        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            self.pending_names.remove(name);
        }
    }

    /// Complete a drag gesture: insert the payload built by
    /// [`json_for_new_element`](Self::json_for_new_element), releasing its
    /// name reservation.
    pub fn drop_element(
        &mut self,
        payload: Value,
        target: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<String, DesignerError> {
        let element = Element::from_json(payload)?;
        self.add_element(element, target, index)
    }

    /// Clone an element right after the original and select the clone.
    pub fn duplicate_element(&mut self, name: &str) -> Result<String, DesignerError> {
        let clone = operations::duplicate_element(&mut self.doc, name)?;
        let page = self
            .doc
            .page_of(&clone)
            .unwrap_or_default()
            .to_string();
        self.apply_selection(Some(NodeId::element(clone.as_str())), true);
        self.set_modified(ModifiedKind::ElementAdded {
            name: clone.clone(),
            page,
        });
        Ok(clone)
    }

    /// Clone a page right after the original and select the clone.
    pub fn duplicate_page(&mut self, name: &str) -> Result<String, DesignerError> {
        let clone = operations::duplicate_page(&mut self.doc, name)?;
        self.apply_selection(Some(NodeId::page(clone.as_str())), true);
        self.set_modified(ModifiedKind::PageAdded { name: clone.clone() });
        Ok(clone)
    }

    /// Delete an element. The selection moves to its container, logic
    /// expressions referencing anything removed are cleared, and dead
    /// navigation entries are purged, all inside the same undo step.
    pub fn delete_element(&mut self, name: &str) -> Result<DeleteOutcome, DesignerError> {
        let outcome = operations::delete_element(&mut self.doc, name)?;
        self.finish_delete(&outcome, NodeId::element(name));
        Ok(outcome)
    }

    /// Delete a page; the last remaining page cannot be deleted.
    pub fn delete_page(&mut self, name: &str) -> Result<DeleteOutcome, DesignerError> {
        if self.doc.pages.len() <= 1 {
            return Err(DesignerError::CannotDeleteLastPage);
        }
        let outcome = operations::delete_page(&mut self.doc, name)?;
        self.finish_delete(&outcome, NodeId::page(name));
        Ok(outcome)
    }

    /// Whether `id` may be deleted right now.
    pub fn can_delete(&self, id: &NodeId) -> bool {
        match id {
            NodeId::Survey => false,
            NodeId::Page(_) => self.doc.pages.len() > 1 && self.doc.contains(id),
            _ => self.doc.contains(id),
        }
    }

    fn finish_delete(&mut self, outcome: &DeleteOutcome, removed_id: NodeId) {
        tracing::debug!(removed = ?outcome.removed, "deleted node");
        self.repair.run(&outcome.removed, &mut self.doc);
        self.selection_history.purge_deleted(&self.doc);
        self.apply_selection(Some(outcome.next_selection.clone()), true);
        self.set_modified(ModifiedKind::ElementRemoved { id: removed_id });
    }

    /// Move an element to a page at the given position.
    pub fn move_element(
        &mut self,
        name: &str,
        page: &str,
        index: usize,
    ) -> Result<(), DesignerError> {
        operations::move_element(&mut self.doc, name, page, index)?;
        self.set_modified(ModifiedKind::ElementMoved {
            name: name.to_string(),
            page: page.to_string(),
        });
        Ok(())
    }

    /// Reorder pages. Out-of-range indices are a no-op.
    pub fn move_page(&mut self, from: usize, to: usize) {
        if from == to || from >= self.doc.pages.len() || to >= self.doc.pages.len() {
            return;
        }
        self.doc.move_page(from, to);
        self.set_modified(ModifiedKind::PageMoved { from, to });
    }

    /// Rename a node, keeping the selection and navigation history pointing
    /// at it under its new name. Expressions referencing the old name are
    /// left untouched.
    pub fn rename(&mut self, target: &NodeId, new_name: &str) -> Result<(), DesignerError> {
        operations::rename(&mut self.doc, target, new_name)?;
        let renamed = match target {
            NodeId::Page(_) => NodeId::page(new_name),
            NodeId::Element(_) => NodeId::element(new_name),
            NodeId::Column { matrix, .. } => NodeId::Column {
                matrix: matrix.clone(),
                column: new_name.to_string(),
            },
            NodeId::Row { matrix, .. } => NodeId::Row {
                matrix: matrix.clone(),
                row: new_name.to_string(),
            },
            NodeId::Survey => NodeId::Survey,
        };
        if self.selection.is_selected(target) {
            self.selection.reset(renamed.clone());
        }
        self.selection_history.replace(target, &renamed);
        self.set_modified(ModifiedKind::PropertyChanged {
            target: renamed,
            property: "name".to_string(),
        });
        Ok(())
    }

    /// Set a property on the survey, a page, an element or a matrix
    /// column/row. `"name"` routes through [`rename`](Self::rename) so
    /// references stay intact.
    pub fn set_property(
        &mut self,
        target: &NodeId,
        property: &str,
        value: Value,
    ) -> Result<(), DesignerError> {
        if property == "name" {
            let new_name = value
                .as_str()
                .ok_or_else(|| DesignerError::InvalidName(value.to_string()))?
                .to_string();
            return self.rename(target, &new_name);
        }
        operations::set_property(&mut self.doc, target, property, value)?;
        self.set_modified(ModifiedKind::PropertyChanged {
            target: target.clone(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// Cache an element as a copied toolbox item.
    pub fn copy_to_toolbox(&mut self, name: &str) -> Result<(), DesignerError> {
        let element = self
            .doc
            .element_by_name(name)
            .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?
            .clone();
        self.toolbox.add_copied_element(&element)
    }

    // ---- undo/redo ----------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.undo_redo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_redo.can_redo()
    }

    /// Restore the previous snapshot. The selection recorded with it is
    /// re-resolved against the restored document, falling back to the survey
    /// root when it no longer exists.
    pub fn undo(&mut self) -> bool {
        let Some(item) = self.undo_redo.undo() else {
            return false;
        };
        self.restore(item);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(item) = self.undo_redo.redo() else {
            return false;
        };
        self.restore(item);
        true
    }

    fn restore(&mut self, item: UndoRedoItem) {
        self.doc = item.doc;
        let selection = if self.doc.contains(&item.selection) {
            item.selection
        } else {
            NodeId::Survey
        };
        self.selection_history.purge_deleted(&self.doc);
        self.selection.reset(selection.clone());
        self.selection_history.on_selection_changed(&selection);
        self.events.fire(DesignerEvent::SurveyLoaded);
        self.events
            .fire(DesignerEvent::SelectionChanged { selection });
    }

    /// Commit the current state: one undo snapshot, then one `Modified`
    /// event, in that order.
    fn set_modified(&mut self, kind: ModifiedKind) {
        self.undo_redo.set_current(UndoRedoItem::new(
            self.doc.clone(),
            self.selection.current().clone(),
        ));
        self.events.fire(DesignerEvent::Modified { kind });
    }
}

impl Default for SurveyDesigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_designer_has_one_page_and_survey_selected() {
        let designer = SurveyDesigner::new();
        assert_eq!(designer.doc().pages.len(), 1);
        assert_eq!(designer.doc().pages[0].name, "page1");
        assert_eq!(designer.selected(), &NodeId::Survey);
        assert!(!designer.can_undo());
    }

    #[test]
    fn test_add_element_selects_it_and_is_undoable() {
        let mut designer = SurveyDesigner::new();
        let name = designer
            .add_from_toolbox("text")
            .expect("toolbox has a text item");
        assert_eq!(name, "question1");
        assert_eq!(designer.selected(), &NodeId::element("question1"));
        assert!(designer.can_undo());

        assert!(designer.undo());
        assert!(designer.doc().element_by_name("question1").is_none());
        // The deleted question cannot stay selected
        assert_eq!(designer.selected(), &NodeId::Survey);
    }

    #[test]
    fn test_last_page_cannot_be_deleted() {
        let mut designer = SurveyDesigner::new();
        let err = designer.delete_page("page1").unwrap_err();
        assert!(matches!(err, DesignerError::CannotDeleteLastPage));
        assert!(!designer.can_delete(&NodeId::page("page1")));
        designer.add_page();
        assert!(designer.can_delete(&NodeId::page("page1")));
    }

    #[test]
    fn test_load_resets_undo_and_history() {
        let mut designer = SurveyDesigner::new();
        designer.add_from_toolbox("text").unwrap();
        assert!(designer.can_undo());
        designer
            .load_json_text(&json!({ "elements": [] }).to_string())
            .unwrap();
        assert!(!designer.can_undo());
        assert!(!designer.can_go_back());
        assert_eq!(designer.selected(), &NodeId::Survey);
    }

    #[test]
    fn test_set_property_name_routes_through_rename() {
        let mut designer = SurveyDesigner::new();
        designer.add_from_toolbox("text").unwrap();
        designer
            .set_property(&NodeId::element("question1"), "name", json!("age"))
            .unwrap();
        assert!(designer.doc().element_by_name("age").is_some());
        assert_eq!(designer.selected(), &NodeId::element("age"));
    }
}
