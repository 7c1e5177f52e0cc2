//! # Structural Mutations
//!
//! Pure document transformations behind the designer's editing operations.
//! Nothing here touches selection, events or undo; the designer sequences
//! those around each call.
//!
//! Name generation reserves every name it hands out before inserting, so a
//! multi-element operation (duplicating a page, dropping a panel with
//! children) never assigns the same free index twice.

use std::collections::HashSet;

use formcraft_model::{new_name, Element, ElementKind, NodeId, Page, SurveyDocument};
use serde_json::Value;

use crate::errors::DesignerError;

/// What a deletion did: which names disappeared (the node and every
/// descendant) and which surviving node the selection should move to.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub removed: Vec<String>,
    pub next_selection: NodeId,
}

/// Append a fresh page and return its name.
pub(crate) fn add_page(doc: &mut SurveyDocument) -> String {
    let name = new_name("page", &doc.used_names());
    doc.pages.push(Page::new(name.clone()));
    name
}

/// Insert an element relative to `target`.
///
/// - target page: insert at `index` (or append)
/// - target panel: insert into the panel at `index` (or append)
/// - target question: insert right after it in its container
/// - target survey: append to the first page, creating one if needed
///
/// Empty or clashing names on the element and its descendants are replaced
/// with generated ones; `reserved` adds names that are promised elsewhere
/// (an in-flight drag) but not yet in the document. Returns the element's
/// final name.
pub(crate) fn add_element(
    doc: &mut SurveyDocument,
    mut element: Element,
    target: &NodeId,
    index: Option<usize>,
    reserved: &HashSet<String>,
) -> Result<String, DesignerError> {
    let mut used = doc.used_names();
    // The element's own reservation must not force a rename of itself
    for name in reserved {
        if name != &element.name {
            used.insert(name.clone());
        }
    }
    reserve_names(&mut element, &mut used);
    let name = element.name.clone();

    match target {
        NodeId::Survey => {
            if doc.pages.is_empty() {
                add_page(doc);
            }
            if let Some(page) = doc.pages.first_mut() {
                let at = index.unwrap_or(page.elements.len());
                page.insert_element(at, element);
            }
        }
        NodeId::Page(page_name) => {
            let page = doc
                .page_by_name_mut(page_name)
                .ok_or_else(|| DesignerError::UnknownElement(page_name.clone()))?;
            let at = index.unwrap_or(page.elements.len());
            page.insert_element(at, element);
        }
        NodeId::Element(el_name) => {
            let is_panel = doc
                .element_by_name(el_name)
                .ok_or_else(|| DesignerError::UnknownElement(el_name.clone()))?
                .is_container();
            if is_panel {
                let panel = doc
                    .element_by_name_mut(el_name)
                    .ok_or_else(|| DesignerError::UnknownElement(el_name.clone()))?;
                let at = index.unwrap_or(panel.elements.len()).min(panel.elements.len());
                panel.elements.insert(at, element);
            } else {
                // Drop next to the targeted question
                let container = container_of_mut(doc, el_name)
                    .ok_or_else(|| DesignerError::UnknownElement(el_name.clone()))?;
                let at = container
                    .iter()
                    .position(|el| el.name == *el_name)
                    .map(|i| i + 1)
                    .unwrap_or(container.len());
                container.insert(at, element);
            }
        }
        NodeId::Column { matrix, .. } | NodeId::Row { matrix, .. } => {
            return Err(DesignerError::UnknownElement(matrix.clone()));
        }
    }
    Ok(name)
}

/// Clone an element in place: the copy gets generated names throughout and
/// lands immediately after the original in the same container. Returns the
/// copy's name.
pub(crate) fn duplicate_element(
    doc: &mut SurveyDocument,
    name: &str,
) -> Result<String, DesignerError> {
    let source = doc
        .element_by_name(name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let mut clone = source.clone();

    let mut used = doc.used_names();
    assign_fresh_names(&mut clone, &mut used);
    let clone_name = clone.name.clone();

    let container = container_of_mut(doc, name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let at = container
        .iter()
        .position(|el| el.name == name)
        .map(|i| i + 1)
        .unwrap_or(container.len());
    container.insert(at, clone);
    Ok(clone_name)
}

/// Clone a page: the copy and every element inside it get generated names
/// and the copy lands immediately after the original. Returns the copy's
/// name.
pub(crate) fn duplicate_page(doc: &mut SurveyDocument, name: &str) -> Result<String, DesignerError> {
    let index = doc
        .pages
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let mut clone = doc.pages[index].clone();

    let mut used = doc.used_names();
    let page_name = new_name("page", &used);
    used.insert(page_name.clone());
    clone.name = page_name.clone();
    for element in &mut clone.elements {
        assign_fresh_names(element, &mut used);
    }

    doc.insert_page(index + 1, clone);
    Ok(page_name)
}

/// Remove an element (and, for a panel, everything inside it).
///
/// The next selection is the removed node's container: its panel if it was
/// nested, otherwise its page.
pub(crate) fn delete_element(
    doc: &mut SurveyDocument,
    name: &str,
) -> Result<DeleteOutcome, DesignerError> {
    let next_selection = doc
        .parent_of(name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let removed_element = doc
        .remove_element(name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let mut removed = Vec::new();
    removed_element.collect_names(&mut removed);
    Ok(DeleteOutcome {
        removed,
        next_selection,
    })
}

/// Remove a page and everything on it. The next selection is the page before
/// it, or the page after it when the first page was removed.
///
/// The caller must have verified this is not the last page.
pub(crate) fn delete_page(
    doc: &mut SurveyDocument,
    name: &str,
) -> Result<DeleteOutcome, DesignerError> {
    debug_assert!(doc.pages.len() > 1);
    let index = doc
        .pages
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;

    let page = doc.pages.remove(index);
    let mut removed = vec![page.name.clone()];
    for element in &page.elements {
        element.collect_names(&mut removed);
    }

    let next_index = index.saturating_sub(1);
    let next_selection = doc
        .pages
        .get(next_index)
        .map(|p| NodeId::Page(p.name.clone()))
        .unwrap_or(NodeId::Survey);
    Ok(DeleteOutcome {
        removed,
        next_selection,
    })
}

/// Move an element to `page` at `index` (clamped). The element keeps its
/// name; only its position changes.
pub(crate) fn move_element(
    doc: &mut SurveyDocument,
    name: &str,
    page: &str,
    index: usize,
) -> Result<(), DesignerError> {
    if doc.page_by_name(page).is_none() {
        return Err(DesignerError::UnknownElement(page.to_string()));
    }
    let element = doc
        .remove_element(name)
        .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
    let target = doc
        .page_by_name_mut(page)
        .ok_or_else(|| DesignerError::UnknownElement(page.to_string()))?;
    target.insert_element(index, element);
    Ok(())
}

/// Rename a page, element, or matrix column/row. Rejects empty names.
///
/// Uniqueness is checked in the name's own scope: survey-wide for pages and
/// elements, within the owning matrix's column/row list for columns and
/// rows (a column may share its name with a question).
pub(crate) fn rename(
    doc: &mut SurveyDocument,
    target: &NodeId,
    new: &str,
) -> Result<(), DesignerError> {
    if new.trim().is_empty() {
        return Err(DesignerError::InvalidName(new.to_string()));
    }
    if target.name() == Some(new) {
        return Ok(());
    }
    match target {
        NodeId::Survey => Err(DesignerError::InvalidName(new.to_string())),
        NodeId::Page(name) => {
            if doc.used_names().contains(new) {
                return Err(DesignerError::NameInUse(new.to_string()));
            }
            let page = doc
                .page_by_name_mut(name)
                .ok_or_else(|| DesignerError::UnknownElement(name.clone()))?;
            page.name = new.to_string();
            Ok(())
        }
        NodeId::Element(name) => {
            if doc.used_names().contains(new) {
                return Err(DesignerError::NameInUse(new.to_string()));
            }
            let el = doc
                .element_by_name_mut(name)
                .ok_or_else(|| DesignerError::UnknownElement(name.clone()))?;
            el.name = new.to_string();
            Ok(())
        }
        NodeId::Column { matrix, column } => {
            let el = doc
                .element_by_name_mut(matrix)
                .ok_or_else(|| DesignerError::UnknownElement(matrix.clone()))?;
            if el.columns.iter().any(|c| c.name() == new) {
                return Err(DesignerError::NameInUse(new.to_string()));
            }
            let item = el
                .columns
                .iter_mut()
                .find(|c| c.name() == column)
                .ok_or_else(|| DesignerError::UnknownElement(column.clone()))?;
            item.set_name(new);
            Ok(())
        }
        NodeId::Row { matrix, row } => {
            let el = doc
                .element_by_name_mut(matrix)
                .ok_or_else(|| DesignerError::UnknownElement(matrix.clone()))?;
            if el.rows.iter().any(|r| r.name() == new) {
                return Err(DesignerError::NameInUse(new.to_string()));
            }
            let item = el
                .rows
                .iter_mut()
                .find(|r| r.name() == row)
                .ok_or_else(|| DesignerError::UnknownElement(row.clone()))?;
            item.set_name(new);
            Ok(())
        }
    }
}

/// Set a property on the survey, a page, an element, or a matrix column/row.
/// Known fields map to their typed slots; anything else lands in the node's
/// `extra` map so the value survives a save/load round-trip.
pub(crate) fn set_property(
    doc: &mut SurveyDocument,
    target: &NodeId,
    property: &str,
    value: Value,
) -> Result<(), DesignerError> {
    match target {
        NodeId::Survey => {
            match property {
                "title" => doc.title = as_opt_string(value),
                _ => {
                    doc.extra.insert(property.to_string(), value);
                }
            }
            Ok(())
        }
        NodeId::Page(name) => {
            let page = doc
                .page_by_name_mut(name)
                .ok_or_else(|| DesignerError::UnknownElement(name.clone()))?;
            match property {
                "title" => page.title = as_opt_string(value),
                "visibleIf" => page.visible_if = as_opt_string(value),
                _ => {
                    page.extra.insert(property.to_string(), value);
                }
            }
            Ok(())
        }
        NodeId::Element(name) => {
            let el = doc
                .element_by_name_mut(name)
                .ok_or_else(|| DesignerError::UnknownElement(name.clone()))?;
            match property {
                "title" => el.title = as_opt_string(value),
                "visibleIf" => el.visible_if = as_opt_string(value),
                "enableIf" => el.enable_if = as_opt_string(value),
                _ => {
                    el.extra.insert(property.to_string(), value);
                }
            }
            Ok(())
        }
        NodeId::Column { matrix, column } => {
            let el = doc
                .element_by_name_mut(matrix)
                .ok_or_else(|| DesignerError::UnknownElement(matrix.clone()))?;
            let item = el
                .columns
                .iter_mut()
                .find(|c| c.name() == column)
                .ok_or_else(|| DesignerError::UnknownElement(column.clone()))?;
            item.set_extra(property, value);
            Ok(())
        }
        NodeId::Row { matrix, row } => {
            let el = doc
                .element_by_name_mut(matrix)
                .ok_or_else(|| DesignerError::UnknownElement(matrix.clone()))?;
            let item = el
                .rows
                .iter_mut()
                .find(|r| r.name() == row)
                .ok_or_else(|| DesignerError::UnknownElement(row.clone()))?;
            item.set_extra(property, value);
            Ok(())
        }
    }
}

fn as_opt_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

pub(crate) fn prefix_for(element: &Element) -> &'static str {
    match element.kind() {
        ElementKind::Panel => "panel",
        _ => "question",
    }
}

/// Generate fresh names for an element and every descendant, reserving each
/// as it is handed out.
fn assign_fresh_names(element: &mut Element, used: &mut HashSet<String>) {
    let name = new_name(prefix_for(element), used);
    used.insert(name.clone());
    element.name = name;
    for child in &mut element.elements {
        assign_fresh_names(child, used);
    }
}

/// Keep usable names, replace empty or clashing ones, and reserve everything
/// so siblings cannot collide.
fn reserve_names(element: &mut Element, used: &mut HashSet<String>) {
    if element.name.is_empty() || used.contains(&element.name) {
        element.name = new_name(prefix_for(element), used);
    }
    used.insert(element.name.clone());
    for child in &mut element.elements {
        reserve_names(child, used);
    }
}

/// The element list that directly holds `name`: a page's list or a panel's.
fn container_of_mut<'a>(
    doc: &'a mut SurveyDocument,
    name: &str,
) -> Option<&'a mut Vec<Element>> {
    let page_name = doc.page_of(name)?.to_string();
    let page = doc.page_by_name_mut(&page_name)?;
    if page.elements.iter().any(|el| el.name == name) {
        return Some(&mut page.elements);
    }
    page.elements
        .iter_mut()
        .find_map(|el| container_in(el, name))
}

fn container_in<'a>(element: &'a mut Element, name: &str) -> Option<&'a mut Vec<Element>> {
    if element.elements.iter().any(|child| child.name == name) {
        return Some(&mut element.elements);
    }
    element
        .elements
        .iter_mut()
        .find_map(|child| container_in(child, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_questions() -> SurveyDocument {
        SurveyDocument::from_json(json!({
            "pages": [{
                "name": "page1",
                "elements": [
                    { "type": "text", "name": "question1" },
                    { "type": "text", "name": "question2" }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_add_element_generates_lowest_free_name() {
        let mut doc = two_questions();
        let name = add_element(
            &mut doc,
            Element {
                type_name: "text".to_string(),
                ..Element::default()
            },
            &NodeId::page("page1"),
            None,
            &HashSet::new(),
        )
        .unwrap();
        assert_eq!(name, "question3");

        doc.remove_element("question1");
        let name = add_element(
            &mut doc,
            Element {
                type_name: "text".to_string(),
                ..Element::default()
            },
            &NodeId::page("page1"),
            None,
            &HashSet::new(),
        )
        .unwrap();
        // question1 was freed, so its index is reused
        assert_eq!(name, "question1");
    }

    #[test]
    fn test_reserved_names_are_not_handed_out() {
        let mut doc = two_questions();
        let mut reserved = HashSet::new();
        reserved.insert("question3".to_string());
        let name = add_element(
            &mut doc,
            Element {
                type_name: "text".to_string(),
                ..Element::default()
            },
            &NodeId::page("page1"),
            None,
            &reserved,
        )
        .unwrap();
        // question3 is promised to an in-flight drag
        assert_eq!(name, "question4");
    }

    #[test]
    fn test_add_next_to_question_target() {
        let mut doc = two_questions();
        add_element(
            &mut doc,
            Element {
                type_name: "text".to_string(),
                name: "extra".to_string(),
                ..Element::default()
            },
            &NodeId::element("question1"),
            None,
            &HashSet::new(),
        )
        .unwrap();
        let names: Vec<_> = doc.pages[0].elements.iter().map(|e| &e.name).collect();
        assert_eq!(names, ["question1", "extra", "question2"]);
    }

    #[test]
    fn test_duplicate_element_lands_after_source() {
        let mut doc = two_questions();
        let clone = duplicate_element(&mut doc, "question1").unwrap();
        assert_eq!(clone, "question3");
        let names: Vec<_> = doc.pages[0].elements.iter().map(|e| &e.name).collect();
        assert_eq!(names, ["question1", "question3", "question2"]);
    }

    #[test]
    fn test_duplicate_panel_renames_children_without_collisions() {
        let mut doc = SurveyDocument::from_json(json!({
            "pages": [{
                "name": "page1",
                "elements": [{
                    "type": "panel",
                    "name": "panel1",
                    "elements": [
                        { "type": "text", "name": "question1" },
                        { "type": "text", "name": "question2" }
                    ]
                }]
            }]
        }))
        .unwrap();
        let clone = duplicate_element(&mut doc, "panel1").unwrap();
        assert_eq!(clone, "panel2");
        let copy = doc.element_by_name("panel2").unwrap();
        let children: Vec<_> = copy.elements.iter().map(|e| &e.name).collect();
        assert_eq!(children, ["question3", "question4"]);
    }

    #[test]
    fn test_duplicate_page_renames_everything() {
        let mut doc = SurveyDocument::from_json(json!({
            "pages": [
                {
                    "name": "page1",
                    "elements": [
                        { "type": "text", "name": "question1" },
                        { "type": "text", "name": "question2" }
                    ]
                },
                { "name": "page2", "elements": [{ "type": "text", "name": "question3" }] }
            ]
        }))
        .unwrap();
        let clone = duplicate_page(&mut doc, "page1").unwrap();
        assert_eq!(clone, "page3");
        // The copy sits right after the original
        assert_eq!(doc.pages[1].name, "page3");
        let names: Vec<_> = doc.pages[1].elements.iter().map(|e| &e.name).collect();
        assert_eq!(names, ["question4", "question5"]);
    }

    #[test]
    fn test_delete_element_reports_descendants_and_parent() {
        let mut doc = SurveyDocument::from_json(json!({
            "pages": [{
                "name": "page1",
                "elements": [{
                    "type": "panel",
                    "name": "panel1",
                    "elements": [{ "type": "text", "name": "question1" }]
                }]
            }]
        }))
        .unwrap();
        let outcome = delete_element(&mut doc, "panel1").unwrap();
        assert_eq!(outcome.removed, ["panel1", "question1"]);
        assert_eq!(outcome.next_selection, NodeId::page("page1"));
        assert!(doc.element_by_name("question1").is_none());
    }

    #[test]
    fn test_delete_page_selects_neighbor() {
        let mut doc = SurveyDocument::from_json(json!({
            "pages": [{ "name": "page1" }, { "name": "page2" }, { "name": "page3" }]
        }))
        .unwrap();
        let outcome = delete_page(&mut doc, "page2").unwrap();
        assert_eq!(outcome.next_selection, NodeId::page("page1"));
        let outcome = delete_page(&mut doc, "page1").unwrap();
        assert_eq!(outcome.next_selection, NodeId::page("page3"));
    }

    #[test]
    fn test_rename_rejects_collisions() {
        let mut doc = two_questions();
        let err = rename(&mut doc, &NodeId::element("question1"), "question2").unwrap_err();
        assert!(matches!(err, DesignerError::NameInUse(_)));
        rename(&mut doc, &NodeId::element("question1"), "age").unwrap();
        assert!(doc.element_by_name("age").is_some());
    }

    fn with_matrix() -> SurveyDocument {
        SurveyDocument::from_json(json!({
            "pages": [{
                "name": "page1",
                "elements": [
                    { "type": "text", "name": "total" },
                    {
                        "type": "matrixdropdown",
                        "name": "grid",
                        "columns": [{ "name": "col1" }, "col2"],
                        "rows": ["row1", "row2"]
                    }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_rename_column_rejects_sibling_duplicates() {
        let mut doc = with_matrix();
        let col2 = NodeId::Column {
            matrix: "grid".to_string(),
            column: "col2".to_string(),
        };
        let err = rename(&mut doc, &col2, "col1").unwrap_err();
        assert!(matches!(err, DesignerError::NameInUse(_)));
        let names: Vec<_> = doc
            .element_by_name("grid")
            .unwrap()
            .columns
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, ["col1", "col2"]);
    }

    #[test]
    fn test_column_name_may_shadow_a_question_name() {
        let mut doc = with_matrix();
        // "total" is a question, but column names are scoped to the matrix
        let col2 = NodeId::Column {
            matrix: "grid".to_string(),
            column: "col2".to_string(),
        };
        rename(&mut doc, &col2, "total").unwrap();
        assert!(doc.contains(&NodeId::Column {
            matrix: "grid".to_string(),
            column: "total".to_string(),
        }));
    }

    #[test]
    fn test_rename_row_rejects_sibling_duplicates() {
        let mut doc = with_matrix();
        let row2 = NodeId::Row {
            matrix: "grid".to_string(),
            row: "row2".to_string(),
        };
        let err = rename(&mut doc, &row2, "row1").unwrap_err();
        assert!(matches!(err, DesignerError::NameInUse(_)));
        rename(&mut doc, &row2, "last").unwrap();
        assert!(doc.contains(&NodeId::Row {
            matrix: "grid".to_string(),
            row: "last".to_string(),
        }));
    }

    #[test]
    fn test_set_property_on_column_promotes_bare_items() {
        let mut doc = with_matrix();
        // col2 is a bare string in the source JSON
        set_property(
            &mut doc,
            &NodeId::Column {
                matrix: "grid".to_string(),
                column: "col2".to_string(),
            },
            "cellType",
            json!("dropdown"),
        )
        .unwrap();
        let grid = doc.element_by_name("grid").unwrap();
        match &grid.columns[1] {
            formcraft_model::ItemRef::Object { name, extra } => {
                assert_eq!(name, "col2");
                assert_eq!(extra["cellType"], json!("dropdown"));
            }
            other => panic!("expected object item, got {other:?}"),
        }

        let err = set_property(
            &mut doc,
            &NodeId::Column {
                matrix: "grid".to_string(),
                column: "ghost".to_string(),
            },
            "cellType",
            json!("text"),
        )
        .unwrap_err();
        assert!(matches!(err, DesignerError::UnknownElement(name) if name == "ghost"));
    }

    #[test]
    fn test_set_property_known_and_extra() {
        let mut doc = two_questions();
        set_property(
            &mut doc,
            &NodeId::element("question1"),
            "title",
            json!("Your name"),
        )
        .unwrap();
        set_property(
            &mut doc,
            &NodeId::element("question1"),
            "placeHolder",
            json!("type here"),
        )
        .unwrap();
        let el = doc.element_by_name("question1").unwrap();
        assert_eq!(el.title.as_deref(), Some("Your name"));
        assert_eq!(el.extra["placeHolder"], json!("type here"));
    }

    #[test]
    fn test_move_element_across_pages() {
        let mut doc = SurveyDocument::from_json(json!({
            "pages": [
                { "name": "page1", "elements": [{ "type": "text", "name": "q1" }] },
                { "name": "page2" }
            ]
        }))
        .unwrap();
        move_element(&mut doc, "q1", "page2", 0).unwrap();
        assert!(doc.pages[0].elements.is_empty());
        assert_eq!(doc.pages[1].elements[0].name, "q1");
    }
}
