//! Back/forward selection navigation through the designer: recording,
//! dedup, truncation, purging after deletions, and reset on load.

use std::cell::RefCell;
use std::rc::Rc;

use formcraft_editor::{DesignerEvent, NodeId, SurveyDesigner};
use serde_json::json;

fn designer_with(json: serde_json::Value) -> SurveyDesigner {
    SurveyDesigner::from_json(json).expect("valid survey json")
}

#[test]
fn test_reselecting_moves_the_entry_to_the_tail() {
    let mut designer = designer_with(json!({
        "pages": [{
            "name": "page1",
            "elements": [{ "type": "text", "name": "question1" }]
        }]
    }));
    designer.select(Some(NodeId::page("page1")));
    designer.select(Some(NodeId::element("question1")));
    designer.select(Some(NodeId::page("page1")));

    // History is survey, question1, page1: page1's earlier entry was removed
    assert!(designer.go_back());
    assert_eq!(designer.selected(), &NodeId::element("question1"));
    assert!(designer.go_back());
    assert_eq!(designer.selected(), &NodeId::Survey);
    assert!(!designer.can_go_back());

    assert!(designer.go_forward());
    assert_eq!(designer.selected(), &NodeId::element("question1"));
    assert!(designer.go_forward());
    assert_eq!(designer.selected(), &NodeId::page("page1"));
    assert!(!designer.can_go_forward());
}

#[test]
fn test_navigation_is_not_recorded_as_a_new_entry() {
    let mut designer = designer_with(json!({
        "elements": [
            { "type": "text", "name": "q1" },
            { "type": "text", "name": "q2" }
        ]
    }));
    designer.select(Some(NodeId::element("q1")));
    designer.select(Some(NodeId::element("q2")));

    designer.go_back();
    assert_eq!(designer.selected(), &NodeId::element("q1"));
    // Going back did not append q1 again, so forward still leads to q2
    assert!(designer.can_go_forward());
    designer.go_forward();
    assert_eq!(designer.selected(), &NodeId::element("q2"));
}

#[test]
fn test_selecting_after_going_back_truncates_forward_entries() {
    let mut designer = designer_with(json!({
        "elements": [
            { "type": "text", "name": "q1" },
            { "type": "text", "name": "q2" },
            { "type": "text", "name": "q3" }
        ]
    }));
    designer.select(Some(NodeId::element("q1")));
    designer.select(Some(NodeId::element("q2")));
    designer.go_back();
    assert!(designer.can_go_forward());

    designer.select(Some(NodeId::element("q3")));
    assert!(!designer.can_go_forward());
    designer.go_back();
    assert_eq!(designer.selected(), &NodeId::element("q1"));
}

#[test]
fn test_deleting_a_node_purges_its_history_entries() {
    let mut designer = designer_with(json!({
        "elements": [
            { "type": "text", "name": "q1" },
            { "type": "text", "name": "q2" }
        ]
    }));
    designer.select(Some(NodeId::element("q2")));
    designer.select(Some(NodeId::element("q1")));
    designer.select(None);

    designer.delete_element("q2").unwrap();
    // Walking back never lands on the deleted question
    while designer.can_go_back() {
        designer.go_back();
        assert_ne!(designer.selected(), &NodeId::element("q2"));
    }
}

#[test]
fn test_deleting_a_matrix_purges_its_column_entries() {
    let mut designer = designer_with(json!({
        "elements": [
            { "type": "text", "name": "q1" },
            {
                "type": "matrixdropdown",
                "name": "grid",
                "columns": [{ "name": "col1" }, { "name": "col2" }]
            }
        ]
    }));
    let col = NodeId::Column {
        matrix: "grid".to_string(),
        column: "col1".to_string(),
    };
    designer.select(Some(col.clone()));
    designer.select(Some(NodeId::element("q1")));

    designer.delete_element("grid").unwrap();
    while designer.can_go_back() {
        designer.go_back();
        assert_ne!(designer.selected(), &col);
        assert_ne!(designer.selected(), &NodeId::element("grid"));
    }
}

#[test]
fn test_deleting_a_panel_purges_descendant_entries() {
    let mut designer = designer_with(json!({
        "pages": [{
            "name": "page1",
            "elements": [
                {
                    "type": "panel",
                    "name": "panel1",
                    "elements": [{ "type": "text", "name": "inner" }]
                },
                { "type": "text", "name": "outside" }
            ]
        }]
    }));
    designer.select(Some(NodeId::element("inner")));
    designer.select(Some(NodeId::element("outside")));

    designer.delete_element("panel1").unwrap();
    while designer.can_go_back() {
        designer.go_back();
        assert_ne!(designer.selected(), &NodeId::element("inner"));
        assert_ne!(designer.selected(), &NodeId::element("panel1"));
    }
}

#[test]
fn test_loading_a_survey_resets_the_history() {
    let mut designer = designer_with(json!({
        "elements": [{ "type": "text", "name": "q1" }]
    }));
    designer.select(Some(NodeId::element("q1")));
    assert!(designer.can_go_back());

    designer
        .load_json_text(&json!({ "elements": [] }).to_string())
        .unwrap();
    assert!(!designer.can_go_back());
    assert!(!designer.can_go_forward());
    assert_eq!(designer.selected(), &NodeId::Survey);
}

#[test]
fn test_selection_events_fire_once_per_actual_change() {
    let mut designer = designer_with(json!({
        "elements": [{ "type": "text", "name": "q1" }]
    }));
    let selections = Rc::new(RefCell::new(Vec::new()));
    let sink = selections.clone();
    designer.events().subscribe(move |event| {
        if let DesignerEvent::SelectionChanged { selection } = event {
            sink.borrow_mut().push(selection.clone());
        }
    });

    designer.select(Some(NodeId::element("q1")));
    // Idempotent select: no event
    designer.select(Some(NodeId::element("q1")));
    // Unresolvable target: rejected, no event
    designer.select(Some(NodeId::element("ghost")));
    designer.go_back();

    assert_eq!(
        *selections.borrow(),
        vec![NodeId::element("q1"), NodeId::Survey]
    );
}
