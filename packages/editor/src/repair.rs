//! # Reference Repair
//!
//! Deleting an element can leave logic expressions (`visibleIf`, `enableIf`)
//! referring to a question that no longer exists. After every deletion the
//! repair engine scans the surviving tree and clears any expression that
//! mentions a deleted name, inside the same operation and the same undo
//! snapshot.
//!
//! Repairs are:
//! - **Deterministic**: the same deletion always produces the same repairs
//! - **Minimal**: only expressions actually mentioning a deleted name change
//! - **Composable**: effects are independent and can run in any order

use formcraft_expression::referenced_names;
use formcraft_model::{NodeId, SurveyDocument};

/// A secondary change needed to keep the document consistent.
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    ClearVisibleIf { target: NodeId },
    ClearEnableIf { target: NodeId },
}

/// Inspects the document after a deletion and proposes repairs.
pub trait PostEffect: std::fmt::Debug {
    fn analyze(&self, deleted_names: &[String], doc: &SurveyDocument) -> Vec<Repair>;
}

/// Clear `visibleIf`/`enableIf` expressions that reference a deleted name.
///
/// The whole expression is dropped rather than partially rewritten: a
/// half-edited condition silently changing truth value is worse than a
/// cleared one the author has to revisit.
#[derive(Debug)]
pub struct ClearDanglingExpressions;

impl ClearDanglingExpressions {
    fn mentions_deleted(expression: &str, deleted_names: &[String]) -> bool {
        referenced_names(expression)
            .iter()
            .any(|name| deleted_names.iter().any(|deleted| deleted == name))
    }
}

impl PostEffect for ClearDanglingExpressions {
    fn analyze(&self, deleted_names: &[String], doc: &SurveyDocument) -> Vec<Repair> {
        let mut repairs = Vec::new();
        for page in &doc.pages {
            if let Some(expr) = &page.visible_if {
                if Self::mentions_deleted(expr, deleted_names) {
                    repairs.push(Repair::ClearVisibleIf {
                        target: NodeId::Page(page.name.clone()),
                    });
                }
            }
        }
        doc.for_each_element(&mut |el| {
            if let Some(expr) = &el.visible_if {
                if Self::mentions_deleted(expr, deleted_names) {
                    repairs.push(Repair::ClearVisibleIf {
                        target: NodeId::Element(el.name.clone()),
                    });
                }
            }
            if let Some(expr) = &el.enable_if {
                if Self::mentions_deleted(expr, deleted_names) {
                    repairs.push(Repair::ClearEnableIf {
                        target: NodeId::Element(el.name.clone()),
                    });
                }
            }
        });
        repairs
    }
}

/// Runs every registered post-effect and applies the proposed repairs.
#[derive(Debug)]
pub struct RepairEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl RepairEngine {
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(ClearDanglingExpressions)],
        }
    }

    pub fn analyze(&self, deleted_names: &[String], doc: &SurveyDocument) -> Vec<Repair> {
        let mut repairs = Vec::new();
        for effect in &self.effects {
            repairs.append(&mut effect.analyze(deleted_names, doc));
        }
        repairs
    }

    /// Analyze and apply in one pass. Returns the repairs that were applied
    /// so the caller can log or surface them.
    pub fn run(&self, deleted_names: &[String], doc: &mut SurveyDocument) -> Vec<Repair> {
        let repairs = self.analyze(deleted_names, doc);
        for repair in &repairs {
            apply_repair(repair, doc);
        }
        if !repairs.is_empty() {
            tracing::debug!(count = repairs.len(), "cleared dangling expressions");
        }
        repairs
    }
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_repair(repair: &Repair, doc: &mut SurveyDocument) {
    match repair {
        Repair::ClearVisibleIf { target } => match target {
            NodeId::Page(name) => {
                if let Some(page) = doc.page_by_name_mut(name) {
                    page.visible_if = None;
                }
            }
            NodeId::Element(name) => {
                if let Some(el) = doc.element_by_name_mut(name) {
                    el.visible_if = None;
                }
            }
            _ => {}
        },
        Repair::ClearEnableIf { target } => {
            if let NodeId::Element(name) = target {
                if let Some(el) = doc.element_by_name_mut(name) {
                    el.enable_if = None;
                }
            }
        }
    }
}
