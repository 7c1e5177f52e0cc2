//! Name-based node addressing.

use serde::{Deserialize, Serialize};

/// Weak reference to a document node.
///
/// A `NodeId` is re-resolved against the live tree on every use; it never owns
/// or pins the node it names. This is what makes selection, navigation history
/// and undo snapshots safe across tree rebuilds: a stale id simply fails to
/// resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// The survey root. Also the conventional meaning of "nothing selected".
    Survey,
    Page(String),
    /// A question or panel, unique survey-wide.
    Element(String),
    /// A matrix column, unique within its matrix question.
    Column { matrix: String, column: String },
    /// A matrix row, unique within its matrix question.
    Row { matrix: String, row: String },
}

impl NodeId {
    pub fn element(name: impl Into<String>) -> Self {
        NodeId::Element(name.into())
    }

    pub fn page(name: impl Into<String>) -> Self {
        NodeId::Page(name.into())
    }

    pub fn is_survey(&self) -> bool {
        matches!(self, NodeId::Survey)
    }

    /// The node's own name, if it has one (the survey root does not).
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeId::Survey => None,
            NodeId::Page(name) | NodeId::Element(name) => Some(name),
            NodeId::Column { column, .. } => Some(column),
            NodeId::Row { row, .. } => Some(row),
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::Survey
    }
}
