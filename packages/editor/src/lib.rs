//! # Formcraft Editor
//!
//! Core editing engine for the survey designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ view layer: tree, property grid, designer   │
//! │ surface, navigator (external bindings)      │
//! └─────────────────────────────────────────────┘
//!                     ↓ calls / ↑ subscribes
//! ┌─────────────────────────────────────────────┐
//! │ editor: SurveyDesigner                      │
//! │  - selection tracking + navigation history  │
//! │  - structural mutations + reference repair  │
//! │  - snapshot undo/redo                       │
//! │  - typed event channel                      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: SurveyDocument (JSON round-trip)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Names are the only references**: selection, history and undo
//!    snapshots store `NodeId`s and re-resolve them against the live tree
//! 2. **One notification per operation**: every logical user operation fires
//!    exactly one `Modified` event and records exactly one undo snapshot
//! 3. **Views never mutate**: subscribers re-render from designer state and
//!    route every edit back through designer operations
//! 4. **Synchronous and single-threaded**: operations run to completion;
//!    subscribers always observe a fully consistent document

mod designer;
mod errors;
mod events;
mod history;
mod operations;
mod repair;
mod selection;
mod toolbox;
mod undo_stack;

pub use designer::SurveyDesigner;
pub use errors::DesignerError;
pub use events::{DesignerEvent, EventChannel, ModifiedKind, SubscriptionId};
pub use history::SelectionHistoryController;
pub use operations::DeleteOutcome;
pub use repair::{ClearDanglingExpressions, PostEffect, Repair, RepairEngine};
pub use selection::SelectionTracker;
pub use toolbox::{QuestionToolbox, ToolboxItem};
pub use undo_stack::{UndoRedoItem, UndoRedoManager};

// Re-export the model types callers touch most
pub use formcraft_model::{Element, NodeId, Page, SurveyDocument};
