//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignerError {
    #[error("Model error: {0}")]
    Model(#[from] formcraft_model::ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Name already in use: {0}")]
    NameInUse(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("A survey must keep at least one page")]
    CannotDeleteLastPage,
}
