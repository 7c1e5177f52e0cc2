//! Error types for the document model

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Survey JSON must be an object")]
    NotAnObject,
}
