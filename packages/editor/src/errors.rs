//! Error types for the editor

use folio_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

impl From<EditorError> for CommonError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::Mutation(crate::mutations::MutationError::Structure(inner)) => inner,
            other => CommonError::Generic(other.to_string()),
        }
    }
}
