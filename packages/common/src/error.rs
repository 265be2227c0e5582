use thiserror::Error;

/// Common error type shared by the document layer and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommonError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Node {0} cannot have children")]
    NotAContainer(String),

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl From<String> for CommonError {
    fn from(s: String) -> Self {
        CommonError::Generic(s)
    }
}

impl From<&str> for CommonError {
    fn from(s: &str) -> Self {
        CommonError::Generic(s.to_string())
    }
}
