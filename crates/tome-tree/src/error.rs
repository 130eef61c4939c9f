use thiserror::Error;

/// Errors produced by tree document operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("document root is empty")]
    EmptyDocument,
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
