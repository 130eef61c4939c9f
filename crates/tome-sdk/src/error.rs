use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("section not found in catalog: {0}")]
    MissingSection(String),

    #[error("library error: {0}")]
    Library(#[from] tome_library::LibraryError),

    #[error("document error: {0}")]
    Tree(#[from] tome_tree::TreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
