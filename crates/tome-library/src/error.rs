use tome_codec::CodecError;

/// Errors from library and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// An add would grow the library past its configured maximum.
    #[error("library of {type_name} is full ({max_records} records)")]
    CapacityExceeded {
        type_name: &'static str,
        max_records: usize,
    },

    /// Every id up to `i32::MAX` has been assigned.
    #[error("library of {0} has no ids left to assign")]
    IdSpaceExhausted(&'static str),

    /// A default member was requested from an empty library.
    #[error("library of {0} is empty; no default member")]
    EmptyLibrary(&'static str),

    /// A positional access past the end of the library.
    #[error("index {index} out of range for library of {len} members")]
    IndexOutOfRange { index: usize, len: usize },

    /// No member carries the requested id.
    #[error("no member with id {0}")]
    IdNotFound(i32),

    /// No library is registered for the requested type.
    #[error("no library registered for {0}")]
    NotRegistered(&'static str),

    /// An entity could not be read or written at all.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration could not be parsed.
    #[error("invalid library config: {0}")]
    Config(String),
}

/// Result alias for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;
