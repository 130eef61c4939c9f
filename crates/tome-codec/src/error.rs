//! Error types for codec operations.

use thiserror::Error;

/// Errors raised while encoding or decoding a single field.
///
/// All three kinds are recoverable: field-driven reads catch them at the
/// field boundary and record them in a [`ReadReport`](crate::ReadReport).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The field's declared kind and its configured reference mode disagree,
    /// or the field has no codec rule for the requested operation.
    #[error("schema error on field {field}: {reason}")]
    Schema { field: String, reason: String },

    /// Text could not be parsed as the expected value.
    #[error("cannot parse {value:?} as {expected}: {reason}")]
    Format {
        expected: &'static str,
        value: String,
        reason: String,
    },

    /// A ById/ByName reference had no library to resolve against, or the
    /// key was not present in that library.
    #[error("unresolved reference to {target} ({key}): {reason}")]
    ReferenceResolution {
        target: &'static str,
        key: String,
        reason: String,
    },
}

impl CodecError {
    pub(crate) fn format(expected: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Format {
            expected,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(field: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(target: &'static str, key: impl ToString, reason: impl Into<String>) -> Self {
        Self::ReferenceResolution {
            target,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`CodecError::ReferenceResolution`].
    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::ReferenceResolution { .. })
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
