use std::fmt;

use crate::error::CodecError;

/// A single field that could not be loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFailure {
    /// Dotted path from the entity being read to the failing field.
    pub field: String,
    pub error: CodecError,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, error: CodecError) -> Self {
        Self {
            field: field.into(),
            error,
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Field failures collected while reading one entity (and anything it
/// embeds). An empty report means every field loaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadReport {
    failures: Vec<FieldFailure>,
}

impl ReadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no field failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<FieldFailure> {
        self.failures
    }

    pub fn push(&mut self, failure: FieldFailure) {
        self.failures.push(failure);
    }

    /// Fold in the report of a nested value, prefixing its paths with
    /// `prefix`.
    pub fn absorb(&mut self, prefix: &str, nested: ReadReport) {
        for failure in nested.failures {
            let field = if failure.field.starts_with('[') {
                format!("{prefix}{}", failure.field)
            } else {
                format!("{prefix}.{}", failure.field)
            };
            self.failures.push(FieldFailure::new(field, failure.error));
        }
    }

    /// Append every failure of `other` unchanged.
    pub fn merge(&mut self, other: ReadReport) {
        self.failures.extend(other.failures);
    }
}
