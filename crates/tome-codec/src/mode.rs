use std::fmt;

use serde::{Deserialize, Serialize};

/// How a field pointing at another entity is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// The full entity is nested as a child node.
    #[default]
    Embedded,
    /// Only the referent's numeric id is written.
    ById,
    /// Only the referent's name is written.
    ByName,
}

impl ReferenceMode {
    /// Returns `true` for [`ReferenceMode::ById`] and [`ReferenceMode::ByName`].
    pub fn is_reference(self) -> bool {
        !matches!(self, Self::Embedded)
    }
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "Embedded"),
            Self::ById => write!(f, "ById"),
            Self::ByName => write!(f, "ByName"),
        }
    }
}

/// The declared type of a field, as far as the codec is concerned.
///
/// Each kind maps to exactly one encoding rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Text,
    DateTime,
    Enum,
    /// A small fixed aggregate of numbers with its own text form (colors).
    Aggregate,
    /// A nested entity written in full.
    Entity,
    /// A key-only handle to an identified entity in a library.
    Reference,
    PrimitiveArray,
    EntityList,
    ReferenceList,
    Map,
    BitSet,
}

impl FieldKind {
    /// Whether a field of this kind may be configured with `mode`.
    ///
    /// Reference kinds require ById or ByName; every other kind is
    /// Embedded only.
    pub fn accepts(self, mode: ReferenceMode) -> bool {
        match self {
            Self::Reference | Self::ReferenceList => mode.is_reference(),
            _ => !mode.is_reference(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
