//! Type-directed codec for tome.
//!
//! This crate turns entities into [`Node`] trees and back. What a field
//! looks like on disk is decided by its declared kind and, for links to
//! other entities, its [`ReferenceMode`]:
//!
//! - **Embedded** -- the referenced entity is written in full as a child
//! - **ById** -- only the referent's numeric id is written
//! - **ByName** -- only the referent's name is written
//!
//! Reference fields hold a key-only [`Ref`]. On read the key is validated
//! against the library registered for the referent's type, reached through
//! a [`Resolver`].
//!
//! # Modules
//!
//! - [`value`] -- [`FieldCodec`] for primitives, dates, arrays, and maps
//! - [`enums`] -- [`named_enum!`] and [`NamedEnum`]
//! - [`color`] / [`bitset`] -- aggregate and bit-set value types
//! - [`entity`] -- [`Entity`], [`Identified`], embedded entity codec
//! - [`reference`] -- [`Ref`], [`Resolver`], ById/ByName codec
//! - [`field`] -- [`FieldDescriptor`], [`Schema`], field-driven read/write
//! - [`identity`] -- [`Identity`] and its attribute conventions
//!
//! # Design Rules
//!
//! 1. A field's kind fixes which modes it may use; a mismatch is a
//!    [`CodecError::Schema`] raised on first use.
//! 2. One bad field never aborts an entity read. It is logged, recorded in
//!    the [`ReadReport`], and the field keeps its previous value.
//! 3. Attributes the schema does not model are preserved in the entity's
//!    [`Identity`] property bag.

pub mod bitset;
pub mod color;
pub mod context;
pub mod entity;
pub mod enums;
pub mod error;
pub mod field;
pub mod identity;
pub mod mode;
pub mod reference;
pub mod report;
pub mod value;

pub use bitset::BitSet;
pub use color::Color;
pub use context::FieldContext;
pub use entity::{
    decode_entity, decode_entity_list, encode_entity, encode_entity_list, Entity, Identified,
    ReadOptions, DEFAULT_ELEMENT,
};
pub use enums::NamedEnum;
pub use error::{CodecError, CodecResult};
pub use field::{
    read_fields, read_identified, read_versioned, write_fields, write_identified,
    write_versioned, FieldDescriptor, Schema,
};
pub use identity::{Identity, NO_ID};
pub use mode::{FieldKind, ReferenceMode};
pub use reference::{
    decode_reference, decode_reference_list, encode_reference, encode_reference_list, KeyIndex,
    NoResolver, Ref, Resolver,
};
pub use report::{FieldFailure, ReadReport};
pub use value::{ArrayElement, FieldCodec, MapValue};

// Re-exported for the macros and for callers building documents.
pub use tome_tree::Node;
