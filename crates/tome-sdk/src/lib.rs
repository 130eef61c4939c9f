//! High-level catalog API for tome.
//!
//! A [`Catalog`] pairs one root document with a [`Registry`]. Each child
//! section of the root holds one library; the host loads sections in
//! dependency order, works with the typed libraries, and saves them back.
//! This is the main entry point for applications embedding tome.

pub mod catalog;
pub mod error;

pub use catalog::{Catalog, ROOT_ELEMENT};
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use tome_codec::{
    Entity, FieldDescriptor, Identified, Identity, Ref, ReferenceMode, Resolver, Schema,
};
pub use tome_library::{AddOutcome, Library, LibraryConfig, LoadReport, Registry};
pub use tome_tree::Node;
