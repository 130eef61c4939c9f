//! Entity libraries for tome.
//!
//! A [`Library`] is the owning, indexed collection of one identified entity
//! type: insertion-ordered members, an id index, and a case-insensitive
//! name index. Libraries load from and save to [`tome_tree::Node`]
//! documents, either replacing their contents or merging into existing
//! members by id.
//!
//! The [`Registry`] maps each entity type to its canonical library and is
//! the [`tome_codec::Resolver`] reference fields are decoded against.
//!
//! # Design Rules
//!
//! 1. Ids are unique within a library. A duplicate add keeps the existing
//!    member and reports [`AddOutcome::DuplicateId`].
//! 2. `next_id` never decreases.
//! 3. Merge-on-read mutates matching members in place, so their addresses
//!    survive a reload.
//! 4. Libraries are loaded in dependency order; the registry does not
//!    reorder or retry.

pub mod config;
pub mod error;
pub mod library;
pub mod registry;

pub use config::{LibraryConfig, UNBOUNDED};
pub use error::{LibraryError, LibraryResult};
pub use library::{AddOutcome, Library, LoadReport, DEFAULT_MEMBER};
pub use registry::Registry;
