//! Tree documents for tome.
//!
//! Every save file handled by tome is a tree of [`Node`]s. A node has a
//! name, a set of string-valued attributes, an ordered list of child nodes,
//! and an optional direct text value. The codec and library crates only ever
//! see this shape; where the tree physically lives (file, archive, network
//! blob) is the host's concern.
//!
//! # Key Types
//!
//! - [`Node`]: a single element of the document tree
//! - [`TreeError`]: JSON persistence failures

pub mod error;
pub mod node;

pub use error::{TreeError, TreeResult};
pub use node::Node;
