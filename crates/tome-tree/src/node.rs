use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// A single element of a tree document.
///
/// Attributes are kept sorted by key so two documents with the same content
/// always serialize identically. Children keep their insertion order, which
/// is significant: libraries rely on it to preserve member order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Node {
    /// Create an empty node with the given element name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a node carrying only a direct text value.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// The element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ---------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Iterate over all attributes in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ---------------------------------------------------------------
    // Children
    // ---------------------------------------------------------------

    /// All children in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The first child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable access to the first child with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Append a child and return a mutable reference to it.
    pub fn push_child(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Return the first child named `name`, appending an empty one if absent.
    pub fn find_or_create_child(&mut self, name: &str) -> &mut Node {
        match self.children.iter().position(|c| c.name == name) {
            Some(pos) => &mut self.children[pos],
            None => self.push_child(Node::new(name)),
        }
    }

    /// Remove every child with the given name. Returns how many were removed.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.name != name);
        before - self.children.len()
    }

    // ---------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------

    /// The node's direct text value.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the node's direct text value.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Clear the node's direct text value.
    pub fn clear_text(&mut self) {
        self.text = None;
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Serialize the document to compact JSON.
    pub fn to_json(&self) -> TreeResult<String> {
        serde_json::to_string(self).map_err(|e| TreeError::Serialization(e.to_string()))
    }

    /// Serialize the document to indented JSON.
    pub fn to_json_pretty(&self) -> TreeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TreeError::Serialization(e.to_string()))
    }

    /// Parse a document from JSON. The root must carry a name.
    pub fn from_json(json: &str) -> TreeResult<Self> {
        let node: Node =
            serde_json::from_str(json).map_err(|e| TreeError::Serialization(e.to_string()))?;
        if node.name.is_empty() {
            return Err(TreeError::EmptyDocument);
        }
        Ok(node)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (k, v) in &self.attributes {
            write!(f, " {k}=\"{v}\"")?;
        }
        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{text}")?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}
