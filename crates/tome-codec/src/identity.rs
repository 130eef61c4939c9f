use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tome_tree::Node;

use crate::error::CodecResult;
use crate::value::ArrayElement;

/// The id carried by an entity that has not been assigned one.
pub const NO_ID: i32 = -1;

pub const ATTR_ID: &str = "ID";
pub const ATTR_NAME: &str = "Name";
pub const ATTR_VERSION: &str = "Version";

/// Write `version` as the `Version` attribute of `node`, if set.
pub fn write_version(version: Option<f32>, node: &mut Node) {
    if let Some(version) = version {
        node.set_attribute(ATTR_VERSION, version.to_string());
    }
}

/// Parse the `Version` attribute of `node`, `None` when absent.
pub fn read_version(node: &Node) -> CodecResult<Option<f32>> {
    node.attribute(ATTR_VERSION).map(f32::from_text).transpose()
}

/// Identity and free-form attributes shared by every identified entity.
///
/// `id` and `name` are what libraries index on. `properties` catches every
/// attribute on the entity's node that the schema does not model, so extra
/// data written by newer or foreign tools survives a load/save cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i32,
    pub name: Option<String>,
    /// Present only if the source document carried one.
    pub version: Option<f32>,
    pub properties: BTreeMap<String, String>,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            id: NO_ID,
            name: None,
            version: None,
            properties: BTreeMap::new(),
        }
    }
}

impl Identity {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// An identity with a name but no id yet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn has_id(&self) -> bool {
        self.id != NO_ID
    }

    /// The document version, `0.0` when none was read.
    pub fn version(&self) -> f32 {
        self.version.unwrap_or(0.0)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Returns `true` for the attribute names identity owns.
    pub fn is_identity_attribute(key: &str) -> bool {
        matches!(key, ATTR_ID | ATTR_NAME | ATTR_VERSION)
    }

    /// Parse the `ID` attribute of `node`, [`NO_ID`] when absent.
    pub fn id_attribute(node: &Node) -> CodecResult<i32> {
        node.attribute(ATTR_ID)
            .map(i32::from_text)
            .transpose()
            .map(|id| id.unwrap_or(NO_ID))
    }

    /// Write `ID`, `Name`, `Version` and every property as attributes.
    ///
    /// `ID` is omitted when unassigned, `Name` when empty, `Version` when it
    /// was never set. A property sharing a name with an identity attribute
    /// is shadowed by it.
    pub fn write_attributes(&self, node: &mut Node) {
        for (key, value) in &self.properties {
            node.set_attribute(key.as_str(), value.as_str());
        }
        if self.has_id() {
            node.set_attribute(ATTR_ID, self.id.to_string());
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            node.set_attribute(ATTR_NAME, name);
        }
        write_version(self.version, node);
    }

    /// Populate identity from the attributes of `node`.
    ///
    /// `id` and `name` fall back to their defaults when absent; `version` is
    /// only touched when present. The property bag is replaced by every
    /// other attribute of `node`. On a malformed `ID` or `Version` the remaining
    /// attributes are still read and the first error is returned.
    pub fn read_attributes(&mut self, node: &Node) -> CodecResult<()> {
        self.name = node
            .attribute(ATTR_NAME)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        self.properties.clear();
        for (key, value) in node.attributes() {
            if !Self::is_identity_attribute(key) {
                self.properties.insert(key.to_string(), value.to_string());
            }
        }

        let id = Self::id_attribute(node);
        let version = read_version(node);
        if let Ok(id) = id {
            self.id = id;
        }
        if let Ok(Some(version)) = version {
            self.version = Some(version);
        }
        id?;
        version?;
        Ok(())
    }
}
