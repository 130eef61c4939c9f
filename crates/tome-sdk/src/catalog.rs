use std::fs;
use std::path::Path;

use tracing::info;

use tome_codec::Identified;
use tome_library::{LibraryConfig, LoadReport, Registry};
use tome_tree::Node;

use crate::error::{SdkError, SdkResult};

/// Element name of a new catalog's root node.
pub const ROOT_ELEMENT: &str = "Catalog";

/// A document of library sections plus the registry they load into.
///
/// Each section is a direct child of the root, named by the caller, holding
/// one library's members. Sections must be loaded in dependency order: a
/// library whose members reference another type is loaded after that
/// type's library.
pub struct Catalog {
    registry: Registry,
    root: Node,
}

impl Catalog {
    /// An empty catalog with an empty registry.
    pub fn new() -> Self {
        Self::from_root(Node::new(ROOT_ELEMENT))
    }

    /// Wrap an existing document.
    pub fn from_root(root: Node) -> Self {
        Self {
            registry: Registry::new(),
            root,
        }
    }

    pub fn from_json(text: &str) -> SdkResult<Self> {
        Ok(Self::from_root(Node::from_json(text)?))
    }

    pub fn to_json(&self) -> SdkResult<String> {
        Ok(self.root.to_json_pretty()?)
    }

    /// Read a catalog document from a JSON file.
    pub fn open(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&text)?;
        info!(
            path = %path.as_ref().display(),
            sections = catalog.root.children().len(),
            "catalog opened"
        );
        Ok(catalog)
    }

    /// Write the catalog document to a JSON file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        info!(path = %path.as_ref().display(), "catalog saved");
        Ok(())
    }

    /// Load section `section` into the library for `T`.
    pub fn load<T: Identified + Default + 'static>(
        &mut self,
        section: &str,
        config: LibraryConfig,
    ) -> SdkResult<LoadReport> {
        let node = self
            .root
            .child(section)
            .ok_or_else(|| SdkError::MissingSection(section.to_string()))?;
        let report = self.registry.load::<T>(node, config)?;
        info!(
            section,
            added = report.added,
            merged = report.merged,
            failures = report.failures.len(),
            "section loaded"
        );
        Ok(report)
    }

    /// Write the library for `T` into section `section`, replacing the
    /// members it held. The section is created if absent.
    pub fn save<T: Identified + 'static>(&mut self, section: &str) -> SdkResult<()> {
        let node = self.root.find_or_create_child(section);
        node.remove_children(T::element_name());
        self.registry.save::<T>(node)?;
        Ok(())
    }

    /// The section named `name`, if present.
    pub fn section(&self, name: &str) -> Option<&Node> {
        self.root.child(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("root", &self.root.name())
            .field("sections", &self.root.children().len())
            .field("registry", &self.registry)
            .finish()
    }
}
