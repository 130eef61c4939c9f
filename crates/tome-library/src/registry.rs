//! The type-scoped library registry.
//!
//! A [`Registry`] holds at most one canonical [`Library`] per entity type
//! and answers reference lookups for the codec. It is an ordinary value:
//! hosts thread it through their load and save passes, and tests build a
//! fresh one each.
//!
//! Libraries must be loaded in dependency order. A reference into a type
//! whose library is not yet registered fails to resolve. References into
//! the type being loaded resolve against that library as it fills, so the
//! referent must come earlier in the document or already be a member.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use tracing::debug;

use tome_codec::{Identified, KeyIndex, Ref, Resolver};
use tome_tree::Node;

use crate::config::LibraryConfig;
use crate::error::{LibraryError, LibraryResult};
use crate::library::{Library, LoadReport};

/// A library with its member type erased.
trait ErasedLibrary {
    fn key_index(&self) -> &dyn KeyIndex;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn member_type(&self) -> &'static str;

    fn member_count(&self) -> usize;
}

impl<T: Identified + 'static> ErasedLibrary for Library<T> {
    fn key_index(&self) -> &dyn KeyIndex {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn member_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn member_count(&self) -> usize {
        self.len()
    }
}

/// Canonical libraries keyed by member type.
#[derive(Default)]
pub struct Registry {
    libraries: HashMap<TypeId, Box<dyn ErasedLibrary>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered libraries.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Make `library` the canonical library for `T`, returning the one it
    /// replaces.
    pub fn register<T: Identified + 'static>(&mut self, library: Library<T>) -> Option<Library<T>> {
        debug!(
            library = type_name::<T>(),
            members = library.len(),
            "library registered"
        );
        self.libraries
            .insert(TypeId::of::<T>(), Box::new(library))
            .and_then(|previous| previous.into_any().downcast::<Library<T>>().ok())
            .map(|previous| *previous)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.libraries.contains_key(&TypeId::of::<T>())
    }

    pub fn library<T: Identified + 'static>(&self) -> Option<&Library<T>> {
        self.libraries
            .get(&TypeId::of::<T>())
            .and_then(|library| library.as_any().downcast_ref())
    }

    pub fn library_mut<T: Identified + 'static>(&mut self) -> Option<&mut Library<T>> {
        self.libraries
            .get_mut(&TypeId::of::<T>())
            .and_then(|library| library.as_any_mut().downcast_mut())
    }

    /// Unregister and return the library for `T`.
    pub fn take<T: Identified + 'static>(&mut self) -> Option<Library<T>> {
        self.libraries
            .remove(&TypeId::of::<T>())
            .and_then(|library| library.into_any().downcast::<Library<T>>().ok())
            .map(|library| *library)
    }

    /// The member a reference points at, looked up by id when the reference
    /// carries one, else by name.
    pub fn resolve<T: Identified + 'static>(&self, reference: &Ref<T>) -> Option<&T> {
        let library = self.library::<T>()?;
        match reference.id() {
            Some(id) => library.by_id(id),
            None => library.by_name(reference.name()?),
        }
    }

    /// Read the library for `T` from `node` and register it.
    ///
    /// An already registered library is reused, keeping its members and
    /// factory, and takes on `config`. Otherwise a new library is created.
    /// The library is registered again even when the read fails part way.
    pub fn load<T: Identified + Default + 'static>(
        &mut self,
        node: &Node,
        config: LibraryConfig,
    ) -> LibraryResult<LoadReport> {
        let mut library = self
            .take::<T>()
            .unwrap_or_else(|| Library::new(config));
        library.set_config(config);
        let result = library.read(node, &*self);
        self.register(library);
        result
    }

    /// Write the library for `T` into `node`.
    pub fn save<T: Identified + 'static>(&self, node: &mut Node) -> LibraryResult<()> {
        self.library::<T>()
            .ok_or(LibraryError::NotRegistered(type_name::<T>()))?
            .write(node, self)
    }
}

impl Resolver for Registry {
    fn index(&self, target: TypeId) -> Option<&dyn KeyIndex> {
        self.libraries.get(&target).map(|library| library.key_index())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut libraries: Vec<(&'static str, usize)> = self
            .libraries
            .values()
            .map(|library| (library.member_type(), library.member_count()))
            .collect();
        libraries.sort();
        f.debug_struct("Registry")
            .field("libraries", &libraries)
            .finish()
    }
}
