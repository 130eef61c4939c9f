//! The typed, indexed entity library.
//!
//! A [`Library`] owns every member of one identified entity type. Members
//! are kept in insertion order and indexed by id and by case-insensitive
//! name. Each member is boxed, so a member keeps its address for as long
//! as it stays in the library, including across merge-on-read loads.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use tracing::{debug, info, warn};

use tome_codec::identity::ATTR_ID;
use tome_codec::{
    Entity, FieldFailure, Identified, Identity, KeyIndex, ReadReport, Resolver, NO_ID,
};
use tome_tree::Node;

use crate::config::LibraryConfig;
use crate::error::{LibraryError, LibraryResult};

/// Name of the member [`Library::default_member`] prefers.
pub const DEFAULT_MEMBER: &str = "_default";

/// What [`Library::add`] did with an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The entity became a member at `index`.
    Added { id: i32, index: usize },
    /// A member with this id already exists. It was kept and the new
    /// entity was dropped.
    DuplicateId { id: i32 },
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added { .. })
    }
}

/// Summary of one document read into a library.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Members created by this read.
    pub added: usize,
    /// Existing members updated in place.
    pub merged: usize,
    /// Ids of document entries dropped because the id was already taken.
    pub duplicates: Vec<i32>,
    /// Field failures, keyed by the id of the member they belong to.
    pub failures: Vec<(i32, FieldFailure)>,
}

impl LoadReport {
    /// Nothing was dropped and every field loaded.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.failures.is_empty()
    }

    fn record(&mut self, id: i32, nested: ReadReport) {
        self.failures
            .extend(nested.into_failures().into_iter().map(|failure| (id, failure)));
    }
}

fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Keys of the members a read has placed so far. Lets members refer to
/// others of their own type while the library itself is being read.
#[derive(Default)]
struct LoadKeys {
    names: HashMap<i32, Option<String>>,
    ids: HashMap<String, i32>,
}

impl LoadKeys {
    fn of<T: Identified>(members: &[Box<T>]) -> Self {
        let mut keys = Self::default();
        for member in members {
            keys.note(member.id(), member.name());
        }
        keys
    }

    fn note(&mut self, id: i32, name: Option<&str>) {
        let name = name.filter(|n| !n.is_empty());
        if let Some(Some(previous)) = self.names.get(&id) {
            let previous = name_key(previous);
            if self.ids.get(&previous) == Some(&id) {
                self.ids.remove(&previous);
            }
        }
        if let Some(name) = name {
            self.ids.insert(name_key(name), id);
        }
        self.names.insert(id, name.map(str::to_owned));
    }
}

impl KeyIndex for LoadKeys {
    fn contains_id(&self, id: i32) -> bool {
        self.names.contains_key(&id)
    }

    fn name_of(&self, id: i32) -> Option<&str> {
        self.names.get(&id).and_then(|name| name.as_deref())
    }

    fn id_of(&self, name: &str) -> Option<i32> {
        self.ids.get(&name_key(name)).copied()
    }
}

/// Answers lookups for the library being read from its [`LoadKeys`] and
/// everything else from the caller's resolver.
struct OwnFirst<'a> {
    own_type: TypeId,
    own: &'a LoadKeys,
    rest: &'a dyn Resolver,
}

impl Resolver for OwnFirst<'_> {
    fn index(&self, target: TypeId) -> Option<&dyn KeyIndex> {
        if target == self.own_type {
            Some(self.own)
        } else {
            self.rest.index(target)
        }
    }
}

/// An ordered collection of one identified entity type.
///
/// Invariants: every member has a distinct id; the id index covers every
/// member; the name index maps each lower-cased name to the last member
/// (in library order) carrying it; `next_id` never decreases.
pub struct Library<T> {
    members: Vec<Box<T>>,
    id_index: HashMap<i32, usize>,
    name_index: HashMap<String, usize>,
    next_id: i32,
    config: LibraryConfig,
    factory: fn() -> T,
}

impl<T: Identified + Default> Library<T> {
    /// Create an empty library whose new members start from `T::default()`.
    pub fn new(config: LibraryConfig) -> Self {
        Self::with_factory(config, T::default)
    }
}

impl<T: Identified> Library<T> {
    /// Create an empty library whose new members are built by `factory`.
    pub fn with_factory(config: LibraryConfig, factory: fn() -> T) -> Self {
        Self {
            members: Vec::new(),
            id_index: HashMap::new(),
            name_index: HashMap::new(),
            next_id: 0,
            config,
            factory,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: LibraryConfig) {
        self.config = config;
    }

    /// The id the next auto-assigned member will receive.
    pub fn next_id(&self) -> i32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // ---------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------

    /// Add `entity` to the end of the library.
    ///
    /// Under `auto_id` the entity's id is replaced by [`Library::next_id`].
    /// Fails once the library holds `max_records` members, or when every id
    /// up to `i32::MAX` has been handed out. An entity whose id is already
    /// taken is dropped and reported as [`AddOutcome::DuplicateId`].
    pub fn add(&mut self, mut entity: T) -> LibraryResult<AddOutcome> {
        if self.config.auto_id {
            entity.identity_mut().id = self.claim_id()?;
        }
        self.insert(entity)
    }

    /// Take `next_id` for a new member and advance past it.
    fn claim_id(&mut self) -> LibraryResult<i32> {
        let id = self.next_id;
        // `next_id` saturates at `i32::MAX`; once that id is taken there is
        // nothing left to hand out.
        if self.id_index.contains_key(&id) {
            return Err(LibraryError::IdSpaceExhausted(type_name::<T>()));
        }
        self.next_id = id.saturating_add(1);
        Ok(id)
    }

    fn insert(&mut self, entity: T) -> LibraryResult<AddOutcome> {
        if self.members.len() >= self.config.max_records {
            return Err(LibraryError::CapacityExceeded {
                type_name: type_name::<T>(),
                max_records: self.config.max_records,
            });
        }

        let id = entity.id();
        if self.id_index.contains_key(&id) {
            warn!(
                library = type_name::<T>(),
                id, "duplicate id; keeping existing member"
            );
            return Ok(AddOutcome::DuplicateId { id });
        }

        let index = self.members.len();
        self.id_index.insert(id, index);
        if let Some(name) = entity.name().filter(|n| !n.is_empty()) {
            self.name_index.insert(name_key(name), index);
        }
        // Keeps auto-assigned ids clear of ids supplied by callers and documents.
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
        self.members.push(Box::new(entity));

        debug!(library = type_name::<T>(), id, index, "member added");
        Ok(AddOutcome::Added { id, index })
    }

    /// Remove and return the member at `index`.
    pub fn remove_at(&mut self, index: usize) -> LibraryResult<T> {
        if index >= self.members.len() {
            return Err(LibraryError::IndexOutOfRange {
                index,
                len: self.members.len(),
            });
        }
        let removed = self.members.remove(index);
        self.reindex();
        debug!(library = type_name::<T>(), id = removed.id(), index, "member removed");
        Ok(*removed)
    }

    /// Remove and return the member with `id`.
    pub fn remove_by_id(&mut self, id: i32) -> LibraryResult<T> {
        let index = *self.id_index.get(&id).ok_or(LibraryError::IdNotFound(id))?;
        self.remove_at(index)
    }

    /// Drop every member. `next_id` is kept.
    pub fn clear(&mut self) {
        self.members.clear();
        self.id_index.clear();
        self.name_index.clear();
    }

    /// Mutate the member with `id` in place, then refresh the name index.
    ///
    /// The member's id cannot be changed this way; it is restored after `f`
    /// returns.
    pub fn update<R>(&mut self, id: i32, f: impl FnOnce(&mut T) -> R) -> LibraryResult<R> {
        let member = self
            .id_index
            .get(&id)
            .and_then(|&index| self.members.get_mut(index))
            .ok_or(LibraryError::IdNotFound(id))?;
        let result = f(&mut **member);
        member.identity_mut().id = id;
        self.reindex();
        Ok(result)
    }

    fn reindex(&mut self) {
        self.id_index.clear();
        self.name_index.clear();
        for (index, member) in self.members.iter().enumerate() {
            self.id_index.insert(member.id(), index);
            if let Some(name) = member.name().filter(|n| !n.is_empty()) {
                self.name_index.insert(name_key(name), index);
            }
        }
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    pub fn by_id(&self, id: i32) -> Option<&T> {
        self.id_index.get(&id).and_then(|&index| self.get(index))
    }

    /// The member named `name`, compared case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.name_index
            .get(&name_key(name))
            .and_then(|&index| self.get(index))
    }

    /// [`Library::by_name`], falling back to `default`.
    pub fn by_name_or<'a>(&'a self, name: &str, default: &'a T) -> &'a T {
        self.by_name(name).unwrap_or(default)
    }

    /// The member at `index` in library order.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.members.get(index).map(|member| &**member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.members.iter().map(|member| &**member)
    }

    /// Every member, in library order, as a fresh list.
    pub fn entries(&self) -> Vec<&T> {
        self.iter().collect()
    }

    /// The members matching `predicate`, in library order, as a fresh list.
    pub fn entries_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        self.iter().filter(|member| predicate(member)).collect()
    }

    /// The member named `_default` (any case), else the first member.
    pub fn default_member(&self) -> LibraryResult<&T> {
        self.by_name(DEFAULT_MEMBER)
            .or_else(|| self.get(0))
            .ok_or(LibraryError::EmptyLibrary(type_name::<T>()))
    }

    // ---------------------------------------------------------------
    // Document I/O
    // ---------------------------------------------------------------

    /// Read members from the children of `node`, merging or replacing as
    /// configured.
    pub fn read(&mut self, node: &Node, resolver: &dyn Resolver) -> LibraryResult<LoadReport>
    where
        T: 'static,
    {
        self.read_with(node, resolver, self.config.merge_on_read)
    }

    /// Read members from every child of `node` named after `T`.
    ///
    /// Without `merge` the library is cleared first. With `merge`, a child
    /// whose id matches an existing member is read into that member in
    /// place; every other child becomes a new member. Ids carried by the
    /// document are kept even under `auto_id`; only children without an id
    /// are assigned one. A full library aborts the read.
    ///
    /// References into `T` itself resolve against the members placed so
    /// far, so a referent must come earlier in the document than the member
    /// pointing at it (or already be in the library when merging). Every
    /// other type goes through `resolver`.
    pub fn read_with(
        &mut self,
        node: &Node,
        resolver: &dyn Resolver,
        merge: bool,
    ) -> LibraryResult<LoadReport>
    where
        T: 'static,
    {
        if !merge {
            self.clear();
        }

        let mut report = LoadReport::default();
        let result = self.read_members(node, resolver, merge, &mut report);
        if merge {
            // Merged members may have been renamed, also by a read that
            // stopped part way.
            self.reindex();
        }
        result?;

        info!(
            library = type_name::<T>(),
            added = report.added,
            merged = report.merged,
            duplicates = report.duplicates.len(),
            failures = report.failures.len(),
            next_id = self.next_id,
            "library loaded"
        );
        Ok(report)
    }

    fn read_members(
        &mut self,
        node: &Node,
        resolver: &dyn Resolver,
        merge: bool,
        report: &mut LoadReport,
    ) -> LibraryResult<()>
    where
        T: 'static,
    {
        let mut keys = LoadKeys::of(&self.members);
        for child in node.children_named(T::element_name()) {
            let id = match Identity::id_attribute(child) {
                Ok(id) => id,
                Err(error) => {
                    warn!(
                        library = type_name::<T>(),
                        %error,
                        "member has a malformed id; skipping"
                    );
                    report.failures.push((NO_ID, FieldFailure::new(ATTR_ID, error)));
                    continue;
                }
            };

            let existing = if merge {
                self.id_index.get(&id).copied()
            } else {
                None
            };
            if let Some(member) = existing.and_then(|index| self.members.get_mut(index)) {
                let nested = member.read(
                    child,
                    &OwnFirst {
                        own_type: TypeId::of::<T>(),
                        own: &keys,
                        rest: resolver,
                    },
                )?;
                keys.note(member.id(), member.name());
                report.merged += 1;
                report.record(id, nested);
                continue;
            }

            let mut entity = (self.factory)();
            let nested = entity.read(
                child,
                &OwnFirst {
                    own_type: TypeId::of::<T>(),
                    own: &keys,
                    rest: resolver,
                },
            )?;
            if self.config.auto_id && !entity.identity().has_id() {
                entity.identity_mut().id = self.claim_id()?;
            }
            let id = entity.id();
            let name = entity.name().map(str::to_owned);
            match self.insert(entity)? {
                AddOutcome::Added { .. } => {
                    keys.note(id, name.as_deref());
                    report.added += 1;
                }
                AddOutcome::DuplicateId { id } => report.duplicates.push(id),
            }
            report.record(id, nested);
        }
        Ok(())
    }

    /// Append one child per member to `node`, in library order.
    pub fn write(&self, node: &mut Node, resolver: &dyn Resolver) -> LibraryResult<()> {
        for member in self.iter() {
            let mut child = Node::new(T::element_name());
            member.write(&mut child, resolver)?;
            node.push_child(child);
        }
        debug!(library = type_name::<T>(), count = self.len(), "library written");
        Ok(())
    }

    /// Write the library into a new node called `name`.
    pub fn write_node(&self, name: &str, resolver: &dyn Resolver) -> LibraryResult<Node> {
        let mut node = Node::new(name);
        self.write(&mut node, resolver)?;
        Ok(node)
    }
}

impl<T: Identified> KeyIndex for Library<T> {
    fn contains_id(&self, id: i32) -> bool {
        self.id_index.contains_key(&id)
    }

    fn name_of(&self, id: i32) -> Option<&str> {
        self.by_id(id).and_then(|member| member.name())
    }

    fn id_of(&self, name: &str) -> Option<i32> {
        self.by_name(name).map(|member| member.id())
    }
}

impl<T> std::fmt::Debug for Library<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("type", &type_name::<T>())
            .field("members", &self.members.len())
            .field("next_id", &self.next_id)
            .field("config", &self.config)
            .finish()
    }
}
