//! References between entities.
//!
//! A field that points at an identified entity owned by some library is
//! stored as a [`Ref`]: a key (id and, when known, name), never the entity
//! itself. Decoding validates the key against the library registered for
//! the referent's type through a [`Resolver`]; resolving a `Ref` back to
//! the entity is done by whoever owns the libraries.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tome_tree::Node;

use crate::context::FieldContext;
use crate::entity::Identified;
use crate::error::{CodecError, CodecResult};
use crate::identity::NO_ID;
use crate::mode::{FieldKind, ReferenceMode};
use crate::value::ArrayElement;

/// Key lookups into one library, independent of its member type.
pub trait KeyIndex {
    fn contains_id(&self, id: i32) -> bool;

    /// The name of the member with `id`, if it has one.
    fn name_of(&self, id: i32) -> Option<&str>;

    /// The id of the member named `name` (case-insensitive).
    fn id_of(&self, name: &str) -> Option<i32>;
}

/// Finds the canonical library for an entity type.
pub trait Resolver {
    fn index(&self, target: TypeId) -> Option<&dyn KeyIndex>;
}

/// A resolver with no libraries. Any ById/ByName field fails to resolve.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResolver;

impl Resolver for NoResolver {
    fn index(&self, _target: TypeId) -> Option<&dyn KeyIndex> {
        None
    }
}

/// Key-only handle to an identified entity of type `T`.
pub struct Ref<T> {
    id: i32,
    name: Option<String>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    /// A reference by id only.
    pub fn by_id(id: i32) -> Self {
        Self {
            id,
            name: None,
            marker: PhantomData,
        }
    }

    /// A reference by name only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: NO_ID,
            name: Some(name.into()),
            marker: PhantomData,
        }
    }

    /// The referent's id, if known.
    pub fn id(&self) -> Option<i32> {
        (self.id != NO_ID).then_some(self.id)
    }

    /// The referent's name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn key(&self) -> String {
        match (self.id(), self.name()) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => name.to_string(),
            (None, None) => "<empty>".to_string(),
        }
    }
}

impl<T: Identified> Ref<T> {
    /// A reference to `entity` carrying both its id and name.
    pub fn to(entity: &T) -> Self {
        Self {
            id: entity.id(),
            name: entity.name().map(str::to_owned),
            marker: PhantomData,
        }
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("target", &type_name::<T>())
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// The library registered for `T`, if any.
pub fn index_for<'r, T: 'static>(resolver: &'r dyn Resolver) -> Option<&'r dyn KeyIndex> {
    resolver.index(TypeId::of::<T>())
}

fn reference_text<T: 'static>(value: &Ref<T>, cx: &FieldContext<'_>) -> CodecResult<String> {
    match cx.mode {
        ReferenceMode::ById => {
            if let Some(id) = value.id() {
                return Ok(id.to_string());
            }
            value
                .name()
                .and_then(|name| index_for::<T>(cx.resolver)?.id_of(name))
                .map(|id| id.to_string())
                .ok_or_else(|| {
                    CodecError::unresolved(type_name::<T>(), value.key(), "reference has no id")
                })
        }
        ReferenceMode::ByName => {
            if let Some(name) = value.name() {
                return Ok(name.to_string());
            }
            value
                .id()
                .and_then(|id| index_for::<T>(cx.resolver)?.name_of(id))
                .map(str::to_owned)
                .ok_or_else(|| {
                    CodecError::unresolved(type_name::<T>(), value.key(), "reference has no name")
                })
        }
        ReferenceMode::Embedded => Err(CodecError::schema(
            cx.field,
            "a reference cannot be embedded",
        )),
    }
}

fn resolve_key<T: 'static>(text: &str, cx: &FieldContext<'_>) -> CodecResult<Ref<T>> {
    let index = index_for::<T>(cx.resolver).ok_or_else(|| {
        CodecError::unresolved(type_name::<T>(), text, "no library registered for this type")
    })?;
    let id = match cx.mode {
        ReferenceMode::ById => {
            let id = i32::from_text(text)?;
            if !index.contains_id(id) {
                return Err(CodecError::unresolved(type_name::<T>(), text, "no member with this id"));
            }
            id
        }
        ReferenceMode::ByName => index.id_of(text).ok_or_else(|| {
            CodecError::unresolved(type_name::<T>(), text, "no member with this name")
        })?,
        ReferenceMode::Embedded => {
            return Err(CodecError::schema(cx.field, "a reference cannot be embedded"))
        }
    };
    Ok(Ref {
        id,
        name: index.name_of(id).map(str::to_owned),
        marker: PhantomData,
    })
}

/// Write a reference as the text of `node`: the referent's id or name,
/// depending on the context's mode.
pub fn encode_reference<T: Identified + 'static>(
    value: &Ref<T>,
    node: &mut Node,
    cx: &FieldContext<'_>,
) -> CodecResult<()> {
    cx.require(FieldKind::Reference)?;
    node.set_text(reference_text(value, cx)?);
    Ok(())
}

/// Read a reference from the text of `node`, checking that the referent
/// exists in the library registered for `T`.
pub fn decode_reference<T: Identified + 'static>(
    node: &Node,
    cx: &FieldContext<'_>,
) -> CodecResult<Ref<T>> {
    cx.require(FieldKind::Reference)?;
    resolve_key(node.text().unwrap_or("").trim(), cx)
}

/// Write one child per reference, each named after `T`'s element name.
pub fn encode_reference_list<T: Identified + 'static>(
    values: &[Ref<T>],
    node: &mut Node,
    cx: &FieldContext<'_>,
) -> CodecResult<()> {
    cx.require(FieldKind::ReferenceList)?;
    for value in values {
        node.push_child(Node::with_text(T::element_name(), reference_text(value, cx)?));
    }
    Ok(())
}

/// Read every child named after `T`'s element name as a reference.
pub fn decode_reference_list<T: Identified + 'static>(
    node: &Node,
    cx: &FieldContext<'_>,
) -> CodecResult<Vec<Ref<T>>> {
    cx.require(FieldKind::ReferenceList)?;
    node.children_named(T::element_name())
        .map(|child| resolve_key(child.text().unwrap_or("").trim(), cx))
        .collect()
}
