//! Entities: anything that reads and writes itself as a tree node.

use tome_tree::Node;

use crate::context::FieldContext;
use crate::error::CodecResult;
use crate::identity::Identity;
use crate::mode::FieldKind;
use crate::reference::Resolver;
use crate::report::ReadReport;

/// Element name used by types that do not configure their own.
pub const DEFAULT_ELEMENT: &str = "Node";

/// Options for reading an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Reset fields missing from the document to their empty value instead
    /// of leaving whatever the instance already held.
    pub force_nulls: bool,
}

impl ReadOptions {
    pub fn force_nulls() -> Self {
        Self { force_nulls: true }
    }
}

/// A value with a write/read contract into and out of a tree node.
pub trait Entity {
    /// The canonical element name for nodes of this type.
    fn element_name() -> &'static str
    where
        Self: Sized,
    {
        DEFAULT_ELEMENT
    }

    /// Write `self` into `node` (attributes and children).
    fn write(&self, node: &mut Node, resolver: &dyn Resolver) -> CodecResult<()>;

    /// Populate `self` from `node`.
    ///
    /// Per-field failures are collected in the returned report; an `Err`
    /// means the entity could not be read at all.
    fn read_with(
        &mut self,
        node: &Node,
        resolver: &dyn Resolver,
        options: ReadOptions,
    ) -> CodecResult<ReadReport>;

    /// [`Entity::read_with`] with default options (sparse overwrite).
    fn read(&mut self, node: &Node, resolver: &dyn Resolver) -> CodecResult<ReadReport> {
        self.read_with(node, resolver, ReadOptions::default())
    }
}

/// An entity with an id, a name, and a property bag; the kind of entity
/// libraries hold and references point at.
pub trait Identified: Entity {
    fn identity(&self) -> &Identity;

    fn identity_mut(&mut self) -> &mut Identity;

    fn id(&self) -> i32 {
        self.identity().id
    }

    fn name(&self) -> Option<&str> {
        self.identity().name.as_deref()
    }
}

/// Write an embedded entity into the field node.
pub fn encode_entity<T: Entity>(
    value: &T,
    node: &mut Node,
    cx: &FieldContext<'_>,
) -> CodecResult<()> {
    cx.require(FieldKind::Entity)?;
    value.write(node, cx.resolver)
}

/// Build a fresh instance with `factory` and read it from the field node.
pub fn decode_entity<T: Entity>(
    node: &Node,
    cx: &FieldContext<'_>,
    factory: fn() -> T,
) -> CodecResult<(T, ReadReport)> {
    cx.require(FieldKind::Entity)?;
    let mut value = factory();
    let report = value.read(node, cx.resolver)?;
    Ok((value, report))
}

/// Write each entity as a child named after `T`'s element name.
pub fn encode_entity_list<T: Entity>(
    values: &[T],
    node: &mut Node,
    cx: &FieldContext<'_>,
) -> CodecResult<()> {
    cx.require(FieldKind::EntityList)?;
    for value in values {
        let mut child = Node::new(T::element_name());
        value.write(&mut child, cx.resolver)?;
        node.push_child(child);
    }
    Ok(())
}

/// Read every child named after `T`'s element name as a fresh entity.
pub fn decode_entity_list<T: Entity>(
    node: &Node,
    cx: &FieldContext<'_>,
    factory: fn() -> T,
) -> CodecResult<(Vec<T>, ReadReport)> {
    cx.require(FieldKind::EntityList)?;
    let mut report = ReadReport::new();
    let mut values = Vec::new();
    for (i, child) in node.children_named(T::element_name()).enumerate() {
        let mut value = factory();
        let nested = value.read(child, cx.resolver)?;
        report.absorb(&format!("[{i}]"), nested);
        values.push(value);
    }
    Ok((values, report))
}

/// Declare how a [`Schema`](crate::Schema) type reads and writes itself.
///
/// `impl_entity!(Type, "Element")` writes every described field as a child
/// node. `impl_entity!(Type, "Element", version = field)` also carries the
/// `Version` attribute in the named `Option<f32>` field.
/// `impl_entity!(Type, "Element", identity = field)` additionally
/// implements [`Identified`] over the named [`Identity`] field and writes it
/// as attributes, version included.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $element:expr) => {
        impl $crate::Entity for $ty {
            fn element_name() -> &'static str {
                $element
            }

            fn write(
                &self,
                node: &mut $crate::Node,
                resolver: &dyn $crate::Resolver,
            ) -> $crate::CodecResult<()> {
                $crate::write_fields(self, node, resolver)
            }

            fn read_with(
                &mut self,
                node: &$crate::Node,
                resolver: &dyn $crate::Resolver,
                options: $crate::ReadOptions,
            ) -> $crate::CodecResult<$crate::ReadReport> {
                Ok($crate::read_fields(self, node, resolver, options))
            }
        }
    };
    ($ty:ty, $element:expr, version = $field:ident) => {
        impl $crate::Entity for $ty {
            fn element_name() -> &'static str {
                $element
            }

            fn write(
                &self,
                node: &mut $crate::Node,
                resolver: &dyn $crate::Resolver,
            ) -> $crate::CodecResult<()> {
                $crate::write_versioned(self, self.$field, node, resolver)
            }

            fn read_with(
                &mut self,
                node: &$crate::Node,
                resolver: &dyn $crate::Resolver,
                options: $crate::ReadOptions,
            ) -> $crate::CodecResult<$crate::ReadReport> {
                Ok($crate::read_versioned(
                    self,
                    |entity: &mut $ty| &mut entity.$field,
                    node,
                    resolver,
                    options,
                ))
            }
        }
    };
    ($ty:ty, $element:expr, identity = $field:ident) => {
        impl $crate::Entity for $ty {
            fn element_name() -> &'static str {
                $element
            }

            fn write(
                &self,
                node: &mut $crate::Node,
                resolver: &dyn $crate::Resolver,
            ) -> $crate::CodecResult<()> {
                $crate::write_identified(self, node, resolver)
            }

            fn read_with(
                &mut self,
                node: &$crate::Node,
                resolver: &dyn $crate::Resolver,
                options: $crate::ReadOptions,
            ) -> $crate::CodecResult<$crate::ReadReport> {
                Ok($crate::read_identified(self, node, resolver, options))
            }
        }

        impl $crate::Identified for $ty {
            fn identity(&self) -> &$crate::Identity {
                &self.$field
            }

            fn identity_mut(&mut self) -> &mut $crate::Identity {
                &mut self.$field
            }
        }
    };
}
