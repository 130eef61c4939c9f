//! Field descriptors and automatic field-driven serialization.
//!
//! A [`Schema`] type lists its fields once, as a table of
//! [`FieldDescriptor`]s. Each descriptor knows the field's declared kind,
//! its serialized name, its reference mode, and how to get at the value, so
//! [`write_fields`] and [`read_fields`] can walk any entity without
//! per-field code.

use tracing::warn;

use tome_tree::Node;

use crate::context::FieldContext;
use crate::entity::{
    decode_entity, decode_entity_list, encode_entity, encode_entity_list, Entity, Identified,
    ReadOptions,
};
use crate::error::CodecResult;
use crate::identity::{read_version, write_version, ATTR_VERSION};
use crate::mode::{FieldKind, ReferenceMode};
use crate::reference::{
    decode_reference, decode_reference_list, encode_reference, encode_reference_list, Ref,
    Resolver,
};
use crate::report::{FieldFailure, ReadReport};
use crate::value::FieldCodec;

/// Field names owned by [`Identity`](crate::Identity). Descriptors with
/// these names are never serialized as child nodes.
pub const IDENTITY_FIELDS: &[&str] = &["id", "name", "version"];

type Encoder<E> = Box<dyn Fn(&E, &mut Node, &FieldContext<'_>) -> CodecResult<()>>;
type Decoder<E> =
    Box<dyn Fn(&mut E, Option<&Node>, &FieldContext<'_>, ReadOptions) -> CodecResult<ReadReport>>;

/// Serialization metadata and accessors for one field of `E`.
pub struct FieldDescriptor<E> {
    name: &'static str,
    serialized_name: Option<&'static str>,
    skip: bool,
    mode: ReferenceMode,
    kind: FieldKind,
    encode: Encoder<E>,
    decode: Decoder<E>,
}

impl<E: 'static> FieldDescriptor<E> {
    /// A text-shaped field: primitive, date, enum, aggregate, primitive
    /// array, map, or bit-set.
    pub fn value<V>(name: &'static str, get: fn(&E) -> &V, get_mut: fn(&mut E) -> &mut V) -> Self
    where
        V: FieldCodec + Default + 'static,
    {
        Self::build(
            name,
            ReferenceMode::Embedded,
            V::KIND,
            Box::new(move |entity: &E, parent: &mut Node, cx: &FieldContext<'_>| {
                let value = get(entity);
                if !value.is_present() {
                    return Ok(());
                }
                let mut child = Node::new(cx.field);
                value.encode(&mut child)?;
                parent.push_child(child);
                Ok(())
            }),
            Box::new(move |entity: &mut E, child: Option<&Node>, _cx: &FieldContext<'_>, options: ReadOptions| {
                match child {
                    Some(node) => *get_mut(entity) = V::decode(node)?,
                    None if options.force_nulls => *get_mut(entity) = V::default(),
                    None => {}
                }
                Ok(ReadReport::new())
            }),
        )
    }

    /// An entity nested in full.
    pub fn entity<T>(
        name: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self
    where
        T: Entity + Default + 'static,
    {
        Self::build(
            name,
            ReferenceMode::Embedded,
            FieldKind::Entity,
            Box::new(move |entity: &E, parent: &mut Node, cx: &FieldContext<'_>| {
                if let Some(value) = get(entity) {
                    let mut child = Node::new(cx.field);
                    encode_entity(value, &mut child, cx)?;
                    parent.push_child(child);
                }
                Ok(())
            }),
            Box::new(move |entity: &mut E, child: Option<&Node>, cx: &FieldContext<'_>, options: ReadOptions| match child {
                Some(node) => {
                    let (value, report) = decode_entity(node, cx, T::default)?;
                    *get_mut(entity) = Some(value);
                    Ok(report)
                }
                None => {
                    if options.force_nulls {
                        *get_mut(entity) = None;
                    }
                    Ok(ReadReport::new())
                }
            }),
        )
    }

    /// A list of entities nested in full, one child per element.
    pub fn entity_list<T>(
        name: &'static str,
        get: fn(&E) -> &Vec<T>,
        get_mut: fn(&mut E) -> &mut Vec<T>,
    ) -> Self
    where
        T: Entity + Default + 'static,
    {
        Self::build(
            name,
            ReferenceMode::Embedded,
            FieldKind::EntityList,
            Box::new(move |entity: &E, parent: &mut Node, cx: &FieldContext<'_>| {
                let mut child = Node::new(cx.field);
                encode_entity_list(get(entity), &mut child, cx)?;
                parent.push_child(child);
                Ok(())
            }),
            Box::new(move |entity: &mut E, child: Option<&Node>, cx: &FieldContext<'_>, options: ReadOptions| match child {
                Some(node) => {
                    let (values, report) = decode_entity_list(node, cx, T::default)?;
                    *get_mut(entity) = values;
                    Ok(report)
                }
                None => {
                    if options.force_nulls {
                        get_mut(entity).clear();
                    }
                    Ok(ReadReport::new())
                }
            }),
        )
    }

    /// A reference to an identified entity, written by id or by name.
    ///
    /// A reference that fails to resolve leaves the field empty.
    pub fn reference<T>(
        name: &'static str,
        mode: ReferenceMode,
        get: fn(&E) -> &Option<Ref<T>>,
        get_mut: fn(&mut E) -> &mut Option<Ref<T>>,
    ) -> Self
    where
        T: Identified + 'static,
    {
        Self::build(
            name,
            mode,
            FieldKind::Reference,
            Box::new(move |entity: &E, parent: &mut Node, cx: &FieldContext<'_>| {
                if let Some(value) = get(entity) {
                    let mut child = Node::new(cx.field);
                    encode_reference(value, &mut child, cx)?;
                    parent.push_child(child);
                }
                Ok(())
            }),
            Box::new(move |entity: &mut E, child: Option<&Node>, cx: &FieldContext<'_>, options: ReadOptions| {
                match child {
                    Some(node) => match decode_reference(node, cx) {
                        Ok(value) => *get_mut(entity) = Some(value),
                        Err(err) => {
                            if err.is_unresolved_reference() {
                                *get_mut(entity) = None;
                            }
                            return Err(err);
                        }
                    },
                    None if options.force_nulls => *get_mut(entity) = None,
                    None => {}
                }
                Ok(ReadReport::new())
            }),
        )
    }

    /// A list of references, one child per element named after `T`.
    ///
    /// Any element failing to resolve leaves the list empty.
    pub fn reference_list<T>(
        name: &'static str,
        mode: ReferenceMode,
        get: fn(&E) -> &Vec<Ref<T>>,
        get_mut: fn(&mut E) -> &mut Vec<Ref<T>>,
    ) -> Self
    where
        T: Identified + 'static,
    {
        Self::build(
            name,
            mode,
            FieldKind::ReferenceList,
            Box::new(move |entity: &E, parent: &mut Node, cx: &FieldContext<'_>| {
                let mut child = Node::new(cx.field);
                encode_reference_list(get(entity), &mut child, cx)?;
                parent.push_child(child);
                Ok(())
            }),
            Box::new(move |entity: &mut E, child: Option<&Node>, cx: &FieldContext<'_>, options: ReadOptions| {
                match child {
                    Some(node) => match decode_reference_list(node, cx) {
                        Ok(values) => *get_mut(entity) = values,
                        Err(err) => {
                            if err.is_unresolved_reference() {
                                get_mut(entity).clear();
                            }
                            return Err(err);
                        }
                    },
                    None if options.force_nulls => get_mut(entity).clear(),
                    None => {}
                }
                Ok(ReadReport::new())
            }),
        )
    }

    fn build(
        name: &'static str,
        mode: ReferenceMode,
        kind: FieldKind,
        encode: Encoder<E>,
        decode: Decoder<E>,
    ) -> Self {
        Self {
            name,
            serialized_name: None,
            skip: false,
            mode,
            kind,
            encode,
            decode,
        }
    }
}

impl<E> FieldDescriptor<E> {
    /// Serialize the field under `serialized` instead of its own name.
    pub fn renamed(mut self, serialized: &'static str) -> Self {
        self.serialized_name = Some(serialized);
        self
    }

    /// Exclude the field from both reading and writing.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Override the reference mode. A mode the field's kind does not accept
    /// surfaces as a schema error on first use.
    pub fn with_mode(mut self, mode: ReferenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The node name the field is written under.
    pub fn serialized_name(&self) -> &'static str {
        self.serialized_name.unwrap_or(self.name)
    }

    pub fn mode(&self) -> ReferenceMode {
        self.mode
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Explicitly skipped, or one of the identity fields.
    pub fn is_skipped(&self) -> bool {
        self.skip
            || IDENTITY_FIELDS
                .iter()
                .any(|id_field| id_field.eq_ignore_ascii_case(self.name))
    }
}

impl<E> std::fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("serialized_name", &self.serialized_name)
            .field("skip", &self.skip)
            .field("mode", &self.mode)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A type whose serialization is driven by its field table.
pub trait Schema: Sized + 'static {
    /// The field table, in declaration order.
    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// Write every non-skipped field of `entity` as a child of `node`.
///
/// The first failing field aborts the write.
pub fn write_fields<E: Schema>(
    entity: &E,
    node: &mut Node,
    resolver: &dyn Resolver,
) -> CodecResult<()> {
    for field in E::fields() {
        if field.is_skipped() {
            continue;
        }
        let cx = FieldContext::new(field.serialized_name(), field.mode, resolver);
        cx.require(field.kind)?;
        (field.encode)(entity, node, &cx)?;
    }
    Ok(())
}

/// Read every non-skipped field of `entity` from the children of `node`.
///
/// Fields absent from `node` keep their current value unless
/// `options.force_nulls` is set. A field that fails is logged, recorded in
/// the returned report, and left as it was; the remaining fields still load.
pub fn read_fields<E: Schema>(
    entity: &mut E,
    node: &Node,
    resolver: &dyn Resolver,
    options: ReadOptions,
) -> ReadReport {
    let mut report = ReadReport::new();
    for field in E::fields() {
        if field.is_skipped() {
            continue;
        }
        let name = field.serialized_name();
        let cx = FieldContext::new(name, field.mode, resolver);
        let outcome = cx
            .require(field.kind)
            .and_then(|()| (field.decode)(entity, node.child(name), &cx, options));
        match outcome {
            Ok(nested) => report.absorb(name, nested),
            Err(error) => {
                warn!(
                    entity = std::any::type_name::<E>(),
                    field = name,
                    %error,
                    "field failed to load; keeping previous value"
                );
                report.push(FieldFailure::new(name, error));
            }
        }
    }
    report
}

/// Write the `Version` attribute, then every described field.
pub fn write_versioned<E: Schema>(
    entity: &E,
    version: Option<f32>,
    node: &mut Node,
    resolver: &dyn Resolver,
) -> CodecResult<()> {
    write_version(version, node);
    write_fields(entity, node, resolver)
}

/// Read the `Version` attribute into the slot `version` selects, then
/// every described field. A missing attribute leaves the slot alone.
pub fn read_versioned<E: Schema>(
    entity: &mut E,
    version: fn(&mut E) -> &mut Option<f32>,
    node: &Node,
    resolver: &dyn Resolver,
    options: ReadOptions,
) -> ReadReport {
    let mut report = ReadReport::new();
    match read_version(node) {
        Ok(Some(read)) => *version(entity) = Some(read),
        Ok(None) => {}
        Err(error) => {
            warn!(
                entity = std::any::type_name::<E>(),
                %error,
                "version attribute failed to load"
            );
            report.push(FieldFailure::new(ATTR_VERSION, error));
        }
    }
    report.merge(read_fields(entity, node, resolver, options));
    report
}

/// Write identity attributes, then every described field.
pub fn write_identified<E: Schema + Identified>(
    entity: &E,
    node: &mut Node,
    resolver: &dyn Resolver,
) -> CodecResult<()> {
    entity.identity().write_attributes(node);
    write_fields(entity, node, resolver)
}

/// Read identity attributes, then every described field.
pub fn read_identified<E: Schema + Identified>(
    entity: &mut E,
    node: &Node,
    resolver: &dyn Resolver,
    options: ReadOptions,
) -> ReadReport {
    let mut report = ReadReport::new();
    if let Err(error) = entity.identity_mut().read_attributes(node) {
        warn!(
            entity = std::any::type_name::<E>(),
            %error,
            "identity attributes failed to load"
        );
        report.push(FieldFailure::new("@identity", error));
    }
    report.merge(read_fields(entity, node, resolver, options));
    report
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::bitset::BitSet;
    use crate::color::Color;
    use crate::error::CodecError;
    use crate::identity::Identity;
    use crate::reference::{KeyIndex, NoResolver};

    crate::named_enum! {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub enum Slot {
            #[default]
            Hand,
            Head,
            Feet,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Gem {
        carats: f32,
        tint: Color,
    }

    impl Schema for Gem {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::value("carats", |g: &Gem| &g.carats, |g| &mut g.carats)
                    .renamed("Carats"),
                FieldDescriptor::value("tint", |g: &Gem| &g.tint, |g| &mut g.tint).renamed("Tint"),
            ]
        }
    }

    crate::impl_entity!(Gem, "Gem");

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        identity: Identity,
        damage: i32,
        weight: f64,
        slot: Slot,
        forged: Option<DateTime<Utc>>,
        tags: Vec<String>,
        stats: BTreeMap<String, i32>,
        flags: BitSet,
        socket: Option<Gem>,
        gems: Vec<Gem>,
        scratch: u32,
    }

    impl Schema for Item {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::value("damage", |i: &Item| &i.damage, |i| &mut i.damage)
                    .renamed("Damage"),
                FieldDescriptor::value("weight", |i: &Item| &i.weight, |i| &mut i.weight)
                    .renamed("Weight"),
                FieldDescriptor::value("slot", |i: &Item| &i.slot, |i| &mut i.slot)
                    .renamed("Slot"),
                FieldDescriptor::value("forged", |i: &Item| &i.forged, |i| &mut i.forged)
                    .renamed("Forged"),
                FieldDescriptor::value("tags", |i: &Item| &i.tags, |i| &mut i.tags)
                    .renamed("Tags"),
                FieldDescriptor::value("stats", |i: &Item| &i.stats, |i| &mut i.stats)
                    .renamed("Stats"),
                FieldDescriptor::value("flags", |i: &Item| &i.flags, |i| &mut i.flags)
                    .renamed("Flags"),
                FieldDescriptor::entity("socket", |i: &Item| &i.socket, |i| &mut i.socket)
                    .renamed("Socket"),
                FieldDescriptor::entity_list("gems", |i: &Item| &i.gems, |i| &mut i.gems)
                    .renamed("Gems"),
                FieldDescriptor::value("scratch", |i: &Item| &i.scratch, |i| &mut i.scratch)
                    .skipped(),
            ]
        }
    }

    crate::impl_entity!(Item, "Item", identity = identity);

    #[derive(Debug, Default)]
    struct Hero {
        identity: Identity,
        weapon: Option<Ref<Item>>,
        pack: Vec<Ref<Item>>,
    }

    impl Schema for Hero {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::reference(
                    "weapon",
                    ReferenceMode::ById,
                    |h: &Hero| &h.weapon,
                    |h| &mut h.weapon,
                )
                .renamed("Weapon"),
                FieldDescriptor::reference_list(
                    "pack",
                    ReferenceMode::ByName,
                    |h: &Hero| &h.pack,
                    |h| &mut h.pack,
                )
                .renamed("Pack"),
            ]
        }
    }

    crate::impl_entity!(Hero, "Hero", identity = identity);

    /// A misconfigured schema: an integer field declared ById.
    #[derive(Debug, Default)]
    struct Broken {
        count: i32,
        label: String,
    }

    impl Schema for Broken {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![
                FieldDescriptor::value("count", |b: &Broken| &b.count, |b| &mut b.count)
                    .with_mode(ReferenceMode::ById),
                FieldDescriptor::value("label", |b: &Broken| &b.label, |b| &mut b.label),
            ]
        }
    }

    crate::impl_entity!(Broken, "Broken");

    /// A plain entity that carries a document version.
    #[derive(Debug, Default, PartialEq)]
    struct Rune {
        version: Option<f32>,
        power: i32,
    }

    impl Schema for Rune {
        fn fields() -> Vec<FieldDescriptor<Self>> {
            vec![FieldDescriptor::value("power", |r: &Rune| &r.power, |r| &mut r.power)
                .renamed("Power")]
        }
    }

    crate::impl_entity!(Rune, "Rune", version = version);

    struct OneItem;

    impl KeyIndex for OneItem {
        fn contains_id(&self, id: i32) -> bool {
            id == 3
        }

        fn name_of(&self, id: i32) -> Option<&str> {
            (id == 3).then_some("Sword")
        }

        fn id_of(&self, name: &str) -> Option<i32> {
            name.eq_ignore_ascii_case("sword").then_some(3)
        }
    }

    impl Resolver for OneItem {
        fn index(&self, target: std::any::TypeId) -> Option<&dyn KeyIndex> {
            (target == std::any::TypeId::of::<Item>()).then_some(self as &dyn KeyIndex)
        }
    }

    fn sample_item() -> Item {
        let mut stats = BTreeMap::new();
        stats.insert("strength".to_string(), 3);
        let mut identity = Identity::new(3, "Sword");
        identity.set_property("Maker", "Dwarves");
        Item {
            identity,
            damage: 12,
            weight: 4.5,
            slot: Slot::Hand,
            forged: Some(Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()),
            tags: vec!["sharp".into(), "steel".into()],
            stats,
            flags: [true, false, true].into_iter().collect(),
            socket: Some(Gem {
                carats: 1.25,
                tint: Color::rgb(1.0, 0.0, 0.0),
            }),
            gems: vec![
                Gem {
                    carats: 0.5,
                    tint: Color::WHITE,
                },
                Gem::default(),
            ],
            scratch: 99,
        }
    }

    fn written<E: Entity>(entity: &E) -> Node {
        let mut node = Node::new(E::element_name());
        entity.write(&mut node, &NoResolver).unwrap();
        node
    }

    // -----------------------------------------------------------------------
    // Descriptor metadata
    // -----------------------------------------------------------------------

    #[test]
    fn serialized_name_falls_back_to_field_name() {
        let fields = Broken::fields();
        assert_eq!(fields[1].serialized_name(), "label");
        assert_eq!(Item::fields()[0].serialized_name(), "Damage");
        assert_eq!(Item::fields()[0].name(), "damage");
        assert_eq!(Item::fields()[0].kind(), FieldKind::Integer);
    }

    #[test]
    fn identity_fields_are_always_skipped() {
        let field = FieldDescriptor::value("Name", |b: &Broken| &b.label, |b| &mut b.label);
        assert!(field.is_skipped());
        assert!(Item::fields()[9].is_skipped());
        assert!(!Item::fields()[0].is_skipped());
    }

    #[test]
    fn descriptor_kinds_follow_value_types() {
        let kinds: Vec<FieldKind> = Item::fields().iter().map(FieldDescriptor::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Integer,
                FieldKind::Float,
                FieldKind::Enum,
                FieldKind::DateTime,
                FieldKind::PrimitiveArray,
                FieldKind::Map,
                FieldKind::BitSet,
                FieldKind::Entity,
                FieldKind::EntityList,
                FieldKind::Integer,
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Write / read
    // -----------------------------------------------------------------------

    #[test]
    fn write_shapes_document() {
        let node = written(&sample_item());
        assert_eq!(node.name(), "Item");
        assert_eq!(node.attribute("ID"), Some("3"));
        assert_eq!(node.attribute("Name"), Some("Sword"));
        assert_eq!(node.attribute("Maker"), Some("Dwarves"));
        assert_eq!(node.child("Damage").and_then(Node::text), Some("12"));
        assert_eq!(node.child("Slot").and_then(Node::text), Some("Hand"));
        assert_eq!(node.child("Tags").and_then(Node::text), Some("sharp,steel"));
        assert_eq!(node.child("Flags").and_then(Node::text), Some("101"));
        assert_eq!(node.child("Gems").unwrap().children_named("Gem").count(), 2);
        assert!(node.child("scratch").is_none());
    }

    #[test]
    fn write_then_read_restores_every_field() {
        let original = sample_item();
        let node = written(&original);

        let mut loaded = Item::default();
        let report = loaded.read(&node, &NoResolver).unwrap();
        assert!(report.is_clean(), "{:?}", report.failures());

        let expected = Item {
            scratch: 0,
            ..original
        };
        assert_eq!(loaded, expected);
    }

    #[test]
    fn missing_fields_keep_current_values() {
        let mut node = Node::new("Item");
        node.push_child(Node::with_text("Damage", "20"));

        let mut item = sample_item();
        item.read(&node, &NoResolver).unwrap();
        assert_eq!(item.damage, 20);
        assert_eq!(item.weight, 4.5);
        assert_eq!(item.tags, vec!["sharp".to_string(), "steel".to_string()]);
        assert!(item.socket.is_some());
    }

    #[test]
    fn force_nulls_resets_missing_fields() {
        let mut node = Node::new("Item");
        node.push_child(Node::with_text("Damage", "20"));

        let mut item = sample_item();
        item.read_with(&node, &NoResolver, ReadOptions::force_nulls())
            .unwrap();
        assert_eq!(item.damage, 20);
        assert_eq!(item.weight, 0.0);
        assert!(item.tags.is_empty());
        assert!(item.forged.is_none());
        assert!(item.socket.is_none());
        assert!(item.gems.is_empty());
        assert_eq!(item.scratch, 99, "skipped fields are never touched");
    }

    #[test]
    fn bad_field_does_not_abort_the_rest() {
        let mut node = Node::new("Item");
        node.push_child(Node::with_text("Damage", "lots"));
        node.push_child(Node::with_text("Weight", "2.5"));
        node.push_child(Node::with_text("Slot", "Tail"));

        let mut item = Item {
            damage: 7,
            ..Default::default()
        };
        let report = item.read(&node, &NoResolver).unwrap();
        assert_eq!(item.damage, 7);
        assert_eq!(item.weight, 2.5);
        assert_eq!(item.slot, Slot::Hand);

        let failed: Vec<&str> = report.failures().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(failed, vec!["Damage", "Slot"]);
    }

    #[test]
    fn nested_failures_carry_paths() {
        let mut node = Node::new("Item");
        let gems = node.push_child(Node::new("Gems"));
        gems.push_child(Node::new("Gem"));
        let second = gems.push_child(Node::new("Gem"));
        second.push_child(Node::with_text("Carats", "heavy"));

        let mut item = Item::default();
        let report = item.read(&node, &NoResolver).unwrap();
        assert_eq!(item.gems.len(), 2);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].field, "Gems[1].Carats");
    }

    #[test]
    fn bad_identity_is_reported() {
        let mut node = Node::new("Item");
        node.set_attribute("ID", "x");
        node.push_child(Node::with_text("Damage", "4"));
        let mut item = Item::default();
        let report = item.read(&node, &NoResolver).unwrap();
        assert_eq!(item.damage, 4);
        assert_eq!(report.failures()[0].field, "@identity");
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn references_write_keys_and_resolve_on_read() {
        let hero = Hero {
            identity: Identity::new(0, "Ayla"),
            weapon: Some(Ref::by_id(3)),
            pack: vec![Ref::by_id(3)],
        };
        let mut node = Node::new("Hero");
        hero.write(&mut node, &OneItem).unwrap();
        assert_eq!(node.child("Weapon").and_then(Node::text), Some("3"));
        let pack = node.child("Pack").unwrap();
        assert_eq!(pack.child("Item").and_then(Node::text), Some("Sword"));

        let mut loaded = Hero::default();
        let report = loaded.read(&node, &OneItem).unwrap();
        assert!(report.is_clean());
        assert_eq!(loaded.weapon.as_ref().and_then(Ref::name), Some("Sword"));
        assert_eq!(loaded.pack.len(), 1);
        assert_eq!(loaded.pack[0].id(), Some(3));
    }

    #[test]
    fn unresolved_reference_leaves_field_empty() {
        let mut node = Node::new("Hero");
        node.push_child(Node::with_text("Weapon", "3"));
        node.push_child(Node::with_text("Name", "ignored-as-field"));

        let mut hero = Hero {
            weapon: Some(Ref::by_id(1)),
            ..Default::default()
        };
        let report = hero.read(&node, &NoResolver).unwrap();
        assert!(hero.weapon.is_none());
        assert!(report.failures()[0].error.is_unresolved_reference());
    }

    #[test]
    fn mode_mismatch_is_schema_error_on_both_paths() {
        let broken = Broken {
            count: 1,
            label: "x".into(),
        };
        let mut node = Node::new("Broken");
        let err = broken.write(&mut node, &NoResolver).unwrap_err();
        assert!(matches!(err, CodecError::Schema { ref field, .. } if field == "count"));

        let mut doc = Node::new("Broken");
        doc.push_child(Node::with_text("count", "5"));
        doc.push_child(Node::with_text("label", "y"));
        let mut loaded = Broken::default();
        let report = loaded.read(&doc, &NoResolver).unwrap();
        assert_eq!(loaded.count, 0);
        assert_eq!(loaded.label, "y");
        assert!(matches!(report.failures()[0].error, CodecError::Schema { .. }));
    }

    // -----------------------------------------------------------------------
    // Versioned plain entities
    // -----------------------------------------------------------------------

    #[test]
    fn plain_entity_round_trips_version() {
        let rune = Rune {
            version: Some(1.5),
            power: 9,
        };
        let mut node = Node::new("Rune");
        rune.write(&mut node, &NoResolver).unwrap();
        assert_eq!(node.attribute("Version"), Some("1.5"));
        assert!(node.child("version").is_none());

        let mut loaded = Rune::default();
        assert!(loaded.read(&node, &NoResolver).unwrap().is_clean());
        assert_eq!(loaded, rune);
    }

    #[test]
    fn plain_entity_without_version_writes_none_and_keeps_current() {
        let mut node = Node::new("Rune");
        Rune::default().write(&mut node, &NoResolver).unwrap();
        assert!(node.attribute("Version").is_none());

        let mut rune = Rune {
            version: Some(2.0),
            power: 1,
        };
        rune.read(&node, &NoResolver).unwrap();
        assert_eq!(rune.version, Some(2.0));
    }

    #[test]
    fn bad_version_is_reported_and_fields_still_load() {
        let mut node = Node::new("Rune");
        node.set_attribute("Version", "beta");
        node.push_child(Node::with_text("Power", "4"));
        let mut rune = Rune::default();
        let report = rune.read(&node, &NoResolver).unwrap();
        assert_eq!(rune.power, 4);
        assert!(rune.version.is_none());
        assert_eq!(report.failures()[0].field, "Version");
    }
}
