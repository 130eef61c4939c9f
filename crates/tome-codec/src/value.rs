//! Text-shaped field values.
//!
//! A [`FieldCodec`] value is written as the direct text (or, for maps, the
//! `entry` children) of a node named after its field. Primitives, dates,
//! enums, aggregates, primitive arrays, string-keyed maps and bit-sets all
//! take this path; entities and references go through [`crate::entity`] and
//! [`crate::reference`] because they need a resolver.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tome_tree::Node;

use crate::error::{CodecError, CodecResult};
use crate::mode::FieldKind;

/// Separator between array elements.
pub const ARRAY_SEPARATOR: &str = ",";

/// Child element name used for each map entry.
pub const MAP_ENTRY: &str = "entry";

/// Separator between a map entry's key and value.
pub const MAP_SEPARATOR: &str = ": ";

/// A value that encodes itself into the node of the field holding it.
pub trait FieldCodec: Sized {
    /// The codec rule this type follows.
    const KIND: FieldKind;

    /// Write `self` into `node`.
    fn encode(&self, node: &mut Node) -> CodecResult<()>;

    /// Read a value back out of `node`.
    fn decode(node: &Node) -> CodecResult<Self>;

    /// Whether anything should be written at all. Only `Option::None`
    /// answers `false`.
    fn is_present(&self) -> bool {
        true
    }
}

/// A primitive that can appear as one element of a comma-joined array.
pub trait ArrayElement: Sized {
    /// Human-readable type name used in format errors.
    const EXPECTED: &'static str;

    fn to_text(&self) -> String;

    fn from_text(text: &str) -> CodecResult<Self>;
}

/// A value type allowed in a string-keyed map.
pub trait MapValue: ArrayElement {}

fn text_of(node: &Node) -> &str {
    node.text().unwrap_or("")
}

macro_rules! numeric_codec {
    ($kind:ident => $($ty:ty),+) => {
        $(
            impl ArrayElement for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn from_text(text: &str) -> CodecResult<Self> {
                    text.trim()
                        .parse::<$ty>()
                        .map_err(|e| CodecError::format(Self::EXPECTED, text, e))
                }
            }

            impl FieldCodec for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn encode(&self, node: &mut Node) -> CodecResult<()> {
                    node.set_text(self.to_text());
                    Ok(())
                }

                fn decode(node: &Node) -> CodecResult<Self> {
                    Self::from_text(text_of(node))
                }
            }
        )+
    };
}

numeric_codec!(Integer => i8, i16, i32, i64, u8, u16, u32, u64);
numeric_codec!(Float => f32, f64);

impl MapValue for i32 {}
impl MapValue for i64 {}

impl ArrayElement for bool {
    const EXPECTED: &'static str = "bool";

    fn to_text(&self) -> String {
        self.to_string()
    }

    // Older documents spell booleans `True`/`False`.
    fn from_text(text: &str) -> CodecResult<Self> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(CodecError::format(Self::EXPECTED, text, "expected true or false"))
        }
    }
}

impl FieldCodec for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.to_text());
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        Self::from_text(text_of(node))
    }
}

impl ArrayElement for String {
    const EXPECTED: &'static str = "string";

    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> CodecResult<Self> {
        Ok(text.to_string())
    }
}

impl MapValue for String {}

impl FieldCodec for String {
    const KIND: FieldKind = FieldKind::Text;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.as_str());
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        Ok(text_of(node).to_string())
    }
}

// ---------------------------------------------------------------
// Dates
// ---------------------------------------------------------------

impl FieldCodec for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::DateTime;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        let text = text_of(node);
        DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CodecError::format("date-time", text, e))
    }
}

impl FieldCodec for NaiveDate {
    const KIND: FieldKind = FieldKind::DateTime;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.format("%Y-%m-%d").to_string());
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        let text = text_of(node);
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| CodecError::format("date", text, e))
    }
}

// ---------------------------------------------------------------
// Optional values
// ---------------------------------------------------------------

impl<V: FieldCodec> FieldCodec for Option<V> {
    const KIND: FieldKind = V::KIND;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        match self {
            Some(value) => value.encode(node),
            None => Ok(()),
        }
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        V::decode(node).map(Some)
    }

    fn is_present(&self) -> bool {
        self.is_some()
    }
}

// ---------------------------------------------------------------
// Primitive arrays
// ---------------------------------------------------------------

impl<T: ArrayElement> FieldCodec for Vec<T> {
    const KIND: FieldKind = FieldKind::PrimitiveArray;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        let joined = self
            .iter()
            .map(ArrayElement::to_text)
            .collect::<Vec<_>>()
            .join(ARRAY_SEPARATOR);
        node.set_text(joined);
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        let text = text_of(node);
        let text = text.strip_suffix(ARRAY_SEPARATOR).unwrap_or(text);
        if text.is_empty() {
            return Ok(Vec::new());
        }
        text.split(ARRAY_SEPARATOR).map(T::from_text).collect()
    }
}

// ---------------------------------------------------------------
// String-keyed maps
// ---------------------------------------------------------------

impl<V: MapValue> FieldCodec for BTreeMap<String, V> {
    const KIND: FieldKind = FieldKind::Map;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        for (key, value) in self {
            node.push_child(Node::with_text(
                MAP_ENTRY,
                format!("{key}{MAP_SEPARATOR}{}", value.to_text()),
            ));
        }
        Ok(())
    }

    /// Entries are split at the first `": "`, so keys that themselves
    /// contain the separator do not survive a save/load cycle.
    fn decode(node: &Node) -> CodecResult<Self> {
        let mut map = BTreeMap::new();
        for entry in node.children_named(MAP_ENTRY) {
            let text = text_of(entry);
            let (key, value) = text
                .split_once(MAP_SEPARATOR)
                .ok_or_else(|| CodecError::format("map entry", text, "missing \": \" separator"))?;
            map.insert(key.to_string(), V::from_text(value)?);
        }
        Ok(map)
    }
}
