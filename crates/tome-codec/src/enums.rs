//! Enum fields, written as the member name.

use tome_tree::Node;

use crate::error::{CodecError, CodecResult};

/// An enum whose members are written by name.
///
/// Implemented by [`named_enum!`](crate::named_enum); name lookup is
/// case-sensitive.
pub trait NamedEnum: Copy + PartialEq + 'static {
    /// Every member paired with its serialized name, in declaration order.
    const MEMBERS: &'static [(Self, &'static str)];

    /// The serialized name of this member.
    fn member_name(&self) -> &'static str {
        Self::MEMBERS
            .iter()
            .find(|(member, _)| member == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }

    /// Look a member up by its exact name.
    fn from_member_name(name: &str) -> Option<Self> {
        Self::MEMBERS
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(member, _)| *member)
    }
}

/// Decode an enum member from a node's text.
pub fn decode_named<E: NamedEnum>(node: &Node) -> CodecResult<E> {
    let text = node.text().unwrap_or("");
    E::from_member_name(text.trim()).ok_or_else(|| {
        CodecError::format(
            std::any::type_name::<E>(),
            text,
            "no member with this name",
        )
    })
}

/// Declare an enum whose fields are written by member name.
///
/// ```
/// tome_codec::named_enum! {
///     #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
///     pub enum Rarity {
///         #[default]
///         Common,
///         Rare,
///     }
/// }
///
/// use tome_codec::NamedEnum;
/// assert_eq!(Rarity::Rare.member_name(), "Rare");
/// assert_eq!(Rarity::from_member_name("rare"), None);
/// ```
#[macro_export]
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::NamedEnum for $name {
            const MEMBERS: &'static [(Self, &'static str)] =
                &[$( ($name::$variant, stringify!($variant)) ),+];
        }

        impl $crate::FieldCodec for $name {
            const KIND: $crate::FieldKind = $crate::FieldKind::Enum;

            fn encode(&self, node: &mut $crate::Node) -> $crate::CodecResult<()> {
                node.set_text($crate::NamedEnum::member_name(self));
                Ok(())
            }

            fn decode(node: &$crate::Node) -> $crate::CodecResult<Self> {
                $crate::enums::decode_named(node)
            }
        }
    };
}
