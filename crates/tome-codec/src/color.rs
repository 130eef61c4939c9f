use std::fmt;

use serde::{Deserialize, Serialize};
use tome_tree::Node;

use crate::error::{CodecError, CodecResult};
use crate::mode::FieldKind;
use crate::value::{ArrayElement, FieldCodec, ARRAY_SEPARATOR};

/// An RGBA color with floating point components in `0.0..=1.0`.
///
/// Written as `r,g,b,a`; three components are accepted on read with alpha
/// defaulting to opaque.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components in `r, g, b, a` order.
    pub fn components(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse the `r,g,b[,a]` text form.
    pub fn parse(text: &str) -> CodecResult<Self> {
        let parts = text
            .split(ARRAY_SEPARATOR)
            .map(f32::from_text)
            .collect::<CodecResult<Vec<f32>>>()
            .map_err(|_| CodecError::format("color", text, "components must be numbers"))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
            _ => Err(CodecError::format(
                "color",
                text,
                format!("expected 3 or 4 components, found {}", parts.len()),
            )),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

impl FieldCodec for Color {
    const KIND: FieldKind = FieldKind::Aggregate;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.to_string());
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        Self::parse(node.text().unwrap_or(""))
    }
}
