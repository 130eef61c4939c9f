use std::fmt;

use tome_tree::Node;

use crate::error::{CodecError, CodecResult};
use crate::mode::FieldKind;
use crate::value::FieldCodec;

/// A growable set of flags addressed by index.
///
/// Written as one `'0'`/`'1'` character per bit, in index order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitSet {
    bits: Vec<bool>,
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set of `len` cleared bits.
    pub fn with_len(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit at `index`; bits past the end read as cleared.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Set the bit at `index`, growing the set if needed.
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        self.bits[index] = value;
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Parse the `0`/`1` text form.
    pub fn parse(text: &str) -> CodecResult<Self> {
        text.chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(CodecError::format(
                    "bit-set",
                    text,
                    format!("unexpected character {other:?}"),
                )),
            })
            .collect::<CodecResult<Vec<bool>>>()
            .map(|bits| Self { bits })
    }
}

impl FromIterator<bool> for BitSet {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FieldCodec for BitSet {
    const KIND: FieldKind = FieldKind::BitSet;

    fn encode(&self, node: &mut Node) -> CodecResult<()> {
        node.set_text(self.to_string());
        Ok(())
    }

    fn decode(node: &Node) -> CodecResult<Self> {
        Self::parse(node.text().unwrap_or(""))
    }
}
