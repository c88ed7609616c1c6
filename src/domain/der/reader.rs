//! Positional DER reader.
//!
//! Walks a byte buffer by structural position rather than through a schema.
//! Every navigation primitive used by the certificate and record models is
//! built on [`DerReader::child_positions`] and [`DerReader::descendant`].

use super::node::{DerError, DerNode};
use crate::domain::constants::{ASN1_BIT_STRING_TAG, ASN1_OCTET_STRING_TAG};

/// Maximum number of length bytes accepted in long-form lengths.
const MAX_LENGTH_BYTES: usize = 4;

/// Read-only view over a DER buffer.
#[derive(Clone, Copy)]
pub struct DerReader<'a> {
    buf: &'a [u8],
}

impl<'a> DerReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    /// Decode the length field starting at `pos`.
    ///
    /// Returns `(value_length, bytes_consumed)`.
    pub fn read_length(&self, pos: usize) -> Result<(usize, usize), DerError> {
        let first = *self.buf.get(pos).ok_or(DerError::Truncated {
            offset: pos,
            needed: 1,
            available: 0,
        })?;
        if first & 0x80 == 0 {
            return Ok((usize::from(first), 1));
        }

        let count = usize::from(first & 0x7f);
        if count == 0 {
            return Err(DerError::IndefiniteLength { offset: pos });
        }
        if count > MAX_LENGTH_BYTES {
            return Err(DerError::LengthTooLarge {
                offset: pos,
                bytes: count,
            });
        }
        let available = self.buf.len().saturating_sub(pos + 1);
        if available < count {
            return Err(DerError::Truncated {
                offset: pos + 1,
                needed: count,
                available,
            });
        }

        let length = self.buf[pos + 1..=pos + count]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        Ok((length, 1 + count))
    }

    /// Decode the TLV header at `pos`.
    pub fn node_at(&self, pos: usize) -> Result<DerNode, DerError> {
        let tag = *self.buf.get(pos).ok_or(DerError::Truncated {
            offset: pos,
            needed: 1,
            available: 0,
        })?;
        if tag & 0x1f == 0x1f {
            return Err(DerError::HighTagNumber { offset: pos, tag });
        }

        let (value_length, length_bytes) = self.read_length(pos + 1)?;
        let value_start = pos + 1 + length_bytes;
        let remaining = self.buf.len() - value_start;
        if value_length > remaining {
            return Err(DerError::Overrun {
                offset: pos,
                declared: value_length,
                remaining,
            });
        }

        Ok(DerNode {
            start: pos,
            length: 1 + length_bytes + value_length,
            value_start,
            value_length,
            constructed: tag & 0x20 != 0,
            tag,
        })
    }

    /// Start offsets of the immediate children of the node at `pos`.
    ///
    /// Constructed nodes must be tiled exactly by their children. A primitive
    /// OCTET STRING or BIT STRING whose value is itself one complete DER
    /// object yields that object as a single virtual child; any other
    /// primitive yields no children.
    pub fn child_positions(&self, pos: usize) -> Result<Vec<usize>, DerError> {
        let node = self.node_at(pos)?;
        if node.constructed {
            return self.walk_children(&node);
        }

        let inner = match node.tag {
            ASN1_OCTET_STRING_TAG => node.value_start,
            // first value byte is the unused-bits count
            ASN1_BIT_STRING_TAG if node.value_length > 0 && self.buf[node.value_start] == 0 => {
                node.value_start + 1
            }
            _ => return Ok(Vec::new()),
        };

        if self.wraps_single_object(inner, node.value_end()) {
            Ok(vec![inner])
        } else {
            Ok(Vec::new())
        }
    }

    fn walk_children(&self, node: &DerNode) -> Result<Vec<usize>, DerError> {
        let end = node.value_end();
        let mut children = Vec::new();
        let mut cursor = node.value_start;
        while cursor < end {
            let child = self.node_at(cursor)?;
            if child.end() > end {
                return Err(DerError::ChildWalkMismatch {
                    offset: node.start,
                    expected_end: end,
                    actual_end: child.end(),
                });
            }
            children.push(cursor);
            cursor = child.end();
        }
        Ok(children)
    }

    fn wraps_single_object(&self, inner: usize, end: usize) -> bool {
        if inner >= end {
            return false;
        }
        match self.node_at(inner) {
            Ok(child) if child.end() == end => {
                !child.constructed || self.walk_children(&child).is_ok()
            }
            _ => false,
        }
    }

    /// Full TLV bytes of the node at `pos`.
    pub fn tlv(&self, pos: usize) -> Result<&'a [u8], DerError> {
        let node = self.node_at(pos)?;
        Ok(&self.buf[node.start..node.end()])
    }

    /// Value bytes of the node at `pos`.
    pub fn value(&self, pos: usize) -> Result<&'a [u8], DerError> {
        let node = self.node_at(pos)?;
        Ok(&self.buf[node.value_start..node.value_end()])
    }

    pub fn hex_of_tlv(&self, pos: usize) -> Result<String, DerError> {
        self.tlv(pos).map(hex::encode)
    }

    pub fn hex_of_v(&self, pos: usize) -> Result<String, DerError> {
        self.value(pos).map(hex::encode)
    }

    /// Follow `indices` from `pos`, selecting the Nth child at every step.
    pub fn descendant(&self, pos: usize, indices: &[usize]) -> Result<usize, DerError> {
        let mut cursor = pos;
        for &index in indices {
            let children = self.child_positions(cursor)?;
            cursor = *children.get(index).ok_or(DerError::IndexOutOfRange {
                offset: cursor,
                index,
                available: children.len(),
            })?;
        }
        Ok(cursor)
    }
}

/// Decode a hex string into bytes for use with [`DerReader`].
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DerError> {
    hex::decode(input.trim()).map_err(|e| DerError::InvalidHex(e.to_string()))
}
