use std::fmt;

/// Positioned TLV node inside a DER buffer.
///
/// All offsets are byte offsets into the buffer the node was read from.
/// Invariant: `start + length == value_start + value_length`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DerNode {
    pub start: usize,
    pub length: usize,
    pub value_start: usize,
    pub value_length: usize,
    pub constructed: bool,
    pub tag: u8,
}

impl DerNode {
    /// Offset one past the last byte of the TLV.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    #[must_use]
    pub fn header_length(&self) -> usize {
        self.value_start - self.start
    }

    #[must_use]
    pub fn value_end(&self) -> usize {
        self.value_start + self.value_length
    }
}

impl fmt::Debug for DerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DerNode(tag=0x{:02x}, start={}, len={}, value_len={}{})",
            self.tag,
            self.start,
            self.length,
            self.value_length,
            if self.constructed { ", constructed" } else { "" }
        )
    }
}

/// Structural decode failures of the DER reader.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DerError {
    #[error("buffer truncated at offset {offset} (needed {needed} bytes, {available} available)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("indefinite length marker at offset {offset}")]
    IndefiniteLength { offset: usize },

    #[error("length field at offset {offset} uses {bytes} bytes")]
    LengthTooLarge { offset: usize, bytes: usize },

    #[error("high-tag-number form (tag 0x{tag:02x}) at offset {offset} is not supported")]
    HighTagNumber { offset: usize, tag: u8 },

    #[error("declared length {declared} at offset {offset} exceeds remaining {remaining} bytes")]
    Overrun {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("children of node at offset {offset} end at {actual_end}, expected {expected_end}")]
    ChildWalkMismatch {
        offset: usize,
        expected_end: usize,
        actual_end: usize,
    },

    #[error("child index {index} out of range at offset {offset} ({available} children)")]
    IndexOutOfRange {
        offset: usize,
        index: usize,
        available: usize,
    },

    #[error("invalid hex input: {0}")]
    InvalidHex(String),
}
