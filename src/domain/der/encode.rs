//! Minimal DER emission helpers.

use crate::domain::constants;

/// Encode a DER length field (short form below 128, minimal long form above).
#[must_use]
pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let be = length.to_be_bytes();
    let skip = be.iter().take_while(|&&b| b == 0).count();
    let significant = &be[skip..];
    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(constants::DER_LONG_FORM_FLAG | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Encode a full TLV with a low-tag-number tag byte.
#[must_use]
pub fn encode_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let length = encode_length(value.len());
    let mut out = Vec::with_capacity(1 + length.len() + value.len());
    out.push(tag);
    out.extend_from_slice(&length);
    out.extend_from_slice(value);
    out
}

/// Copy of `tlv` with its tag byte replaced.
#[must_use]
pub fn retag(tlv: &[u8], tag: u8) -> Vec<u8> {
    let mut out = tlv.to_vec();
    if let Some(first) = out.first_mut() {
        *first = tag;
    }
    out
}
