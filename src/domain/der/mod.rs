//! Minimal positional DER decoding.
//!
//! Provides:
//! - [`DerReader`]: TLV decoding, child walking and index-path descent
//! - [`is_canonical_der`]: the byte-exact re-encoding gate applied before a
//!   buffer is trusted as a certificate or record
//! - small emission helpers for tag rewriting and tests
//!
//! Not a general ASN.1 library: no indefinite lengths, no high tag numbers.

mod canonical;
mod encode;
mod node;
mod reader;

pub use canonical::{is_canonical_der, is_canonical_der_hex};
pub use encode::{encode_length, encode_tlv, retag};
pub use node::{DerError, DerNode};
pub use reader::{decode_hex, DerReader};
