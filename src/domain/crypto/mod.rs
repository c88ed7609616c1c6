//! Cryptographic primitive boundary.
//!
//! Everything above this module treats RSA verification and SHA-256 as a
//! trusted library: `verify(key, algorithm, message, signature) -> bool` and
//! `sha256(bytes) -> [u8; 32]`.

mod algorithm;
mod hash;
mod primitives;

pub use algorithm::SignatureAlgorithm;
pub use hash::HashAlgorithm;
pub use primitives::{sha256, sha256_hex, verify};
