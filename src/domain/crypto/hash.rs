//! Hash algorithm domain type.
//!
//! SHA-2 digests named by an `AlgorithmIdentifier`, as used in ESSCertIDv2
//! certificate hashes.

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::domain::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Map a digest OID (complete TLV hex) to an algorithm.
    #[must_use]
    pub fn from_oid_hex(oid_hex: &str) -> Option<Self> {
        match oid_hex {
            constants::SHA256_OID => Some(HashAlgorithm::Sha256),
            constants::SHA384_OID => Some(HashAlgorithm::Sha384),
            constants::SHA512_OID => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}
