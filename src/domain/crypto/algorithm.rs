//! Signature algorithm domain type.

use std::fmt;
use std::str::FromStr;

use openssl::hash::MessageDigest;

use crate::domain::constants;
use crate::infra::error::VerifyError;

/// RSA PKCS#1 v1.5 signature algorithms understood by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    Sha1WithRsa,
    #[default]
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1WithRsa => "SHA1withRSA",
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
            SignatureAlgorithm::Sha384WithRsa => "SHA384withRSA",
            SignatureAlgorithm::Sha512WithRsa => "SHA512withRSA",
        }
    }

    #[must_use]
    pub fn message_digest(&self) -> MessageDigest {
        match self {
            SignatureAlgorithm::Sha1WithRsa => MessageDigest::sha1(),
            SignatureAlgorithm::Sha256WithRsa => MessageDigest::sha256(),
            SignatureAlgorithm::Sha384WithRsa => MessageDigest::sha384(),
            SignatureAlgorithm::Sha512WithRsa => MessageDigest::sha512(),
        }
    }

    /// Map a signature-algorithm OID (complete TLV hex) to an algorithm.
    #[must_use]
    pub fn from_oid_hex(oid_hex: &str) -> Option<Self> {
        match oid_hex {
            constants::SHA1_WITH_RSA_OID => Some(SignatureAlgorithm::Sha1WithRsa),
            constants::SHA256_WITH_RSA_OID => Some(SignatureAlgorithm::Sha256WithRsa),
            constants::SHA384_WITH_RSA_OID => Some(SignatureAlgorithm::Sha384WithRsa),
            constants::SHA512_WITH_RSA_OID => Some(SignatureAlgorithm::Sha512WithRsa),
            _ => None,
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1withrsa" => Ok(SignatureAlgorithm::Sha1WithRsa),
            "sha256withrsa" => Ok(SignatureAlgorithm::Sha256WithRsa),
            "sha384withrsa" => Ok(SignatureAlgorithm::Sha384WithRsa),
            "sha512withrsa" => Ok(SignatureAlgorithm::Sha512WithRsa),
            _ => Err(VerifyError::ArgumentError(format!(
                "Unsupported signature algorithm: {s}"
            ))),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
