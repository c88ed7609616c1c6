//! Trusted cryptographic primitives: RSA verify (OpenSSL) and SHA-256.

use openssl::pkey::{PKey, Public};
use openssl::sign::Verifier;
use sha2::{Digest, Sha256};

use super::SignatureAlgorithm;
use crate::infra::error::VerifyResult;

/// Verify `signature` over `message` with `key`.
///
/// `Ok(false)` means the signature does not match; `Err` means OpenSSL could
/// not run the check at all (bad key, unsupported digest).
pub fn verify(
    key: &PKey<Public>,
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> VerifyResult<bool> {
    let mut verifier = Verifier::new(algorithm.message_digest(), key)?;
    verifier.update(message)?;
    Ok(verifier.verify(signature)?)
}

#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
