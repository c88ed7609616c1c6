//! Legacy preservation record.
//!
//! ```text
//! record     SEQUENCE {
//!   name       UTF8String
//!   archive    SEQUENCE { content { version, digest { alg, hashed { INTEGER } } },
//!                         signature OCTET STRING }
//!   timestamp  ContentInfo (SignedData carrying a TSTInfo with a UTCTime)
//!   signature  BIT STRING      -- CA signature over name || archive || timestamp
//! }
//! ```
//!
//! The user certificate signs the hash text held in the archive; the CA
//! certificate signs the first three children of the record.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Utc};

use super::paths::{
    LEGACY_ARCHIVE_SIGNATURE, LEGACY_GEN_TIME, LEGACY_SIGNED_HASH,
    LEGACY_TIMESTAMP_CONTENT_TYPE, RECORD_ARCHIVE, RECORD_NAME, RECORD_SIGNATURE,
    RECORD_TIMESTAMP,
};
use super::{
    check_record_der, decode_record_body, expect_oid, hashes_match, read_name, same_instant,
};
use super::PreservationRecord;
use crate::domain::constants::PKCS7_SIGNED_DATA_OID;
use crate::domain::der::DerReader;
use crate::domain::verification::Verification;
use crate::domain::x509::{parse_time_node, Certificate};
use crate::infra::config::VerifierConfig;
use crate::infra::error::{VerifyError, VerifyResult};

pub struct LegacyRecord {
    der: Vec<u8>,
    name: String,
    ca_certificate: Option<Certificate>,
    user_certificate: Option<Certificate>,
    declared_timestamp: DateTime<Utc>,
    declared_hash: String,
    archive: Range<usize>,
    timestamp: Range<usize>,
    signed_span: Range<usize>,
    signed_hash: String,
    archive_signature: Vec<u8>,
    record_timestamp: DateTime<Utc>,
    signature: Range<usize>,
    config: VerifierConfig,
}

impl LegacyRecord {
    /// Build from the base64 blobs carried by the document envelope.
    ///
    /// Certificates that fail to parse are kept as `None` and make the
    /// checks that need them fail; a malformed record body is an error.
    pub fn new(
        ca_certificate: &str,
        user_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
    ) -> VerifyResult<Self> {
        Self::new_with(
            ca_certificate,
            user_certificate,
            record,
            timestamp,
            hash,
            &VerifierConfig::default(),
        )
    }

    pub fn new_with(
        ca_certificate: &str,
        user_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
        config: &VerifierConfig,
    ) -> VerifyResult<Self> {
        let der = decode_record_body(record)?;
        let ca = absorb("CA", Certificate::from_base64_with(ca_certificate, config));
        let user = absorb("user", Certificate::from_base64_with(user_certificate, config));
        Self::from_parts(ca, user, der, timestamp, hash, config)
    }

    /// Build from already decoded parts.
    pub fn from_parts(
        ca_certificate: Option<Certificate>,
        user_certificate: Option<Certificate>,
        der: Vec<u8>,
        timestamp: DateTime<Utc>,
        hash: &str,
        config: &VerifierConfig,
    ) -> VerifyResult<Self> {
        check_record_der(&der)?;
        let reader = DerReader::new(&der);

        let name = read_name(&reader)?;
        let name_pos = RECORD_NAME.resolve(&reader, 0)?;
        let archive = span(&reader, RECORD_ARCHIVE.resolve(&reader, 0)?)?;
        let timestamp_span = span(&reader, RECORD_TIMESTAMP.resolve(&reader, 0)?)?;
        expect_oid(&reader, &LEGACY_TIMESTAMP_CONTENT_TYPE, PKCS7_SIGNED_DATA_OID)?;

        let hash_pos = LEGACY_SIGNED_HASH.resolve(&reader, 0)?;
        let signed_hash = hash_text(reader.value(hash_pos)?);

        let signature_pos = LEGACY_ARCHIVE_SIGNATURE.resolve(&reader, 0)?;
        let archive_signature = reader.value(signature_pos)?.to_vec();

        let time_pos = LEGACY_GEN_TIME.resolve(&reader, 0)?;
        let time_node = reader.node_at(time_pos)?;
        let record_timestamp =
            parse_time_node(time_node.tag, reader.value(time_pos)?, config.year_base).map_err(
                |e| VerifyError::InvalidRecordError(format!("record timestamp value: {e}")),
            )?;

        let outer_pos = RECORD_SIGNATURE.resolve(&reader, 0)?;
        let outer = reader.node_at(outer_pos)?;
        if outer.value_length == 0 || der[outer.value_start] != 0 {
            return Err(VerifyError::InvalidRecordError(
                "record signature BIT STRING has unused bits".into(),
            ));
        }
        let signature = outer.value_start + 1..outer.value_end();

        // name, archive and timestamp are adjacent, so the signed bytes are
        // one contiguous span
        let signed_span = reader.node_at(name_pos)?.start..timestamp_span.end;

        log::debug!(
            "legacy record '{name}': signed hash {signed_hash}, timestamp {record_timestamp}"
        );

        Ok(Self {
            der,
            name,
            ca_certificate,
            user_certificate,
            declared_timestamp: timestamp,
            declared_hash: hash.trim().to_string(),
            archive,
            timestamp: timestamp_span,
            signed_span,
            signed_hash,
            archive_signature,
            record_timestamp,
            signature,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn ca_certificate(&self) -> Option<&Certificate> {
        self.ca_certificate.as_ref()
    }

    #[must_use]
    pub fn user_certificate(&self) -> Option<&Certificate> {
        self.user_certificate.as_ref()
    }

    #[must_use]
    pub fn declared_timestamp(&self) -> DateTime<Utc> {
        self.declared_timestamp
    }

    #[must_use]
    pub fn declared_hash(&self) -> &str {
        &self.declared_hash
    }

    /// Archive TLV, hex encoded.
    #[must_use]
    pub fn archive_hex(&self) -> String {
        hex::encode(&self.der[self.archive.clone()])
    }

    /// Timestamp TLV, hex encoded.
    #[must_use]
    pub fn timestamp_hex(&self) -> String {
        hex::encode(&self.der[self.timestamp.clone()])
    }

    /// Bytes covered by the outer signature: name, archive and timestamp TLVs.
    #[must_use]
    pub fn signed_data(&self) -> &[u8] {
        &self.der[self.signed_span.clone()]
    }

    #[must_use]
    pub fn signed_data_hex(&self) -> String {
        hex::encode(self.signed_data())
    }

    /// Outer CA signature, without the BIT STRING unused-bits byte.
    #[must_use]
    pub fn record_signature(&self) -> &[u8] {
        &self.der[self.signature.clone()]
    }
}

impl PreservationRecord for LegacyRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn archive_signed_hash(&self) -> String {
        self.signed_hash.clone()
    }

    fn archive_signature(&self) -> String {
        hex::encode(&self.archive_signature)
    }

    fn record_timestamp(&self) -> DateTime<Utc> {
        self.record_timestamp
    }

    /// Declared hash equals the signed one and the user certificate's
    /// signature over it verifies.
    fn check_archive_hash(&self) -> Verification {
        if !hashes_match(&self.declared_hash, &self.signed_hash) {
            return Verification::invalid(format!(
                "declared hash '{}' differs from archive hash '{}'",
                self.declared_hash, self.signed_hash
            ));
        }
        let Some(user) = &self.user_certificate else {
            return Verification::invalid("no user certificate available for the archive");
        };
        user.verify_string(&self.signed_hash, &self.archive_signature())
    }

    fn check_timestamps(&self) -> Verification {
        Verification::check(
            same_instant(self.declared_timestamp, self.record_timestamp, &self.config),
            || {
                format!(
                    "declared timestamp {} differs from record timestamp {}",
                    self.declared_timestamp, self.record_timestamp
                )
            },
        )
    }

    /// CA signature over [`LegacyRecord::signed_data`].
    fn check_signature(&self) -> Verification {
        let Some(ca) = &self.ca_certificate else {
            return Verification::invalid("no CA certificate available for the record");
        };
        match self.config.algorithm() {
            Ok(algorithm) => {
                ca.verify_bytes(self.signed_data(), self.record_signature(), algorithm)
            }
            Err(e) => Verification::invalid(e.to_string()),
        }
    }
}

impl fmt::Debug for LegacyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyRecord")
            .field("name", &self.name)
            .field("signed_hash", &self.signed_hash)
            .field("record_timestamp", &self.record_timestamp)
            .field("has_ca_certificate", &self.ca_certificate.is_some())
            .field("has_user_certificate", &self.user_certificate.is_some())
            .finish()
    }
}

fn absorb(role: &str, certificate: VerifyResult<Certificate>) -> Option<Certificate> {
    match certificate {
        Ok(cert) => Some(cert),
        Err(e) => {
            log::warn!("legacy record {role} certificate unavailable: {e}");
            None
        }
    }
}

fn span(reader: &DerReader<'_>, pos: usize) -> VerifyResult<Range<usize>> {
    let node = reader.node_at(pos)?;
    Ok(node.start..node.end())
}

/// Hash text stored as INTEGER content; sign-padding zero bytes are dropped.
fn hash_text(value: &[u8]) -> String {
    let first = value.iter().position(|&b| b != 0).unwrap_or(value.len());
    String::from_utf8_lossy(&value[first..]).into_owned()
}
