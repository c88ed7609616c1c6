//! Digital preservation records (NOM-151 constancias).
//!
//! Both variants share the outer shape `SEQUENCE { name, archive, timestamp,
//! signature }` and cross-check a caller-declared hash and timestamp against
//! what the record commits to.

pub mod cms;
pub mod legacy;
pub mod paths;

pub use cms::CmsRecord;
pub use legacy::LegacyRecord;

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::domain::der::{is_canonical_der, DerReader};
use crate::domain::verification::Verification;
use crate::domain::x509::truncate_to_seconds;
use crate::infra::config::VerifierConfig;
use crate::infra::error::{VerifyError, VerifyResult};

/// Common surface of both record variants.
///
/// The `check_*` methods return the verdict with its failure reason; the
/// boolean forms are what an orchestrator composes.
pub trait PreservationRecord {
    /// Text of the record's name field.
    fn name(&self) -> &str;

    /// Hash the record commits to, as text.
    fn archive_signed_hash(&self) -> String;

    /// Signature over the archive commitment, hex encoded.
    fn archive_signature(&self) -> String;

    /// Timestamp embedded in the record.
    fn record_timestamp(&self) -> DateTime<Utc>;

    fn check_archive_hash(&self) -> Verification;

    fn check_timestamps(&self) -> Verification;

    fn check_signature(&self) -> Verification;

    fn valid_archive_hash(&self) -> bool {
        self.check_archive_hash().is_valid()
    }

    fn equal_timestamps(&self) -> bool {
        self.check_timestamps().is_valid()
    }

    fn valid(&self) -> bool {
        self.check_signature().is_valid()
    }
}

/// Decode a base64 record body and gate it on canonical DER.
pub(crate) fn decode_record_body(record_b64: &str) -> VerifyResult<Vec<u8>> {
    let record_b64 = record_b64.trim();
    if record_b64.is_empty() {
        return Err(VerifyError::ArgumentError(
            "preservation record body is empty".into(),
        ));
    }
    let der = base64::engine::general_purpose::STANDARD
        .decode(record_b64)
        .map_err(|e| VerifyError::InvalidRecordError(format!("record is not base64: {e}")))?;
    check_record_der(&der)?;
    Ok(der)
}

pub(crate) fn check_record_der(der: &[u8]) -> VerifyResult<()> {
    if der.is_empty() {
        return Err(VerifyError::ArgumentError(
            "preservation record body is empty".into(),
        ));
    }
    if !is_canonical_der(der) {
        return Err(VerifyError::InvalidRecordError(
            "record body is not canonical DER".into(),
        ));
    }
    Ok(())
}

/// Text of the name node at the root of a record.
pub(crate) fn read_name(reader: &DerReader<'_>) -> VerifyResult<String> {
    let pos = paths::RECORD_NAME.resolve(reader, 0)?;
    Ok(String::from_utf8_lossy(reader.value(pos)?).into_owned())
}

/// Check that the OID at the end of `path` is `expected` (complete TLV hex).
pub(crate) fn expect_oid(
    reader: &DerReader<'_>,
    path: &paths::RecordPath,
    expected: &str,
) -> VerifyResult<()> {
    let found = reader.hex_of_tlv(path.resolve(reader, 0)?)?;
    if found == expected {
        Ok(())
    } else {
        Err(VerifyError::InvalidRecordError(format!(
            "{}: expected OID {expected}, found {found}",
            path.name
        )))
    }
}

/// Compare two instants at the precision the config asks for.
pub(crate) fn same_instant(a: DateTime<Utc>, b: DateTime<Utc>, config: &VerifierConfig) -> bool {
    if config.timestamp_precision_seconds {
        truncate_to_seconds(a) == truncate_to_seconds(b)
    } else {
        a == b
    }
}

/// Case-insensitive comparison of two hash strings.
pub(crate) fn hashes_match(declared: &str, embedded: &str) -> bool {
    !declared.is_empty() && declared.trim().eq_ignore_ascii_case(embedded.trim())
}
