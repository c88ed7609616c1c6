//! Record verification service: runs every check of a preservation record.
//!
//! Checks never short-circuit one another; each verdict lands in the
//! [`RecordReport`] with its failure reason so the caller sees all problems
//! of a record at once.

use chrono::{DateTime, Utc};

use crate::domain::preservation::{CmsRecord, LegacyRecord, PreservationRecord};
use crate::domain::verification::{RecordReport, Verification};
use crate::infra::config::{ConfigManager, VerifierConfig};
use crate::infra::error::VerifyResult;

/// Service aggregating the verdicts of a preservation record.
pub struct RecordVerificationService {
    config: VerifierConfig,
}

impl Default for RecordVerificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordVerificationService {
    /// Service using the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    #[must_use]
    pub fn with_config(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Service using the policy read by `manager`.
    pub fn from_config_manager(manager: &ConfigManager) -> VerifyResult<Self> {
        Ok(Self::with_config(manager.load()?))
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Decode a legacy record under this service's policy.
    pub fn open_legacy(
        &self,
        ca_certificate: &str,
        user_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
    ) -> VerifyResult<LegacyRecord> {
        LegacyRecord::new_with(
            ca_certificate,
            user_certificate,
            record,
            timestamp,
            hash,
            &self.config,
        )
    }

    /// Decode a CMS record under this service's policy.
    pub fn open_cms(
        &self,
        ca_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
    ) -> VerifyResult<CmsRecord> {
        CmsRecord::new_with(ca_certificate, record, timestamp, hash, &self.config)
    }

    /// Run archive-hash, timestamp and signature checks over `record`.
    pub fn verify(&self, record: &dyn PreservationRecord) -> RecordReport {
        log::info!("Verifying preservation record '{}'", record.name());

        let mut failures = Vec::new();
        let mut run = |label: &str, verdict: Verification| match verdict {
            Verification::Valid => true,
            Verification::Invalid(reason) => {
                failures.push(format!("{label}: {reason}"));
                false
            }
        };

        let archive_hash_ok = run("archive hash", record.check_archive_hash());
        let timestamps_ok = run("timestamps", record.check_timestamps());
        let signature_ok = run("signature", record.check_signature());

        let report = RecordReport {
            archive_hash_ok,
            timestamps_ok,
            signature_ok,
            failures,
        };
        if report.success() {
            log::info!("Preservation record '{}' verified", record.name());
        } else {
            log::warn!(
                "Preservation record '{}' failed {} check(s)",
                record.name(),
                report.failures.len()
            );
        }
        report
    }
}
