//! Verification verdicts and report types.
//!
//! Cryptographic predicates never raise: any failure inside a check becomes
//! an [`Verification::Invalid`] verdict carrying the reason, and the reason is
//! logged when the verdict is produced so a structural bug cannot hide behind
//! a plain `false`.

use std::fmt;

/// Outcome of a fail-closed verification predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Invalid(String),
}

impl Verification {
    /// Build an `Invalid` verdict and log its reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::warn!("verification failed: {reason}");
        Verification::Invalid(reason)
    }

    /// `Valid` when `ok`, otherwise an `Invalid` verdict with `reason`.
    pub fn check(ok: bool, reason: impl FnOnce() -> String) -> Self {
        if ok {
            Verification::Valid
        } else {
            Self::invalid(reason())
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verification::Valid => None,
            Verification::Invalid(reason) => Some(reason),
        }
    }

    /// Continue with `next` only when this verdict is valid.
    pub fn and_then(self, next: impl FnOnce() -> Verification) -> Verification {
        match self {
            Verification::Valid => next(),
            invalid => invalid,
        }
    }
}

impl From<Verification> for bool {
    fn from(verdict: Verification) -> Self {
        verdict.is_valid()
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Valid => f.write_str("valid"),
            Verification::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

/// Result of running every check of a preservation record.
///
/// - `archive_hash_ok`: the declared document hash is the one the record signs
/// - `timestamps_ok`: the declared timestamp matches the embedded ones
/// - `signature_ok`: the record signature (and chain, where applicable) verifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub archive_hash_ok: bool,
    pub timestamps_ok: bool,
    pub signature_ok: bool,
    /// Reasons collected from failed checks, in evaluation order.
    pub failures: Vec<String>,
}

impl RecordReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.archive_hash_ok && self.timestamps_ok && self.signature_ok
    }
}
