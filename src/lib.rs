//! NOM-151 Preservation Record Verification
//!
//! Cryptographic core for validating documents preserved under the Mexican
//! NOM-151 archival standard. It decodes DER buffers by position, models
//! X.509 certificates with single-hop chain checks, and cross-validates the
//! hash and timestamp commitments held in preservation records (both the
//! legacy container and the 2016 CMS timestamp-token profile).
//!
//! Failed cryptographic checks are reported as [`Verification`] verdicts;
//! only malformed input raises a [`VerifyError`].

pub mod domain;
pub mod infra;
pub mod services;

pub use domain::der::{is_canonical_der, is_canonical_der_hex, DerNode, DerReader};
pub use domain::preservation::{CmsRecord, LegacyRecord, PreservationRecord};
pub use domain::signature::{Signature, SignatureBuilder, SignatureFormat};
pub use domain::verification::{RecordReport, Verification};
pub use domain::x509::{Certificate, ParentRef, Subject};
pub use infra::config::{ConfigFormat, ConfigManager, VerifierConfig};
pub use infra::error::{VerifyError, VerifyResult};
pub use services::RecordVerificationService;
