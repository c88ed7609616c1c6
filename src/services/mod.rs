//! Service layer module root.
//! Sequences domain checks into reports for the orchestrator.

pub mod verification;

pub use verification::RecordVerificationService;
