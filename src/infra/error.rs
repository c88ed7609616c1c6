//! Error types for preservation-record verification.
//!
//! Errors are raised only for malformed *structure* (a buffer that is not a
//! certificate, a record body that does not decode, a missing argument).
//! Failed cryptographic checks never surface here; they are reported as
//! [`crate::domain::verification::Verification::Invalid`] verdicts.

use thiserror::Error;

use crate::domain::der::DerError;

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Error types for certificate and record handling
#[derive(Error, Debug, miette::Diagnostic)]
pub enum VerifyError {
    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Argument error: {0}")]
    ArgumentError(String),

    #[error("Invalid record: {0}")]
    InvalidRecordError(String),

    #[error("ASN.1 decoding error: {0}")]
    Asn1Error(String),

    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<DerError> for VerifyError {
    fn from(error: DerError) -> Self {
        VerifyError::Asn1Error(error.to_string())
    }
}

impl From<der::Error> for VerifyError {
    fn from(error: der::Error) -> Self {
        VerifyError::Asn1Error(error.to_string())
    }
}

impl From<openssl::error::ErrorStack> for VerifyError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        VerifyError::CryptographicError(error.to_string())
    }
}

impl From<hex::FromHexError> for VerifyError {
    fn from(error: hex::FromHexError) -> Self {
        VerifyError::EncodingError(format!("invalid hex: {error}"))
    }
}

impl From<base64::DecodeError> for VerifyError {
    fn from(error: base64::DecodeError) -> Self {
        VerifyError::EncodingError(format!("invalid base64: {error}"))
    }
}

impl From<std::io::Error> for VerifyError {
    fn from(error: std::io::Error) -> Self {
        VerifyError::IoError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = VerifyError::CertificateError("empty input".to_string());
        assert_eq!(error.to_string(), "Certificate error: empty input");

        let error = VerifyError::ArgumentError("signed_at is required".to_string());
        assert_eq!(error.to_string(), "Argument error: signed_at is required");
    }

    #[test]
    fn test_der_error_conversion() {
        let error: VerifyError = DerError::IndefiniteLength { offset: 4 }.into();
        match error {
            VerifyError::Asn1Error(msg) => assert!(msg.contains("offset 4")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_hex_error_conversion() {
        let error: VerifyError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(error, VerifyError::EncodingError(_)));
    }
}
