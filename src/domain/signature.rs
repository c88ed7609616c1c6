//! Signature wrapper: a certificate, the raw signature it produced and the
//! signer identity derived from it.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::domain::verification::Verification;
use crate::domain::x509::Certificate;
use crate::infra::config::VerifierConfig;
use crate::infra::error::{VerifyError, VerifyResult};

/// Text encodings a signature can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFormat {
    Hex,
    Base64,
}

impl FromStr for SignatureFormat {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(SignatureFormat::Hex),
            "base64" => Ok(SignatureFormat::Base64),
            _ => Err(VerifyError::ArgumentError(format!(
                "Unknown signature format: {s}"
            ))),
        }
    }
}

impl fmt::Display for SignatureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignatureFormat::Hex => "hex",
            SignatureFormat::Base64 => "base64",
        })
    }
}

/// A document signature and its signer.
pub struct Signature {
    certificate: Certificate,
    signature: Vec<u8>,
    signed_at: DateTime<Utc>,
    owner_id: Option<String>,
    owner_name: Option<String>,
    email: Option<String>,
}

impl Signature {
    #[must_use]
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    #[must_use]
    pub fn signed_at(&self) -> DateTime<Utc> {
        self.signed_at
    }

    /// Tax identifier from the certificate's `UI` attribute.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Signature rendered as `"hex"` or `"base64"`.
    pub fn sig(&self, format: &str) -> VerifyResult<String> {
        Ok(self.sig_as(format.parse()?))
    }

    #[must_use]
    pub fn sig_as(&self, format: SignatureFormat) -> String {
        match format {
            SignatureFormat::Hex => hex::encode(&self.signature),
            SignatureFormat::Base64 => {
                base64::engine::general_purpose::STANDARD.encode(&self.signature)
            }
        }
    }

    /// Verify the signature over the hash text with the signer's certificate.
    pub fn check(&self, hash: &str) -> VerifyResult<Verification> {
        if hash.is_empty() {
            return Err(VerifyError::ArgumentError(
                "hash to verify must not be empty".into(),
            ));
        }
        Ok(self
            .certificate
            .verify_string(hash, &self.sig_as(SignatureFormat::Hex)))
    }

    pub fn valid(&self, hash: &str) -> VerifyResult<bool> {
        self.check(hash).map(|verdict| verdict.is_valid())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("owner_id", &self.owner_id)
            .field("owner_name", &self.owner_name)
            .field("email", &self.email)
            .field("signed_at", &self.signed_at)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

enum CertificateInput {
    Built(Certificate),
    Der(Vec<u8>),
    Base64(String),
}

enum SignatureInput {
    Bytes(Vec<u8>),
    Hex(String),
    Base64(String),
}

/// Builder for [`Signature`].
#[derive(Default)]
pub struct SignatureBuilder {
    certificate: Option<CertificateInput>,
    signature: Option<SignatureInput>,
    signed_at: Option<DateTime<Utc>>,
    email: Option<String>,
    config: VerifierConfig,
}

impl SignatureBuilder {
    #[must_use]
    pub fn certificate(mut self, certificate: Certificate) -> Self {
        self.certificate = Some(CertificateInput::Built(certificate));
        self
    }

    #[must_use]
    pub fn certificate_der(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.certificate = Some(CertificateInput::Der(der.into()));
        self
    }

    #[must_use]
    pub fn certificate_base64(mut self, input: impl Into<String>) -> Self {
        self.certificate = Some(CertificateInput::Base64(input.into()));
        self
    }

    #[must_use]
    pub fn signature(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.signature = Some(SignatureInput::Bytes(bytes.into()));
        self
    }

    #[must_use]
    pub fn signature_hex(mut self, input: impl Into<String>) -> Self {
        self.signature = Some(SignatureInput::Hex(input.into()));
        self
    }

    #[must_use]
    pub fn signature_base64(mut self, input: impl Into<String>) -> Self {
        self.signature = Some(SignatureInput::Base64(input.into()));
        self
    }

    #[must_use]
    pub fn signed_at(mut self, signed_at: DateTime<Utc>) -> Self {
        self.signed_at = Some(signed_at);
        self
    }

    /// Overrides the certificate's email attribute.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> VerifyResult<Signature> {
        let certificate = match self.certificate {
            Some(CertificateInput::Built(cert)) => cert,
            Some(CertificateInput::Der(der)) => {
                Certificate::from_hex_with(&hex::encode(der), &self.config)?
            }
            Some(CertificateInput::Base64(input)) => {
                Certificate::from_base64_with(&input, &self.config)?
            }
            None => {
                return Err(VerifyError::ArgumentError(
                    "signature requires a certificate".into(),
                ))
            }
        };
        let signed_at = self
            .signed_at
            .ok_or_else(|| VerifyError::ArgumentError("signature requires signed_at".into()))?;
        let signature = match self.signature {
            Some(SignatureInput::Bytes(bytes)) => bytes,
            Some(SignatureInput::Hex(input)) => hex::decode(input.trim())?,
            Some(SignatureInput::Base64(input)) => {
                base64::engine::general_purpose::STANDARD.decode(input.trim())?
            }
            None => Vec::new(),
        };

        let owner_id = certificate.owner_id().map(str::to_string);
        let owner_name = certificate.owner().map(str::to_string);
        let email = self
            .email
            .or_else(|| certificate.email().map(str::to_string));

        log::debug!(
            "signature by {} ({}) at {signed_at}",
            owner_name.as_deref().unwrap_or("<unknown>"),
            owner_id.as_deref().unwrap_or("-")
        );

        Ok(Signature {
            certificate,
            signature,
            signed_at,
            owner_id,
            owner_name,
            email,
        })
    }
}
