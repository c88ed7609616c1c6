//! Owned X.509 certificate model.
//!
//! Built once from DER, hex, base64 or PEM input and immutable afterwards.
//! Structural fields (TBS span, validity, subject, serial, signature) are
//! located with the positional [`DerReader`]; the BasicConstraints flag comes
//! from `x509-cert`; the public key handle is OpenSSL's.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use base64::Engine;
use chrono::{DateTime, Utc};
use der::Decode;
use openssl::pkey::{PKey, Public};
use openssl::x509::X509;
use x509_cert::ext::pkix::BasicConstraints;

use super::subject::{decode_subject, Subject};
use super::time::parse_time_node;
use crate::domain::constants::{self, ASN1_CONTEXT_0_TAG, PEM_BEGIN_HEX};
use crate::domain::crypto::{self, SignatureAlgorithm};
use crate::domain::der::{decode_hex, is_canonical_der, DerError, DerReader};
use crate::domain::verification::Verification;
use crate::infra::config::VerifierConfig;
use crate::infra::error::{VerifyError, VerifyResult};

/// Separator between the RFC and CURP halves of the `UI` attribute.
const OWNER_ID_SEPARATOR: &str = " / ";

/// Parent certificate supplied to [`Certificate::valid_parent`].
#[derive(Clone, Copy)]
pub enum ParentRef<'a> {
    /// PEM text; subject to the BasicConstraints CA requirement.
    Pem(&'a str),
    /// Hex-encoded DER.
    Hex(&'a str),
    /// An already constructed certificate.
    Certificate(&'a Certificate),
}

/// X.509 certificate with decoded subject and validity window.
pub struct Certificate {
    der: Vec<u8>,
    hex: String,
    pem: String,
    subject: Subject,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    tbs: Range<usize>,
    serial: Range<usize>,
    signature_value: Range<usize>,
    signature_algorithm: Option<SignatureAlgorithm>,
    ca: bool,
    public_key: PKey<Public>,
    config: VerifierConfig,
}

impl Certificate {
    /// Build from raw DER bytes.
    pub fn from_der(der: &[u8]) -> VerifyResult<Self> {
        Self::from_hex_with(&hex::encode(der), &VerifierConfig::default())
    }

    /// Build from hex-encoded DER or hex-encoded PEM text.
    pub fn from_hex(input: &str) -> VerifyResult<Self> {
        Self::from_hex_with(input, &VerifierConfig::default())
    }

    /// Build from base64-encoded DER, as carried by the XML envelope.
    pub fn from_base64(input: &str) -> VerifyResult<Self> {
        Self::from_base64_with(input, &VerifierConfig::default())
    }

    /// Build from PEM text.
    pub fn from_pem(pem: &str) -> VerifyResult<Self> {
        Self::from_pem_with(pem, &VerifierConfig::default())
    }

    pub fn from_base64_with(input: &str, config: &VerifierConfig) -> VerifyResult<Self> {
        let der = base64::engine::general_purpose::STANDARD
            .decode(input.trim())
            .map_err(|e| VerifyError::CertificateError(format!("invalid base64: {e}")))?;
        Self::from_hex_with(&hex::encode(der), config)
    }

    pub fn from_pem_with(pem: &str, config: &VerifierConfig) -> VerifyResult<Self> {
        Self::from_hex_with(&hex::encode(pem.as_bytes()), config)
    }

    pub fn from_hex_with(input: &str, config: &VerifierConfig) -> VerifyResult<Self> {
        let input = input.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(VerifyError::CertificateError("empty certificate input".into()));
        }

        let (der, pem) = if input.starts_with(PEM_BEGIN_HEX) {
            Self::decode_pem_hex(&input)?
        } else {
            let der = decode_hex(&input)
                .map_err(|e| VerifyError::CertificateError(e.to_string()))?;
            if !is_canonical_der(&der) {
                return Err(VerifyError::CertificateError(
                    "input is neither PEM nor canonical DER".into(),
                ));
            }
            let x509 = X509::from_der(&der).map_err(|e| {
                VerifyError::CertificateError(format!("not an X.509 certificate: {e}"))
            })?;
            let pem = String::from_utf8(x509.to_pem()?)
                .map_err(|e| VerifyError::CertificateError(e.to_string()))?;
            (der, pem)
        };

        Self::assemble(der, pem, config)
    }

    fn decode_pem_hex(input: &str) -> VerifyResult<(Vec<u8>, String)> {
        let text = decode_hex(input)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| VerifyError::CertificateError("PEM input is not text".into()))?;
        let x509 = X509::from_pem(text.as_bytes())
            .map_err(|e| VerifyError::CertificateError(format!("invalid PEM certificate: {e}")))?;
        let der = x509.to_der()?;
        if !is_canonical_der(&der) {
            return Err(VerifyError::CertificateError(
                "PEM payload is not canonical DER".into(),
            ));
        }
        Ok((der, text))
    }

    fn assemble(der: Vec<u8>, pem: String, config: &VerifierConfig) -> VerifyResult<Self> {
        let reader = DerReader::new(&der);

        let outer = reader.child_positions(0).map_err(malformed("certificate"))?;
        let &[tbs_pos, alg_pos, sig_pos] = outer.as_slice() else {
            return Err(VerifyError::CertificateError(format!(
                "certificate has {} top-level fields, expected 3",
                outer.len()
            )));
        };

        let fields = reader.child_positions(tbs_pos).map_err(malformed("tbsCertificate"))?;
        // explicit [0] version is optional
        let skip = usize::from(
            fields
                .first()
                .map(|&p| der[p] == ASN1_CONTEXT_0_TAG)
                .unwrap_or(false),
        );
        let field = |index: usize| {
            fields.get(skip + index).copied().ok_or_else(|| {
                VerifyError::CertificateError(format!("tbsCertificate field {index} missing"))
            })
        };
        let serial_pos = field(0)?;
        let validity_pos = field(3)?;
        let subject_pos = field(4)?;

        let validity = reader.child_positions(validity_pos).map_err(malformed("validity"))?;
        let [not_before, not_after] = [0usize, 1].map(|i| {
            let pos = validity.get(i).copied().ok_or_else(|| {
                VerifyError::CertificateError("validity window incomplete".into())
            })?;
            let node = reader.node_at(pos).map_err(malformed("validity"))?;
            let value = reader.value(pos).map_err(malformed("validity"))?;
            parse_time_node(node.tag, value, config.year_base)
                .map_err(|e| VerifyError::CertificateError(e.to_string()))
        });
        let (not_before, not_after) = (not_before?, not_after?);

        let subject = decode_subject(&reader, subject_pos).map_err(malformed("subject"))?;

        let alg_oid = reader
            .descendant(alg_pos, &[0])
            .and_then(|p| reader.hex_of_tlv(p))
            .map_err(malformed("signatureAlgorithm"))?;
        let signature_algorithm = SignatureAlgorithm::from_oid_hex(&alg_oid);
        if signature_algorithm.is_none() {
            log::debug!("certificate uses unsupported signature algorithm {alg_oid}");
        }

        let node = |pos: usize| reader.node_at(pos).map_err(malformed("certificate"));
        let tbs_node = node(tbs_pos)?;
        let serial_node = node(serial_pos)?;
        let sig_node = node(sig_pos)?;
        if sig_node.tag != constants::ASN1_BIT_STRING_TAG || sig_node.value_length == 0 {
            return Err(VerifyError::CertificateError(
                "signatureValue is not a BIT STRING".into(),
            ));
        }

        let parsed = x509_cert::Certificate::from_der(&der)
            .map_err(|e| VerifyError::CertificateError(format!("X.509 decode failed: {e}")))?;
        let ca = basic_constraints_ca(&parsed);

        let public_key = X509::from_der(&der)?.public_key()?;

        Ok(Self {
            hex: hex::encode(&der),
            pem,
            subject,
            not_before,
            not_after,
            tbs: tbs_node.start..tbs_node.end(),
            serial: serial_node.value_start..serial_node.value_end(),
            // skip the unused-bits byte
            signature_value: sig_node.value_start + 1..sig_node.value_end(),
            signature_algorithm,
            ca,
            public_key,
            config: config.clone(),
            der,
        })
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Subject as an attribute-name -> value map.
    #[must_use]
    pub fn get_subject(&self) -> BTreeMap<String, String> {
        self.subject.to_map()
    }

    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        Utc::now() > self.not_after
    }

    #[must_use]
    pub fn is_valid_on(&self, date: DateTime<Utc>) -> bool {
        self.not_before <= date && date <= self.not_after
    }

    /// Common name of the subject, falling back to the `name` attribute.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.subject.get("CN").or_else(|| self.subject.get("name"))
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.subject.get("emailAddress")
    }

    /// Tax identifier: first token of the `UI` attribute.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.subject
            .get("UI")
            .and_then(|ui| ui.split(OWNER_ID_SEPARATOR).next())
            .map(str::trim)
    }

    #[must_use]
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.der[self.serial.clone()])
    }

    /// Serial number bytes read as ASCII (the issuing PKI stores the
    /// certificate number as text). Falls back to hex when not printable.
    #[must_use]
    pub fn get_serial_number(&self) -> String {
        let bytes = &self.der[self.serial.clone()];
        let trimmed: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
        if !trimmed.is_empty() && trimmed.iter().all(|b| b.is_ascii_graphic()) {
            String::from_utf8_lossy(&trimmed).into_owned()
        } else {
            hex::encode(bytes)
        }
    }

    /// BasicConstraints `cA` flag.
    #[must_use]
    pub fn is_ca(&self) -> bool {
        self.ca
    }

    /// Algorithm the issuer used to sign this certificate, when supported.
    #[must_use]
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.signature_algorithm
    }

    /// DER of the to-be-signed portion (first child of the outer SEQUENCE).
    #[must_use]
    pub fn tbs_certificate(&self) -> &[u8] {
        &self.der[self.tbs.clone()]
    }

    #[must_use]
    pub fn signature_value(&self) -> &[u8] {
        &self.der[self.signature_value.clone()]
    }

    #[must_use]
    pub fn fingerprint_sha256(&self) -> String {
        crypto::sha256_hex(&self.der)
    }

    #[must_use]
    pub fn public_key(&self) -> &PKey<Public> {
        &self.public_key
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `signature` over `data` with this certificate's key.
    #[must_use]
    pub fn verify_bytes(
        &self,
        data: &[u8],
        signature: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Verification {
        match crypto::verify(&self.public_key, algorithm, data, signature) {
            Ok(ok) => Verification::check(ok, || {
                format!("{algorithm} signature does not match certificate {}", self.describe())
            }),
            Err(e) => Verification::invalid(format!("{algorithm} verification error: {e}")),
        }
    }

    /// Verify a hex signature over the bytes of `data`, using the configured
    /// default algorithm.
    #[must_use]
    pub fn verify_string(&self, data: &str, signature_hex: &str) -> Verification {
        self.verify_string_with(data, signature_hex, &self.config.signature_algorithm)
    }

    #[must_use]
    pub fn verify_string_with(
        &self,
        data: &str,
        signature_hex: &str,
        algorithm: &str,
    ) -> Verification {
        self.verify_decoded(Ok(data.as_bytes().to_vec()), signature_hex, algorithm)
    }

    /// Verify a hex signature over hex-encoded `data_hex`, using the
    /// configured default algorithm.
    #[must_use]
    pub fn verify_hex_string(&self, data_hex: &str, signature_hex: &str) -> Verification {
        self.verify_hex_string_with(data_hex, signature_hex, &self.config.signature_algorithm)
    }

    #[must_use]
    pub fn verify_hex_string_with(
        &self,
        data_hex: &str,
        signature_hex: &str,
        algorithm: &str,
    ) -> Verification {
        self.verify_decoded(decode_hex(data_hex), signature_hex, algorithm)
    }

    fn verify_decoded(
        &self,
        data: Result<Vec<u8>, DerError>,
        signature_hex: &str,
        algorithm: &str,
    ) -> Verification {
        let algorithm = match algorithm.parse::<SignatureAlgorithm>() {
            Ok(algorithm) => algorithm,
            Err(e) => return Verification::invalid(e.to_string()),
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => return Verification::invalid(format!("data: {e}")),
        };
        let signature = match decode_hex(signature_hex) {
            Ok(signature) => signature,
            Err(e) => return Verification::invalid(format!("signature: {e}")),
        };
        self.verify_bytes(&data, &signature, algorithm)
    }

    /// Check that `parent` issued this certificate.
    ///
    /// Verifies `tbsCertificate` against this certificate's signature with
    /// the parent's key and this certificate's declared algorithm. A parent
    /// supplied as PEM must also carry the CA flag when the config asks for
    /// it. Never raises.
    #[must_use]
    pub fn valid_parent(&self, parent: ParentRef<'_>) -> Verification {
        let built;
        let (parent, require_ca) = match parent {
            ParentRef::Pem(pem) => match Certificate::from_pem_with(pem, &self.config) {
                Ok(cert) => {
                    built = cert;
                    (&built, self.config.require_parent_ca_flag)
                }
                Err(e) => return Verification::invalid(format!("parent certificate: {e}")),
            },
            ParentRef::Hex(hex) => match Certificate::from_hex_with(hex, &self.config) {
                Ok(cert) => {
                    built = cert;
                    (&built, false)
                }
                Err(e) => return Verification::invalid(format!("parent certificate: {e}")),
            },
            ParentRef::Certificate(cert) => (cert, false),
        };

        if require_ca && !parent.is_ca() {
            return Verification::invalid(format!(
                "parent {} is not a CA certificate",
                parent.describe()
            ));
        }
        let Some(algorithm) = self.signature_algorithm else {
            return Verification::invalid(format!(
                "certificate {} uses an unsupported signature algorithm",
                self.describe()
            ));
        };

        parent.verify_bytes(self.tbs_certificate(), self.signature_value(), algorithm)
    }

    fn describe(&self) -> String {
        format!(
            "'{}' (serial {})",
            self.owner().unwrap_or("<no CN>"),
            self.serial_hex()
        )
    }
}

fn malformed(what: &'static str) -> impl Fn(DerError) -> VerifyError {
    move |e| VerifyError::CertificateError(format!("malformed {what}: {e}"))
}

fn basic_constraints_ca(cert: &x509_cert::Certificate) -> bool {
    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|ext| ext.extn_id.to_string() == constants::BASIC_CONSTRAINTS_OID)
        .filter_map(|ext| BasicConstraints::from_der(ext.extn_value.as_bytes()).ok())
        .any(|bc| bc.ca)
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Certificate(cn={:?}, serial={}, len={})",
            self.subject.cn,
            self.serial_hex(),
            self.der.len()
        )
    }
}
