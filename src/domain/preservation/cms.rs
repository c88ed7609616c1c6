//! CMS preservation record (2016 profile).
//!
//! The archive child of the record is a ContentInfo carrying an RFC 3161
//! timestamp token:
//!
//! ```text
//! SignedData {
//!   version, digestAlgorithms,
//!   encapContentInfo { id-ct-TSTInfo, [0] OCTET STRING { TSTInfo } },
//!   certificates [0] { TSA certificate, root certificate },
//!   signerInfos { SignerInfo { version, sid, digestAlgorithm,
//!                              signedAttrs [0], signatureAlgorithm, signature } }
//! }
//! ```
//!
//! The TSA signs the signed attributes in their `SET OF` encoding, so the
//! transported `[0]` tag is rewritten to `0x31` before verification.

use std::fmt;
use std::ops::Range;

use base64::Engine;
use chrono::{DateTime, Utc};

use super::paths::{
    ATTRIBUTE_FIRST_VALUE, ATTRIBUTE_TYPE, ATTR_CONTENT_TYPE_INDEX, ATTR_MESSAGE_DIGEST_INDEX,
    ATTR_SIGNING_CERTIFICATE_V2_INDEX, ATTR_SIGNING_TIME_INDEX, CMS_CONTENT_TYPE,
    CMS_ENCAPSULATED_CONTENT_TYPE, CMS_ROOT_CERTIFICATE, CMS_SIGNER_INFO, CMS_TSA_CERTIFICATE,
    CMS_TST_INFO, SIGNER_SIGNATURE, SIGNER_SIGNATURE_ALGORITHM, SIGNER_SIGNED_ATTRS,
    TST_INFO_DIGEST, TST_INFO_GEN_TIME,
};
use super::{
    check_record_der, decode_record_body, expect_oid, hashes_match, read_name, same_instant,
};
use super::PreservationRecord;
use crate::domain::constants::{
    ASN1_OCTET_STRING_TAG, ASN1_OID_TAG, ASN1_SEQUENCE_TAG, ASN1_SET_TAG, PKCS7_SIGNED_DATA_OID,
    PKCS9_CONTENT_TYPE_OID, PKCS9_MESSAGE_DIGEST_OID, PKCS9_SIGNING_TIME_OID,
    SIGNING_CERTIFICATE_V2_OID, TST_INFO_OID,
};
use crate::domain::crypto::{sha256, HashAlgorithm, SignatureAlgorithm};
use crate::domain::der::{retag, DerReader};
use crate::domain::verification::Verification;
use crate::domain::x509::{parse_time_node, Certificate, ParentRef};
use crate::infra::config::VerifierConfig;
use crate::infra::error::{VerifyError, VerifyResult};

pub struct CmsRecord {
    der: Vec<u8>,
    name: String,
    tsa_certificate: Certificate,
    root_certificate: Certificate,
    declared_timestamp: DateTime<Utc>,
    declared_hash: String,
    tst_info: Range<usize>,
    tst_digest: Vec<u8>,
    gen_time: DateTime<Utc>,
    content_attributes: Range<usize>,
    signed_attributes: Vec<u8>,
    message_digest: Vec<u8>,
    signing_time: DateTime<Utc>,
    signing_certificate_v2: Option<Vec<u8>>,
    signer_algorithm: Option<SignatureAlgorithm>,
    signer_signature: Vec<u8>,
    config: VerifierConfig,
}

impl CmsRecord {
    /// Build from the base64 TSA certificate and record body.
    ///
    /// The supplied certificate must be byte-identical to the TSA
    /// certificate embedded in the token.
    pub fn new(
        ca_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
    ) -> VerifyResult<Self> {
        Self::new_with(
            ca_certificate,
            record,
            timestamp,
            hash,
            &VerifierConfig::default(),
        )
    }

    pub fn new_with(
        ca_certificate: &str,
        record: &str,
        timestamp: DateTime<Utc>,
        hash: &str,
        config: &VerifierConfig,
    ) -> VerifyResult<Self> {
        let der = decode_record_body(record)?;
        let ca = base64::engine::general_purpose::STANDARD
            .decode(ca_certificate.trim())
            .map_err(|e| VerifyError::ArgumentError(format!("CA certificate is not base64: {e}")))?;
        Self::from_parts(&ca, der, timestamp, hash, config)
    }

    /// Build from the DER of the expected TSA certificate and the record body.
    pub fn from_parts(
        ca_certificate: &[u8],
        der: Vec<u8>,
        timestamp: DateTime<Utc>,
        hash: &str,
        config: &VerifierConfig,
    ) -> VerifyResult<Self> {
        check_record_der(&der)?;
        let reader = DerReader::new(&der);
        let name = read_name(&reader)?;
        expect_oid(&reader, &CMS_CONTENT_TYPE, PKCS7_SIGNED_DATA_OID)?;
        expect_oid(&reader, &CMS_ENCAPSULATED_CONTENT_TYPE, TST_INFO_OID)?;

        let tsa_pos = CMS_TSA_CERTIFICATE.resolve(&reader, 0)?;
        let tsa_der = reader.tlv(tsa_pos)?;
        if tsa_der != ca_certificate {
            return Err(VerifyError::ArgumentError(
                "supplied CA certificate does not match the TSA certificate in the record".into(),
            ));
        }
        let tsa_certificate = embedded_certificate("TSA", tsa_der, config)?;
        let root_pos = CMS_ROOT_CERTIFICATE.resolve(&reader, 0)?;
        let root_certificate = embedded_certificate("root", reader.tlv(root_pos)?, config)?;

        let tst_pos = CMS_TST_INFO.resolve(&reader, 0)?;
        let tst_info = span(&reader, tst_pos)?;
        let tst_digest = reader
            .value(TST_INFO_DIGEST.resolve(&reader, tst_pos)?)?
            .to_vec();
        let gen_time = read_time(&reader, TST_INFO_GEN_TIME.resolve(&reader, tst_pos)?, config)
            .map_err(|e| VerifyError::InvalidRecordError(format!("TSTInfo genTime: {e}")))?;

        let signer_pos = CMS_SIGNER_INFO.resolve(&reader, 0)?;
        let attrs_pos = SIGNER_SIGNED_ATTRS.resolve(&reader, signer_pos)?;
        let content_attributes = span(&reader, attrs_pos)?;
        let signed_attributes = set_of_encoding(reader.tlv(attrs_pos)?);
        let signer_signature = reader
            .value(SIGNER_SIGNATURE.resolve(&reader, signer_pos)?)?
            .to_vec();
        let signer_algorithm = SIGNER_SIGNATURE_ALGORITHM
            .resolve(&reader, signer_pos)
            .ok()
            .and_then(|pos| reader.hex_of_tlv(pos).ok())
            .and_then(|oid| SignatureAlgorithm::from_oid_hex(&oid));

        let attrs = DerReader::new(&signed_attributes);
        let content_type_pos = attribute_value(
            &attrs,
            ATTR_CONTENT_TYPE_INDEX,
            PKCS9_CONTENT_TYPE_OID,
            "contentType",
        )?;
        if attrs.hex_of_tlv(content_type_pos)? != TST_INFO_OID {
            return Err(VerifyError::InvalidRecordError(
                "contentType attribute does not name TSTInfo".into(),
            ));
        }
        let digest_pos = attribute_value(
            &attrs,
            ATTR_MESSAGE_DIGEST_INDEX,
            PKCS9_MESSAGE_DIGEST_OID,
            "messageDigest",
        )?;
        if attrs.node_at(digest_pos)?.tag != ASN1_OCTET_STRING_TAG {
            return Err(VerifyError::InvalidRecordError(
                "messageDigest attribute value is not an OCTET STRING".into(),
            ));
        }
        let message_digest = attrs.value(digest_pos)?.to_vec();

        let time_pos = attribute_value(
            &attrs,
            ATTR_SIGNING_TIME_INDEX,
            PKCS9_SIGNING_TIME_OID,
            "signingTime",
        )?;
        let signing_time = read_time(&attrs, time_pos, config)
            .map_err(|e| VerifyError::InvalidRecordError(format!("signingTime: {e}")))?;

        let signing_certificate_v2 = match attribute_value(
            &attrs,
            ATTR_SIGNING_CERTIFICATE_V2_INDEX,
            SIGNING_CERTIFICATE_V2_OID,
            "signingCertificateV2",
        ) {
            Ok(pos) => Some(attrs.tlv(pos)?.to_vec()),
            Err(e) => {
                log::debug!("CMS record '{name}' has no signingCertificateV2: {e}");
                None
            }
        };

        log::debug!(
            "CMS record '{name}': TSTInfo hash {}, genTime {gen_time}, signingTime {signing_time}",
            hex::encode(&tst_digest)
        );

        Ok(Self {
            der,
            name,
            tsa_certificate,
            root_certificate,
            declared_timestamp: timestamp,
            declared_hash: hash.trim().to_string(),
            tst_info,
            tst_digest,
            gen_time,
            content_attributes,
            signed_attributes,
            message_digest,
            signing_time,
            signing_certificate_v2,
            signer_algorithm,
            signer_signature,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn tsa_certificate(&self) -> &Certificate {
        &self.tsa_certificate
    }

    #[must_use]
    pub fn root_certificate(&self) -> &Certificate {
        &self.root_certificate
    }

    #[must_use]
    pub fn declared_timestamp(&self) -> DateTime<Utc> {
        self.declared_timestamp
    }

    #[must_use]
    pub fn declared_hash(&self) -> &str {
        &self.declared_hash
    }

    /// TSTInfo TLV, hex encoded.
    #[must_use]
    pub fn tst_info_hex(&self) -> String {
        hex::encode(&self.der[self.tst_info.clone()])
    }

    /// Signed attributes as transported (`[0]` tagged).
    #[must_use]
    pub fn content_attributes_hex(&self) -> String {
        hex::encode(&self.der[self.content_attributes.clone()])
    }

    /// Signed attributes in the `SET OF` encoding the TSA signed.
    #[must_use]
    pub fn signed_attributes_hex(&self) -> String {
        hex::encode(&self.signed_attributes)
    }

    #[must_use]
    pub fn message_digest(&self) -> String {
        hex::encode(&self.message_digest)
    }

    /// Signing time from the signed attributes.
    #[must_use]
    pub fn signed_timestamp(&self) -> DateTime<Utc> {
        self.signing_time
    }

    /// SigningCertificateV2 attribute value, hex encoded, when present.
    #[must_use]
    pub fn signing_certificate_v2(&self) -> Option<String> {
        self.signing_certificate_v2.as_ref().map(hex::encode)
    }

    /// The signed attributes commit to this exact TSTInfo.
    pub fn check_message_digest(&self) -> Verification {
        let expected = sha256(&self.der[self.tst_info.clone()]);
        Verification::check(self.message_digest == expected, || {
            format!(
                "messageDigest {} is not the SHA-256 of TSTInfo ({})",
                self.message_digest(),
                hex::encode(expected)
            )
        })
    }

    /// A signingCertificateV2 attribute is present and names the TSA
    /// certificate, hashed with the ESSCertIDv2 `hashAlgorithm`.
    pub fn check_signing_certificate(&self) -> Verification {
        let Some(value) = &self.signing_certificate_v2 else {
            return Verification::invalid("signingCertificateV2 attribute is missing");
        };
        let Some(cert_id) = ess_cert_id(value) else {
            return Verification::invalid("signingCertificateV2 carries no certificate hash");
        };
        let algorithm = match cert_id.hash_algorithm.as_deref() {
            None => HashAlgorithm::default(),
            Some(oid) => match HashAlgorithm::from_oid_hex(oid) {
                Some(algorithm) => algorithm,
                None => {
                    return Verification::invalid(format!(
                        "signingCertificateV2 uses unsupported hash algorithm {oid}"
                    ))
                }
            },
        };
        let expected = algorithm.digest(self.tsa_certificate.der());
        Verification::check(cert_id.cert_hash == expected, || {
            format!(
                "signingCertificateV2 {} hash {} does not match TSA certificate {}",
                algorithm.as_str(),
                hex::encode(&cert_id.cert_hash),
                hex::encode(&expected)
            )
        })
    }

    /// TSA signature over the re-tagged signed attributes.
    pub fn check_signer_signature(&self) -> Verification {
        let algorithm = match self.signer_algorithm {
            Some(algorithm) => algorithm,
            None => match self.config.algorithm() {
                Ok(algorithm) => algorithm,
                Err(e) => return Verification::invalid(e.to_string()),
            },
        };
        self.tsa_certificate
            .verify_bytes(&self.signed_attributes, &self.signer_signature, algorithm)
    }
}

impl PreservationRecord for CmsRecord {
    fn name(&self) -> &str {
        &self.name
    }

    /// Hash held in the TSTInfo message imprint, hex encoded.
    fn archive_signed_hash(&self) -> String {
        hex::encode(&self.tst_digest)
    }

    fn archive_signature(&self) -> String {
        hex::encode(&self.signer_signature)
    }

    /// TSTInfo genTime.
    fn record_timestamp(&self) -> DateTime<Utc> {
        self.gen_time
    }

    fn check_archive_hash(&self) -> Verification {
        let embedded = self.archive_signed_hash();
        Verification::check(hashes_match(&self.declared_hash, &embedded), || {
            format!(
                "declared hash '{}' differs from TSTInfo hash '{embedded}'",
                self.declared_hash
            )
        })
        .and_then(|| {
            Verification::check(self.tsa_certificate.is_valid_on(self.signing_time), || {
                format!(
                    "TSA certificate is not valid at signing time {}",
                    self.signing_time
                )
            })
        })
        .and_then(|| self.check_message_digest())
        .and_then(|| self.check_timestamps())
        .and_then(|| self.check_signing_certificate())
        .and_then(|| self.check_signer_signature())
    }

    /// Declared timestamp, TSTInfo genTime and signingTime agree.
    fn check_timestamps(&self) -> Verification {
        Verification::check(
            same_instant(self.declared_timestamp, self.gen_time, &self.config),
            || {
                format!(
                    "declared timestamp {} differs from TSTInfo genTime {}",
                    self.declared_timestamp, self.gen_time
                )
            },
        )
        .and_then(|| {
            Verification::check(
                same_instant(self.gen_time, self.signing_time, &self.config),
                || {
                    format!(
                        "TSTInfo genTime {} differs from signingTime {}",
                        self.gen_time, self.signing_time
                    )
                },
            )
        })
    }

    /// Signature over the signed attributes, their binding to TSTInfo, and
    /// the TSA certificate chaining to the embedded root.
    fn check_signature(&self) -> Verification {
        self.check_message_digest()
            .and_then(|| self.check_signer_signature())
            .and_then(|| {
                self.tsa_certificate
                    .valid_parent(ParentRef::Certificate(&self.root_certificate))
            })
    }
}

impl fmt::Debug for CmsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsRecord")
            .field("name", &self.name)
            .field("tst_digest", &hex::encode(&self.tst_digest))
            .field("gen_time", &self.gen_time)
            .field("signing_time", &self.signing_time)
            .field("tsa_certificate", &self.tsa_certificate)
            .finish()
    }
}

fn embedded_certificate(
    role: &str,
    der: &[u8],
    config: &VerifierConfig,
) -> VerifyResult<Certificate> {
    Certificate::from_hex_with(&hex::encode(der), config).map_err(|e| {
        VerifyError::InvalidRecordError(format!("embedded {role} certificate: {e}"))
    })
}

fn span(reader: &DerReader<'_>, pos: usize) -> VerifyResult<Range<usize>> {
    let node = reader.node_at(pos)?;
    Ok(node.start..node.end())
}

fn read_time(
    reader: &DerReader<'_>,
    pos: usize,
    config: &VerifierConfig,
) -> VerifyResult<DateTime<Utc>> {
    let node = reader.node_at(pos)?;
    parse_time_node(node.tag, reader.value(pos)?, config.year_base)
}

/// Rewrite the implicit `[0]` tag of the signed attributes to `SET OF`.
fn set_of_encoding(tlv: &[u8]) -> Vec<u8> {
    if tlv.first() == Some(&ASN1_SET_TAG) {
        tlv.to_vec()
    } else {
        retag(tlv, ASN1_SET_TAG)
    }
}

/// First value of the attribute at `index`, after checking its type OID.
fn attribute_value(
    reader: &DerReader<'_>,
    index: usize,
    oid: &str,
    label: &str,
) -> VerifyResult<usize> {
    let attributes = reader.child_positions(0)?;
    let attribute = *attributes.get(index).ok_or_else(|| {
        VerifyError::InvalidRecordError(format!(
            "{label} attribute expected at position {index}, signed attributes hold {}",
            attributes.len()
        ))
    })?;
    let found = reader.hex_of_tlv(ATTRIBUTE_TYPE.resolve(reader, attribute)?)?;
    if found != oid {
        return Err(VerifyError::InvalidRecordError(format!(
            "{label} attribute expected at position {index}, found OID {found}"
        )));
    }
    ATTRIBUTE_FIRST_VALUE.resolve(reader, attribute)
}

struct EssCertId {
    /// Digest OID as TLV hex; `None` when the SHA-256 default was omitted.
    hash_algorithm: Option<String>,
    cert_hash: Vec<u8>,
}

/// First ESSCertIDv2 of a SigningCertificateV2 value.
///
/// `hashAlgorithm` is omitted when it is the SHA-256 default, so a leading
/// SEQUENCE is the algorithm and the next field is `certHash`.
fn ess_cert_id(value: &[u8]) -> Option<EssCertId> {
    let reader = DerReader::new(value);
    let cert_id = reader.descendant(0, &[0, 0]).ok()?;
    let children = reader.child_positions(cert_id).ok()?;
    let mut fields = children.into_iter().peekable();

    let hash_algorithm = match fields.peek().copied() {
        Some(pos) if reader.node_at(pos).ok()?.tag == ASN1_SEQUENCE_TAG => {
            fields.next();
            let oid = reader.descendant(pos, &[0]).ok()?;
            if reader.node_at(oid).ok()?.tag != ASN1_OID_TAG {
                return None;
            }
            Some(reader.hex_of_tlv(oid).ok()?)
        }
        _ => None,
    };

    let hash = fields.next()?;
    if reader.node_at(hash).ok()?.tag != ASN1_OCTET_STRING_TAG {
        return None;
    }
    Some(EssCertId {
        hash_algorithm,
        cert_hash: reader.value(hash).ok()?.to_vec(),
    })
}
