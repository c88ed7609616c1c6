//! Fixture builders shared by the integration tests.
//!
//! Certificates and preservation records are assembled from raw TLVs with the
//! crate's own encoder and signed with freshly generated OpenSSL RSA keys, so
//! every fixture is valid DER with real signatures.

#![allow(dead_code)]

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer;

use nom151_verify::domain::der::encode_tlv;

pub const OID_C: &str = "0603550406";
pub const OID_O: &str = "060355040a";
pub const OID_CN: &str = "0603550403";
pub const OID_UI: &str = "060355042d";
pub const OID_EMAIL: &str = "06092a864886f70d010901";

pub const OID_SHA256: &str = "0609608648016503040201";
pub const OID_SHA512: &str = "0609608648016503040203";
pub const OID_SHA256_WITH_RSA: &str = "06092a864886f70d01010b";
pub const OID_SIGNED_DATA: &str = "06092a864886f70d010702";
pub const OID_TST_INFO: &str = "060b2a864886f70d0109100104";
pub const OID_CONTENT_TYPE: &str = "06092a864886f70d010903";
pub const OID_MESSAGE_DIGEST: &str = "06092a864886f70d010904";
pub const OID_SIGNING_TIME: &str = "06092a864886f70d010905";
pub const OID_SIGNING_CERTIFICATE_V2: &str = "060b2a864886f70d010910022f";
const OID_BASIC_CONSTRAINTS: &str = "0603551d13";
const OID_POLICY: &str = "06032a0304";

pub const COMPANY: &str = "ACCEM SERVICIOS EMPRESARIALES SC";
pub const UI_VALUE: &str = "AAA010101AAA / HEGT7610034S2";
pub const EMAIL: &str = "pruebas@sat.gob.mx";
pub const SERIAL_ASCII: &str = "20001000000200001410";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

pub fn sign(key: &PKey<Private>, data: &[u8]) -> Vec<u8> {
    let mut signer = Signer::new(MessageDigest::sha256(), key).unwrap();
    signer.update(data).unwrap();
    signer.sign_to_vec().unwrap()
}

pub fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    openssl::sha::sha256(data).to_vec()
}

pub fn declared_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 5, 12, 18, 4, 3).unwrap()
}

pub fn seq(parts: &[&[u8]]) -> Vec<u8> {
    encode_tlv(0x30, &parts.concat())
}

pub fn oid(hex_oid: &str) -> Vec<u8> {
    hex::decode(hex_oid).unwrap()
}

fn algorithm(hex_oid: &str) -> Vec<u8> {
    seq(&[&oid(hex_oid), &[0x05, 0x00]])
}

/// Name built from `(oid, tag, value)` triples, one RDN each.
pub fn name(attributes: &[(&str, u8, &str)]) -> Vec<u8> {
    let rdns: Vec<u8> = attributes
        .iter()
        .flat_map(|(attr_oid, tag, value)| {
            let atv = seq(&[&oid(attr_oid), &encode_tlv(*tag, value.as_bytes())]);
            encode_tlv(0x31, &atv)
        })
        .collect();
    encode_tlv(0x30, &rdns)
}

pub struct CertSpec {
    pub subject: Vec<u8>,
    pub serial: Vec<u8>,
    pub not_before: &'static str,
    pub not_after: &'static str,
    pub ca: bool,
}

/// Issue a certificate for `subject_key`, signed by `issuer_key`.
pub fn issue(
    spec: &CertSpec,
    subject_key: &PKey<Private>,
    issuer_key: &PKey<Private>,
    issuer: &[u8],
) -> Vec<u8> {
    let version = encode_tlv(0xa0, &encode_tlv(0x02, &[0x02]));
    let validity = seq(&[
        &encode_tlv(0x17, spec.not_before.as_bytes()),
        &encode_tlv(0x17, spec.not_after.as_bytes()),
    ]);
    let spki = subject_key.public_key_to_der().unwrap();
    let constraints = if spec.ca {
        seq(&[&[0x01, 0x01, 0xff]])
    } else {
        seq(&[])
    };
    let extension = seq(&[
        &oid(OID_BASIC_CONSTRAINTS),
        &[0x01, 0x01, 0xff],
        &encode_tlv(0x04, &constraints),
    ]);
    let extensions = encode_tlv(0xa3, &seq(&[&extension]));

    let tbs = seq(&[
        &version,
        &encode_tlv(0x02, &spec.serial),
        &algorithm(OID_SHA256_WITH_RSA),
        issuer,
        &validity,
        &spec.subject,
        &spki,
        &extensions,
    ]);
    let signature = sign(issuer_key, &tbs);
    let mut bits = vec![0x00];
    bits.extend(signature);
    seq(&[&tbs, &algorithm(OID_SHA256_WITH_RSA), &encode_tlv(0x03, &bits)])
}

pub struct Party {
    pub key: PKey<Private>,
    pub name: Vec<u8>,
    pub cert: Vec<u8>,
}

/// Self-signed CA.
pub fn root_ca(common_name: &str) -> Party {
    let key = rsa_key();
    let subject = name(&[(OID_C, 0x13, "MX"), (OID_CN, 0x0c, common_name)]);
    let cert = issue(
        &CertSpec {
            subject: subject.clone(),
            serial: vec![0x01],
            not_before: "100101000000Z",
            not_after: "491231235959Z",
            ca: true,
        },
        &key,
        &key,
        &subject,
    );
    Party {
        key,
        name: subject,
        cert,
    }
}

/// End-entity certificate issued by `issuer`.
pub fn end_entity(issuer: &Party, common_name: &str, serial: &[u8]) -> Party {
    end_entity_valid(issuer, common_name, serial, "160101000000Z", "491231235959Z")
}

/// End-entity certificate with an explicit validity window.
pub fn end_entity_valid(
    issuer: &Party,
    common_name: &str,
    serial: &[u8],
    not_before: &'static str,
    not_after: &'static str,
) -> Party {
    let key = rsa_key();
    let subject = name(&[
        (OID_C, 0x13, "MX"),
        (OID_O, 0x0c, COMPANY),
        (OID_CN, 0x0c, common_name),
        (OID_UI, 0x0c, UI_VALUE),
        (OID_EMAIL, 0x16, EMAIL),
    ]);
    let cert = issue(
        &CertSpec {
            subject: subject.clone(),
            serial: serial.to_vec(),
            not_before,
            not_after,
            ca: false,
        },
        &key,
        &issuer.key,
        &issuer.name,
    );
    Party {
        key,
        name: subject,
        cert,
    }
}

/// The lapsed company certificate used for subject and serial checks.
pub fn expired_company_certificate() -> Vec<u8> {
    let key = rsa_key();
    let subject = name(&[
        (OID_CN, 0x0c, COMPANY),
        (OID_O, 0x0c, COMPANY),
        (OID_UI, 0x13, UI_VALUE),
        (OID_EMAIL, 0x16, EMAIL),
    ]);
    issue(
        &CertSpec {
            subject: subject.clone(),
            serial: SERIAL_ASCII.as_bytes().to_vec(),
            not_before: "120101000000Z",
            not_after: "160101000000Z",
            ca: false,
        },
        &key,
        &key,
        &subject,
    )
}

pub fn document_hash() -> String {
    hex::encode(sha256(b"contrato de prestacion de servicios"))
}

// ---------------------------------------------------------------------------
// Legacy record
// ---------------------------------------------------------------------------

pub struct LegacyFixture {
    pub ca: Party,
    pub user: Party,
    pub record: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
}

fn tst_info(imprint: &[u8], time_tag: u8, time: &str) -> Vec<u8> {
    seq(&[
        &encode_tlv(0x02, &[0x01]),
        &oid(OID_POLICY),
        &seq(&[&algorithm(OID_SHA256), &encode_tlv(0x04, imprint)]),
        &encode_tlv(0x02, &[0x2a]),
        &encode_tlv(time_tag, time.as_bytes()),
    ])
}

pub fn legacy_fixture() -> LegacyFixture {
    let ca = root_ca("AC NOM151 PRUEBAS");
    let user = end_entity(&ca, "PSC PRUEBAS", b"00001");
    let hash = document_hash();

    let archive_signature = sign(&user.key, hash.as_bytes());
    let archive = seq(&[
        &seq(&[
            &encode_tlv(0x02, &[0x01]),
            &seq(&[
                &algorithm(OID_SHA256),
                &seq(&[&encode_tlv(0x02, hash.as_bytes())]),
            ]),
        ]),
        &encode_tlv(0x04, &archive_signature),
    ]);

    let tst = tst_info(&hex::decode(&hash).unwrap(), 0x17, "170512180403Z");
    let timestamp = seq(&[
        &oid(OID_SIGNED_DATA),
        &encode_tlv(
            0xa0,
            &seq(&[
                &encode_tlv(0x02, &[0x03]),
                &seq(&[
                    &oid(OID_TST_INFO),
                    &encode_tlv(0xa0, &encode_tlv(0x04, &tst)),
                ]),
            ]),
        ),
    ]);
    let record_name = encode_tlv(0x0c, b"constancia-nom151");

    let signed = [record_name.as_slice(), archive.as_slice(), timestamp.as_slice()].concat();
    let mut bits = vec![0x00];
    bits.extend(sign(&ca.key, &signed));
    let record = seq(&[&record_name, &archive, &timestamp, &encode_tlv(0x03, &bits)]);

    LegacyFixture {
        ca,
        user,
        record,
        timestamp: declared_timestamp(),
        hash,
    }
}

// ---------------------------------------------------------------------------
// CMS record (2016 profile)
// ---------------------------------------------------------------------------

pub struct CmsOptions {
    pub signing_certificate_v2: bool,
    /// Digest OID written into the ESSCertIDv2; `None` omits it (SHA-256).
    pub ess_hash_algorithm: Option<&'static str>,
    pub tamper_message_digest: bool,
    pub signing_time: &'static str,
    pub gen_time: &'static str,
    pub tsa_not_before: &'static str,
    pub tsa_not_after: &'static str,
    /// Issue the TSA certificate from a key other than the embedded root's.
    pub foreign_tsa_issuer: bool,
}

impl Default for CmsOptions {
    fn default() -> Self {
        Self {
            signing_certificate_v2: true,
            ess_hash_algorithm: None,
            tamper_message_digest: false,
            signing_time: "170512180403Z",
            gen_time: "20170512180403.123Z",
            tsa_not_before: "160101000000Z",
            tsa_not_after: "491231235959Z",
            foreign_tsa_issuer: false,
        }
    }
}

fn cert_hash(digest_oid: Option<&str>, cert: &[u8]) -> Vec<u8> {
    match digest_oid {
        None | Some(OID_SHA256) => sha256(cert),
        Some(OID_SHA512) => openssl::sha::sha512(cert).to_vec(),
        Some(other) => panic!("no fixture digest for {other}"),
    }
}

pub struct CmsFixture {
    pub root: Party,
    pub tsa: Party,
    pub record: Vec<u8>,
    pub tst_info: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
}

fn attribute(attr_oid: &str, value: &[u8]) -> Vec<u8> {
    seq(&[&oid(attr_oid), &encode_tlv(0x31, value)])
}

pub fn cms_fixture() -> CmsFixture {
    cms_fixture_with(&CmsOptions::default())
}

pub fn cms_fixture_with(options: &CmsOptions) -> CmsFixture {
    let root = root_ca("AC RAIZ SELLOS DE TIEMPO");
    let issuer = if options.foreign_tsa_issuer {
        root_ca("AC RAIZ SELLOS DE TIEMPO")
    } else {
        Party {
            key: root.key.clone(),
            name: root.name.clone(),
            cert: root.cert.clone(),
        }
    };
    let tsa = end_entity_valid(
        &issuer,
        "TSA NOM151",
        &[0x10, 0x01],
        options.tsa_not_before,
        options.tsa_not_after,
    );
    let hash = document_hash();

    let tst = tst_info(&hex::decode(&hash).unwrap(), 0x18, options.gen_time);
    let mut digest = sha256(&tst);
    if options.tamper_message_digest {
        digest[0] ^= 0xff;
    }

    let mut attributes = vec![
        attribute(OID_CONTENT_TYPE, &oid(OID_TST_INFO)),
        attribute(
            OID_SIGNING_TIME,
            &encode_tlv(0x17, options.signing_time.as_bytes()),
        ),
        attribute(OID_MESSAGE_DIGEST, &encode_tlv(0x04, &digest)),
    ];
    if options.signing_certificate_v2 {
        let hash = encode_tlv(0x04, &cert_hash(options.ess_hash_algorithm, &tsa.cert));
        let ess_cert_id = match options.ess_hash_algorithm {
            Some(digest_oid) => seq(&[&algorithm(digest_oid), &hash]),
            None => seq(&[&hash]),
        };
        attributes.push(attribute(
            OID_SIGNING_CERTIFICATE_V2,
            &seq(&[&seq(&[&ess_cert_id])]),
        ));
    }
    let attributes = attributes.concat();
    let signature = sign(&tsa.key, &encode_tlv(0x31, &attributes));

    let signer_info = seq(&[
        &encode_tlv(0x02, &[0x01]),
        &seq(&[&root.name, &encode_tlv(0x02, &[0x10, 0x01])]),
        &algorithm(OID_SHA256),
        &encode_tlv(0xa0, &attributes),
        &algorithm(OID_SHA256_WITH_RSA),
        &encode_tlv(0x04, &signature),
    ]);
    let signed_data = seq(&[
        &encode_tlv(0x02, &[0x03]),
        &encode_tlv(0x31, &algorithm(OID_SHA256)),
        &seq(&[
            &oid(OID_TST_INFO),
            &encode_tlv(0xa0, &encode_tlv(0x04, &tst)),
        ]),
        &encode_tlv(0xa0, &[tsa.cert.as_slice(), root.cert.as_slice()].concat()),
        &encode_tlv(0x31, &signer_info),
    ]);
    let content_info = seq(&[&oid(OID_SIGNED_DATA), &encode_tlv(0xa0, &signed_data)]);
    let record = seq(&[&encode_tlv(0x0c, b"constancia-2016"), &content_info]);

    CmsFixture {
        root,
        tsa,
        record,
        tst_info: tst,
        timestamp: declared_timestamp(),
        hash,
    }
}
