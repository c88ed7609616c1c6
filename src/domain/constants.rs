//! Centralized constants for DER tags, OIDs and fixed encodings.
//! Keep this intentionally small; only broadly reused literals should live here.

// === ASN.1 DER Tags ===

/// ASN.1 INTEGER tag
pub const ASN1_INTEGER_TAG: u8 = 0x02;

/// ASN.1 BIT STRING tag
pub const ASN1_BIT_STRING_TAG: u8 = 0x03;

/// ASN.1 OCTET STRING tag
pub const ASN1_OCTET_STRING_TAG: u8 = 0x04;

/// ASN.1 OBJECT IDENTIFIER tag
pub const ASN1_OID_TAG: u8 = 0x06;

/// ASN.1 UTF8String tag
pub const ASN1_UTF8_STRING_TAG: u8 = 0x0c;

/// ASN.1 PrintableString tag
pub const ASN1_PRINTABLE_STRING_TAG: u8 = 0x13;

/// ASN.1 IA5String tag
pub const ASN1_IA5_STRING_TAG: u8 = 0x16;

/// ASN.1 UTCTime tag
pub const ASN1_UTC_TIME_TAG: u8 = 0x17;

/// ASN.1 GeneralizedTime tag
pub const ASN1_GENERALIZED_TIME_TAG: u8 = 0x18;

/// ASN.1 SEQUENCE tag
pub const ASN1_SEQUENCE_TAG: u8 = 0x30;

/// ASN.1 SET tag
pub const ASN1_SET_TAG: u8 = 0x31;

/// ASN.1 context-specific constructed tag [0]
pub const ASN1_CONTEXT_0_TAG: u8 = 0xa0;

/// High bit of the first length octet: long form follows
pub const DER_LONG_FORM_FLAG: u8 = 0x80;

// === Subject attribute OIDs (complete TLV hex) ===

/// Fixed OID -> attribute name table used to decode certificate subjects.
pub const SUBJECT_OID_NAMES: &[(&str, &str)] = &[
    ("0603550406", "C"),
    ("060355040a", "O"),
    ("060355040b", "OU"),
    ("0603550403", "CN"),
    ("0603550405", "serialNumber"),
    ("0603550408", "ST"),
    ("0603550407", "L"),
    ("060355042d", "UI"),
    ("0603550409", "street"),
    ("0603550429", "name"),
    ("0603550411", "postalCode"),
    ("06092a864886f70d010901", "emailAddress"),
    ("06092a864886f70d010902", "unstructuredName"),
];

// === PKCS#7 / CMS OIDs (complete TLV hex) ===

/// PKCS#7 `SignedData` content type (1.2.840.113549.1.7.2)
pub const PKCS7_SIGNED_DATA_OID: &str = "06092a864886f70d010702";

/// RFC 3161 `TSTInfo` content type (1.2.840.113549.1.9.16.1.4)
pub const TST_INFO_OID: &str = "060b2a864886f70d0109100104";

/// PKCS#9 contentType attribute (1.2.840.113549.1.9.3)
pub const PKCS9_CONTENT_TYPE_OID: &str = "06092a864886f70d010903";

/// PKCS#9 messageDigest attribute (1.2.840.113549.1.9.4)
pub const PKCS9_MESSAGE_DIGEST_OID: &str = "06092a864886f70d010904";

/// PKCS#9 signingTime attribute (1.2.840.113549.1.9.5)
pub const PKCS9_SIGNING_TIME_OID: &str = "06092a864886f70d010905";

/// ESS signingCertificateV2 attribute (1.2.840.113549.1.9.16.2.47)
pub const SIGNING_CERTIFICATE_V2_OID: &str = "060b2a864886f70d010910022f";

// === Digest algorithm OIDs (complete TLV hex) ===

/// id-sha256 (2.16.840.1.101.3.4.2.1)
pub const SHA256_OID: &str = "0609608648016503040201";

/// id-sha384 (2.16.840.1.101.3.4.2.2)
pub const SHA384_OID: &str = "0609608648016503040202";

/// id-sha512 (2.16.840.1.101.3.4.2.3)
pub const SHA512_OID: &str = "0609608648016503040203";

// === Signature algorithm OIDs (complete TLV hex) ===

/// sha1WithRSAEncryption (1.2.840.113549.1.1.5)
pub const SHA1_WITH_RSA_OID: &str = "06092a864886f70d010105";

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
pub const SHA256_WITH_RSA_OID: &str = "06092a864886f70d01010b";

/// sha384WithRSAEncryption (1.2.840.113549.1.1.12)
pub const SHA384_WITH_RSA_OID: &str = "06092a864886f70d01010c";

/// sha512WithRSAEncryption (1.2.840.113549.1.1.13)
pub const SHA512_WITH_RSA_OID: &str = "06092a864886f70d01010d";

/// X.509 basicConstraints extension (2.5.29.19), dotted form
pub const BASIC_CONSTRAINTS_OID: &str = "2.5.29.19";

// === Text markers ===

/// Hex encoding of `-----BEGIN`, the prefix of any PEM block
pub const PEM_BEGIN_HEX: &str = "2d2d2d2d2d424547494e";

/// Default signature algorithm name
pub const DEFAULT_SIGNATURE_ALGORITHM: &str = "SHA256withRSA";
