//! Named index paths into preservation-record bodies.
//!
//! Each path is a list of hops; a hop selects the Nth child of the current
//! node and asserts the tag found there. A mismatch names the path and the
//! hop instead of silently landing on the wrong node.

use crate::domain::constants::{
    ASN1_BIT_STRING_TAG as BIT_STRING, ASN1_CONTEXT_0_TAG as CTX_0,
    ASN1_GENERALIZED_TIME_TAG as GENERALIZED_TIME, ASN1_INTEGER_TAG as INTEGER,
    ASN1_OCTET_STRING_TAG as OCTET_STRING, ASN1_OID_TAG as OID, ASN1_SEQUENCE_TAG as SEQ,
    ASN1_SET_TAG as SET, ASN1_UTC_TIME_TAG as UTC_TIME,
};
use crate::domain::der::DerReader;
use crate::infra::error::{VerifyError, VerifyResult};

/// One step of a path: child index plus the tag expected at that child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub index: usize,
    pub tag: Option<u8>,
}

const fn hop(index: usize, tag: u8) -> Hop {
    Hop {
        index,
        tag: Some(tag),
    }
}

const fn any(index: usize) -> Hop {
    Hop { index, tag: None }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordPath {
    pub name: &'static str,
    pub hops: &'static [Hop],
}

impl RecordPath {
    /// Resolve the path starting at the node at `from`.
    pub fn resolve(&self, reader: &DerReader<'_>, from: usize) -> VerifyResult<usize> {
        let mut cursor = from;
        for (depth, step) in self.hops.iter().enumerate() {
            let children = reader.child_positions(cursor).map_err(|e| {
                VerifyError::InvalidRecordError(format!(
                    "{}: hop {depth} cannot list children at offset {cursor}: {e}",
                    self.name
                ))
            })?;
            let next = *children.get(step.index).ok_or_else(|| {
                VerifyError::InvalidRecordError(format!(
                    "{}: hop {depth} wants child {} at offset {cursor}, found {} children",
                    self.name,
                    step.index,
                    children.len()
                ))
            })?;
            if let Some(expected) = step.tag {
                let found = reader.node_at(next)?.tag;
                if found != expected {
                    return Err(VerifyError::InvalidRecordError(format!(
                        "{}: hop {depth} (child {}) expected tag 0x{expected:02x}, found 0x{found:02x}",
                        self.name, step.index
                    )));
                }
            }
            cursor = next;
        }
        Ok(cursor)
    }
}

// === Outer record: SEQUENCE { name, archive, timestamp, signature } ===

pub const RECORD_NAME: RecordPath = RecordPath {
    name: "record name",
    hops: &[any(0)],
};

pub const RECORD_ARCHIVE: RecordPath = RecordPath {
    name: "record archive",
    hops: &[hop(1, SEQ)],
};

pub const RECORD_TIMESTAMP: RecordPath = RecordPath {
    name: "record timestamp",
    hops: &[hop(2, SEQ)],
};

pub const RECORD_SIGNATURE: RecordPath = RecordPath {
    name: "record signature",
    hops: &[hop(3, BIT_STRING)],
};

/// timestamp > contentType
pub const LEGACY_TIMESTAMP_CONTENT_TYPE: RecordPath = RecordPath {
    name: "timestamp contentType",
    hops: &[hop(2, SEQ), hop(0, OID)],
};

// === Legacy archive ===
//
// archive   SEQUENCE {
//   content   SEQUENCE { version INTEGER,
//                        digest SEQUENCE { algorithm, hashed SEQUENCE { INTEGER } } }
//   signature OCTET STRING }

/// archive > content > digest > hashed > INTEGER holding the hash text
pub const LEGACY_SIGNED_HASH: RecordPath = RecordPath {
    name: "archive signed hash",
    hops: &[hop(1, SEQ), hop(0, SEQ), hop(1, SEQ), hop(1, SEQ), hop(0, INTEGER)],
};

/// archive > signature
pub const LEGACY_ARCHIVE_SIGNATURE: RecordPath = RecordPath {
    name: "archive signature",
    hops: &[hop(1, SEQ), hop(1, OCTET_STRING)],
};

/// timestamp > [0] > SignedData > encapContentInfo > [0] > OCTET STRING >
/// TSTInfo > genTime (UTCTime)
pub const LEGACY_GEN_TIME: RecordPath = RecordPath {
    name: "record timestamp value",
    hops: &[
        hop(2, SEQ),
        hop(1, CTX_0),
        hop(0, SEQ),
        hop(1, SEQ),
        hop(1, CTX_0),
        hop(0, OCTET_STRING),
        hop(0, SEQ),
        hop(4, UTC_TIME),
    ],
};

// === CMS (2016 profile) archive: ContentInfo { signedData, [0] SignedData } ===

/// archive > contentType
pub const CMS_CONTENT_TYPE: RecordPath = RecordPath {
    name: "ContentInfo contentType",
    hops: &[hop(1, SEQ), hop(0, OID)],
};

/// SignedData > encapContentInfo > eContentType
pub const CMS_ENCAPSULATED_CONTENT_TYPE: RecordPath = RecordPath {
    name: "eContentType",
    hops: &[hop(1, SEQ), hop(1, CTX_0), hop(0, SEQ), hop(2, SEQ), hop(0, OID)],
};

/// SignedData > certificates [0] > first certificate
pub const CMS_TSA_CERTIFICATE: RecordPath = RecordPath {
    name: "TSA certificate",
    hops: &[
        hop(1, SEQ),
        hop(1, CTX_0),
        hop(0, SEQ),
        hop(3, CTX_0),
        hop(0, SEQ),
    ],
};

/// SignedData > certificates [0] > second certificate
pub const CMS_ROOT_CERTIFICATE: RecordPath = RecordPath {
    name: "root certificate",
    hops: &[
        hop(1, SEQ),
        hop(1, CTX_0),
        hop(0, SEQ),
        hop(3, CTX_0),
        hop(1, SEQ),
    ],
};

/// SignedData > encapContentInfo > [0] > OCTET STRING > TSTInfo
pub const CMS_TST_INFO: RecordPath = RecordPath {
    name: "TSTInfo",
    hops: &[
        hop(1, SEQ),
        hop(1, CTX_0),
        hop(0, SEQ),
        hop(2, SEQ),
        hop(1, CTX_0),
        hop(0, OCTET_STRING),
        hop(0, SEQ),
    ],
};

/// Relative to TSTInfo: messageImprint > hashedMessage
pub const TST_INFO_DIGEST: RecordPath = RecordPath {
    name: "TSTInfo hashedMessage",
    hops: &[hop(2, SEQ), hop(1, OCTET_STRING)],
};

/// Relative to TSTInfo: genTime
pub const TST_INFO_GEN_TIME: RecordPath = RecordPath {
    name: "TSTInfo genTime",
    hops: &[hop(4, GENERALIZED_TIME)],
};

/// SignedData > signerInfos > first SignerInfo
pub const CMS_SIGNER_INFO: RecordPath = RecordPath {
    name: "SignerInfo",
    hops: &[
        hop(1, SEQ),
        hop(1, CTX_0),
        hop(0, SEQ),
        hop(4, SET),
        hop(0, SEQ),
    ],
};

/// Relative to SignerInfo: signedAttrs [0] IMPLICIT
pub const SIGNER_SIGNED_ATTRS: RecordPath = RecordPath {
    name: "signedAttrs",
    hops: &[hop(3, CTX_0)],
};

/// Relative to SignerInfo: signature
pub const SIGNER_SIGNATURE: RecordPath = RecordPath {
    name: "SignerInfo signature",
    hops: &[hop(5, OCTET_STRING)],
};

/// Relative to SignerInfo: signatureAlgorithm > algorithm
pub const SIGNER_SIGNATURE_ALGORITHM: RecordPath = RecordPath {
    name: "SignerInfo signatureAlgorithm",
    hops: &[hop(4, SEQ), hop(0, OID)],
};

// === Signed attributes (re-tagged SET OF Attribute) ===

/// Position of each attribute inside the DER-sorted signed attribute set.
pub const ATTR_CONTENT_TYPE_INDEX: usize = 0;
pub const ATTR_SIGNING_TIME_INDEX: usize = 1;
pub const ATTR_MESSAGE_DIGEST_INDEX: usize = 2;
pub const ATTR_SIGNING_CERTIFICATE_V2_INDEX: usize = 3;

/// Relative to an Attribute: attrValues > first value
pub const ATTRIBUTE_FIRST_VALUE: RecordPath = RecordPath {
    name: "attribute value",
    hops: &[hop(1, SET), any(0)],
};

/// Relative to an Attribute: attrType
pub const ATTRIBUTE_TYPE: RecordPath = RecordPath {
    name: "attribute type",
    hops: &[hop(0, OID)],
};
