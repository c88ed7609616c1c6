//! Certificate subject decoding.
//!
//! The subject Name is walked structurally: every RDN SET is visited and each
//! `AttributeTypeAndValue` contributes one field, named through the fixed
//! OID table in [`constants::SUBJECT_OID_NAMES`].

use std::collections::BTreeMap;

use crate::domain::constants;
use crate::domain::der::{DerError, DerReader};

/// Decoded certificate subject.
///
/// Known attributes land in named fields; anything else is kept in `extra`
/// keyed by the attribute OID (complete TLV hex).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub c: Option<String>,
    pub o: Option<String>,
    pub ou: Option<String>,
    pub cn: Option<String>,
    pub serial_number: Option<String>,
    pub st: Option<String>,
    pub l: Option<String>,
    pub ui: Option<String>,
    pub street: Option<String>,
    pub name: Option<String>,
    pub postal_code: Option<String>,
    pub email_address: Option<String>,
    pub unstructured_name: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl Subject {
    /// Look up an attribute by its table name (`"CN"`, `"UI"`, ...) or, for
    /// unknown attributes, by OID hex.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slot(key)
            .and_then(|slot| slot.as_deref())
            .or_else(|| self.extra.get(key).map(String::as_str))
    }

    /// Flatten into a name -> value map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        for (_, name) in constants::SUBJECT_OID_NAMES {
            if let Some(value) = self.get(name) {
                map.insert((*name).to_string(), value.to_string());
            }
        }
        map
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        Some(match key {
            "C" => &self.c,
            "O" => &self.o,
            "OU" => &self.ou,
            "CN" => &self.cn,
            "serialNumber" => &self.serial_number,
            "ST" => &self.st,
            "L" => &self.l,
            "UI" => &self.ui,
            "street" => &self.street,
            "name" => &self.name,
            "postalCode" => &self.postal_code,
            "emailAddress" => &self.email_address,
            "unstructuredName" => &self.unstructured_name,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        Some(match key {
            "C" => &mut self.c,
            "O" => &mut self.o,
            "OU" => &mut self.ou,
            "CN" => &mut self.cn,
            "serialNumber" => &mut self.serial_number,
            "ST" => &mut self.st,
            "L" => &mut self.l,
            "UI" => &mut self.ui,
            "street" => &mut self.street,
            "name" => &mut self.name,
            "postalCode" => &mut self.postal_code,
            "emailAddress" => &mut self.email_address,
            "unstructuredName" => &mut self.unstructured_name,
            _ => return None,
        })
    }

    fn insert(&mut self, oid_hex: String, value: String) {
        if let Some(slot) = oid_name(&oid_hex).and_then(|name| self.slot_mut(name)) {
            // first occurrence wins for repeated attributes
            if slot.is_none() {
                *slot = Some(value);
            }
            return;
        }
        self.extra.entry(oid_hex).or_insert(value);
    }
}

/// Attribute-name lookup for a subject OID (complete TLV hex).
#[must_use]
pub fn oid_name(oid_hex: &str) -> Option<&'static str> {
    constants::SUBJECT_OID_NAMES
        .iter()
        .find(|(oid, _)| *oid == oid_hex)
        .map(|(_, name)| *name)
}

/// Decode the Name SEQUENCE at `pos`.
pub fn decode_subject(reader: &DerReader<'_>, pos: usize) -> Result<Subject, DerError> {
    let mut subject = Subject::default();
    for rdn in reader.child_positions(pos)? {
        for attribute in reader.child_positions(rdn)? {
            let parts = reader.child_positions(attribute)?;
            let (Some(&oid_pos), Some(&value_pos)) = (parts.first(), parts.get(1)) else {
                log::debug!("skipping malformed subject attribute at offset {attribute}");
                continue;
            };
            let oid_hex = reader.hex_of_tlv(oid_pos)?;
            let node = reader.node_at(value_pos)?;
            let value = decode_string(node.tag, reader.value(value_pos)?);
            subject.insert(oid_hex, value);
        }
    }
    Ok(subject)
}

fn decode_string(tag: u8, bytes: &[u8]) -> String {
    match tag {
        // BMPString
        0x1e => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        constants::ASN1_UTF8_STRING_TAG
        | constants::ASN1_PRINTABLE_STRING_TAG
        | constants::ASN1_IA5_STRING_TAG
        | 0x12 // NumericString
        | 0x14 // TeletexString
        | 0x1a => String::from_utf8_lossy(bytes).into_owned(),
        _ => hex::encode(bytes),
    }
}
