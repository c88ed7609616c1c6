//! Canonical-DER gate.
//!
//! A buffer is canonical when the strict `der` crate decodes it (and every
//! constructed descendant) and re-serializes each TLV byte for byte.

use der::{Decode, Encode};

use super::reader::{decode_hex, DerReader};

/// Deepest nesting accepted before a buffer is rejected.
const MAX_DEPTH: usize = 64;

/// True when `bytes` is exactly one canonical DER object.
#[must_use]
pub fn is_canonical_der(bytes: &[u8]) -> bool {
    match check_canonical(bytes) {
        Ok(()) => true,
        Err(reason) => {
            log::debug!("buffer is not canonical DER: {reason}");
            false
        }
    }
}

/// Hex-string form of [`is_canonical_der`].
#[must_use]
pub fn is_canonical_der_hex(input: &str) -> bool {
    match decode_hex(input) {
        Ok(bytes) => is_canonical_der(&bytes),
        Err(e) => {
            log::debug!("buffer is not canonical DER: {e}");
            false
        }
    }
}

fn check_canonical(bytes: &[u8]) -> Result<(), String> {
    if bytes.is_empty() {
        return Err("empty input".to_string());
    }
    let reader = DerReader::new(bytes);
    let root = reader.node_at(0).map_err(|e| e.to_string())?;
    if root.end() != bytes.len() {
        return Err(format!(
            "{} trailing bytes after top-level object",
            bytes.len() - root.end()
        ));
    }
    check_node(&reader, 0, 0)
}

fn check_node(reader: &DerReader<'_>, pos: usize, depth: usize) -> Result<(), String> {
    if depth > MAX_DEPTH {
        return Err(format!("nesting deeper than {MAX_DEPTH} levels"));
    }
    let tlv = reader.tlv(pos).map_err(|e| e.to_string())?;
    round_trip(tlv).map_err(|e| format!("node at offset {pos}: {e}"))?;

    let node = reader.node_at(pos).map_err(|e| e.to_string())?;
    if node.constructed {
        for child in reader.child_positions(pos).map_err(|e| e.to_string())? {
            check_node(reader, child, depth + 1)?;
        }
    }
    Ok(())
}

fn round_trip(tlv: &[u8]) -> Result<(), String> {
    let any = der::Any::from_der(tlv).map_err(|e| e.to_string())?;
    let encoded = any.to_der().map_err(|e| e.to_string())?;
    if encoded.as_slice() == tlv {
        Ok(())
    } else {
        Err("re-encoding differs from input".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_structures() {
        assert!(is_canonical_der_hex("3006020101020102"));
        assert!(is_canonical_der_hex("300c020105040530030101ff0500"));
        assert!(is_canonical_der_hex("0500"));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(!is_canonical_der(&[]));
        assert!(!is_canonical_der_hex(""));
        assert!(!is_canonical_der_hex("not hex"));
    }

    #[test]
    fn rejects_truncated_length_bytes() {
        assert!(!is_canonical_der_hex("3082"));
        assert!(!is_canonical_der_hex("308201"));
        assert!(!is_canonical_der_hex("3005020101"));
    }

    #[test]
    fn rejects_indefinite_length() {
        assert!(!is_canonical_der_hex("30800201010000"));
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert!(!is_canonical_der_hex("300302010100"));
        assert!(!is_canonical_der_hex("30030201010201 02".replace(' ', "").as_str()));
    }

    #[test]
    fn rejects_non_minimal_lengths() {
        // outer length in long form although it fits the short form
        assert!(!is_canonical_der_hex("308103020101"));
        // same defect one level down
        assert!(!is_canonical_der_hex("30040281 0101".replace(' ', "").as_str()));
    }
}
