//! Time formats found in certificates and preservation records.
//!
//! - `YYMMDDHHMMSSZ`: two-digit year, offset by a fixed base (2000)
//! - `YYYYMMDDHHMMSSZ`
//! - `YYYYMMDDHHMMSS.fffZ`: fractional seconds, any number of digits

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};

use crate::domain::constants::{ASN1_GENERALIZED_TIME_TAG, ASN1_UTC_TIME_TAG};
use crate::infra::error::{VerifyError, VerifyResult};

/// Parse a record/certificate time string.
pub fn parse_record_time(input: &str, year_base: i32) -> VerifyResult<DateTime<Utc>> {
    let invalid = || VerifyError::Asn1Error(format!("Unrecognised time value: {input:?}"));

    let body = input.strip_suffix('Z').ok_or_else(invalid)?;
    let (main, fraction) = match body.split_once('.') {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (body, None),
    };
    if !main.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let (year, rest) = match main.len() {
        12 if fraction.is_none() => (year_base + digits(&main[..2]), &main[2..]),
        14 => (digits(&main[..4]), &main[4..]),
        _ => return Err(invalid()),
    };

    let nanos = match fraction {
        None => 0,
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            let mut padded: String = f.chars().take(9).collect();
            while padded.len() < 9 {
                padded.push('0');
            }
            digits(&padded) as u32
        }
        Some(_) => return Err(invalid()),
    };

    let month = digits(&rest[0..2]) as u32;
    let day = digits(&rest[2..4]) as u32;
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| {
            date.and_hms_nano_opt(
                digits(&rest[4..6]) as u32,
                digits(&rest[6..8]) as u32,
                digits(&rest[8..10]) as u32,
                nanos,
            )
        })
        .ok_or_else(invalid)?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Parse the value bytes of a UTCTime or GeneralizedTime node.
pub fn parse_time_node(tag: u8, value: &[u8], year_base: i32) -> VerifyResult<DateTime<Utc>> {
    if tag != ASN1_UTC_TIME_TAG && tag != ASN1_GENERALIZED_TIME_TAG {
        return Err(VerifyError::Asn1Error(format!(
            "Expected a time node, found tag 0x{tag:02x}"
        )));
    }
    let text = std::str::from_utf8(value)
        .map_err(|_| VerifyError::Asn1Error("Time value is not ASCII".to_string()))?;
    parse_record_time(text, year_base)
}

/// Drop sub-second precision.
#[must_use]
pub fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}

fn digits(s: &str) -> i32 {
    s.bytes().fold(0, |acc, b| acc * 10 + i32::from(b - b'0'))
}
