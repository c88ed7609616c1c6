//! CMS (2016 profile) preservation record built from a signed timestamp token.

mod common;

use chrono::Duration;
use common::{CmsFixture, CmsOptions};
use nom151_verify::{
    CmsRecord, ConfigManager, ParentRef, PreservationRecord, RecordVerificationService,
    VerifyError,
};

fn build(fixture: &CmsFixture) -> CmsRecord {
    CmsRecord::new(
        &common::b64(&fixture.tsa.cert),
        &common::b64(&fixture.record),
        fixture.timestamp,
        &fixture.hash,
    )
    .unwrap()
}

#[test]
fn matching_token_verifies() {
    common::init_logging();
    let fixture = common::cms_fixture();
    let record = build(&fixture);

    assert_eq!(record.name(), "constancia-2016");
    assert_eq!(record.archive_signed_hash(), fixture.hash);
    assert_eq!(record.tst_info_hex(), hex::encode(&fixture.tst_info));
    assert_eq!(
        record.message_digest(),
        hex::encode(common::sha256(&fixture.tst_info))
    );
    assert_eq!(record.signed_timestamp(), fixture.timestamp);
    assert_eq!(record.tsa_certificate().der(), fixture.tsa.cert.as_slice());
    assert_eq!(record.root_certificate().der(), fixture.root.cert.as_slice());

    assert!(record.equal_timestamps());
    assert!(record.valid_archive_hash());
    assert!(record.valid());
    assert!(RecordVerificationService::new().verify(&record).success());
}

#[test]
fn signed_attributes_are_retagged_for_verification() {
    let fixture = common::cms_fixture();
    let record = build(&fixture);

    let transported = record.content_attributes_hex();
    let signed = record.signed_attributes_hex();
    assert!(transported.starts_with("a0"));
    assert!(signed.starts_with("31"));
    assert_eq!(transported[2..], signed[2..]);

    assert!(record
        .tsa_certificate()
        .verify_hex_string(&signed, &record.archive_signature())
        .is_valid());
    assert!(!record
        .tsa_certificate()
        .verify_hex_string(&transported, &record.archive_signature())
        .is_valid());
}

#[test]
fn supplied_certificate_must_match_embedded_tsa() {
    let fixture = common::cms_fixture();
    let err = CmsRecord::new(
        &common::b64(&fixture.root.cert),
        &common::b64(&fixture.record),
        fixture.timestamp,
        &fixture.hash,
    )
    .unwrap_err();
    assert!(matches!(err, VerifyError::ArgumentError(msg) if msg.contains("TSA")));
}

#[test]
fn empty_record_is_an_argument_error() {
    let fixture = common::cms_fixture();
    let err = CmsRecord::new(&common::b64(&fixture.tsa.cert), "", fixture.timestamp, "")
        .unwrap_err();
    assert!(matches!(err, VerifyError::ArgumentError(_)));
}

#[test]
fn declared_inputs_are_cross_checked() {
    let fixture = common::cms_fixture();

    let late = CmsRecord::new(
        &common::b64(&fixture.tsa.cert),
        &common::b64(&fixture.record),
        fixture.timestamp + Duration::seconds(2),
        &fixture.hash,
    )
    .unwrap();
    assert!(!late.equal_timestamps());
    assert!(!late.valid_archive_hash());
    assert!(late.valid());

    let other_hash = CmsRecord::new(
        &common::b64(&fixture.tsa.cert),
        &common::b64(&fixture.record),
        fixture.timestamp,
        &hex::encode(common::sha256(b"otro")),
    )
    .unwrap();
    assert!(!other_hash.valid_archive_hash());
    assert!(other_hash.equal_timestamps());
}

#[test]
fn signing_time_must_agree_with_gen_time() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        signing_time: "170512180500Z",
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    let verdict = record.check_timestamps();
    assert!(verdict
        .reason()
        .is_some_and(|reason| reason.contains("signingTime")));
    assert!(!record.valid_archive_hash());
}

#[test]
fn message_digest_binds_tst_info() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        tamper_message_digest: true,
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    assert!(!record.check_message_digest().is_valid());
    assert!(!record.valid_archive_hash());
    assert!(!record.valid());
    // the TSA did sign these (tampered) attributes
    assert!(record.check_signer_signature().is_valid());
}

#[test]
fn signing_certificate_v2_is_required() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        signing_certificate_v2: false,
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    assert!(record.signing_certificate_v2().is_none());
    assert!(!record.valid_archive_hash());
    assert!(record.valid());

    let complete = build(&common::cms_fixture());
    assert!(complete.signing_certificate_v2().is_some());
    assert!(complete.check_signing_certificate().is_valid());
}

#[test]
fn fractional_gen_time_matches_at_second_precision() {
    let fixture = common::cms_fixture();
    let record = build(&fixture);
    assert_ne!(record.record_timestamp(), fixture.timestamp);
    assert_eq!(
        record.record_timestamp() - fixture.timestamp,
        Duration::milliseconds(123)
    );
    assert!(record.equal_timestamps());
}

#[test]
fn legacy_body_is_not_a_cms_record() {
    let legacy = common::legacy_fixture();
    let err = CmsRecord::new(
        &common::b64(&legacy.ca.cert),
        &common::b64(&legacy.record),
        legacy.timestamp,
        &legacy.hash,
    )
    .unwrap_err();
    assert!(
        matches!(err, VerifyError::InvalidRecordError(msg) if msg.contains("contentType: hop 1"))
    );
}

#[test]
fn signing_certificate_v2_honours_explicit_hash_algorithm() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        ess_hash_algorithm: Some(common::OID_SHA512),
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    assert!(record.check_signing_certificate().is_valid());
    assert!(record.check_signer_signature().is_valid());
    assert!(record.valid_archive_hash());
    assert!(record.valid());

    let explicit_default = build(&common::cms_fixture_with(&CmsOptions {
        ess_hash_algorithm: Some(common::OID_SHA256),
        ..CmsOptions::default()
    }));
    assert!(explicit_default.valid_archive_hash());
}

#[test]
fn signing_certificate_v2_rejects_unknown_hash_algorithm() {
    let mut fixture = common::cms_fixture_with(&CmsOptions {
        ess_hash_algorithm: Some(common::OID_SHA512),
        ..CmsOptions::default()
    });
    // sha512 -> sha512/224 (2.16.840.1.101.3.4.2.5); record stays canonical
    let sha512 = hex::decode(common::OID_SHA512).unwrap();
    let at = fixture
        .record
        .windows(sha512.len())
        .position(|window| window == sha512.as_slice())
        .unwrap();
    fixture.record[at + sha512.len() - 1] = 0x05;

    let record = CmsRecord::new(
        &common::b64(&fixture.tsa.cert),
        &common::b64(&fixture.record),
        fixture.timestamp,
        &fixture.hash,
    )
    .unwrap();
    let verdict = record.check_signing_certificate();
    assert!(verdict
        .reason()
        .is_some_and(|reason| reason.contains("unsupported hash algorithm")));
    assert!(!record.valid_archive_hash());
}

#[test]
fn tsa_certificate_must_cover_signing_time() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        tsa_not_before: "180101000000Z",
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    assert!(record.equal_timestamps());
    assert!(record.check_signer_signature().is_valid());
    assert!(!record.valid_archive_hash());
    assert!(record.valid());

    let report = RecordVerificationService::new().verify(&record);
    assert!(!report.archive_hash_ok);
    assert!(report.signature_ok);
}

#[test]
fn tsa_must_chain_to_embedded_root() {
    let fixture = common::cms_fixture_with(&CmsOptions {
        foreign_tsa_issuer: true,
        ..CmsOptions::default()
    });
    let record = build(&fixture);
    assert!(record.check_signer_signature().is_valid());
    assert!(record.check_message_digest().is_valid());
    assert!(!record.valid());
    assert!(record
        .tsa_certificate()
        .valid_parent(ParentRef::Certificate(record.root_certificate()))
        .reason()
        .is_some());
}

#[test]
fn service_policy_controls_timestamp_precision() {
    let fixture = common::cms_fixture();
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("policy.json");
    std::fs::write(&path, r#"{ "timestamp_precision_seconds": false }"#).unwrap();

    let exact = RecordVerificationService::from_config_manager(&ConfigManager::with_path(&path))
        .unwrap();
    let record = exact
        .open_cms(
            &common::b64(&fixture.tsa.cert),
            &common::b64(&fixture.record),
            fixture.timestamp,
            &fixture.hash,
        )
        .unwrap();
    let report = exact.verify(&record);
    assert!(!report.timestamps_ok);
    assert!(report.signature_ok);

    let lenient = RecordVerificationService::new();
    let record = lenient
        .open_cms(
            &common::b64(&fixture.tsa.cert),
            &common::b64(&fixture.record),
            fixture.timestamp,
            &fixture.hash,
        )
        .unwrap();
    assert!(lenient.verify(&record).success());
}
