/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Security failure integration tests.
//!
//! These tests verify that verification correctly rejects:
//! - Tampered headers, bodies, manifests and package files
//! - Signatures checked against the wrong key or publisher
//! - Unsigned and structurally broken inputs

use notar::front_matter::{stringify, FieldValue, SIGNATURES_FIELD};
use notar::packaging::{extract_files, pack_files, LEGACY_SIGNATURE_FILENAME, MANIFEST_FILENAME};
use notar::types::FileIntegrity;
use notar::{
    parse_document, sign_archive, sign_document, verify_archive, verify_document, SignError,
    SignOptions, VerifyErrorCode,
};

use crate::fixtures::{archive, sample_archive, sample_metadata, TestKey, SAMPLE_DOCUMENT};

fn signed_sample(key: &TestKey) -> String {
    sign_document(
        SAMPLE_DOCUMENT,
        &key.private_key,
        &SignOptions::new().with_key_id("key_test"),
    )
    .unwrap()
}

#[test]
fn test_tampered_header_rejected() {
    let key = TestKey::generate();
    let tampered = signed_sample(&key).replace("test-file", "evil-file");

    let result = verify_document(&tampered, &key.public_key);

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::NoMatchingSignature));
    assert_eq!(
        result.signers()[0].code,
        Some(VerifyErrorCode::SignatureMismatch)
    );
}

#[test]
fn test_tampered_body_rejected() {
    let key = TestKey::generate();
    let tampered = signed_sample(&key).replace("This is the body.", "This is not the body.");

    let result = verify_document(&tampered, &key.public_key);

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::NoMatchingSignature));
}

#[test]
fn test_body_whitespace_is_not_significant() {
    let key = TestKey::generate();
    let padded = format!("{}\n\n", signed_sample(&key));

    assert!(verify_document(&padded, &key.public_key).valid);
}

#[test]
fn test_wrong_key_rejected() {
    let signer = TestKey::generate();
    let other = TestKey::generate();

    let result = verify_document(&signed_sample(&signer), &other.public_key);

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::NoMatchingSignature));
    assert_eq!(
        result.reason.as_deref(),
        Some("No matching signature for provided key")
    );
}

#[test]
fn test_signature_replayed_under_other_publisher_rejected() {
    let key = TestKey::generate();
    let mut document = parse_document(&signed_sample(&key)).unwrap();

    let mut entries = document.signatures().to_vec();
    entries[0].publisher = "attacker.example".to_string();
    document
        .fields
        .insert(SIGNATURES_FIELD.to_string(), FieldValue::Signatures(entries));
    let replayed = stringify(&document.body, &document.fields);

    let result = verify_document(&replayed, &key.public_key);

    assert!(!result.valid);
    assert_eq!(result.signers()[0].publisher, "attacker.example");
    assert_eq!(
        result.signers()[0].code,
        Some(VerifyErrorCode::SignatureMismatch)
    );
}

#[test]
fn test_unsigned_document_rejected() {
    let key = TestKey::generate();

    let result = verify_document(SAMPLE_DOCUMENT, &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::NoSignatures));
    assert_eq!(result.reason.as_deref(), Some("No signatures found"));
    assert!(result.signers().is_empty());
}

#[test]
fn test_document_missing_required_field() {
    let key = TestKey::generate();
    let raw = "---\nname: test-file\nversion: \"1.0\"\nauthor: example.com\n---\nBody\n";

    let verified = verify_document(raw, &key.public_key);
    assert_eq!(verified.code, Some(VerifyErrorCode::InvalidFrontMatter));

    let signed = sign_document(raw, &key.private_key, &SignOptions::new());
    assert!(matches!(signed, Err(SignError::InvalidDocument(_))));
}

#[test]
fn test_signing_without_publisher_fails() {
    let key = TestKey::generate();
    let raw = "---\nname: test-file\ndescription: d\nversion: \"1.0\"\n---\nBody\n";

    let result = sign_document(raw, &key.private_key, &SignOptions::new());

    assert!(matches!(result, Err(SignError::MissingPublisher)));
}

#[test]
fn test_signing_with_invalid_private_key_fails() {
    let result = sign_document(SAMPLE_DOCUMENT, &[0u8; 16], &SignOptions::new());

    assert!(matches!(result, Err(SignError::Signing(_))));
}

#[test]
fn test_tampered_package_file_rejected() {
    let key = TestKey::generate();
    let signed = sign_archive(&sample_archive(), &sample_metadata(), &key.private_key).unwrap();

    let mut files = extract_files(&signed).unwrap();
    files.insert("a.txt".to_string(), b"AAA".to_vec());
    let tampered = pack_files(&files).unwrap();

    let result = verify_archive(&tampered, &key.public_key);

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::HashMismatch));
    assert_eq!(result.reason.as_deref(), Some("Hash mismatch for file: a.txt"));
    assert!(result.signers()[0].valid);
    assert!(matches!(
        result.files()[0].integrity,
        FileIntegrity::HashMismatch { .. }
    ));
    assert!(result.files()[1].is_valid());
}

#[test]
fn test_removed_package_file_rejected() {
    let key = TestKey::generate();
    let signed = sign_archive(&sample_archive(), &sample_metadata(), &key.private_key).unwrap();

    let mut files = extract_files(&signed).unwrap();
    files.remove("b.txt");
    let stripped = pack_files(&files).unwrap();

    let result = verify_archive(&stripped, &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::MissingFile));
    assert_eq!(result.reason.as_deref(), Some("Missing file: b.txt"));
    assert_eq!(result.files()[1].actual_hash(), None);
}

#[test]
fn test_tampered_manifest_rejected() {
    let key = TestKey::generate();
    let signed = sign_archive(&sample_archive(), &sample_metadata(), &key.private_key).unwrap();

    let mut files = extract_files(&signed).unwrap();
    let manifest = String::from_utf8(files[MANIFEST_FILENAME].clone()).unwrap();
    files.insert(
        MANIFEST_FILENAME.to_string(),
        manifest.replace("sample-package", "evil-package").into_bytes(),
    );
    let tampered = pack_files(&files).unwrap();

    let result = verify_archive(&tampered, &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::NoMatchingSignature));
    assert!(result.files().is_empty());
}

#[test]
fn test_archive_without_manifest_rejected() {
    let key = TestKey::generate();

    let result = verify_archive(&sample_archive(), &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::MissingManifest));
}

#[test]
fn test_corrupt_archive_rejected() {
    let key = TestKey::generate();

    let result = verify_archive(b"definitely not a zip file", &key.public_key);

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::MissingManifest));
}

#[test]
fn test_manifest_that_is_not_json_rejected() {
    let key = TestKey::generate();
    let package = archive(&[(MANIFEST_FILENAME, "{ not json"), ("a.txt", "aaa")]);

    let result = verify_archive(&package, &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::MissingManifest));
}

#[test]
fn test_unsigned_manifest_rejected() {
    let key = TestKey::generate();
    let manifest = r#"{"name":"p","description":"d","version":"1","author":"example.com","files":{}}"#;
    let package = archive(&[(MANIFEST_FILENAME, manifest)]);

    let result = verify_archive(&package, &key.public_key);

    assert_eq!(result.code, Some(VerifyErrorCode::NoSignatures));
    assert_eq!(result.details.unwrap().meta.name.as_deref(), Some("p"));
}

#[test]
fn test_legacy_signature_file_dropped_on_signing() {
    let key = TestKey::generate();
    let legacy = archive(&[("a.txt", "aaa"), (LEGACY_SIGNATURE_FILENAME, "old detached signature")]);

    let signed = sign_archive(&legacy, &sample_metadata(), &key.private_key).unwrap();
    let files = extract_files(&signed).unwrap();

    assert!(!files.contains_key(LEGACY_SIGNATURE_FILENAME));
    let result = verify_archive(&signed, &key.public_key);
    assert!(result.valid);
    assert_eq!(result.files().len(), 1);
}
