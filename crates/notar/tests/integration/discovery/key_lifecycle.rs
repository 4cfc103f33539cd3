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

//! Revoked and expired keys.

use chrono::Duration;
use notar::{
    fetch_public_key, fetch_public_keys, sign_document, verify_document_from_publisher,
    SignOptions, VerifyErrorCode, VerifyOptions,
};
use serde_json::{json, Value};

use crate::fixtures::{
    fixed_now, https_options, key_entry, key_manifest, well_known_route, MockFetcher, TestKey,
    KEY_EXPIRES, PUBLISHER, SAMPLE_DOCUMENT,
};

fn signed_with(key: &TestKey, key_id: &str) -> String {
    sign_document(
        SAMPLE_DOCUMENT,
        &key.private_key,
        &SignOptions::new().with_key_id(key_id),
    )
    .unwrap()
}

fn entry_expiring(key: &TestKey, expires: &str) -> Value {
    let mut entry = key_entry("k1", key);
    entry["expires"] = json!(expires);
    entry
}

#[tokio::test]
async fn test_revoked_key_rejected() {
    let key = TestKey::generate();
    let mut entry = key_entry("k1", &key);
    entry["revoked"] = json!(true);
    let fetcher = MockFetcher::new().with_json(&well_known_route(PUBLISHER), key_manifest(vec![entry]));

    let result =
        verify_document_from_publisher(&signed_with(&key, "k1"), &fetcher, &https_options()).await;

    assert!(!result.valid);
    assert_eq!(result.code, Some(VerifyErrorCode::NoMatchingSignature));
    assert_eq!(result.signers()[0].code, Some(VerifyErrorCode::KeyRevoked));
    assert_eq!(
        result.signers()[0].reason.as_deref(),
        Some("Key k1 has been revoked")
    );
}

#[tokio::test]
async fn test_expired_key_rejected() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![entry_expiring(&key, "2025-06-30T00:00:00Z")]),
    );

    let result =
        verify_document_from_publisher(&signed_with(&key, "k1"), &fetcher, &https_options()).await;

    let signer = &result.signers()[0];
    assert_eq!(signer.code, Some(VerifyErrorCode::KeyExpired));
    assert_eq!(signer.key_expires.as_deref(), Some("2025-06-30T00:00:00Z"));
}

#[tokio::test]
async fn test_expiry_at_verification_instant_counts_as_expired() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![entry_expiring(&key, "2026-01-01T00:00:00Z")]),
    );
    let signed = signed_with(&key, "k1");

    let at_expiry = verify_document_from_publisher(&signed, &fetcher, &https_options()).await;
    assert_eq!(
        at_expiry.signers()[0].code,
        Some(VerifyErrorCode::KeyExpired)
    );

    let just_before = VerifyOptions::https_only().with_now(fixed_now() - Duration::seconds(1));
    let earlier = verify_document_from_publisher(&signed, &fetcher, &just_before).await;
    assert!(earlier.valid);
}

#[tokio::test]
async fn test_unreadable_expiry_counts_as_expired() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![entry_expiring(&key, "next tuesday")]),
    );

    let result =
        verify_document_from_publisher(&signed_with(&key, "k1"), &fetcher, &https_options()).await;

    assert_eq!(result.signers()[0].code, Some(VerifyErrorCode::KeyExpired));
}

#[tokio::test]
async fn test_date_only_expiry_accepted() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![entry_expiring(&key, "2027-03-01")]),
    );

    let result =
        verify_document_from_publisher(&signed_with(&key, "k1"), &fetcher, &https_options()).await;

    assert!(result.valid, "unexpected failure: {:?}", result.reason);
}

#[tokio::test]
async fn test_rotation_keeps_old_signatures_until_revoked() {
    let old_key = TestKey::generate();
    let new_key = TestKey::generate();
    let signed = signed_with(&old_key, "2025");

    let both = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![key_entry("2025", &old_key), key_entry("2026", &new_key)]),
    );
    assert!(
        verify_document_from_publisher(&signed, &both, &https_options())
            .await
            .valid
    );

    let mut retired = key_entry("2025", &old_key);
    retired["revoked"] = json!(true);
    let rotated = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![retired, key_entry("2026", &new_key)]),
    );
    let result = verify_document_from_publisher(&signed, &rotated, &https_options()).await;
    assert_eq!(result.signers()[0].code, Some(VerifyErrorCode::KeyRevoked));
}

#[tokio::test]
async fn test_fetch_helpers_only_return_valid_keys() {
    let active = TestKey::generate();
    let expired = TestKey::generate();
    let mut expired_entry = key_entry("old", &expired);
    expired_entry["expires"] = json!("2020-01-01T00:00:00Z");
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![key_entry("current", &active), expired_entry]),
    );

    let keys = fetch_public_keys(&fetcher, PUBLISHER, fixed_now()).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_id, "current");

    let current = fetch_public_key(&fetcher, PUBLISHER, "current", fixed_now())
        .await
        .unwrap();
    assert_eq!(current.map(|key| key.public_key), Some(active.public_key_b64.clone()));

    let old = fetch_public_key(&fetcher, PUBLISHER, "old", fixed_now())
        .await
        .unwrap();
    assert!(old.is_none());
}

#[tokio::test]
async fn test_malformed_manifest_entry_does_not_hide_other_keys() {
    let key = TestKey::generate();
    let mut good = key_entry("k1", &key);
    good["revoked"] = Value::Null;
    let draft = json!({ "keyId": "draft", "algorithm": "ed25519", "expires": KEY_EXPIRES });
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![good, draft]),
    );

    let result =
        verify_document_from_publisher(&signed_with(&key, "k1"), &fetcher, &https_options()).await;
    assert!(result.valid, "unexpected failure: {:?}", result.reason);

    let keys = fetch_public_keys(&fetcher, PUBLISHER, fixed_now()).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_id, "k1");
}
