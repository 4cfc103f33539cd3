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

//! Checking a signing key against the publisher's manifest before signing.

use notar::{validate_signing_key, PreflightError};
use serde_json::json;

use crate::fixtures::{
    fixed_now, key_entry, key_manifest, well_known_route, MockFetcher, TestKey, PUBLISHER,
};

#[tokio::test]
async fn test_published_key_accepted() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![key_entry("k1", &TestKey::generate()), key_entry("k2", &key)]),
    );

    let entry = validate_signing_key(&key.private_key, PUBLISHER, None, &fetcher, fixed_now())
        .await
        .unwrap();
    assert_eq!(entry.key_id, "k2");

    let entry =
        validate_signing_key(&key.private_key, PUBLISHER, Some("k2"), &fetcher, fixed_now())
            .await
            .unwrap();
    assert_eq!(entry.public_key, key.public_key_b64);
}

#[tokio::test]
async fn test_unknown_key_id() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![key_entry("k1", &key)]),
    );

    let err = validate_signing_key(&key.private_key, PUBLISHER, Some("k9"), &fetcher, fixed_now())
        .await
        .unwrap_err();

    assert!(matches!(err, PreflightError::KeyNotFound { ref key_id, .. } if key_id == "k9"));
}

#[tokio::test]
async fn test_empty_manifest() {
    let key = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(&well_known_route(PUBLISHER), key_manifest(vec![]));

    let err = validate_signing_key(&key.private_key, PUBLISHER, None, &fetcher, fixed_now())
        .await
        .unwrap_err();

    assert!(matches!(err, PreflightError::NoKeys { .. }));
}

#[tokio::test]
async fn test_revoked_and_expired_keys_reported() {
    let key = TestKey::generate();
    let mut revoked = key_entry("revoked", &key);
    revoked["revoked"] = json!(true);
    let mut expired = key_entry("expired", &key);
    expired["expires"] = json!("2020-01-01T00:00:00Z");
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![revoked, expired]),
    );

    let err =
        validate_signing_key(&key.private_key, PUBLISHER, Some("revoked"), &fetcher, fixed_now())
            .await
            .unwrap_err();
    assert!(matches!(err, PreflightError::Revoked { .. }));

    let err =
        validate_signing_key(&key.private_key, PUBLISHER, Some("expired"), &fetcher, fixed_now())
            .await
            .unwrap_err();
    assert_eq!(err.to_string(), "Key expired expired at 2020-01-01T00:00:00Z");

    let err = validate_signing_key(&key.private_key, PUBLISHER, None, &fetcher, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, PreflightError::NoValidMatch { .. }));
}

#[tokio::test]
async fn test_mismatched_key_reported_with_previews() {
    let key = TestKey::generate();
    let published = TestKey::generate();
    let fetcher = MockFetcher::new().with_json(
        &well_known_route(PUBLISHER),
        key_manifest(vec![key_entry("k1", &published)]),
    );

    let err = validate_signing_key(&key.private_key, PUBLISHER, Some("k1"), &fetcher, fixed_now())
        .await
        .unwrap_err();

    match err {
        PreflightError::Mismatch {
            derived, published: shown, ..
        } => {
            assert_eq!(derived, key.public_key_b64[..8]);
            assert_eq!(shown, published.public_key_b64[..8]);
        }
        other => panic!("expected a mismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_private_key_and_unreachable_publisher() {
    let fetcher = MockFetcher::new().with_failure(&well_known_route(PUBLISHER));

    let err = validate_signing_key(&[0u8; 3], PUBLISHER, None, &fetcher, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, PreflightError::InvalidKey(_)));
    assert!(fetcher.calls().is_empty());

    let key = TestKey::generate();
    let err = validate_signing_key(&key.private_key, PUBLISHER, None, &fetcher, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, PreflightError::FetchFailed { .. }));
}
