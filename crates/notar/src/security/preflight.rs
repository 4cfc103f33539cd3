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

//! Pre-flight check that a signing key is published by its publisher.
//!
//! Signing with a key the publisher does not advertise produces signatures
//! nobody can verify; this check catches that before anything is signed.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::crypto::{derive_public_key, encode_base64, SigningError};
use crate::discovery::{fetch_key_manifest, keys_url, Fetcher, KeyStatus, PublicKeyEntry};

/// Characters of a base64 key shown in mismatch diagnostics.
const KEY_PREVIEW_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(#[from] SigningError),

    #[error("Cannot validate key: failed to fetch {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Key {key_id} not found at {url}")]
    KeyNotFound { key_id: String, url: String },

    #[error("No keys found at {url}")]
    NoKeys { url: String },

    #[error("Key {key_id} has been revoked")]
    Revoked { key_id: String },

    #[error("Key {key_id} expired at {expires}")]
    Expired { key_id: String, expires: String },

    #[error("Key {key_id} does not match: signing key {derived}..., published key {published}...")]
    Mismatch {
        key_id: String,
        derived: String,
        published: String,
    },

    #[error("Signing key does not match any valid key published by {publisher}")]
    NoValidMatch { publisher: String },
}

/// Checks that `private_key` belongs to a valid key published by `publisher`.
///
/// # Arguments
///
/// * `private_key` - The 32-byte Ed25519 private key seed
/// * `publisher` - Domain whose key manifest is consulted
/// * `key_id` - Restricts the search to one published key
/// * `fetcher` - HTTP capability used to fetch the manifest
/// * `now` - Instant key expiry is judged against
///
/// # Returns
///
/// The published entry matching the key.
///
/// # Errors
///
/// Returns `PreflightError` describing why no entry matched. With a
/// `key_id`, the first entry carrying that id decides between revoked,
/// expired and mismatch.
pub async fn validate_signing_key(
    private_key: &[u8],
    publisher: &str,
    key_id: Option<&str>,
    fetcher: &dyn Fetcher,
    now: DateTime<Utc>,
) -> Result<PublicKeyEntry, PreflightError> {
    let derived = derive_public_key(private_key)?;
    let url = keys_url(publisher);

    let manifest = fetch_key_manifest(fetcher, publisher)
        .await
        .map_err(|err| PreflightError::FetchFailed {
            url: url.clone(),
            message: err.to_string(),
        })?;

    let candidates: Vec<PublicKeyEntry> = manifest
        .keys
        .into_iter()
        .filter(|entry| key_id.map_or(true, |id| entry.key_id == id))
        .collect();

    let Some(first) = candidates.first() else {
        return Err(match key_id {
            Some(id) => PreflightError::KeyNotFound {
                key_id: id.to_string(),
                url,
            },
            None => PreflightError::NoKeys { url },
        });
    };

    let matches_derived =
        |entry: &PublicKeyEntry| entry.public_key_bytes().is_ok_and(|bytes| bytes == derived);

    if let Some(found) = candidates
        .iter()
        .find(|entry| entry.status_at(now) == KeyStatus::Active && matches_derived(entry))
    {
        tracing::debug!(publisher, key_id = %found.key_id, "signing key matches published key");
        return Ok(found.clone());
    }

    if key_id.is_none() {
        return Err(PreflightError::NoValidMatch {
            publisher: publisher.to_string(),
        });
    }

    Err(match first.status_at(now) {
        KeyStatus::Revoked => PreflightError::Revoked {
            key_id: first.key_id.clone(),
        },
        KeyStatus::Expired => PreflightError::Expired {
            key_id: first.key_id.clone(),
            expires: first.expires.clone(),
        },
        KeyStatus::Active => PreflightError::Mismatch {
            key_id: first.key_id.clone(),
            derived: preview(&encode_base64(&derived)),
            published: preview(&first.public_key),
        },
    })
}

fn preview(key: &str) -> String {
    key.chars().take(KEY_PREVIEW_LEN).collect()
}
