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

//! HTTPS key manifest channel.
//!
//! Publishers serve their keys at `https://<domain>/.well-known/notar-keys.json`:
//!
//! ```json
//! {"keys": [{"keyId": "key_1", "algorithm": "ed25519",
//!            "publicKey": "<base64>", "expires": "2030-01-01T00:00:00Z",
//!            "revoked": false}]}
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::fetch::{FetchError, Fetcher};
use super::{KeyResolution, ResolutionFailure, ResolvedKey};
use crate::crypto::decode_base64_lenient;
use crate::types::{KeySource, VerifyErrorCode};

/// Path of the key manifest below the publisher's domain.
pub const WELL_KNOWN_KEYS_PATH: &str = ".well-known/notar-keys.json";

/// The only supported key algorithm.
pub const KEY_ALGORITHM: &str = "ed25519";

/// URL of a publisher's key manifest. Loopback hosts use plain HTTP.
pub fn keys_url(publisher: &str) -> String {
    let scheme = if publisher.starts_with("localhost") || publisher.starts_with("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{publisher}/{WELL_KNOWN_KEYS_PATH}")
}

/// Lifecycle state of a published key at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Revoked,
    Expired,
}

impl KeyStatus {
    pub fn error_code(self) -> Option<VerifyErrorCode> {
        match self {
            Self::Active => None,
            Self::Revoked => Some(VerifyErrorCode::KeyRevoked),
            Self::Expired => Some(VerifyErrorCode::KeyExpired),
        }
    }
}

/// One published key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyEntry {
    pub key_id: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Base64 Ed25519 public key.
    pub public_key: String,
    /// ISO-8601 expiry instant.
    #[serde(default)]
    pub expires: String,
    /// Any truthy JSON value revokes; `null` does not.
    #[serde(
        default,
        deserialize_with = "deserialize_revoked",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub revoked: bool,
}

fn deserialize_revoked<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn default_algorithm() -> String {
    KEY_ALGORITHM.to_string()
}

impl PublicKeyEntry {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.expires)
    }

    /// Revocation wins over expiry. A missing or unreadable expiry counts
    /// as expired.
    pub fn status_at(&self, now: DateTime<Utc>) -> KeyStatus {
        if self.revoked {
            return KeyStatus::Revoked;
        }
        match self.expires_at() {
            Some(expires) if expires > now => KeyStatus::Active,
            _ => KeyStatus::Expired,
        }
    }

    pub fn public_key_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        decode_base64_lenient(&self.public_key)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Document served at [`WELL_KNOWN_KEYS_PATH`].
///
/// Entries that do not read as a [`PublicKeyEntry`] are skipped so one bad
/// entry does not hide the publisher's other keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyManifest {
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub keys: Vec<PublicKeyEntry>,
}

fn deserialize_entries<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<PublicKeyEntry>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<PublicKeyEntry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable key manifest entry");
                None
            }
        })
        .collect())
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid key manifest at {url}: {source}")]
    InvalidManifest {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches and parses a publisher's key manifest.
///
/// # Errors
///
/// Returns `DiscoveryError` on transport failure, a non-2xx status or a body
/// that is not a key manifest.
pub async fn fetch_key_manifest(
    fetcher: &dyn Fetcher,
    publisher: &str,
) -> Result<KeyManifest, DiscoveryError> {
    let url = keys_url(publisher);
    let response = fetcher
        .get(&url, &[])
        .await
        .map_err(|source| DiscoveryError::Fetch {
            url: url.clone(),
            source,
        })?;

    if !response.is_success() {
        return Err(DiscoveryError::Status {
            url,
            status: response.status,
        });
    }

    let manifest: KeyManifest = response
        .json()
        .map_err(|source| DiscoveryError::InvalidManifest {
            url: url.clone(),
            source,
        })?;

    tracing::debug!(publisher, url = %url, keys = manifest.keys.len(), "fetched key manifest");
    Ok(manifest)
}

/// All keys of `publisher` that are neither revoked nor expired at `now`.
pub async fn fetch_public_keys(
    fetcher: &dyn Fetcher,
    publisher: &str,
    now: DateTime<Utc>,
) -> Result<Vec<PublicKeyEntry>, DiscoveryError> {
    let manifest = fetch_key_manifest(fetcher, publisher).await?;
    Ok(manifest
        .keys
        .into_iter()
        .filter(|key| key.status_at(now) == KeyStatus::Active)
        .collect())
}

/// The key `key_id` of `publisher`, if it exists and is valid at `now`.
pub async fn fetch_public_key(
    fetcher: &dyn Fetcher,
    publisher: &str,
    key_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<PublicKeyEntry>, DiscoveryError> {
    let manifest = fetch_key_manifest(fetcher, publisher).await?;
    Ok(manifest
        .keys
        .into_iter()
        .find(|key| key.key_id == key_id && key.status_at(now) == KeyStatus::Active))
}

/// Resolves `key_id` through the HTTPS channel.
///
/// A key that exists but is revoked or expired still resolves; its status
/// tells the caller not to use it.
pub async fn resolve_from_https(
    fetcher: &dyn Fetcher,
    publisher: &str,
    key_id: &str,
    now: DateTime<Utc>,
) -> KeyResolution {
    let failure = |code, message: String| ResolutionFailure {
        source: KeySource::Https,
        code,
        message,
    };

    let manifest = match fetch_key_manifest(fetcher, publisher).await {
        Ok(manifest) => manifest,
        Err(err @ DiscoveryError::Fetch { .. }) => {
            return Err(failure(VerifyErrorCode::NetworkError, err.to_string()))
        }
        Err(err) => return Err(failure(VerifyErrorCode::KeyFetchFailed, err.to_string())),
    };

    match manifest.keys.into_iter().find(|key| key.key_id == key_id) {
        Some(entry) => {
            let status = entry.status_at(now);
            Ok(ResolvedKey {
                entry,
                source: KeySource::Https,
                status,
            })
        }
        None => Err(failure(
            VerifyErrorCode::KeyNotFound,
            format!("key {key_id} not found at {}", keys_url(publisher)),
        )),
    }
}
