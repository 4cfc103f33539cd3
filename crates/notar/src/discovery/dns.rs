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

//! DNS TXT key channel.
//!
//! A publisher may mirror a key as a TXT record at `notar.<keyId>.<domain>`:
//!
//! ```text
//! v=sk1; k=ed25519; p=<base64 public key>; exp=<unix seconds>
//! ```
//!
//! Records are looked up through a DNS-over-HTTPS JSON endpoint so the
//! channel shares the injected [`Fetcher`] with the HTTPS channel.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::fetch::{FetchError, Fetcher};
use super::well_known::{PublicKeyEntry, KEY_ALGORITHM};
use super::{KeyResolution, ResolutionFailure, ResolvedKey};
use crate::config::VerifyOptions;
use crate::types::{KeySource, VerifyErrorCode};

/// Leading label of every key record name.
pub const DNS_RECORD_PREFIX: &str = "notar";

/// Supported record version tag.
pub const DNS_RECORD_VERSION: &str = "sk1";

/// DNS resource record type of TXT answers.
pub const TXT_RECORD_TYPE: u16 = 16;

/// Parsed key record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsTxtKeyRecord {
    pub version: String,
    pub algorithm: String,
    pub public_key: String,
    /// Expiry as unix seconds.
    pub expires: i64,
}

impl DnsTxtKeyRecord {
    /// Converts the record into the key entry shape the HTTPS channel uses.
    pub fn into_entry(self, key_id: &str) -> PublicKeyEntry {
        let expires = Utc
            .timestamp_opt(self.expires, 0)
            .single()
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();

        PublicKeyEntry {
            key_id: key_id.to_string(),
            algorithm: self.algorithm,
            public_key: self.public_key,
            expires,
            revoked: false,
        }
    }
}

/// A record ready to publish: the name relative to the publisher's zone and
/// the TXT value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsTxtRecord {
    pub fqdn: String,
    pub value: String,
}

/// Parses a TXT value into a key record.
///
/// Returns `None` unless the value carries `v=sk1`, `k=ed25519`, a
/// non-empty `p` and a positive numeric `exp`. Tags may appear in any
/// order; whitespace around separators is ignored.
pub fn parse_dns_txt_record(txt: &str) -> Option<DnsTxtKeyRecord> {
    let mut tags: HashMap<&str, &str> = HashMap::new();

    for part in txt.split(';').map(str::trim).filter(|part| !part.is_empty()) {
        let eq = part.find('=')?;
        if eq == 0 {
            return None;
        }
        tags.insert(part[..eq].trim(), part[eq + 1..].trim());
    }

    let tag = |name: &str| tags.get(name).copied().filter(|value| !value.is_empty());
    let version = tag("v")?;
    let algorithm = tag("k")?;
    let public_key = tag("p")?;
    let exp = tag("exp")?;

    if version != DNS_RECORD_VERSION || algorithm != KEY_ALGORITHM {
        return None;
    }

    let exp: f64 = exp.parse().ok()?;
    if !exp.is_finite() || exp <= 0.0 {
        return None;
    }

    Some(DnsTxtKeyRecord {
        version: version.to_string(),
        algorithm: algorithm.to_string(),
        public_key: public_key.to_string(),
        expires: exp.floor() as i64,
    })
}

/// Formats the TXT record that publishes `public_key` under `key_id`.
pub fn format_dns_txt_record(key_id: &str, public_key: &str, expires: i64) -> DnsTxtRecord {
    DnsTxtRecord {
        fqdn: format!("{DNS_RECORD_PREFIX}.{key_id}"),
        value: format!(
            "v={DNS_RECORD_VERSION}; k={KEY_ALGORITHM}; p={public_key}; exp={expires}"
        ),
    }
}

/// Fully qualified record name for `key_id` of `publisher`.
pub fn dns_record_name(publisher: &str, key_id: &str) -> String {
    format!("{DNS_RECORD_PREFIX}.{key_id}.{publisher}")
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: i64,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// Looks up the TXT values at `name` through a DNS-over-HTTPS endpoint.
///
/// An error status, a non-zero DNS status or an unreadable answer yields
/// no records.
///
/// # Errors
///
/// Returns `FetchError` if the endpoint is not a URL or the request fails.
pub async fn query_txt_records(
    fetcher: &dyn Fetcher,
    endpoint: &str,
    name: &str,
) -> Result<Vec<String>, FetchError> {
    let mut url = url::Url::parse(endpoint).map_err(|e| FetchError::Transport {
        url: endpoint.to_string(),
        message: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("name", name)
        .append_pair("type", "TXT");

    let response = fetcher
        .get(url.as_str(), &[("accept", "application/dns-json")])
        .await?;

    if !response.is_success() {
        tracing::debug!(name, status = response.status, "DNS-over-HTTPS query rejected");
        return Ok(Vec::new());
    }

    let parsed: DohResponse = match response.json() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(name, error = %err, "unreadable DNS-over-HTTPS answer");
            return Ok(Vec::new());
        }
    };

    if parsed.status != 0 {
        tracing::debug!(name, dns_status = parsed.status, "DNS query returned an error status");
        return Ok(Vec::new());
    }

    Ok(parsed
        .answer
        .into_iter()
        .filter(|answer| answer.record_type == TXT_RECORD_TYPE)
        .map(|answer| strip_txt_quotes(&answer.data).to_string())
        .collect())
}

fn strip_txt_quotes(data: &str) -> &str {
    let data = data.strip_prefix('"').unwrap_or(data);
    data.strip_suffix('"').unwrap_or(data)
}

/// Resolves `key_id` through the DNS channel, bounded by the configured timeout.
///
/// The first parseable record wins.
pub async fn resolve_from_dns(
    fetcher: &dyn Fetcher,
    options: &VerifyOptions,
    publisher: &str,
    key_id: &str,
    now: DateTime<Utc>,
) -> KeyResolution {
    let name = dns_record_name(publisher, key_id);
    let failure = |code, message: String| ResolutionFailure {
        source: KeySource::Dns,
        code,
        message,
    };

    let lookup = query_txt_records(fetcher, &options.doh_endpoint, &name);
    let records = match tokio::time::timeout(options.dns_timeout, lookup).await {
        Ok(Ok(records)) => records,
        Ok(Err(err)) => {
            return Err(failure(
                VerifyErrorCode::DnsResolutionFailed,
                err.to_string(),
            ))
        }
        Err(_) => {
            return Err(failure(
                VerifyErrorCode::DnsResolutionFailed,
                format!("DNS lookup for {name} timed out after {:?}", options.dns_timeout),
            ))
        }
    };

    match records.iter().find_map(|txt| parse_dns_txt_record(txt)) {
        Some(record) => {
            let entry = record.into_entry(key_id);
            let status = entry.status_at(now);
            Ok(ResolvedKey {
                entry,
                source: KeySource::Dns,
                status,
            })
        }
        None => Err(failure(
            VerifyErrorCode::KeyNotFound,
            format!("no key record at {name}"),
        )),
    }
}
