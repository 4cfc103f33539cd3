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

//! Combines the HTTPS and DNS channels.

use chrono::{DateTime, Utc};
use futures::future::{self, Either};
use std::future::Future;
use std::pin::pin;

use super::dns::resolve_from_dns;
use super::fetch::Fetcher;
use super::well_known::{fetch_public_keys, resolve_from_https, KeyStatus, PublicKeyEntry};
use super::KeyResolution;
use crate::config::VerifyOptions;
use crate::security::audit;
use crate::types::KeySource;

/// keyId queried over DNS when a signature does not name one.
pub const DEFAULT_DNS_KEY_ID: &str = "key";

/// Read-only inputs shared by every resolution in one verification.
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub options: &'a VerifyOptions,
    pub now: DateTime<Utc>,
}

impl<'a> ResolverContext<'a> {
    /// Pins `now` from the options (or the wall clock) for the whole call.
    pub fn new(fetcher: &'a dyn Fetcher, options: &'a VerifyOptions) -> Self {
        Self {
            fetcher,
            options,
            now: options.now(),
        }
    }
}

/// Resolves `key_id` of `publisher`.
///
/// With DNS enabled both channels run concurrently and the first one to find
/// the key wins, even when that key is revoked or expired. When both fail
/// the HTTPS failure is reported.
pub async fn resolve_public_key(
    ctx: &ResolverContext<'_>,
    publisher: &str,
    key_id: &str,
) -> KeyResolution {
    let https = resolve_from_https(ctx.fetcher, publisher, key_id, ctx.now);

    let resolution = if ctx.options.resolve_txt {
        let dns = resolve_from_dns(ctx.fetcher, ctx.options, publisher, key_id, ctx.now);
        first_found(https, dns).await
    } else {
        https.await
    };

    match &resolution {
        Ok(found) => audit::log_key_resolved(publisher, key_id, found.source),
        Err(failure) => audit::log_key_resolution_failed(
            publisher,
            key_id,
            failure.source,
            failure.code,
            &failure.message,
        ),
    }

    resolution
}

async fn first_found(
    https: impl Future<Output = KeyResolution>,
    dns: impl Future<Output = KeyResolution>,
) -> KeyResolution {
    let https = pin!(https);
    let dns = pin!(dns);

    match future::select(https, dns).await {
        Either::Left((Ok(found), _)) | Either::Right((Ok(found), _)) => Ok(found),
        Either::Left((Err(https_failure), dns)) => match dns.await {
            Ok(found) => Ok(found),
            Err(dns_failure) => {
                tracing::debug!(error = %dns_failure.message, "DNS channel also failed");
                Err(https_failure)
            }
        },
        Either::Right((Err(dns_failure), https)) => {
            tracing::debug!(error = %dns_failure.message, "DNS channel failed first");
            https.await
        }
    }
}

/// A valid key that may have produced a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateKey {
    pub entry: PublicKeyEntry,
    pub source: KeySource,
}

/// Every currently valid key of `publisher`.
///
/// HTTPS keys come first; the DNS record at [`DEFAULT_DNS_KEY_ID`] is added
/// when it is valid and its public key is not already listed. Channel
/// failures contribute no keys.
pub async fn collect_candidate_keys(
    ctx: &ResolverContext<'_>,
    publisher: &str,
) -> Vec<CandidateKey> {
    let https = async {
        match fetch_public_keys(ctx.fetcher, publisher, ctx.now).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::debug!(publisher, error = %err, "no HTTPS keys for candidate search");
                Vec::new()
            }
        }
    };

    let dns = async {
        if !ctx.options.resolve_txt {
            return None;
        }
        resolve_from_dns(ctx.fetcher, ctx.options, publisher, DEFAULT_DNS_KEY_ID, ctx.now)
            .await
            .ok()
            .filter(|found| found.status == KeyStatus::Active)
    };

    let (https_keys, dns_key) = futures::join!(https, dns);

    let mut candidates: Vec<CandidateKey> = https_keys
        .into_iter()
        .map(|entry| CandidateKey {
            entry,
            source: KeySource::Https,
        })
        .collect();

    if let Some(found) = dns_key {
        let duplicate = candidates
            .iter()
            .any(|candidate| candidate.entry.public_key == found.entry.public_key);
        if !duplicate {
            candidates.push(CandidateKey {
                entry: found.entry,
                source: KeySource::Dns,
            });
        }
    }

    candidates
}
