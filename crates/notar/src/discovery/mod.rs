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

//! Public key discovery.
//!
//! A publisher's keys are looked up through two independent channels, the
//! HTTPS key manifest ([`well_known`]) and DNS TXT records ([`dns`]). The
//! [`resolver`] races them for a single key and merges them when every
//! valid key is needed.

pub mod dns;
pub mod fetch;
pub mod resolver;
pub mod well_known;

use crate::types::{KeySource, VerifyErrorCode};

pub use dns::{
    dns_record_name, format_dns_txt_record, parse_dns_txt_record, query_txt_records,
    resolve_from_dns, DnsTxtKeyRecord, DnsTxtRecord,
};
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use resolver::{collect_candidate_keys, resolve_public_key, CandidateKey, ResolverContext};
pub use well_known::{
    fetch_key_manifest, fetch_public_key, fetch_public_keys, keys_url, resolve_from_https,
    DiscoveryError, KeyManifest, KeyStatus, PublicKeyEntry,
};

/// A key found by one of the channels, whatever its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub entry: PublicKeyEntry,
    pub source: KeySource,
    pub status: KeyStatus,
}

/// A channel that did not find the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub source: KeySource,
    pub code: VerifyErrorCode,
    pub message: String,
}

pub type KeyResolution = Result<ResolvedKey, ResolutionFailure>;
