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

//! Shared fixtures: a scripted [`Fetcher`], test keys, and sample inputs.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use notar::crypto::encode_base64;
use notar::discovery::{FetchError, FetchResponse, Fetcher};
use notar::packaging::{pack_files, ArchiveFiles};
use notar::{generate_signing_keypair, PackageMetadata, VerifyOptions};
use serde_json::{json, Value};

pub const PUBLISHER: &str = "example.com";
pub const KEY_EXPIRES: &str = "2030-01-01T00:00:00Z";
/// 2030-01-01T00:00:00Z as unix seconds.
pub const KEY_EXPIRES_UNIX: i64 = 1_893_456_000;

pub const SAMPLE_DOCUMENT: &str = "---
name: test-file
description: A document used in tests
version: \"1.0\"
author: example.com
---
# Hello

This is the body.
";

/// Instant all resolving tests verify at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn https_options() -> VerifyOptions {
    VerifyOptions::https_only().with_now(fixed_now())
}

pub fn dns_options() -> VerifyOptions {
    VerifyOptions::default().with_now(fixed_now())
}

pub struct TestKey {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
    pub public_key_b64: String,
}

impl TestKey {
    pub fn generate() -> Self {
        let keypair = generate_signing_keypair();
        let public_key_b64 = encode_base64(&keypair.public_key);
        Self {
            private_key: keypair.private_key,
            public_key: keypair.public_key,
            public_key_b64,
        }
    }
}

pub fn key_entry(key_id: &str, key: &TestKey) -> Value {
    json!({
        "keyId": key_id,
        "algorithm": "ed25519",
        "publicKey": key.public_key_b64,
        "expires": KEY_EXPIRES,
    })
}

pub fn key_manifest(entries: Vec<Value>) -> Value {
    json!({ "keys": entries })
}

pub fn txt_value(key: &TestKey, exp: i64) -> String {
    format!("v=sk1; k=ed25519; p={}; exp={exp}", key.public_key_b64)
}

/// A DNS-over-HTTPS JSON answer carrying one TXT record.
pub fn doh_answer(name: &str, txt: &str) -> Value {
    json!({
        "Status": 0,
        "Answer": [{ "name": name, "type": 16, "TTL": 300, "data": format!("\"{txt}\"") }],
    })
}

/// URL fragment matching only the publisher's key manifest.
pub fn well_known_route(publisher: &str) -> String {
    format!("//{publisher}/.well-known/notar-keys.json")
}

/// URL fragment matching only the DoH query for `notar.<key_id>.<publisher>`.
pub fn dns_route(publisher: &str, key_id: &str) -> String {
    format!("name=notar.{key_id}.{publisher}&")
}

pub fn sample_archive() -> Vec<u8> {
    archive(&[("a.txt", "aaa"), ("b.txt", "bbb")])
}

pub fn archive(files: &[(&str, &str)]) -> Vec<u8> {
    let files: ArchiveFiles = files
        .iter()
        .map(|(path, contents)| (path.to_string(), contents.as_bytes().to_vec()))
        .collect();
    pack_files(&files).unwrap()
}

pub fn sample_metadata() -> PackageMetadata {
    PackageMetadata::new("sample-package", "A package used in tests", "1.0.0", PUBLISHER)
}

enum Reply {
    Response(FetchResponse),
    Failure(FetchError),
}

struct Route {
    pattern: String,
    reply: Reply,
    delay: Option<Duration>,
}

/// Fetcher answering from scripted routes.
///
/// The first route whose pattern is a substring of the URL answers;
/// anything else gets a 404.
#[derive(Default)]
pub struct MockFetcher {
    routes: Vec<Route>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, pattern: &str, body: Value) -> Self {
        self.with_response(pattern, 200, body.to_string())
    }

    pub fn with_response(mut self, pattern: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            reply: Reply::Response(FetchResponse::new(status, body)),
            delay: None,
        });
        self
    }

    pub fn with_failure(mut self, pattern: &str) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            reply: Reply::Failure(FetchError::Transport {
                url: pattern.to_string(),
                message: "connection refused".to_string(),
            }),
            delay: None,
        });
        self
    }

    /// Delays the most recently added route.
    pub fn delayed(mut self, delay: Duration) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.delay = Some(delay);
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn headers_for(&self, fragment: &str) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(url, _)| url.contains(fragment))
            .map(|(_, headers)| headers.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        ));

        let Some(route) = self.routes.iter().find(|route| url.contains(&route.pattern)) else {
            return Ok(FetchResponse::new(404, "not found"));
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        match &route.reply {
            Reply::Response(response) => Ok(response.clone()),
            Reply::Failure(error) => Err(error.clone()),
        }
    }
}
