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

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::types::{DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_DOH_ENDPOINT};

/// Per-call verification options.
///
/// `now` pins the instant key expiry is judged against; when unset the
/// wall clock is read once at the start of each verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    pub now: Option<DateTime<Utc>>,
    pub resolve_txt: bool,
    pub require_key_id: bool,
    pub dns_timeout: Duration,
    pub doh_endpoint: String,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            now: None,
            resolve_txt: true,
            require_key_id: false,
            dns_timeout: Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS),
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
        }
    }
}

impl VerifyOptions {
    /// HTTPS-only resolution.
    pub fn https_only() -> Self {
        Self::default().with_resolve_txt(false)
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_resolve_txt(mut self, resolve_txt: bool) -> Self {
        self.resolve_txt = resolve_txt;
        self
    }

    pub fn with_require_key_id(mut self, require_key_id: bool) -> Self {
        self.require_key_id = require_key_id;
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    pub fn with_doh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.doh_endpoint = endpoint.into();
        self
    }

    /// The pinned instant, or the current time.
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}
