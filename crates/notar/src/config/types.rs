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

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ConfigError, ValidationError};
use super::options::VerifyOptions;

/// Public DNS-over-HTTPS resolver used for TXT lookups.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration file.
///
/// ```toml
/// [discovery]
/// resolve_txt = true
/// dns_timeout_secs = 5
/// doh_endpoint = "${NOTAR_DOH_ENDPOINT:-https://cloudflare-dns.com/dns-query}"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotarConfig {
    pub discovery: DiscoveryConfig,
}

/// Key discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Race a DNS TXT lookup against the HTTPS key manifest.
    pub resolve_txt: bool,
    /// Reject signature entries that do not name a keyId.
    pub require_key_id: bool,
    pub dns_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub doh_endpoint: String,
    pub user_agent: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            resolve_txt: true,
            require_key_id: false,
            dns_timeout_secs: DEFAULT_DNS_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            user_agent: concat!("notar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl NotarConfig {
    /// Parses and validates a TOML document.
    ///
    /// Environment substitution is not applied; use [`super::ConfigLoader`]
    /// for files.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NotarConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let discovery = &self.discovery;

        for (field, timeout) in [
            ("dns_timeout_secs", discovery.dns_timeout_secs),
            ("http_timeout_secs", discovery.http_timeout_secs),
        ] {
            if timeout == 0 {
                return Err(ValidationError::InvalidTimeout {
                    field: field.to_string(),
                    timeout,
                });
            }
        }

        match url::Url::parse(&discovery.doh_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ValidationError::InvalidEndpoint {
                url: discovery.doh_endpoint.clone(),
            }),
        }
    }

    /// Verification options derived from the discovery settings.
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions::default()
            .with_resolve_txt(self.discovery.resolve_txt)
            .with_require_key_id(self.discovery.require_key_id)
            .with_dns_timeout(self.discovery.dns_timeout())
            .with_doh_endpoint(self.discovery.doh_endpoint.clone())
    }
}
