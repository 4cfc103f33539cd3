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

//! Configuration for key discovery and verification.
//!
//! [`NotarConfig`] is the file-backed configuration (TOML with `${VAR}`
//! substitution), [`VerifyOptions`] the per-call options threaded through
//! every resolution and verification call.

mod error;
mod loader;
mod options;
mod types;

pub use error::{ConfigError, ValidationError};
pub use loader::ConfigLoader;
pub use options::VerifyOptions;
pub use types::{
    DiscoveryConfig, NotarConfig, DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_DOH_ENDPOINT,
    DEFAULT_HTTP_TIMEOUT_SECS,
};
