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

//! Result types shared by the signing and verification engines.
//!
//! Verification never fails with an `Err`: every outcome, including
//! structural problems with the input, is described by a [`VerifyResult`]
//! carrying a [`VerifyErrorCode`] and per-signer / per-file details.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of verification outcome codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyErrorCode {
    NoSignatures,
    MalformedSignature,
    MissingKeyId,
    SignatureMismatch,
    NoMatchingSignature,
    KeyNotFound,
    KeyExpired,
    KeyRevoked,
    KeyFetchFailed,
    MissingManifest,
    MissingFile,
    HashMismatch,
    InvalidFrontMatter,
    NetworkError,
    DnsResolutionFailed,
}

impl VerifyErrorCode {
    /// Wire name of the code, e.g. `KEY_EXPIRED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSignatures => "NO_SIGNATURES",
            Self::MalformedSignature => "MALFORMED_SIGNATURE",
            Self::MissingKeyId => "MISSING_KEY_ID",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::NoMatchingSignature => "NO_MATCHING_SIGNATURE",
            Self::KeyNotFound => "KEY_NOT_FOUND",
            Self::KeyExpired => "KEY_EXPIRED",
            Self::KeyRevoked => "KEY_REVOKED",
            Self::KeyFetchFailed => "KEY_FETCH_FAILED",
            Self::MissingManifest => "MISSING_MANIFEST",
            Self::MissingFile => "MISSING_FILE",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::InvalidFrontMatter => "INVALID_FRONT_MATTER",
            Self::NetworkError => "NETWORK_ERROR",
            Self::DnsResolutionFailed => "DNS_RESOLUTION_FAILED",
        }
    }
}

impl fmt::Display for VerifyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel a public key was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Https,
    Dns,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Https => f.write_str("https"),
            Self::Dns => f.write_str("dns"),
        }
    }
}

/// Input accepted by the unified sign/verify entry points.
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    /// A text document with a front-matter header.
    Document(&'a str),
    /// A zip archive carrying a `MANIFEST.json`.
    Archive(&'a [u8]),
}

/// Descriptive metadata of a signed document or package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
}

/// Outcome of checking one signature entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerResult {
    pub key_id: String,
    pub publisher: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<VerifyErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_source: Option<KeySource>,
    /// ISO-8601 expiry of the key that was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_expires: Option<String>,
}

impl SignerResult {
    pub(crate) fn verified(key_id: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            publisher: publisher.into(),
            valid: true,
            code: None,
            reason: None,
            key_source: None,
            key_expires: None,
        }
    }

    pub(crate) fn rejected(
        key_id: impl Into<String>,
        publisher: impl Into<String>,
        code: VerifyErrorCode,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            publisher: publisher.into(),
            valid: false,
            code: Some(code),
            reason: Some(reason.into()),
            key_source: None,
            key_expires: None,
        }
    }

    pub(crate) fn with_key(mut self, source: KeySource, expires: &str) -> Self {
        self.key_source = Some(source);
        if !expires.is_empty() {
            self.key_expires = Some(expires.to_string());
        }
        self
    }
}

/// Result of comparing one manifest entry with the archive contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileIntegrity {
    Verified { hash: String },
    Missing { expected: String },
    HashMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIntegrityResult {
    pub path: String,
    #[serde(flatten)]
    pub integrity: FileIntegrity,
}

impl FileIntegrityResult {
    pub fn is_valid(&self) -> bool {
        matches!(self.integrity, FileIntegrity::Verified { .. })
    }

    pub fn code(&self) -> Option<VerifyErrorCode> {
        match self.integrity {
            FileIntegrity::Verified { .. } => None,
            FileIntegrity::Missing { .. } => Some(VerifyErrorCode::MissingFile),
            FileIntegrity::HashMismatch { .. } => Some(VerifyErrorCode::HashMismatch),
        }
    }

    pub fn expected_hash(&self) -> &str {
        match &self.integrity {
            FileIntegrity::Verified { hash } => hash,
            FileIntegrity::Missing { expected } | FileIntegrity::HashMismatch { expected, .. } => {
                expected
            }
        }
    }

    pub fn actual_hash(&self) -> Option<&str> {
        match &self.integrity {
            FileIntegrity::Verified { hash } => Some(hash),
            FileIntegrity::Missing { .. } => None,
            FileIntegrity::HashMismatch { actual, .. } => Some(actual),
        }
    }
}

/// Observability block attached to a [`VerifyResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyDetails {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signers: Vec<SignerResult>,
    /// Per-file results; only present for archives that reached the hash check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileIntegrityResult>>,
}

impl VerifyDetails {
    pub fn from_meta(meta: DocumentMeta) -> Self {
        Self {
            meta,
            ..Default::default()
        }
    }
}

/// Overall verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<VerifyErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<VerifyDetails>,
}

impl VerifyResult {
    pub fn success(details: VerifyDetails) -> Self {
        Self {
            valid: true,
            code: None,
            reason: None,
            details: Some(details),
        }
    }

    pub fn failure(code: VerifyErrorCode, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            code: Some(code),
            reason: Some(reason.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: VerifyDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Signer outcomes, empty when verification stopped before checking signers.
    pub fn signers(&self) -> &[SignerResult] {
        self.details
            .as_ref()
            .map(|d| d.signers.as_slice())
            .unwrap_or_default()
    }

    pub fn files(&self) -> &[FileIntegrityResult] {
        self.details
            .as_ref()
            .and_then(|d| d.files.as_deref())
            .unwrap_or_default()
    }
}
