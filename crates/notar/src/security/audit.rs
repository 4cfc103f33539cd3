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

//! Security audit logging.
//!
//! Structured events for every security-relevant step:
//! - Document and package signing (success/failure)
//! - Key resolution through the HTTPS and DNS channels
//! - Signature verification and archive integrity checks
//!
//! Events are logged using the `tracing` crate with an `event_type` field
//! so they can be filtered and forwarded to a SIEM.

use crate::types::{KeySource, VerifyErrorCode};

/// Event types for signing and verification.
pub mod events {
    /// Document signed event type.
    pub const DOCUMENT_SIGNED: &str = "document.signed";
    /// Package archive signed event type.
    pub const ARCHIVE_SIGNED: &str = "archive.signed";
    /// Signing failure event type.
    pub const SIGN_FAILURE: &str = "sign.failure";

    /// Public key resolved event type.
    pub const KEY_RESOLVED: &str = "key.resolved";
    /// Public key resolution failure event type.
    pub const KEY_RESOLUTION_FAILED: &str = "key.resolution_failed";
    /// Resolved key rejected (revoked or expired) event type.
    pub const KEY_REJECTED: &str = "key.rejected";

    /// Verification success event type.
    pub const VERIFICATION_SUCCESS: &str = "verification.success";
    /// Verification failure event type.
    pub const VERIFICATION_FAILURE: &str = "verification.failure";
    /// Archive file integrity failure event type.
    pub const INTEGRITY_FAILURE: &str = "integrity.failure";
}

/// Log a document signing event.
pub fn log_document_signed(name: &str, publisher: &str, key_id: &str, key_fingerprint: &str) {
    tracing::info!(
        event_type = events::DOCUMENT_SIGNED,
        name = %name,
        publisher = %publisher,
        key_id = %key_id,
        key_fingerprint = %key_fingerprint,
        "Document signed"
    );
}

/// Log a package signing event.
pub fn log_archive_signed(
    name: &str,
    publisher: &str,
    key_id: &str,
    key_fingerprint: &str,
    file_count: usize,
) {
    tracing::info!(
        event_type = events::ARCHIVE_SIGNED,
        name = %name,
        publisher = %publisher,
        key_id = %key_id,
        key_fingerprint = %key_fingerprint,
        file_count = file_count,
        "Package signed"
    );
}

/// Log a signing failure.
pub fn log_sign_failed(subject: &str, error: &str) {
    tracing::error!(
        event_type = events::SIGN_FAILURE,
        subject = %subject,
        error = %error,
        "Signing failed"
    );
}

/// Log a successful key resolution.
pub fn log_key_resolved(publisher: &str, key_id: &str, source: KeySource) {
    tracing::info!(
        event_type = events::KEY_RESOLVED,
        publisher = %publisher,
        key_id = %key_id,
        source = %source,
        "Public key resolved"
    );
}

/// Log a failed key resolution.
pub fn log_key_resolution_failed(
    publisher: &str,
    key_id: &str,
    source: KeySource,
    code: VerifyErrorCode,
    error: &str,
) {
    tracing::warn!(
        event_type = events::KEY_RESOLUTION_FAILED,
        publisher = %publisher,
        key_id = %key_id,
        source = %source,
        code = %code,
        error = %error,
        "Public key resolution failed"
    );
}

/// Log a resolved key that may not be used.
pub fn log_key_rejected(publisher: &str, key_id: &str, code: VerifyErrorCode, expires: &str) {
    tracing::warn!(
        event_type = events::KEY_REJECTED,
        publisher = %publisher,
        key_id = %key_id,
        code = %code,
        expires = %expires,
        "Public key rejected"
    );
}

/// Log a verification success event.
pub fn log_verification_success(
    name: Option<&str>,
    publisher: &str,
    key_id: &str,
    signer_count: usize,
) {
    tracing::info!(
        event_type = events::VERIFICATION_SUCCESS,
        name = name.unwrap_or("<unknown>"),
        publisher = %publisher,
        key_id = %key_id,
        signer_count = signer_count,
        "Signature verified successfully"
    );
}

/// Log a verification failure event.
pub fn log_verification_failure(name: Option<&str>, code: VerifyErrorCode, reason: &str) {
    tracing::warn!(
        event_type = events::VERIFICATION_FAILURE,
        name = name.unwrap_or("<unknown>"),
        code = %code,
        reason = %reason,
        "Signature verification failed"
    );
}

/// Log a file that failed the manifest hash check.
pub fn log_integrity_failure(path: &str, code: VerifyErrorCode, expected: &str, actual: Option<&str>) {
    tracing::warn!(
        event_type = events::INTEGRITY_FAILURE,
        path = %path,
        code = %code,
        expected_hash = %expected,
        actual_hash = actual.unwrap_or("<missing>"),
        "Package file failed integrity check"
    );
}
