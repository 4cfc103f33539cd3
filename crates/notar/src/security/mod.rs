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

//! Signing, verification, and signing-key preflight.
//!
//! This module provides:
//! - [`sign`], [`sign_document`], [`sign_archive`] for producing signatures
//! - [`verify`] and [`verify_from_publisher`] with their per-format variants
//! - [`validate_signing_key`] to check a private key against a publisher
//! - Security audit logging for SIEM integration

pub mod audit;
mod preflight;
mod signer;
mod verification;

pub use preflight::{validate_signing_key, PreflightError};
pub use signer::{sign, sign_archive, sign_document, SignError, SignOptions, SignedContent};
pub use verification::{
    check_file_integrity, verify, verify_archive, verify_archive_from_publisher, verify_document,
    verify_document_from_publisher, verify_from_publisher,
};
