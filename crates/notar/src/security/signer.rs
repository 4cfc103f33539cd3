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

//! Signing engine for documents and package archives.
//!
//! Signing appends one signature entry per (keyId, publisher) pair.
//! Re-signing with the same pair replaces the earlier entry; any other pair
//! is preserved, so several publishers can co-sign the same content.

use thiserror::Error;

use super::audit;
use crate::crypto::{
    compute_key_fingerprint, derive_public_key, encode_signature_value, sign_payload,
    SigningError,
};
use crate::document::{
    base_payload, parse_document, scope_payload, FrontMatterError, LEGACY_SIGNATURE_FIELD,
};
use crate::front_matter::{stringify, FieldValue, SignatureEntry, SIGNATURES_FIELD};
use crate::packaging::{
    build_manifest, extract_files, manifest_signable_payload, pack_files, ArchiveError,
    PackageManifest, PackageMetadata, LEGACY_SIGNATURE_FILENAME, MANIFEST_FILENAME,
};
use crate::types::Content;

/// Options for signing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Label of the signing key; empty when unset.
    pub key_id: Option<String>,
    /// Domain the signature is scoped to; defaults to the `author` field.
    pub publisher: Option<String>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }
}

/// Errors that can occur while signing.
#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    InvalidDocument(#[from] FrontMatterError),

    #[error("Publisher is required: pass a publisher or set author")]
    MissingPublisher,

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Package archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Failed to encode manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Signed output of [`sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedContent {
    Document(String),
    Archive(Vec<u8>),
}

/// Signs a document or archive.
///
/// For archives, `options` supply the keyId and publisher and `metadata`
/// the manifest fields; documents take their metadata from the header.
pub fn sign(
    content: Content<'_>,
    private_key: &[u8],
    options: &SignOptions,
    metadata: &PackageMetadata,
) -> Result<SignedContent, SignError> {
    match content {
        Content::Document(raw) => sign_document(raw, private_key, options).map(SignedContent::Document),
        Content::Archive(bytes) => {
            let mut metadata = metadata.clone();
            if let Some(key_id) = &options.key_id {
                metadata.key_id = Some(key_id.clone());
            }
            if let Some(publisher) = &options.publisher {
                metadata.publisher = Some(publisher.clone());
            }
            sign_archive(bytes, &metadata, private_key).map(SignedContent::Archive)
        }
    }
}

/// Signs a front-matter document and returns the re-serialized text.
///
/// The publisher is `options.publisher`, falling back to the `author`
/// field. A legacy singular `signature` field is dropped.
///
/// # Errors
///
/// Returns `SignError` if a required field or the publisher is missing, or
/// the private key is invalid.
pub fn sign_document(
    raw: &str,
    private_key: &[u8],
    options: &SignOptions,
) -> Result<String, SignError> {
    let result = sign_document_inner(raw, private_key, options);
    if let Err(err) = &result {
        audit::log_sign_failed("document", &err.to_string());
    }
    result
}

fn sign_document_inner(
    raw: &str,
    private_key: &[u8],
    options: &SignOptions,
) -> Result<String, SignError> {
    let mut document = parse_document(raw)?;

    let publisher = options
        .publisher
        .clone()
        .filter(|publisher| !publisher.is_empty())
        .or_else(|| document.text_field("author"))
        .ok_or(SignError::MissingPublisher)?;
    let key_id = options.key_id.clone().unwrap_or_default();

    document.fields.shift_remove(LEGACY_SIGNATURE_FIELD);

    let payload = scope_payload(&publisher, &base_payload(&document));
    let signature = sign_payload(payload.as_bytes(), private_key)?;
    let entry = SignatureEntry::new(key_id, publisher, encode_signature_value(&signature));

    let signatures = merge_signatures(document.signatures(), entry.clone());
    document
        .fields
        .insert(SIGNATURES_FIELD.to_string(), FieldValue::Signatures(signatures));

    audit::log_document_signed(
        document.text_field("name").as_deref().unwrap_or_default(),
        &entry.publisher,
        &entry.key_id,
        &compute_key_fingerprint(&derive_public_key(private_key)?),
    );

    Ok(stringify(&document.body, &document.fields))
}

/// Signs a package archive and returns the repacked archive.
///
/// The manifest is rebuilt from the current archive contents. Signatures
/// from an existing `MANIFEST.json` are carried over unless they belong to
/// the same (keyId, publisher) pair. Only the old `signatures` array is
/// read; an unreadable old manifest contributes none. The legacy `SIGNATURE` entry is removed.
///
/// # Errors
///
/// Returns `SignError` if the archive cannot be read or written, no
/// publisher is available, or the private key is invalid.
pub fn sign_archive(
    bytes: &[u8],
    metadata: &PackageMetadata,
    private_key: &[u8],
) -> Result<Vec<u8>, SignError> {
    let result = sign_archive_inner(bytes, metadata, private_key);
    if let Err(err) = &result {
        audit::log_sign_failed(&metadata.name, &err.to_string());
    }
    result
}

fn sign_archive_inner(
    bytes: &[u8],
    metadata: &PackageMetadata,
    private_key: &[u8],
) -> Result<Vec<u8>, SignError> {
    let publisher = metadata.publisher();
    if publisher.is_empty() {
        return Err(SignError::MissingPublisher);
    }

    let mut files = extract_files(bytes)?;
    let manifest = build_manifest(&files, metadata);

    let payload = manifest_signable_payload(publisher, &manifest)?;
    let signature = sign_payload(payload.as_bytes(), private_key)?;
    let entry = SignatureEntry::new(
        metadata.key_id.clone().unwrap_or_default(),
        publisher,
        encode_signature_value(&signature),
    );

    let previous = files
        .get(MANIFEST_FILENAME)
        .map(|raw| previous_signatures(raw))
        .unwrap_or_default();

    let signed = PackageManifest {
        signatures: merge_signatures(&previous, entry.clone()),
        ..manifest
    };
    let file_count = signed.files.len();

    files.insert(MANIFEST_FILENAME.to_string(), serde_json::to_vec_pretty(&signed)?);
    files.remove(LEGACY_SIGNATURE_FILENAME);
    let archive = pack_files(&files)?;

    audit::log_archive_signed(
        &signed.name,
        &entry.publisher,
        &entry.key_id,
        &compute_key_fingerprint(&derive_public_key(private_key)?),
        file_count,
    );

    Ok(archive)
}

/// Signature entries of an old manifest; the rest of it is not read.
fn previous_signatures(raw: &[u8]) -> Vec<SignatureEntry> {
    let Ok(serde_json::Value::Object(mut old)) = serde_json::from_slice(raw) else {
        return Vec::new();
    };
    match old.remove(SIGNATURES_FIELD) {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<SignatureEntry>(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Drops any entry for the same signer and appends `entry`.
fn merge_signatures(existing: &[SignatureEntry], entry: SignatureEntry) -> Vec<SignatureEntry> {
    let mut merged: Vec<SignatureEntry> = existing
        .iter()
        .filter(|previous| !previous.same_signer(&entry))
        .cloned()
        .collect();
    merged.push(entry);
    merged
}
