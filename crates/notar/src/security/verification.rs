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

//! Verification engine.
//!
//! Pipeline, for documents and archives alike:
//! 1. Parse the input (front matter or `MANIFEST.json`); no signatures is an
//!    immediate failure
//! 2. Rebuild the canonical base payload, excluding the signatures
//! 3. Check every signature entry independently and concurrently
//! 4. Accept if at least one signer is valid
//! 5. For archives, recompute every file hash against the manifest
//!
//! Keys come either from the caller ([`verify`], [`verify_document`],
//! [`verify_archive`]) or from the signer's publisher over HTTPS / DNS
//! ([`verify_from_publisher`] and friends).

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;

use super::audit;
use crate::config::VerifyOptions;
use crate::crypto::{
    compute_sha256_hex, decode_base64_lenient, strip_signature_prefix, verify_encoded_signature,
    verify_signature, SigningError,
};
use crate::discovery::{
    collect_candidate_keys, resolve_public_key, Fetcher, KeyStatus, ResolverContext,
};
use crate::document::{base_payload, parse_document, scope_payload};
use crate::front_matter::{SignatureEntry, SIGNATURES_FIELD};
use crate::packaging::{canonical_json, extract_files, ArchiveFiles, HASH_PREFIX, MANIFEST_FILENAME};
use crate::types::{
    Content, DocumentMeta, FileIntegrity, FileIntegrityResult, SignerResult, VerifyDetails,
    VerifyErrorCode, VerifyResult,
};

const NO_VALID_SIGNATURE: &str = "No valid signature found";
const NO_MATCHING_SIGNATURE_FOR_KEY: &str = "No matching signature for provided key";
const SIGNATURE_DOES_NOT_MATCH: &str = "Signature does not match content";

/// A parsed input ready for signer checks.
struct SignedSubject {
    base_payload: String,
    signatures: Vec<SignatureEntry>,
    meta: DocumentMeta,
    /// Manifest hash table and archive contents, for archives only.
    package: Option<PackageContents>,
}

struct PackageContents {
    expected: IndexMap<String, String>,
    files: ArchiveFiles,
}

/// Verifies a document or archive against one caller-supplied public key.
pub fn verify(content: Content<'_>, public_key: &[u8]) -> VerifyResult {
    match content {
        Content::Document(raw) => verify_document(raw, public_key),
        Content::Archive(bytes) => verify_archive(bytes, public_key),
    }
}

/// Verifies a signed document against `public_key`.
pub fn verify_document(raw: &str, public_key: &[u8]) -> VerifyResult {
    verify_with_key(load_document(raw), public_key)
}

/// Verifies a signed package archive against `public_key`.
pub fn verify_archive(bytes: &[u8], public_key: &[u8]) -> VerifyResult {
    verify_with_key(load_archive(bytes), public_key)
}

fn verify_with_key(loaded: Result<SignedSubject, VerifyResult>, public_key: &[u8]) -> VerifyResult {
    let subject = match loaded {
        Ok(subject) => subject,
        Err(result) => return report(result),
    };

    let signers = subject
        .signatures
        .iter()
        .map(|entry| check_entry_with_key(entry, &subject.base_payload, public_key))
        .collect();

    conclude(subject, signers, NO_MATCHING_SIGNATURE_FOR_KEY)
}

fn check_entry_with_key(entry: &SignatureEntry, base: &str, public_key: &[u8]) -> SignerResult {
    let Some(encoded) = strip_signature_prefix(&entry.value) else {
        return malformed(entry);
    };

    let payload = scope_payload(&entry.publisher, base);
    let verified = decode_base64_lenient(encoded)
        .map_err(SigningError::from)
        .and_then(|signature| verify_signature(payload.as_bytes(), &signature, public_key));

    match verified {
        Ok(()) => SignerResult::verified(&entry.key_id, &entry.publisher),
        Err(_) => SignerResult::rejected(
            &entry.key_id,
            &entry.publisher,
            VerifyErrorCode::SignatureMismatch,
            SIGNATURE_DOES_NOT_MATCH,
        ),
    }
}

/// Verifies a document or archive with keys resolved from each signer's publisher.
pub async fn verify_from_publisher(
    content: Content<'_>,
    fetcher: &dyn Fetcher,
    options: &VerifyOptions,
) -> VerifyResult {
    match content {
        Content::Document(raw) => verify_document_from_publisher(raw, fetcher, options).await,
        Content::Archive(bytes) => verify_archive_from_publisher(bytes, fetcher, options).await,
    }
}

/// Verifies a signed document, resolving each signer's key from its publisher.
pub async fn verify_document_from_publisher(
    raw: &str,
    fetcher: &dyn Fetcher,
    options: &VerifyOptions,
) -> VerifyResult {
    verify_resolved(load_document(raw), fetcher, options).await
}

/// Verifies a signed archive, resolving each signer's key from its publisher.
pub async fn verify_archive_from_publisher(
    bytes: &[u8],
    fetcher: &dyn Fetcher,
    options: &VerifyOptions,
) -> VerifyResult {
    verify_resolved(load_archive(bytes), fetcher, options).await
}

async fn verify_resolved(
    loaded: Result<SignedSubject, VerifyResult>,
    fetcher: &dyn Fetcher,
    options: &VerifyOptions,
) -> VerifyResult {
    let subject = match loaded {
        Ok(subject) => subject,
        Err(result) => return report(result),
    };

    let ctx = ResolverContext::new(fetcher, options);
    let signers = join_all(
        subject
            .signatures
            .iter()
            .map(|entry| check_entry_resolved(entry, &subject.base_payload, &ctx)),
    )
    .await;

    conclude(subject, signers, NO_VALID_SIGNATURE)
}

async fn check_entry_resolved(
    entry: &SignatureEntry,
    base: &str,
    ctx: &ResolverContext<'_>,
) -> SignerResult {
    let Some(encoded) = strip_signature_prefix(&entry.value) else {
        return malformed(entry);
    };

    if entry.key_id.is_empty() {
        if ctx.options.require_key_id {
            return SignerResult::rejected(
                "",
                &entry.publisher,
                VerifyErrorCode::MissingKeyId,
                "Signature entry does not name a keyId",
            );
        }
        return check_against_all_keys(entry, base, encoded, ctx).await;
    }

    let resolved = match resolve_public_key(ctx, &entry.publisher, &entry.key_id).await {
        Ok(resolved) => resolved,
        Err(failure) => {
            return SignerResult::rejected(
                &entry.key_id,
                &entry.publisher,
                failure.code,
                format!(
                    "Could not resolve public key for {} ({})",
                    entry.publisher, entry.key_id
                ),
            )
        }
    };

    let key_expires = resolved.entry.expires.as_str();
    let reason = match resolved.status {
        KeyStatus::Active => None,
        KeyStatus::Revoked => Some(format!("Key {} has been revoked", entry.key_id)),
        KeyStatus::Expired => Some(format!("Key {} expired at {}", entry.key_id, key_expires)),
    };
    if let (Some(code), Some(reason)) = (resolved.status.error_code(), reason) {
        audit::log_key_rejected(&entry.publisher, &entry.key_id, code, key_expires);
        return SignerResult::rejected(&entry.key_id, &entry.publisher, code, reason)
            .with_key(resolved.source, key_expires);
    }

    let payload = scope_payload(&entry.publisher, base);
    let result = match verify_encoded_signature(payload.as_bytes(), encoded, &resolved.entry.public_key) {
        Ok(()) => SignerResult::verified(&entry.key_id, &entry.publisher),
        Err(_) => SignerResult::rejected(
            &entry.key_id,
            &entry.publisher,
            VerifyErrorCode::SignatureMismatch,
            SIGNATURE_DOES_NOT_MATCH,
        ),
    };
    result.with_key(resolved.source, key_expires)
}

/// Tries every currently valid key of the publisher for an entry without keyId.
async fn check_against_all_keys(
    entry: &SignatureEntry,
    base: &str,
    encoded: &str,
    ctx: &ResolverContext<'_>,
) -> SignerResult {
    let candidates = collect_candidate_keys(ctx, &entry.publisher).await;
    if candidates.is_empty() {
        return SignerResult::rejected(
            "",
            &entry.publisher,
            VerifyErrorCode::KeyNotFound,
            format!("No public keys found for {}", entry.publisher),
        );
    }

    let payload = scope_payload(&entry.publisher, base);
    for candidate in &candidates {
        if verify_encoded_signature(payload.as_bytes(), encoded, &candidate.entry.public_key).is_ok()
        {
            return SignerResult::verified(&candidate.entry.key_id, &entry.publisher)
                .with_key(candidate.source, &candidate.entry.expires);
        }
    }

    SignerResult::rejected(
        "",
        &entry.publisher,
        VerifyErrorCode::SignatureMismatch,
        format!(
            "Signature does not match any of {} key(s)",
            candidates.len()
        ),
    )
}

fn malformed(entry: &SignatureEntry) -> SignerResult {
    SignerResult::rejected(
        &entry.key_id,
        &entry.publisher,
        VerifyErrorCode::MalformedSignature,
        "Signature value must start with ed25519:",
    )
}

fn load_document(raw: &str) -> Result<SignedSubject, VerifyResult> {
    let document = parse_document(raw)
        .map_err(|err| VerifyResult::failure(VerifyErrorCode::InvalidFrontMatter, err.to_string()))?;
    let meta = document.meta();

    let signatures = document.signatures().to_vec();
    if signatures.is_empty() {
        return Err(no_signatures(meta));
    }

    Ok(SignedSubject {
        base_payload: base_payload(&document),
        signatures,
        meta,
        package: None,
    })
}

fn load_archive(bytes: &[u8]) -> Result<SignedSubject, VerifyResult> {
    let missing = |reason: String| VerifyResult::failure(VerifyErrorCode::MissingManifest, reason);

    let files = extract_files(bytes).map_err(|err| missing(format!("Unreadable package: {err}")))?;
    let raw_manifest = files
        .get(MANIFEST_FILENAME)
        .ok_or_else(|| missing(format!("Missing {MANIFEST_FILENAME} in package")))?;

    let mut manifest = match serde_json::from_slice::<Value>(raw_manifest) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(missing(format!("{MANIFEST_FILENAME} is not a JSON object"))),
        Err(err) => return Err(missing(format!("{MANIFEST_FILENAME} is not valid JSON: {err}"))),
    };

    let signatures: Vec<SignatureEntry> = match manifest.remove(SIGNATURES_FIELD) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };

    let text = |key: &str| manifest.get(key).and_then(Value::as_str).map(str::to_string);
    let meta = DocumentMeta {
        name: text("name"),
        description: text("description"),
        version: text("version"),
        author: text("author"),
    };

    if signatures.is_empty() {
        return Err(no_signatures(meta));
    }

    let expected = match manifest.get("files") {
        Some(Value::Object(table)) => table
            .iter()
            .map(|(path, hash)| (path.clone(), hash.as_str().unwrap_or_default().to_string()))
            .collect(),
        _ => IndexMap::new(),
    };

    let base_payload = canonical_json(&Value::Object(manifest))
        .map_err(|err| missing(format!("{MANIFEST_FILENAME} cannot be canonicalized: {err}")))?;

    Ok(SignedSubject {
        base_payload,
        signatures,
        meta,
        package: Some(PackageContents { expected, files }),
    })
}

fn no_signatures(meta: DocumentMeta) -> VerifyResult {
    VerifyResult::failure(VerifyErrorCode::NoSignatures, "No signatures found")
        .with_details(VerifyDetails::from_meta(meta))
}

/// Compares each manifest entry with the archive, in manifest order.
pub fn check_file_integrity(
    expected: &IndexMap<String, String>,
    files: &ArchiveFiles,
) -> Vec<FileIntegrityResult> {
    expected
        .iter()
        .map(|(path, expected_hash)| {
            let integrity = match files.get(path) {
                None => FileIntegrity::Missing {
                    expected: expected_hash.clone(),
                },
                Some(contents) => {
                    let actual = format!("{HASH_PREFIX}{}", compute_sha256_hex(contents));
                    if &actual == expected_hash {
                        FileIntegrity::Verified { hash: actual }
                    } else {
                        FileIntegrity::HashMismatch {
                            expected: expected_hash.clone(),
                            actual,
                        }
                    }
                }
            };
            FileIntegrityResult {
                path: path.clone(),
                integrity,
            }
        })
        .collect()
}

/// Aggregates signer outcomes and, for archives, runs the integrity check.
fn conclude(
    subject: SignedSubject,
    signers: Vec<SignerResult>,
    no_match_reason: &str,
) -> VerifyResult {
    let SignedSubject { meta, package, .. } = subject;
    let mut details = VerifyDetails::from_meta(meta);
    details.signers = signers;

    let Some(signer) = details.signers.iter().find(|signer| signer.valid).cloned() else {
        return report(
            VerifyResult::failure(VerifyErrorCode::NoMatchingSignature, no_match_reason)
                .with_details(details),
        );
    };

    if let Some(package) = package {
        let files = check_file_integrity(&package.expected, &package.files);
        let first_failure = files.iter().find(|file| !file.is_valid()).cloned();
        details.files = Some(files);

        if let Some(file) = first_failure {
            let code = file.code().unwrap_or(VerifyErrorCode::HashMismatch);
            audit::log_integrity_failure(&file.path, code, file.expected_hash(), file.actual_hash());
            let reason = match code {
                VerifyErrorCode::MissingFile => format!("Missing file: {}", file.path),
                _ => format!("Hash mismatch for file: {}", file.path),
            };
            return report(VerifyResult::failure(code, reason).with_details(details));
        }
    }

    let signer_count = details.signers.iter().filter(|s| s.valid).count();
    audit::log_verification_success(
        details.meta.name.as_deref(),
        &signer.publisher,
        &signer.key_id,
        signer_count,
    );
    VerifyResult::success(details)
}

/// Audits a failed result and passes it through.
fn report(result: VerifyResult) -> VerifyResult {
    if let (Some(code), Some(reason)) = (result.code, result.reason.as_deref()) {
        let name = result
            .details
            .as_ref()
            .and_then(|details| details.meta.name.as_deref());
        audit::log_verification_failure(name, code, reason);
    }
    result
}
