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

//! Ed25519 signing utilities for content signatures.
//!
//! Provides functions for:
//! - Generating Ed25519 signing keypairs and deriving public keys
//! - Computing SHA256 content hashes and key fingerprints
//! - Signing payloads and verifying signatures
//! - Encoding signatures as `ed25519:<base64>` values

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::encoding::{decode_base64_lenient, encode_base64};

/// Prefix of every encoded signature value.
pub const SIGNATURE_PREFIX: &str = "ed25519:";

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Invalid private key: expected 32 bytes, got {0}")]
    InvalidPrivateKeyLength(usize),

    #[error("Invalid public key: expected 32 bytes, got {0}")]
    InvalidPublicKeyLength(usize),

    #[error("Invalid signature: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Failed to create verifying key: {0}")]
    KeyCreationFailed(String),

    #[error("Invalid base64 encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// A generated Ed25519 keypair.
pub struct GeneratedKeypair {
    /// The 32-byte private key seed
    pub private_key: Vec<u8>,
    /// The 32-byte public key
    pub public_key: Vec<u8>,
    /// SHA256 hex fingerprint of the public key
    pub fingerprint: String,
}

/// Generates a new Ed25519 signing keypair.
///
/// # Returns
///
/// A `GeneratedKeypair` containing the private key, public key, and fingerprint.
pub fn generate_signing_keypair() -> GeneratedKeypair {
    let mut csprng = rand::thread_rng();
    let signing_key = SigningKey::generate(&mut csprng);
    let public_key_bytes = signing_key.verifying_key().to_bytes();

    GeneratedKeypair {
        private_key: signing_key.to_bytes().to_vec(),
        public_key: public_key_bytes.to_vec(),
        fingerprint: compute_key_fingerprint(&public_key_bytes),
    }
}

fn signing_key(private_key: &[u8]) -> Result<SigningKey, SigningError> {
    let key_bytes: [u8; 32] = private_key
        .try_into()
        .map_err(|_| SigningError::InvalidPrivateKeyLength(private_key.len()))?;
    Ok(SigningKey::from_bytes(&key_bytes))
}

/// Derives the 32-byte public key belonging to a private key seed.
///
/// # Errors
///
/// Returns `SigningError::InvalidPrivateKeyLength` if the seed is not 32 bytes.
pub fn derive_public_key(private_key: &[u8]) -> Result<Vec<u8>, SigningError> {
    Ok(signing_key(private_key)?.verifying_key().to_bytes().to_vec())
}

/// Computes the SHA256 hex fingerprint of a public key.
pub fn compute_key_fingerprint(public_key: &[u8]) -> String {
    compute_sha256_hex(public_key)
}

/// Signs a payload using an Ed25519 private key.
///
/// # Arguments
///
/// * `payload` - The exact bytes to sign
/// * `private_key` - The 32-byte Ed25519 private key seed
///
/// # Returns
///
/// The 64-byte Ed25519 signature.
///
/// # Errors
///
/// Returns `SigningError` if the private key is invalid.
pub fn sign_payload(payload: &[u8], private_key: &[u8]) -> Result<Vec<u8>, SigningError> {
    let signature = signing_key(private_key)?.sign(payload);
    Ok(signature.to_bytes().to_vec())
}

/// Verifies a signature using an Ed25519 public key.
///
/// # Arguments
///
/// * `payload` - The bytes that were signed
/// * `signature` - The 64-byte Ed25519 signature
/// * `public_key` - The 32-byte Ed25519 public key
///
/// # Returns
///
/// `Ok(())` if the signature is valid.
///
/// # Errors
///
/// Returns `SigningError` if the signature is invalid or verification fails.
pub fn verify_signature(
    payload: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SigningError> {
    let key_bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| SigningError::InvalidPublicKeyLength(public_key.len()))?;

    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| SigningError::InvalidSignatureLength(signature.len()))?;

    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| SigningError::KeyCreationFailed(e.to_string()))?;

    verifying_key
        .verify(payload, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| SigningError::VerificationFailed)
}

/// Verifies a base64 signature (without prefix) against a base64 public key.
///
/// # Errors
///
/// Returns `SigningError` if either value fails to decode or verification fails.
pub fn verify_encoded_signature(
    payload: &[u8],
    signature_b64: &str,
    public_key_b64: &str,
) -> Result<(), SigningError> {
    let signature = decode_base64_lenient(signature_b64)?;
    let public_key = decode_base64_lenient(public_key_b64)?;
    verify_signature(payload, &signature, &public_key)
}

/// Formats signature bytes as `ed25519:<base64>`.
pub fn encode_signature_value(signature: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", encode_base64(signature))
}

/// Returns the base64 part of an `ed25519:` value, or `None` for any other scheme.
pub fn strip_signature_prefix(value: &str) -> Option<&str> {
    value.strip_prefix(SIGNATURE_PREFIX)
}

/// Computes the SHA256 hash of arbitrary data.
///
/// # Returns
///
/// A 64-character lowercase hex string.
pub fn compute_sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
