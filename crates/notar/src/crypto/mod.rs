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

//! Cryptographic primitives for content signing.
//!
//! This module provides:
//! - Ed25519 key generation, public key derivation, signing and verification
//! - SHA256 content hashes and key fingerprints
//! - Base64 helpers with lenient decoding

mod encoding;
mod signing;

pub use encoding::{decode_base64_lenient, encode_base64};
pub use signing::{
    compute_key_fingerprint, compute_sha256_hex, derive_public_key, encode_signature_value,
    generate_signing_keypair, sign_payload, strip_signature_prefix, verify_encoded_signature,
    verify_signature, GeneratedKeypair, SigningError, SIGNATURE_PREFIX,
};
