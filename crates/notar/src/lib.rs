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

//! # Notar
//!
//! Ed25519 signing and verification for front-matter documents and zip
//! packages, with trust anchored in the signer's publisher domain.
//!
//! ## Key Features
//!
//! - Detached-in-place signatures: documents carry a `signatures` list in
//!   their front matter, packages in `MANIFEST.json`
//! - Multiple co-signers per artifact, one entry per (keyId, publisher)
//! - Per-file SHA-256 integrity for package contents
//! - Public key discovery from `https://<publisher>/.well-known/notar-keys.json`
//!   raced against `notar.<keyId>.<publisher>` TXT records over DoH
//! - Key revocation and expiry
//! - Structured audit events through `tracing`
//!
//! ## Example
//!
//! ```rust,no_run
//! use notar::{
//!     generate_signing_keypair, sign_document, verify_document, verify_document_from_publisher,
//!     HttpFetcher, SignOptions, VerifyOptions,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let keypair = generate_signing_keypair();
//! let raw = "---\nname: hello\ndescription: Greets\nversion: \"1.0\"\nauthor: example.com\n---\nHi\n";
//!
//! let signed = sign_document(raw, &keypair.private_key, &SignOptions::new().with_key_id("k1"))?;
//! assert!(verify_document(&signed, &keypair.public_key).valid);
//!
//! let fetcher = HttpFetcher::new()?;
//! let result = verify_document_from_publisher(&signed, &fetcher, &VerifyOptions::default()).await;
//! println!("valid: {}", result.valid);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod discovery;
pub mod document;
pub mod front_matter;
pub mod packaging;
pub mod security;
pub mod types;

pub use config::{ConfigError, ConfigLoader, NotarConfig, VerifyOptions};
pub use crypto::{generate_signing_keypair, GeneratedKeypair, SigningError};
pub use discovery::{
    fetch_public_key, fetch_public_keys, format_dns_txt_record, parse_dns_txt_record, Fetcher,
    HttpFetcher, PublicKeyEntry,
};
pub use document::{build_signable_payload, parse_document, Document, FrontMatterError};
pub use packaging::{PackageManifest, PackageMetadata};
pub use security::{
    sign, sign_archive, sign_document, validate_signing_key, verify, verify_archive,
    verify_archive_from_publisher, verify_document, verify_document_from_publisher,
    verify_from_publisher, PreflightError, SignError, SignOptions, SignedContent,
};
pub use types::{
    Content, DocumentMeta, FileIntegrity, FileIntegrityResult, KeySource, SignerResult,
    VerifyDetails, VerifyErrorCode, VerifyResult,
};
