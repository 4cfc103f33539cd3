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

//! Package manifest (`MANIFEST.json`).
//!
//! The manifest records the package metadata, a `sha256:` hash for every
//! file in the archive and the list of signatures. Signatures cover the
//! canonical JSON of the manifest without its `signatures` key, scoped to
//! the signer's publisher.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::archive::ArchiveFiles;
use crate::crypto::compute_sha256_hex;
use crate::front_matter::{SignatureEntry, SIGNATURES_FIELD};

/// Name of the manifest entry inside a package archive.
pub const MANIFEST_FILENAME: &str = "MANIFEST.json";

/// Legacy detached signature entry, dropped when a package is re-signed.
pub const LEGACY_SIGNATURE_FILENAME: &str = "SIGNATURE";

/// Prefix of every file hash in the manifest.
pub const HASH_PREFIX: &str = "sha256:";

/// Metadata supplied when signing a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Overrides `author` as the publisher the signature is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl PackageMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: version.into(),
            author: author.into(),
            key_id: None,
            publisher: None,
        }
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// The explicit publisher when set and non-empty, otherwise the author.
    pub fn publisher(&self) -> &str {
        match self.publisher.as_deref() {
            Some(publisher) if !publisher.is_empty() => publisher,
            _ => &self.author,
        }
    }
}

/// Contents of `MANIFEST.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    /// Path to `sha256:<hex>`, in path order.
    pub files: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<SignatureEntry>,
}

impl PackageManifest {
    /// The manifest as a JSON object without its `signatures` key.
    pub fn unsigned_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove(SIGNATURES_FIELD);
        }
        Ok(value)
    }
}

/// Hashes every archive file except the manifest and legacy signature.
pub fn build_manifest(files: &ArchiveFiles, metadata: &PackageMetadata) -> PackageManifest {
    let hashes = files
        .iter()
        .filter(|(path, _)| !is_excluded(path))
        .map(|(path, contents)| {
            (
                path.clone(),
                format!("{HASH_PREFIX}{}", compute_sha256_hex(contents)),
            )
        })
        .collect();

    PackageManifest {
        name: metadata.name.clone(),
        description: metadata.description.clone(),
        version: metadata.version.clone(),
        author: metadata.author.clone(),
        files: hashes,
        signatures: Vec::new(),
    }
}

fn is_excluded(path: &str) -> bool {
    path == MANIFEST_FILENAME || path == LEGACY_SIGNATURE_FILENAME
}

/// Pretty-prints JSON (two-space indent) with top-level keys sorted.
///
/// Nested objects keep their own key order.
pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), map[key.as_str()].clone());
            }
            serde_json::to_string_pretty(&Value::Object(sorted))
        }
        other => serde_json::to_string_pretty(other),
    }
}

/// Builds the exact text a `publisher` signs for `manifest`.
pub fn manifest_signable_payload(
    publisher: &str,
    manifest: &PackageManifest,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(&manifest.unsigned_value()?)?;
    Ok(format!("{publisher}\n{canonical}"))
}
