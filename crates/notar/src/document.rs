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

//! Canonical signable payloads for front-matter documents.
//!
//! The base payload is the compact JSON of every header field except the
//! signature list, keys sorted, followed by a newline and the trimmed body.
//! Each signature covers the base payload scoped to its publisher:
//!
//! ```text
//! <publisher>\n<sorted fields JSON>\n<trimmed body>
//! ```

use thiserror::Error;

use crate::front_matter::{self, FieldValue, Fields, SignatureEntry, SIGNATURES_FIELD};
use crate::types::DocumentMeta;

/// Header fields every signable document must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "description", "version"];

/// Legacy single-signature header field, removed on signing.
pub const LEGACY_SIGNATURE_FIELD: &str = "signature";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("File must have name, description, and version in front matter (missing '{field}')")]
    MissingRequiredField { field: String },
}

/// A document whose header carries the required fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub fields: Fields,
    pub body: String,
}

impl Document {
    pub fn signatures(&self) -> &[SignatureEntry] {
        match self.fields.get(SIGNATURES_FIELD) {
            Some(FieldValue::Signatures(entries)) => entries,
            _ => &[],
        }
    }

    /// Truthy field value rendered as text.
    pub fn text_field(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .filter(|value| value.is_truthy())
            .map(FieldValue::to_plain_string)
    }

    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            name: self.text_field("name"),
            description: self.text_field("description"),
            version: self.text_field("version"),
            author: self.text_field("author"),
        }
    }
}

/// Parses `raw` and checks that `name`, `description` and `version` are present.
///
/// # Errors
///
/// Returns `FrontMatterError::MissingRequiredField` naming the first absent
/// or empty required field.
pub fn parse_document(raw: &str) -> Result<Document, FrontMatterError> {
    let parsed = front_matter::parse(raw);

    for field in REQUIRED_FIELDS {
        if !parsed.fields.get(field).is_some_and(FieldValue::is_truthy) {
            return Err(FrontMatterError::MissingRequiredField {
                field: field.to_string(),
            });
        }
    }

    Ok(Document {
        fields: parsed.fields,
        body: parsed.body,
    })
}

/// Builds the publisher-independent part of the signable payload.
pub fn base_payload(document: &Document) -> String {
    let mut keys: Vec<&String> = document
        .fields
        .keys()
        .filter(|key| key.as_str() != SIGNATURES_FIELD)
        .collect();
    keys.sort();

    let members: Vec<String> = keys
        .into_iter()
        .map(|key| {
            format!(
                "{}:{}",
                serde_json::Value::from(key.as_str()),
                document.fields[key].to_json_text()
            )
        })
        .collect();

    format!("{{{}}}\n{}", members.join(","), document.body.trim())
}

/// Prefixes a base payload with the publisher it is signed for.
pub fn scope_payload(publisher: &str, base: &str) -> String {
    format!("{publisher}\n{base}")
}

/// Builds the exact text a `publisher` signs for the document `raw`.
///
/// # Errors
///
/// Returns `FrontMatterError` if the document lacks a required field.
pub fn build_signable_payload(raw: &str, publisher: &str) -> Result<String, FrontMatterError> {
    let document = parse_document(raw)?;
    Ok(scope_payload(publisher, &base_payload(&document)))
}
