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

//! Front-matter codec.
//!
//! A document is a `---` fenced header of `key: value` lines followed by a
//! free-form body. Values are strings, booleans or numbers; the special
//! `signatures` key holds an indented list of `keyId` / `publisher` /
//! `value` entries.
//!
//! ```text
//! ---
//! name: test-file
//! version: "1.0"
//! signatures:
//!   - keyId: key_test
//!     publisher: example.com
//!     value: "ed25519:..."
//! ---
//! Body text
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Header key holding the signature list.
pub const SIGNATURES_FIELD: &str = "signatures";

static FRONT_MATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---\r?\n(?:(.*?)\r?\n)?---\r?\n?(.*)\z")
        .expect("front matter pattern is valid")
});

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?\z").expect("numeric pattern is valid")
});

static RADIX_NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A0(?:[xX](?P<hex>[0-9a-fA-F]+)|[oO](?P<oct>[0-7]+)|[bB](?P<bin>[01]+))\z")
        .expect("radix pattern is valid")
});

/// One `signatures` list item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    /// Publisher-chosen key label; empty when the signer did not name one.
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub publisher: String,
    /// `ed25519:<base64 signature>`
    #[serde(default)]
    pub value: String,
}

impl SignatureEntry {
    pub fn new(
        key_id: impl Into<String>,
        publisher: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            publisher: publisher.into(),
            value: value.into(),
        }
    }

    /// Two entries belong to the same signer when keyId and publisher agree.
    pub fn same_signer(&self, other: &SignatureEntry) -> bool {
        self.key_id == other.key_id && self.publisher == other.publisher
    }
}

/// A parsed header value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Number(f64),
    Signatures(Vec<SignatureEntry>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Empty strings, zero and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Signatures(_) => true,
        }
    }

    /// Scalar rendered as plain text, `true` / `1.5` / `name`.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Signatures(entries) => entries
                .iter()
                .map(|e| e.value.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Compact JSON text. Numbers use [`format_number`]; non-finite ones
    /// become `null`.
    pub fn to_json_text(&self) -> String {
        match self {
            Self::String(s) => serde_json::Value::from(s.as_str()).to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) if n.is_finite() => format_number(*n),
            Self::Number(_) => "null".to_string(),
            Self::Signatures(entries) => serde_json::to_value(entries)
                .unwrap_or(serde_json::Value::Null)
                .to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Header fields in declaration order.
pub type Fields = IndexMap<String, FieldValue>;

/// Header fields plus the body that follows the closing fence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub fields: Fields,
    pub body: String,
}

impl FrontMatter {
    /// Signature entries, empty when the header has no list.
    pub fn signatures(&self) -> &[SignatureEntry] {
        match self.fields.get(SIGNATURES_FIELD) {
            Some(FieldValue::Signatures(entries)) => entries,
            _ => &[],
        }
    }
}

/// Splits `raw` into header fields and body.
///
/// Input without a well-formed leading fence yields no fields and the whole
/// input as body. Malformed header lines are skipped.
pub fn parse(raw: &str) -> FrontMatter {
    let Some(captures) = FRONT_MATTER.captures(raw) else {
        return FrontMatter {
            fields: Fields::new(),
            body: raw.to_string(),
        };
    };

    let block = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    FrontMatter {
        fields: parse_block(block),
        body: body.to_string(),
    }
}

fn parse_block(block: &str) -> Fields {
    let lines: Vec<&str> = block.split('\n').collect();
    let mut fields = Fields::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        let Some((key, rest)) = split_key_value(line) else {
            continue;
        };

        if key == SIGNATURES_FIELD && rest.is_empty() {
            let (entries, next) = parse_signature_list(&lines, i);
            fields.insert(key.to_string(), FieldValue::Signatures(entries));
            i = next;
            continue;
        }

        fields.insert(key.to_string(), parse_inline_value(rest));
    }

    fields
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    if colon == 0 {
        return None;
    }
    Some((line[..colon].trim(), line[colon + 1..].trim()))
}

/// Consumes indented list lines starting at `start`.
///
/// Returns the complete entries and the index of the first line that is not
/// part of the list. An item lacking a publisher or a value is dropped.
fn parse_signature_list(lines: &[&str], start: usize) -> (Vec<SignatureEntry>, usize) {
    let mut entries = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let raw = lines[i];
        if !(raw.starts_with("  ") || raw.starts_with('\t')) {
            break;
        }

        let Some(key_id) = raw.trim().strip_prefix("- keyId:") else {
            i += 1;
            continue;
        };
        let key_id = parse_inline_value(key_id.trim()).to_plain_string();
        let mut publisher = None;
        let mut value = None;
        i += 1;

        while i < lines.len() {
            let next = lines[i].trim();
            if let Some(rest) = next.strip_prefix("publisher:") {
                publisher = Some(parse_inline_value(rest.trim()).to_plain_string());
            } else if let Some(rest) = next.strip_prefix("value:") {
                value = Some(parse_inline_value(rest.trim()).to_plain_string());
            } else {
                break;
            }
            i += 1;
        }

        match (publisher, value) {
            (Some(publisher), Some(value)) if !publisher.is_empty() && !value.is_empty() => {
                entries.push(SignatureEntry::new(key_id, publisher, value));
            }
            _ => {}
        }
    }

    (entries, i)
}

/// Interprets one scalar value.
///
/// Quoted text is unquoted (double quotes also unescape `\\` and `\"`),
/// `true` / `false` become booleans. Decimals, `0x` / `0o` / `0b` numerals
/// and `Infinity` become numbers. Numerals with a leading zero (`007`) and
/// dotted versions (`1.2.3`) stay strings.
pub fn parse_inline_value(value: &str) -> FieldValue {
    if let Some(inner) = strip_quotes(value, '"') {
        return FieldValue::String(unescape(inner));
    }
    if let Some(inner) = strip_quotes(value, '\'') {
        return FieldValue::String(inner.to_string());
    }

    match value {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }

    match parse_number(value) {
        Some(number) => FieldValue::Number(number),
        None => FieldValue::String(value.to_string()),
    }
}

fn strip_quotes(value: &str, quote: char) -> Option<&str> {
    if !(value.starts_with(quote) && value.ends_with(quote)) {
        return None;
    }
    if value.len() < 2 {
        return Some("");
    }
    Some(&value[1..value.len() - 1])
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '"' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn parse_number(value: &str) -> Option<f64> {
    match value {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if let Some(number) = parse_radix_numeral(value) {
        return Some(number);
    }
    if !NUMERIC.is_match(value) || has_leading_zero(value) {
        return None;
    }
    value.parse().ok()
}

fn parse_radix_numeral(value: &str) -> Option<f64> {
    let captures = RADIX_NUMERAL.captures(value)?;
    let (radix, digits) = if let Some(m) = captures.name("hex") {
        (16, m.as_str())
    } else if let Some(m) = captures.name("oct") {
        (8, m.as_str())
    } else {
        (2, captures.name("bin")?.as_str())
    };

    Some(match u128::from_str_radix(digits, radix) {
        Ok(n) => n as f64,
        Err(_) => digits
            .chars()
            .filter_map(|d| d.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
    })
}

fn has_leading_zero(value: &str) -> bool {
    let mut bytes = value.bytes();
    bytes.next() == Some(b'0') && bytes.next().is_some_and(|b| b.is_ascii_digit())
}

/// Renders a number the way ECMAScript's `Number::toString` does.
///
/// Shortest round-trip digits; plain notation for magnitudes in
/// `[1e-7, 1e21)`, exponent notation (`1e+21`, `1.5e-7`) outside it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let len = digits.len() as i32;
    let point = exponent + 1;

    let body = if len <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let e_sign = if exponent < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{e_sign}{}", exponent.abs())
        } else {
            format!("{lead}.{rest}e{e_sign}{}", exponent.abs())
        }
    };

    format!("{sign}{body}")
}

/// Renders `fields` as a fenced header followed by `body`.
///
/// [`parse`] applied to the output returns the same fields and body.
pub fn stringify(body: &str, fields: &Fields) -> String {
    let mut lines = vec!["---".to_string()];

    for (key, value) in fields {
        match value {
            FieldValue::Signatures(entries) => {
                lines.push(format!("{key}:"));
                for entry in entries {
                    lines.push(format!("  - keyId: {}", render_scalar(&entry.key_id)));
                    lines.push(format!("    publisher: {}", render_scalar(&entry.publisher)));
                    lines.push(format!("    value: {}", render_scalar(&entry.value)));
                }
            }
            FieldValue::String(s) => lines.push(format!("{key}: {}", render_scalar(s))),
            other => lines.push(format!("{key}: {}", other.to_plain_string())),
        }
    }

    lines.push("---".to_string());
    format!("{}\n{}", lines.join("\n"), body)
}

fn render_scalar(value: &str) -> String {
    if needs_quotes(value) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Strings that would otherwise re-parse as something else.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.contains([':', '#', '"', '\''])
        || value.starts_with(|c: char| c.is_ascii_digit())
        || value.trim() != value
        || value == "true"
        || value == "false"
        || parse_number(value).is_some()
}
