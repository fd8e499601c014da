//! One-line-per-entry codec for timeline logs.
//!
//! Each entry is a newline-terminated line of four space-separated fields:
//! `timestamp scope name value`. The last three fields are percent-escaped
//! so a field separator or control byte never collides with recorded text.

use std::fmt::Write as _;

use thiserror::Error;

use crate::entry::{AttributeKey, AttributeValue, Scope, TimelineEntry};

/// Scope field reserved for globally scoped attributes.
const GLOBAL_SCOPE: &str = "_";

/// Escaped form of a legend literally named `_`.
const ESCAPED_UNDERSCORE: &str = "%5F";

/// Value field reserved for [`AttributeValue::Absent`].
///
/// A literal `%` always escapes to `%25`, so no present value can encode to
/// this token.
const ABSENT: &str = "%-";

/// Errors produced while decoding one timeline line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The line did not split into exactly four fields.
    #[error("expected 4 fields, got {count}")]
    FieldCount { count: usize },

    /// The timestamp field did not parse as an integer.
    #[error("invalid timestamp {field:?}")]
    Timestamp { field: String },

    /// A `%` escape was truncated or not followed by two hex digits.
    #[error("invalid escape in field {field:?}")]
    Escape { field: String },

    /// The unescaped bytes were not valid UTF-8.
    #[error("field {field:?} is not valid UTF-8 after unescaping")]
    Utf8 { field: String },
}

/// Encodes one entry as its log line, without the trailing newline.
#[must_use]
pub fn encode_entry(entry: &TimelineEntry) -> String {
    let scope = match &entry.key.scope {
        Scope::Global => GLOBAL_SCOPE.to_string(),
        Scope::Legend(name) if name == GLOBAL_SCOPE => ESCAPED_UNDERSCORE.to_string(),
        Scope::Legend(name) => escape(name),
    };
    let value = match &entry.value {
        AttributeValue::Present(value) => escape(value),
        AttributeValue::Absent => ABSENT.to_string(),
    };
    format!(
        "{} {} {} {}",
        entry.timestamp,
        scope,
        escape(&entry.key.name),
        value
    )
}

/// Decodes one log line (trailing newline already stripped).
pub fn decode_entry(line: &str) -> Result<TimelineEntry, DecodeError> {
    let fields: Vec<&str> = line.split(' ').collect();
    let &[timestamp, scope, name, value] = fields.as_slice() else {
        return Err(DecodeError::FieldCount {
            count: fields.len(),
        });
    };

    let timestamp: i64 = timestamp.parse().map_err(|_| DecodeError::Timestamp {
        field: timestamp.to_string(),
    })?;

    let scope = if scope == GLOBAL_SCOPE {
        Scope::Global
    } else {
        Scope::Legend(unescape(scope)?)
    };

    let value = if value == ABSENT {
        AttributeValue::Absent
    } else {
        AttributeValue::Present(unescape(value)?)
    };

    Ok(TimelineEntry {
        timestamp,
        key: AttributeKey {
            scope,
            name: unescape(name)?,
        },
        value,
    })
}

/// Escapes separator, escape, and control characters as `%XX`.
///
/// Non-ASCII characters pass through untouched; their UTF-8 bytes can never
/// be mistaken for a separator.
fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c == '%' || c == ' ' || c.is_ascii_control() {
            let _ = write!(out, "%{:02X}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape(field: &str) -> Result<String, DecodeError> {
    if !field.contains('%') {
        return Ok(field.to_string());
    }

    let mut out = Vec::with_capacity(field.len());
    let mut bytes = field.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let (Some(hi), Some(lo)) = (bytes.next(), bytes.next()) else {
                return Err(DecodeError::Escape {
                    field: field.to_string(),
                });
            };
            let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
                return Err(DecodeError::Escape {
                    field: field.to_string(),
                });
            };
            out.push((hi << 4) | lo);
        } else {
            out.push(b);
        }
    }

    String::from_utf8(out).map_err(|_| DecodeError::Utf8 {
        field: field.to_string(),
    })
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
