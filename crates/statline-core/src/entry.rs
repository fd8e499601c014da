//! Attribute keys, values, and timeline entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scope of a tracked attribute.
///
/// Most attributes live in the global scope. Per-legend counters are scoped
/// to the legend they belong to, so the same counter name can repeat across
/// legends without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Legend(String),
}

impl Scope {
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("_"),
            Self::Legend(name) => f.write_str(name),
        }
    }
}

/// Composite key identifying one tracked attribute.
///
/// Keys compare by exact equality of both parts. They are never flattened
/// to a single string, which keeps legend names with unusual characters
/// from colliding with global attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeKey {
    pub scope: Scope,
    pub name: String,
}

impl AttributeKey {
    /// Key in the global scope.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            scope: Scope::Global,
            name: name.into(),
        }
    }

    /// Key scoped to a legend.
    #[must_use]
    pub fn legend(legend: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Scope::Legend(legend.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Global => f.write_str(&self.name),
            Scope::Legend(legend) => write!(f, "{legend}/{}", self.name),
        }
    }
}

/// One recorded attribute value.
///
/// Values carry their decimal string form. `Absent` is the explicit "no
/// longer applicable" marker written when a previously tracked key vanishes
/// from the upstream snapshot; it is distinct from a key never having been
/// recorded at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Present(String),
    Absent,
}

impl AttributeValue {
    #[must_use]
    pub fn present(value: impl Into<String>) -> Self {
        Self::Present(value.into())
    }

    /// Returns the contained string when the value is present.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Parses the value as a number, when present and parseable.
    #[must_use]
    pub fn numeric(&self) -> Option<f64> {
        self.as_str().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(value) => f.write_str(value),
            Self::Absent => f.write_str("(absent)"),
        }
    }
}

/// One immutable timeline record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub key: AttributeKey,
    pub value: AttributeValue,
}

impl TimelineEntry {
    #[must_use]
    pub fn new(timestamp: i64, key: AttributeKey, value: AttributeValue) -> Self {
        Self {
            timestamp,
            key,
            value,
        }
    }
}
