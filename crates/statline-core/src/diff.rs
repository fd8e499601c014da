//! Change sets produced by one snapshot ingestion.

use std::collections::HashMap;

use crate::attrs;
use crate::entry::{AttributeKey, AttributeValue};

/// One key's transition within a single ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    /// Last indexed value; `None` when the key had never been recorded.
    pub old: Option<AttributeValue>,
    pub new: AttributeValue,
}

/// Everything one ingestion changed, keyed by attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatDiff {
    changes: HashMap<AttributeKey, ValueChange>,
}

impl StatDiff {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: AttributeKey, old: Option<AttributeValue>, new: AttributeValue) {
        self.changes.insert(key, ValueChange { old, new });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn get(&self, key: &AttributeKey) -> Option<&ValueChange> {
        self.changes.get(key)
    }

    /// Whether this ingestion wrote the given key.
    #[must_use]
    pub fn changed(&self, key: &AttributeKey) -> bool {
        self.changes.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &ValueChange)> {
        self.changes.iter()
    }

    /// Changes sorted by key, for stable presentation.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&AttributeKey, &ValueChange)> {
        let mut changes: Vec<_> = self.changes.iter().collect();
        changes.sort_by(|a, b| a.0.cmp(b.0));
        changes
    }

    /// Did this ingestion flip the online flag to online?
    #[must_use]
    pub fn went_online(&self) -> bool {
        self.online_change() == Some(true)
    }

    /// Did this ingestion flip the online flag to offline?
    #[must_use]
    pub fn went_offline(&self) -> bool {
        self.online_change() == Some(false)
    }

    fn online_change(&self) -> Option<bool> {
        let change = self.changes.get(&AttributeKey::global(attrs::IS_ONLINE))?;
        Some(change.new.as_str() == Some("1"))
    }
}
