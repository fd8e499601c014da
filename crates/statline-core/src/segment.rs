//! Segment construction: state at the window edges plus what changed inside.

use std::collections::HashMap;

use crate::attrs;
use crate::entry::{AttributeKey, AttributeValue, TimelineEntry};

/// Before/after pair for one key whose value changed inside a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentChange {
    pub before: AttributeValue,
    pub after: AttributeValue,
}

/// Read-only view over one closed time window of a timeline.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: i64,
    pub end: i64,
    /// State as of `start`; keys whose last value was absent are excluded.
    pub start_state: HashMap<AttributeKey, AttributeValue>,
    /// State as of `end`. Absent values stay visible here: an explicit null
    /// inside the window is a real observed transition.
    pub end_state: HashMap<AttributeKey, AttributeValue>,
    /// Entries observed inside the window, oldest first.
    pub entries: Vec<TimelineEntry>,
    /// Keys whose value differs between the window edges.
    pub diff: HashMap<AttributeKey, SegmentChange>,
}

/// Numeric delta for one per-legend counter inside a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterDelta {
    pub key: AttributeKey,
    pub before: AttributeValue,
    pub after: AttributeValue,
    /// `None` when either side is absent or does not parse as a number.
    pub delta: Option<f64>,
}

impl Segment {
    /// Window length in seconds.
    #[must_use]
    pub const fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Value of one key at the window edges: `(start, end)`.
    #[must_use]
    pub fn edge_values(
        &self,
        key: &AttributeKey,
    ) -> (Option<&AttributeValue>, Option<&AttributeValue>) {
        (self.start_state.get(key), self.end_state.get(key))
    }

    /// Per-legend counter deltas for keys that changed in the window,
    /// sorted by key for stable output.
    #[must_use]
    pub fn counter_deltas(&self) -> Vec<CounterDelta> {
        let mut deltas: Vec<CounterDelta> = self
            .diff
            .iter()
            .filter(|(key, _)| !key.scope.is_global() && attrs::is_tracker(&key.name))
            .map(|(key, change)| CounterDelta {
                key: key.clone(),
                before: change.before.clone(),
                after: change.after.clone(),
                delta: match (change.before.numeric(), change.after.numeric()) {
                    (Some(before), Some(after)) => Some(after - before),
                    _ => None,
                },
            })
            .collect();
        deltas.sort_by(|a, b| a.key.cmp(&b.key));
        deltas
    }
}

/// Streaming segment builder fed by an oldest-first scan.
///
/// Entries before the window accumulate into the start state; entries
/// inside are collected; the first entry past the window ends the build,
/// so the driving scan can stop early.
#[derive(Debug)]
pub struct SegmentBuilder {
    start: i64,
    end: i64,
    start_state: HashMap<AttributeKey, AttributeValue>,
    entries: Vec<TimelineEntry>,
}

impl SegmentBuilder {
    /// Builder for the closed window `[start, end]`.
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end);
        Self {
            start,
            end,
            start_state: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Observes the next entry of an oldest-first scan.
    ///
    /// Returns `false` once the entry lies past the window and the segment
    /// is complete.
    pub fn observe(&mut self, entry: &TimelineEntry) -> bool {
        if entry.timestamp > self.end {
            return false;
        }
        if entry.timestamp < self.start {
            self.start_state
                .insert(entry.key.clone(), entry.value.clone());
        } else {
            self.entries.push(entry.clone());
        }
        true
    }

    /// Finalizes the segment.
    #[must_use]
    pub fn finish(self) -> Segment {
        let mut start_state = self.start_state;
        start_state.retain(|_, value| !value.is_absent());

        let mut end_state = start_state.clone();
        let mut first_observed: HashMap<AttributeKey, AttributeValue> = HashMap::new();
        for entry in &self.entries {
            first_observed
                .entry(entry.key.clone())
                .or_insert_with(|| entry.value.clone());
            end_state.insert(entry.key.clone(), entry.value.clone());
        }

        let mut diff = HashMap::new();
        for (key, after) in &end_state {
            let Some(before) = start_state.get(key).or_else(|| first_observed.get(key)) else {
                continue;
            };
            if before != after {
                diff.insert(
                    key.clone(),
                    SegmentChange {
                        before: before.clone(),
                        after: after.clone(),
                    },
                );
            }
        }

        Segment {
            start: self.start,
            end: self.end,
            start_state,
            end_state,
            entries: self.entries,
            diff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: i64, key: AttributeKey, value: &str) -> TimelineEntry {
        TimelineEntry::new(timestamp, key, AttributeValue::present(value))
    }

    fn absent(timestamp: i64, key: AttributeKey) -> TimelineEntry {
        TimelineEntry::new(timestamp, key, AttributeValue::Absent)
    }

    fn build(entries: &[TimelineEntry], start: i64, end: i64) -> Segment {
        let mut builder = SegmentBuilder::new(start, end);
        for e in entries {
            if !builder.observe(e) {
                break;
            }
        }
        builder.finish()
    }

    #[test]
    fn start_state_keeps_last_value_before_window() {
        let level = AttributeKey::global("level");
        let entries = [
            entry(10, level.clone(), "70"),
            entry(20, level.clone(), "71"),
            entry(150, level.clone(), "72"),
        ];
        let segment = build(&entries, 100, 200);
        assert_eq!(
            segment.start_state.get(&level),
            Some(&AttributeValue::present("71"))
        );
        assert_eq!(
            segment.end_state.get(&level),
            Some(&AttributeValue::present("72"))
        );
        assert_eq!(segment.entries.len(), 1);
    }

    #[test]
    fn absent_before_window_is_excluded_from_start_state() {
        let key = AttributeKey::legend("Valkyrie", "tracker_kills");
        let entries = [
            entry(10, key.clone(), "5"),
            absent(20, key.clone()),
            entry(150, key.clone(), "9"),
        ];
        let segment = build(&entries, 100, 200);
        assert!(!segment.start_state.contains_key(&key));
        // First in-window value stands in for the missing start value, so
        // a single observation produces no diff row.
        assert_eq!(
            segment.end_state.get(&key),
            Some(&AttributeValue::present("9"))
        );
        assert!(!segment.diff.contains_key(&key));
    }

    #[test]
    fn first_window_value_seeds_before_for_new_keys() {
        let key = AttributeKey::legend("Valkyrie", "tracker_kills");
        let entries = [
            entry(110, key.clone(), "5"),
            entry(180, key.clone(), "9"),
        ];
        let segment = build(&entries, 100, 200);
        let change = segment.diff.get(&key).unwrap();
        assert_eq!(change.before, AttributeValue::present("5"));
        assert_eq!(change.after, AttributeValue::present("9"));
    }

    #[test]
    fn absent_inside_window_is_a_real_transition() {
        let key = AttributeKey::legend("Valkyrie", "tracker_kills");
        let entries = [entry(10, key.clone(), "5"), absent(150, key.clone())];
        let segment = build(&entries, 100, 200);
        assert_eq!(segment.end_state.get(&key), Some(&AttributeValue::Absent));
        let change = segment.diff.get(&key).unwrap();
        assert_eq!(change.before, AttributeValue::present("5"));
        assert_eq!(change.after, AttributeValue::Absent);
    }

    #[test]
    fn unchanged_keys_are_not_in_the_diff() {
        let state = AttributeKey::global("cur_state");
        let name = AttributeKey::global("name");
        let entries = [
            entry(10, state.clone(), "inLobby"),
            entry(20, name.clone(), "TTVPlayer"),
            entry(150, state.clone(), "inMatch"),
            entry(190, state.clone(), "inLobby"),
        ];
        let segment = build(&entries, 100, 200);
        // cur_state went inLobby -> inMatch -> inLobby: edges match.
        assert!(segment.diff.is_empty());
        assert_eq!(segment.entries.len(), 2);
    }

    #[test]
    fn scan_stops_past_the_window() {
        let level = AttributeKey::global("level");
        let entries = [
            entry(150, level.clone(), "72"),
            entry(250, level.clone(), "73"),
        ];
        let mut builder = SegmentBuilder::new(100, 200);
        assert!(builder.observe(&entries[0]));
        assert!(!builder.observe(&entries[1]));
        let segment = builder.finish();
        assert_eq!(
            segment.end_state.get(&level),
            Some(&AttributeValue::present("72"))
        );
    }

    #[test]
    fn counter_deltas_cover_numeric_and_unknown() {
        let kills = AttributeKey::legend("Valkyrie", "tracker_kills");
        let damage = AttributeKey::legend("Valkyrie", "tracker_damage");
        let rank = AttributeKey::global("br_rank_score");
        let entries = [
            entry(10, kills.clone(), "100"),
            entry(10, damage.clone(), "900"),
            entry(11, rank.clone(), "4800"),
            entry(150, kills.clone(), "112"),
            absent(160, damage.clone()),
            entry(170, rank.clone(), "4900"),
        ];
        let segment = build(&entries, 100, 200);
        let deltas = segment.counter_deltas();

        // Global rank attributes are not counters.
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].key, damage);
        assert_eq!(deltas[0].delta, None);
        assert_eq!(deltas[1].key, kills);
        assert_eq!(deltas[1].delta, Some(12.0));
    }

    #[test]
    fn duration_is_window_length() {
        let segment = build(&[], 100, 250);
        assert_eq!(segment.duration(), 150);
        assert!(segment.start_state.is_empty());
        assert!(segment.diff.is_empty());
    }
}
