//! Snapshot ingestion: full upstream state in, minimal delta entries out.

use statline_core::{
    AttributeKey, AttributeValue, PlayerSnapshot, Scope, StatDiff, TimelineEntry, attrs,
};
use thiserror::Error;

use crate::{StorageError, Timeline};

/// Upstream clock jitter tolerated on `state_since` updates, in seconds.
pub const STATE_SINCE_JITTER_SECS: i64 = 20;

/// Errors from snapshot ingestion.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The snapshot is missing required fields; nothing was written.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Ingestion engine over one player's timeline.
///
/// Each [`consume`](Self::consume) call diffs a full upstream snapshot
/// against the timeline's current-state index and appends only what
/// changed, as one batch with one flush. The whole batch is assembled in
/// memory before the first write, so a failed extraction never leaves a
/// partial ingestion behind.
pub struct StatIngest<'a> {
    timeline: &'a mut Timeline,
}

impl<'a> StatIngest<'a> {
    pub fn new(timeline: &'a mut Timeline) -> Self {
        Self { timeline }
    }

    /// Ingests a raw JSON snapshot as returned by the stat provider.
    pub fn consume_value(&mut self, snapshot: &serde_json::Value) -> Result<StatDiff, ConsumeError> {
        let snapshot: PlayerSnapshot =
            serde_json::from_value(snapshot.clone()).map_err(ConsumeError::InvalidSnapshot)?;
        self.consume(&snapshot)
    }

    /// Ingests a snapshot, stamping new entries with the current time.
    pub fn consume(&mut self, snapshot: &PlayerSnapshot) -> Result<StatDiff, ConsumeError> {
        self.consume_at(snapshot, unix_now())
    }

    /// Ingests a snapshot with an explicit ingestion timestamp.
    ///
    /// Every entry written by one call shares this timestamp. Returns the
    /// changed keys with their `(old, new)` pairs; an unchanged snapshot
    /// appends nothing and returns an empty diff.
    pub fn consume_at(
        &mut self,
        snapshot: &PlayerSnapshot,
        now: i64,
    ) -> Result<StatDiff, ConsumeError> {
        let rows = snapshot.attribute_rows();
        let state = self.timeline.current_state();

        let mut diff = StatDiff::new();
        let mut batch = Vec::new();

        for (key, value) in &rows {
            let old = state.get(key);
            if old == Some(value) {
                continue;
            }
            if key.scope.is_global()
                && key.name == attrs::STATE_SINCE
                && within_jitter(old, value)
            {
                // The provider's since-timestamp drifts a few seconds
                // between polls without the state actually changing.
                tracing::debug!(%key, "suppressing state_since jitter");
                continue;
            }
            batch.push(TimelineEntry::new(now, key.clone(), value.clone()));
            diff.record(key.clone(), old.cloned(), value.clone());
        }

        // Counters of the selected legend that the provider stopped
        // reporting get an explicit null instead of going silently stale.
        let selected = &snapshot.legends.selected.name;
        for (key, value) in state {
            if value.is_absent() || !attrs::is_tracker(&key.name) {
                continue;
            }
            if !matches!(&key.scope, Scope::Legend(name) if name == selected) {
                continue;
            }
            if rows.iter().any(|(row_key, _)| row_key == key) {
                continue;
            }
            batch.push(TimelineEntry::new(now, key.clone(), AttributeValue::Absent));
            diff.record(key.clone(), Some(value.clone()), AttributeValue::Absent);
        }

        if !batch.is_empty() {
            tracing::debug!(entries = batch.len(), "appending ingestion batch");
            self.timeline.append_batch(&batch)?;
        }
        Ok(diff)
    }
}

/// Whether a `state_since` change is within the jitter bound.
///
/// A missing or unparsable old value counts as 0, so the first real
/// observation is always far outside the bound and gets written.
fn within_jitter(old: Option<&AttributeValue>, new: &AttributeValue) -> bool {
    let Some(new) = new.as_str().and_then(|s| s.parse::<i64>().ok()) else {
        return false;
    };
    let old = old
        .and_then(AttributeValue::as_str)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    (old - new).abs() < STATE_SINCE_JITTER_SECS
}

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use statline_core::PlayerId;
    use tempfile::TempDir;

    use super::*;

    fn snapshot_json() -> serde_json::Value {
        serde_json::json!({
            "global": {
                "name": "TTVPlayer",
                "level": 72,
                "toNextLevelPercent": 35,
                "bans": { "isActive": false },
                "rank": {
                    "rankScore": 4_800,
                    "rankDiv": 2,
                    "ladderPosPlatform": -1,
                    "rankName": "Diamond"
                },
                "arena": {
                    "rankScore": 1_600,
                    "rankDiv": 0,
                    "ladderPosPlatform": -1,
                    "rankName": "Silver"
                }
            },
            "realtime": {
                "isOnline": 1,
                "currentState": "inLobby",
                "currentStateSinceTimestamp": 1_660_000_000
            },
            "legends": {
                "selected": {
                    "LegendName": "Valkyrie",
                    "data": [
                        { "key": "kills", "value": 1_207 },
                        { "key": "damage", "value": 400_000 }
                    ]
                }
            }
        })
    }

    fn parse(json: &serde_json::Value) -> PlayerSnapshot {
        serde_json::from_value(json.clone()).unwrap()
    }

    fn open(dir: &TempDir) -> Timeline {
        Timeline::open(dir.path(), &PlayerId::new("player-1").unwrap()).unwrap()
    }

    fn entry_count(timeline: &Timeline) -> usize {
        timeline.iter().unwrap().count()
    }

    #[test]
    fn first_ingestion_records_every_attribute() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        let snapshot = parse(&snapshot_json());

        let diff = StatIngest::new(&mut timeline)
            .consume_at(&snapshot, 1_000)
            .unwrap();

        let rows = snapshot.attribute_rows();
        assert_eq!(diff.len(), rows.len());
        assert_eq!(entry_count(&timeline), rows.len());
        assert!(diff.went_online());
    }

    #[test]
    fn reingestion_of_identical_snapshot_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        let snapshot = parse(&snapshot_json());

        StatIngest::new(&mut timeline)
            .consume_at(&snapshot, 1_000)
            .unwrap();
        let written = entry_count(&timeline);

        let diff = StatIngest::new(&mut timeline)
            .consume_at(&snapshot, 1_060)
            .unwrap();
        assert!(diff.is_empty());
        assert_eq!(entry_count(&timeline), written);
    }

    #[test]
    fn only_changed_attributes_are_appended() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_000)
            .unwrap();
        let written = entry_count(&timeline);

        let mut json = snapshot_json();
        json["global"]["rank"]["rankScore"] = serde_json::json!(4_950);
        let diff = StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_060)
            .unwrap();

        assert_eq!(diff.len(), 1);
        assert_eq!(entry_count(&timeline), written + 1);
        let change = diff
            .get(&AttributeKey::global(attrs::BR_RANK_SCORE))
            .unwrap();
        assert_eq!(change.old, Some(AttributeValue::present("4800")));
        assert_eq!(change.new, AttributeValue::present("4950"));
    }

    #[test]
    fn state_since_jitter_is_suppressed() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_000)
            .unwrap();
        let written = entry_count(&timeline);
        let key = AttributeKey::global(attrs::STATE_SINCE);

        // 19 seconds of drift: below the bound, nothing written.
        let mut json = snapshot_json();
        json["realtime"]["currentStateSinceTimestamp"] = serde_json::json!(1_660_000_019);
        let diff = StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_060)
            .unwrap();
        assert!(diff.is_empty());
        assert_eq!(entry_count(&timeline), written);

        // 21 seconds: a real change.
        json["realtime"]["currentStateSinceTimestamp"] = serde_json::json!(1_660_000_021);
        let diff = StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_120)
            .unwrap();
        assert_eq!(diff.len(), 1);
        assert!(diff.get(&key).is_some());
        assert_eq!(entry_count(&timeline), written + 1);
    }

    #[test]
    fn missing_counters_get_nulled() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_000)
            .unwrap();

        let mut json = snapshot_json();
        json["legends"]["selected"]["data"] = serde_json::json!([
            { "key": "kills", "value": 1_210 }
        ]);
        let diff = StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_060)
            .unwrap();

        let kills = AttributeKey::legend("Valkyrie", "tracker_kills");
        let damage = AttributeKey::legend("Valkyrie", "tracker_damage");
        assert_eq!(diff.len(), 2);
        assert_eq!(
            diff.get(&kills).unwrap().new,
            AttributeValue::present("1210")
        );
        assert_eq!(diff.get(&damage).unwrap().new, AttributeValue::Absent);
        assert_eq!(
            timeline.current_state().get(&damage),
            Some(&AttributeValue::Absent)
        );
    }

    #[test]
    fn switching_legends_does_not_null_the_previous_one() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_000)
            .unwrap();

        let mut json = snapshot_json();
        json["legends"]["selected"] = serde_json::json!({
            "LegendName": "Bloodhound",
            "data": [ { "key": "kills", "value": 88 } ]
        });
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_060)
            .unwrap();

        // Valkyrie's counters are no longer selected; they stay as last
        // observed rather than being nulled.
        let valk_kills = AttributeKey::legend("Valkyrie", "tracker_kills");
        assert_eq!(
            timeline.current_state().get(&valk_kills),
            Some(&AttributeValue::present("1207"))
        );
    }

    #[test]
    fn batch_shares_one_ingestion_timestamp() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_234)
            .unwrap();

        for entry in timeline.iter().unwrap() {
            assert_eq!(entry.unwrap().timestamp, 1_234);
        }
    }

    #[test]
    fn invalid_snapshot_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);

        let mut json = snapshot_json();
        json.as_object_mut().unwrap().remove("realtime");
        let result = StatIngest::new(&mut timeline).consume_value(&json);

        assert!(matches!(result, Err(ConsumeError::InvalidSnapshot(_))));
        assert!(timeline.current_state().is_empty());
        assert_eq!(entry_count(&timeline), 0);
    }

    #[test]
    fn going_offline_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut timeline = open(&dir);
        StatIngest::new(&mut timeline)
            .consume_at(&parse(&snapshot_json()), 1_000)
            .unwrap();

        let mut json = snapshot_json();
        json["realtime"] = serde_json::json!({
            "isOnline": 0,
            "currentState": "offline",
            "currentStateSinceTimestamp": 1_660_000_500
        });
        let diff = StatIngest::new(&mut timeline)
            .consume_at(&parse(&json), 1_060)
            .unwrap();
        assert!(diff.went_offline());
    }
}
