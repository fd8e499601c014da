//! Upstream stat snapshots and their conversion to attribute rows.

use serde::Deserialize;

use crate::attrs;
use crate::entry::{AttributeKey, AttributeValue};

/// One full player snapshot as returned by the upstream stat provider.
///
/// Only the fields the timeline tracks are modeled; anything else in the
/// provider response is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSnapshot {
    pub global: GlobalStats,
    pub realtime: RealtimeStats,
    pub legends: Legends,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalStats {
    pub name: String,
    pub level: f64,
    #[serde(rename = "toNextLevelPercent")]
    pub to_next_level_percent: f64,
    pub bans: Bans,
    pub rank: RankedStats,
    pub arena: RankedStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bans {
    #[serde(rename = "isActive")]
    pub is_active: Flag,
}

/// One ranked-mode tuple (battle royale or arenas).
#[derive(Debug, Clone, Deserialize)]
pub struct RankedStats {
    #[serde(rename = "rankScore")]
    pub rank_score: f64,
    #[serde(rename = "rankDiv")]
    pub rank_div: f64,
    #[serde(rename = "ladderPosPlatform")]
    pub ladder_pos_platform: f64,
    #[serde(rename = "rankName")]
    pub rank_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeStats {
    #[serde(rename = "isOnline")]
    pub is_online: Flag,
    #[serde(rename = "currentState")]
    pub current_state: String,
    #[serde(rename = "currentStateSinceTimestamp")]
    pub current_state_since: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Legends {
    pub selected: SelectedLegend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedLegend {
    #[serde(rename = "LegendName")]
    pub name: String,
    #[serde(default)]
    pub data: Vec<TrackerStat>,
}

/// One counter of the selected legend.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerStat {
    pub key: String,
    pub value: serde_json::Value,
}

/// Boolean field that the provider serializes as either a bool or a number.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    #[must_use]
    pub const fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

impl PlayerSnapshot {
    /// Derived online flag.
    ///
    /// The provider occasionally reports `isOnline` together with an
    /// `offline` current state and a `-1` since-timestamp; such responses
    /// count as offline.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.realtime.is_online.as_bool()
            && (self.realtime.current_state != "offline"
                || self.realtime.current_state_since != -1)
    }

    /// Flattens the snapshot into the attribute rows the timeline tracks.
    ///
    /// Row order is stable: global attributes first, then the selected
    /// legend's counters in provider order.
    #[must_use]
    pub fn attribute_rows(&self) -> Vec<(AttributeKey, AttributeValue)> {
        let global = &self.global;
        let realtime = &self.realtime;
        let selected = &self.legends.selected;

        let mut rows = vec![
            (
                AttributeKey::global(attrs::LEVEL),
                AttributeValue::present(number_string(
                    global.level + global.to_next_level_percent / 100.0,
                )),
            ),
            (
                AttributeKey::global(attrs::IS_ONLINE),
                AttributeValue::present(flag_string(self.is_online())),
            ),
            (
                AttributeKey::global(attrs::CUR_STATE),
                AttributeValue::present(realtime.current_state.clone()),
            ),
            (
                AttributeKey::global(attrs::STATE_SINCE),
                AttributeValue::present(realtime.current_state_since.to_string()),
            ),
            (
                AttributeKey::global(attrs::IS_BANNED),
                AttributeValue::present(flag_string(global.bans.is_active.as_bool())),
            ),
        ];

        rows.extend(ranked_rows(
            &global.rank,
            attrs::BR_RANK_SCORE,
            attrs::BR_RANK_DIV,
            attrs::BR_RANK_TOP_POS,
            attrs::BR_RANK_NAME,
        ));
        rows.extend(ranked_rows(
            &global.arena,
            attrs::AR_RANK_SCORE,
            attrs::AR_RANK_DIV,
            attrs::AR_RANK_TOP_POS,
            attrs::AR_RANK_NAME,
        ));

        rows.push((
            AttributeKey::global(attrs::NAME),
            AttributeValue::present(global.name.clone()),
        ));
        rows.push((
            AttributeKey::global(attrs::LEGEND),
            AttributeValue::present(selected.name.clone()),
        ));

        for tracker in &selected.data {
            rows.push((
                AttributeKey::legend(
                    &selected.name,
                    format!("{}{}", attrs::TRACKER_PREFIX, tracker.key),
                ),
                AttributeValue::present(value_string(&tracker.value)),
            ));
        }

        rows
    }
}

fn ranked_rows(
    ranked: &RankedStats,
    score: &str,
    div: &str,
    top_pos: &str,
    name: &str,
) -> Vec<(AttributeKey, AttributeValue)> {
    vec![
        (
            AttributeKey::global(score),
            AttributeValue::present(number_string(ranked.rank_score)),
        ),
        (
            AttributeKey::global(div),
            AttributeValue::present(number_string(ranked.rank_div)),
        ),
        (
            AttributeKey::global(top_pos),
            AttributeValue::present(number_string(ranked.ladder_pos_platform)),
        ),
        (
            AttributeKey::global(name),
            AttributeValue::present(ranked.rank_name.clone()),
        ),
    ]
}

fn number_string(n: f64) -> String {
    format!("{n}")
}

const fn flag_string(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

/// Counter values arrive as JSON numbers or strings; both keep their
/// natural text form.
fn value_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(online: bool, state: &str, since: i64) -> serde_json::Value {
        serde_json::json!({
            "global": {
                "name": "TTVPlayer",
                "tag": "ignored",
                "level": 72,
                "toNextLevelPercent": 35,
                "bans": { "isActive": false, "remainingSeconds": 0 },
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
                "isOnline": if online { 1 } else { 0 },
                "currentState": state,
                "currentStateSinceTimestamp": since,
                "lobbyState": "ignored"
            },
            "legends": {
                "selected": {
                    "LegendName": "Valkyrie",
                    "data": [
                        { "key": "kills", "name": "Kills", "value": 1207 },
                        { "key": "wins_season_13", "name": "Wins", "value": 18 }
                    ]
                }
            }
        })
    }

    fn sample(online: bool, state: &str, since: i64) -> PlayerSnapshot {
        serde_json::from_value(sample_json(online, state, since)).unwrap()
    }

    #[test]
    fn rows_cover_all_tracked_attributes() {
        let rows = sample(true, "inMatch", 1_660_000_000).attribute_rows();
        let rendered: String = rows
            .iter()
            .map(|(key, value)| format!("{} {} {}\n", key.scope, key.name, value))
            .collect();
        insta::assert_snapshot!(rendered, @r"
        _ level 72.35
        _ is_online 1
        _ cur_state inMatch
        _ state_since 1660000000
        _ is_banned 0
        _ br_rank_score 4800
        _ br_rank_div 2
        _ br_rank_top_pos -1
        _ br_rank_name Diamond
        _ ar_rank_score 1600
        _ ar_rank_div 0
        _ ar_rank_top_pos -1
        _ ar_rank_name Silver
        _ name TTVPlayer
        _ legend Valkyrie
        Valkyrie tracker_kills 1207
        Valkyrie tracker_wins_season_13 18
        ");
    }

    #[test]
    fn contradictory_realtime_counts_as_offline() {
        let snapshot = sample(true, "offline", -1);
        assert!(!snapshot.is_online());

        let snapshot = sample(true, "offline", 1_660_000_000);
        assert!(snapshot.is_online());

        let snapshot = sample(true, "inLobby", -1);
        assert!(snapshot.is_online());

        let snapshot = sample(false, "inLobby", 1_660_000_000);
        assert!(!snapshot.is_online());
    }

    #[test]
    fn bool_flags_accept_numbers_and_bools() {
        let mut json = sample_json(true, "inLobby", 5);
        json["realtime"]["isOnline"] = serde_json::json!(true);
        json["global"]["bans"]["isActive"] = serde_json::json!(1);
        let snapshot: PlayerSnapshot = serde_json::from_value(json).unwrap();
        assert!(snapshot.is_online());
        assert!(snapshot.global.bans.is_active.as_bool());
    }

    #[test]
    fn missing_required_section_is_an_error() {
        let mut json = sample_json(true, "inLobby", 5);
        json.as_object_mut().unwrap().remove("realtime");
        let result: Result<PlayerSnapshot, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_tracker_list_means_no_counters() {
        let mut json = sample_json(true, "inLobby", 5);
        json["legends"]["selected"]
            .as_object_mut()
            .unwrap()
            .remove("data");
        let snapshot: PlayerSnapshot = serde_json::from_value(json).unwrap();
        let rows = snapshot.attribute_rows();
        assert!(rows.iter().all(|(key, _)| key.scope.is_global()));
    }

    #[test]
    fn string_tracker_values_stay_verbatim() {
        let mut json = sample_json(true, "inLobby", 5);
        json["legends"]["selected"]["data"] = serde_json::json!([
            { "key": "damage", "value": "12045" }
        ]);
        let snapshot: PlayerSnapshot = serde_json::from_value(json).unwrap();
        let rows = snapshot.attribute_rows();
        let (_, value) = rows
            .iter()
            .find(|(key, _)| key.name == "tracker_damage")
            .unwrap();
        assert_eq!(value.as_str(), Some("12045"));
    }
}
