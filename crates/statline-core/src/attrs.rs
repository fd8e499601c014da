//! Well-known attribute names produced by snapshot ingestion.

pub const LEVEL: &str = "level";
pub const IS_ONLINE: &str = "is_online";
pub const CUR_STATE: &str = "cur_state";
pub const STATE_SINCE: &str = "state_since";
pub const IS_BANNED: &str = "is_banned";

pub const BR_RANK_SCORE: &str = "br_rank_score";
pub const BR_RANK_DIV: &str = "br_rank_div";
pub const BR_RANK_TOP_POS: &str = "br_rank_top_pos";
pub const BR_RANK_NAME: &str = "br_rank_name";

pub const AR_RANK_SCORE: &str = "ar_rank_score";
pub const AR_RANK_DIV: &str = "ar_rank_div";
pub const AR_RANK_TOP_POS: &str = "ar_rank_top_pos";
pub const AR_RANK_NAME: &str = "ar_rank_name";

pub const NAME: &str = "name";
pub const LEGEND: &str = "legend";

/// Prefix shared by per-legend counter attributes.
pub const TRACKER_PREFIX: &str = "tracker_";

/// Whether an attribute name is a per-legend counter.
#[must_use]
pub fn is_tracker(name: &str) -> bool {
    name.starts_with(TRACKER_PREFIX)
}
