//! Shared helpers for command implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};

/// Parses an instant given as epoch seconds or an RFC 3339 timestamp.
pub fn parse_instant(s: &str) -> Result<i64> {
    if let Ok(epoch) = s.parse::<i64>() {
        return Ok(epoch);
    }
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid instant {s:?} (expected epoch seconds or RFC 3339)"))?;
    Ok(parsed.timestamp())
}

/// Formats an epoch-seconds instant as UTC RFC 3339.
///
/// Falls back to the raw number for instants chrono cannot represent.
#[must_use]
pub fn format_instant(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0).single().map_or_else(
        || timestamp.to_string(),
        |dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    )
}

/// Formats a duration in seconds as `Xh Ym`, `Ym` or `Zs`.
#[must_use]
pub fn format_duration(secs: i64) -> String {
    if secs < 0 {
        return "0s".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{secs}s")
    }
}
