//! Session-start detection over a backward entry scan.

use crate::attrs;
use crate::entry::TimelineEntry;

/// Longest break between two online periods that still counts as one
/// session, in seconds.
pub const MAX_SESSION_BREAK_SECS: i64 = 30 * 60;

/// Backward-scan state machine that finds where a session started.
///
/// Feed it entries newest-first through [`SessionScan::observe`]; it
/// answers with the session start as soon as a gap proves nothing earlier
/// can belong to the same session, and [`SessionScan::finish`] returns the
/// best candidate once the log is exhausted.
///
/// A session is the maximal run of online activity ending at or before
/// `before_time`. Going offline does not end the scan: if the player came
/// back within `max_break`, the runs on both sides merge into one session.
/// The gap comparison is strict, so an entry exactly `max_break` seconds
/// before the candidate still belongs to the session.
#[derive(Debug)]
pub struct SessionScan {
    before_time: i64,
    max_break: i64,
    candidate: Option<i64>,
}

impl SessionScan {
    #[must_use]
    pub const fn new(before_time: i64, max_break: i64) -> Self {
        Self {
            before_time,
            max_break,
            candidate: None,
        }
    }

    /// Scan with the default break bound of [`MAX_SESSION_BREAK_SECS`].
    #[must_use]
    pub const fn with_default_break(before_time: i64) -> Self {
        Self::new(before_time, MAX_SESSION_BREAK_SECS)
    }

    /// Observes the next entry of a newest-first scan.
    ///
    /// Returns the session start once it is proven; the caller stops
    /// feeding entries at that point.
    pub fn observe(&mut self, entry: &TimelineEntry) -> Option<i64> {
        if entry.timestamp > self.before_time {
            return None;
        }

        if let Some(candidate) = self.candidate {
            if entry.timestamp < candidate - self.max_break {
                // Too long silent before the candidate; anything earlier
                // is a different session.
                return Some(candidate);
            }
        }

        if is_online_entry(entry) {
            self.candidate = Some(entry.timestamp);
        }
        None
    }

    /// Returns the candidate found so far, for when the log is exhausted.
    #[must_use]
    pub const fn finish(&self) -> Option<i64> {
        self.candidate
    }
}

fn is_online_entry(entry: &TimelineEntry) -> bool {
    entry.key.scope.is_global()
        && entry.key.name == attrs::IS_ONLINE
        && entry.value.as_str() == Some("1")
}
