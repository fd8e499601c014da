//! Report command: what changed between two instants.
//!
//! The core hands over raw before/after values and numeric deltas; the
//! rendering here (and nothing deeper) decides how they read.

use std::fmt::Write as _;

use anyhow::{Context, Result, ensure};
use serde::Serialize;
use statline_core::{AttributeValue, PlayerId, Scope, Segment};
use statline_store::Timeline;

use crate::Config;
use crate::commands::util::{format_duration, format_instant, parse_instant};

/// Structured form of one segment report.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub player: String,
    pub start: i64,
    pub end: i64,
    pub duration_secs: i64,
    /// Globally scoped attributes that changed, sorted by name.
    pub changes: Vec<ChangeRow>,
    /// Per-legend counters that changed, sorted by key.
    pub counters: Vec<CounterRow>,
}

#[derive(Debug, Serialize)]
pub struct ChangeRow {
    pub name: String,
    pub before: AttributeValue,
    pub after: AttributeValue,
    /// Present when both sides parse as numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CounterRow {
    pub legend: String,
    pub name: String,
    pub before: AttributeValue,
    pub after: AttributeValue,
    /// `None` marks an unknown delta (either side absent or non-numeric).
    pub delta: Option<f64>,
}

impl SessionReport {
    #[must_use]
    pub fn build(player: &PlayerId, segment: &Segment) -> Self {
        let mut changes: Vec<ChangeRow> = segment
            .diff
            .iter()
            .filter(|(key, _)| key.scope.is_global())
            .map(|(key, change)| ChangeRow {
                name: key.name.clone(),
                delta: match (change.before.numeric(), change.after.numeric()) {
                    (Some(before), Some(after)) => Some(after - before),
                    _ => None,
                },
                before: change.before.clone(),
                after: change.after.clone(),
            })
            .collect();
        changes.sort_by(|a, b| a.name.cmp(&b.name));

        let counters = segment
            .counter_deltas()
            .into_iter()
            .map(|delta| CounterRow {
                legend: match &delta.key.scope {
                    Scope::Legend(name) => name.clone(),
                    Scope::Global => String::new(),
                },
                name: delta.key.name,
                before: delta.before,
                after: delta.after,
                delta: delta.delta,
            })
            .collect();

        Self {
            player: player.to_string(),
            start: segment.start,
            end: segment.end,
            duration_secs: segment.duration(),
            changes,
            counters,
        }
    }
}

/// Renders the human-readable form of a report.
#[must_use]
pub fn format_report(report: &SessionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Report for {}", report.player);
    let _ = writeln!(
        out,
        "Window: {} .. {} ({})",
        format_instant(report.start),
        format_instant(report.end),
        format_duration(report.duration_secs)
    );

    if report.changes.is_empty() && report.counters.is_empty() {
        let _ = writeln!(out, "No changes in window.");
        return out;
    }

    if !report.changes.is_empty() {
        let _ = writeln!(out, "Changed:");
        for row in &report.changes {
            match row.delta {
                Some(delta) => {
                    let _ = writeln!(
                        out,
                        "  {}: {} -> {} ({delta:+})",
                        row.name, row.before, row.after
                    );
                }
                None => {
                    let _ = writeln!(out, "  {}: {} -> {}", row.name, row.before, row.after);
                }
            }
        }
    }

    if !report.counters.is_empty() {
        let _ = writeln!(out, "Trackers:");
        for row in &report.counters {
            let delta = row
                .delta
                .map_or_else(|| "?".to_string(), |delta| format!("{delta:+}"));
            let _ = writeln!(
                out,
                "  {}/{}: {} -> {} ({delta})",
                row.legend, row.name, row.before, row.after
            );
        }
    }

    out
}

pub fn run(config: &Config, player: &PlayerId, start: &str, end: &str, json: bool) -> Result<()> {
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    ensure!(start <= end, "start must not be after end");

    let timeline = Timeline::open(&config.timeline_dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;
    let segment = timeline.segment(start, end)?;
    let report = SessionReport::build(player, &segment);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }

    Ok(())
}
