//! Status command: one line per timeline in the data directory.

use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use statline_core::PlayerId;
use statline_store::Timeline;

use crate::Config;
use crate::commands::util::format_instant;

struct StatusRow {
    player: PlayerId,
    entries: usize,
    last: Option<i64>,
}

pub fn run(config: &Config) -> Result<()> {
    let dir = &config.timeline_dir;
    println!("Timelines in {}", dir.display());

    if !dir.exists() {
        println!("(none)");
        return Ok(());
    }

    let mut players: Vec<PlayerId> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "log"))
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
        })
        .collect();
    players.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    if players.is_empty() {
        println!("(none)");
        return Ok(());
    }

    let rows: Result<Vec<StatusRow>> = players
        .par_iter()
        .map(|player| summarize(dir, player))
        .collect();

    for row in rows? {
        let last = row.last.map_or_else(|| "-".to_string(), format_instant);
        println!("- {}: {} entries, last at {last}", row.player, row.entries);
    }

    Ok(())
}

fn summarize(dir: &Path, player: &PlayerId) -> Result<StatusRow> {
    let timeline = Timeline::open(dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;

    let mut entries = 0_usize;
    for entry in timeline.iter()? {
        entry?;
        entries += 1;
    }
    let last = timeline
        .iter_rev()?
        .next()
        .transpose()?
        .map(|entry| entry.timestamp);

    Ok(StatusRow {
        player: player.clone(),
        entries,
        last,
    })
}
