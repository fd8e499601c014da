//! Log command: print decoded timeline entries.

use anyhow::{Context, Result};
use statline_core::{PlayerId, TimelineEntry};
use statline_store::{StorageError, Timeline};

use crate::Config;
use crate::commands::util::format_instant;

pub fn run(config: &Config, player: &PlayerId, reverse: bool, limit: Option<usize>) -> Result<()> {
    let timeline = Timeline::open(&config.timeline_dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;

    let limit = limit.unwrap_or(usize::MAX);
    if reverse {
        print_entries(timeline.iter_rev()?, limit)
    } else {
        print_entries(timeline.iter()?, limit)
    }
}

fn print_entries(
    entries: impl Iterator<Item = Result<TimelineEntry, StorageError>>,
    limit: usize,
) -> Result<()> {
    for entry in entries.take(limit) {
        let entry = entry?;
        println!(
            "{} {} = {}",
            format_instant(entry.timestamp),
            entry.key,
            entry.value
        );
    }
    Ok(())
}
