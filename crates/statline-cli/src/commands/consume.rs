//! Consume command: hand one upstream snapshot to the ingestion engine.
//!
//! The surrounding poller is out of scope; this command is its stand-in.
//! It reads a snapshot from a file or stdin, takes the per-directory
//! writer lock, and ingests.

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt as _;
use statline_core::PlayerId;
use statline_store::{StatIngest, Timeline};

use crate::Config;

pub fn run(config: &Config, player: &PlayerId, file: Option<&Path>, quiet: bool) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read snapshot from stdin")?;
            buf
        }
    };
    let snapshot: serde_json::Value =
        serde_json::from_str(&raw).context("snapshot is not valid JSON")?;

    std::fs::create_dir_all(&config.timeline_dir)
        .context("failed to create timeline directory")?;

    // One writer per data directory; concurrent consume calls queue here.
    let lock = File::create(config.timeline_dir.join(".lock"))
        .context("failed to create lock file")?;
    lock.lock_exclusive()
        .context("failed to acquire writer lock")?;

    let mut timeline = Timeline::open(&config.timeline_dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;
    let diff = StatIngest::new(&mut timeline).consume_value(&snapshot)?;
    timeline.close()?;

    if diff.is_empty() {
        if !quiet {
            println!("no changes");
        }
        return Ok(());
    }

    for (key, change) in diff.sorted() {
        match &change.old {
            Some(old) => println!("{key}: {old} -> {}", change.new),
            None => println!("{key}: {}", change.new),
        }
    }

    if diff.went_online() {
        tracing::info!(%player, "player came online");
    } else if diff.went_offline() {
        tracing::info!(%player, "player went offline");
    }

    Ok(())
}
