//! Session command: locate the start of the session in progress.

use anyhow::{Context, Result};
use statline_core::PlayerId;
use statline_store::Timeline;

use crate::Config;
use crate::commands::util::{format_instant, parse_instant};

pub fn run(config: &Config, player: &PlayerId, before: Option<&str>) -> Result<()> {
    let before_time = match before {
        Some(s) => parse_instant(s)?,
        None => chrono::Utc::now().timestamp(),
    };

    let timeline = Timeline::open(&config.timeline_dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;

    match timeline.find_session_start(before_time)? {
        Some(start) => println!("session started at {} ({start})", format_instant(start)),
        None => println!("no session found"),
    }

    Ok(())
}
