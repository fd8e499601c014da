//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use statline_core::PlayerId;

/// Player stat timeline tracker.
///
/// Keeps an append-only log of attribute changes per player and answers
/// questions about it: current state, session boundaries, and what changed
/// between two instants.
#[derive(Debug, Parser)]
#[command(name = "statline", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest one upstream stat snapshot for a player.
    Consume {
        /// Player whose timeline receives the snapshot.
        #[arg(long)]
        player: PlayerId,

        /// Read the snapshot JSON from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print nothing when the snapshot changed nothing.
        #[arg(long)]
        quiet: bool,
    },

    /// Show when the session in progress at a given instant started.
    Session {
        #[arg(long)]
        player: PlayerId,

        /// Scan backward from this instant (epoch seconds or RFC 3339);
        /// defaults to now.
        #[arg(long)]
        before: Option<String>,
    },

    /// Report what changed between two instants.
    Report {
        #[arg(long)]
        player: PlayerId,

        /// Window start (epoch seconds or RFC 3339).
        #[arg(long)]
        start: String,

        /// Window end (epoch seconds or RFC 3339).
        #[arg(long)]
        end: String,

        /// Emit the structured JSON form instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Dump the current value of every tracked attribute.
    State {
        #[arg(long)]
        player: PlayerId,

        #[arg(long)]
        json: bool,
    },

    /// Print decoded timeline entries.
    Log {
        #[arg(long)]
        player: PlayerId,

        /// Newest entries first.
        #[arg(long)]
        reverse: bool,

        /// Stop after this many entries.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Summarize every timeline in the data directory.
    Status,
}
