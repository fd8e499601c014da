//! statline CLI library.
//!
//! This crate provides the command-line interface over the timeline store.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
