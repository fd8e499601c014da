//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one timeline log per player.
    pub timeline_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            timeline_dir: data_dir.join("timelines"),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Layering: defaults, then `config.toml` in the XDG config dir, then
    /// the given file, then `STATLINE_`-prefixed environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("STATLINE_"));

        figment.extract()
    }
}

/// Platform-specific config directory for statline.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("statline"))
}

/// Platform-specific data directory for statline.
///
/// On Linux: `~/.local/share/statline`
fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("statline"))
}
