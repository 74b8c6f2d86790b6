//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tally_core::{DEFAULT_DOCUMENT_KEY, DEFAULT_WINDOW_MINUTES, RetentionPolicy};

/// Which store holds the statistics document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A JSON file at `store_path`.
    #[default]
    Json,
    /// A `kv` table in the SQLite database at `store_path`.
    Sqlite,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON file or SQLite database.
    pub store_path: PathBuf,
    pub backend: Backend,
    /// Key the document is stored under.
    pub document_key: String,
    /// Default window for `tally recent`.
    pub recent_window_minutes: i64,
    pub retention: RetentionPolicy,
    /// Optional second JSON file rewritten after every change.
    pub mirror_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store_path", &self.store_path)
            .field("backend", &self.backend)
            .field("document_key", &self.document_key)
            .field("recent_window_minutes", &self.recent_window_minutes)
            .field("mirror_path", &self.mirror_path)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            store_path: data_dir.join("stats.json"),
            backend: Backend::default(),
            document_key: DEFAULT_DOCUMENT_KEY.to_string(),
            recent_window_minutes: DEFAULT_WINDOW_MINUTES,
            retention: RetentionPolicy::default(),
            mirror_path: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TALLY_*, nested keys split on `__`)
        figment = figment.merge(Env::prefixed("TALLY_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for tally.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}

/// Returns the platform-specific data directory for tally.
///
/// On Linux: `~/.local/share/tally`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tally"))
}
