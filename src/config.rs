use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{Result, TrackerError};
use crate::ingest::scanner::{Scanner, DEFAULT_IGNORED_DIRS};

/// Default directory name for tracker state.
const STATE_DIR: &str = ".jtrack";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";
/// Default JSON data filename.
const JSON_DATA_FILE: &str = "java-files.json";
/// Default SQLite data filename.
const SQLITE_DATA_FILE: &str = "tracker.db";

/// Tracker configuration resolved from the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the tracker was started in.
    pub home: PathBuf,
    /// Path to the `.jtrack/` directory.
    pub state_dir: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .jtrack/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub scan: ScanSettings,
    pub store: StoreSettings,
    pub output: OutputSettings,
}

/// Scan-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Directory names never descended into.
    pub ignored_dirs: Vec<String>,
    /// Also honor `.gitignore` files.
    pub respect_gitignore: bool,
    /// Items processed between progress yields.
    pub batch_size: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| (*s).to_string()).collect(),
            respect_gitignore: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Data file name or path relative to `.jtrack/`.
    pub data_file: Option<String>,
}

/// Output-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: "minified" (default) or "pretty".
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "minified".into(),
        }
    }
}

impl Config {
    /// Create config rooted at `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let state_dir = home.join(STATE_DIR);
        let config_path = state_dir.join(CONFIG_FILE);

        // Try to load settings from config.toml
        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            home,
            state_dir,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| TrackerError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "invalid config, using defaults");
                None
            }
        }
    }

    /// Ensure the `.jtrack/` directory exists.
    pub fn ensure_state_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        Ok(())
    }

    /// Path of the data file for the configured backend.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        match &self.settings.store.data_file {
            Some(custom) => self.state_dir.join(custom),
            None => match self.settings.store.backend {
                StoreBackend::Json => self.state_dir.join(JSON_DATA_FILE),
                StoreBackend::Sqlite => self.state_dir.join(SQLITE_DATA_FILE),
            },
        }
    }

    /// Build a scanner for `root` using the configured filters.
    #[must_use]
    pub fn scanner(&self, root: impl Into<PathBuf>) -> Scanner {
        Scanner::new(root)
            .with_ignored_dirs(self.settings.scan.ignored_dirs.iter().cloned())
            .respect_gitignore(self.settings.scan.respect_gitignore)
    }

    #[must_use]
    pub fn pretty_output(&self) -> bool {
        self.settings.output.format == "pretty"
    }
}
