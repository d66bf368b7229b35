//! # Configuration
//!
//! TOML configuration for the `wayfarer` binary: where progress is stored,
//! where content (achievements, collectibles, ranks) is read from, banner
//! timing and logging.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//! progress_key = "userProgress"
//!
//! [content]
//! dir = "./content"
//! achievements_file = "achievements.json"
//! collectibles_file = "collectibles.json"
//! # ranks_file = "ranks.json"
//!
//! [notifications]
//! dismiss_after_ms = 3000
//!
//! [logging]
//! level = "info"
//! # file = "wayfarer.log"
//! ```
//!
//! Every section has defaults, so a partial file (or an empty one) loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::progress::storage::{progress_db_path, DEFAULT_PROGRESS_KEY};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Logical key the progress record is stored under.
    pub progress_key: String,
}

fn default_progress_key() -> String {
    DEFAULT_PROGRESS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            progress_key: default_progress_key(),
        }
    }
}

impl StorageConfig {
    /// Sled database directory.
    pub fn db_path(&self) -> PathBuf {
        progress_db_path(&self.data_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub dir: String,
    pub achievements_file: String,
    pub collectibles_file: String,
    /// Optional rank table; the built-in explorer ladder is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranks_file: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "./content".to_string(),
            achievements_file: "achievements.json".to_string(),
            collectibles_file: "collectibles.json".to_string(),
            ranks_file: None,
        }
    }
}

impl ContentConfig {
    pub fn achievements_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.achievements_file)
    }

    pub fn collectibles_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.collectibles_file)
    }

    pub fn ranks_path(&self) -> Option<PathBuf> {
        self.ranks_file
            .as_ref()
            .map(|f| PathBuf::from(&self.dir).join(f))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a banner stays up before auto-dismissing.
    pub dismiss_after_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 3000,
        }
    }
}

impl NotificationConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter; unknown names fall back to `info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| anyhow!("invalid wayfarer config: {}", e))
    }

    /// Read and parse the config file at `path`.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).await.map_err(|e| {
            anyhow!(
                "cannot read {} ({}); run `wayfarer init` to create one",
                path.display(),
                e
            )
        })?;
        Self::from_toml(&text).map_err(|e| anyhow!("{}: {}", path.display(), e))
    }

    /// Write the default config to `path`. An existing file is left alone
    /// and `false` is returned.
    pub async fn create_default<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            return Ok(false);
        }
        let text = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("cannot render default config: {}", e))?;
        fs::write(path, text)
            .await
            .map_err(|e| anyhow!("cannot write {}: {}", path.display(), e))?;
        Ok(true)
    }
}
