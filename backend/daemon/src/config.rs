//! Daemon configuration: YAML file in the config directory, with the bot
//! token overridable from the environment so it never has to live on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Paceline config directory.
/// Priority: `PACELINE_CONFIG_DIR` env > `~/.paceline/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PACELINE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".paceline");
    }
    PathBuf::from(".paceline")
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacelineConfig {
    /// Bot token; `PACELINE_BOT_TOKEN` overrides the file value.
    pub bot_token: String,
    /// Forum supergroup holding one audit topic per course.
    pub group_chat_id: i64,
    /// Optional announcement channel for removals.
    pub broadcast_chat_id: Option<i64>,
    pub tick_interval_secs: u64,
    pub max_strikes: u32,
    pub max_appeals: u32,
    pub reminder_ttl_minutes: u64,
    pub cleanup_after_hours: i64,
    /// Fixed UTC offset the whole program runs in.
    pub utc_offset_hours: i32,
    pub db_path: String,
    pub log_dir: String,
    pub log_level: String,
}

impl Default for PacelineConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            group_chat_id: 0,
            broadcast_chat_id: None,
            tick_interval_secs: 240,
            max_strikes: 3,
            max_appeals: paceline_core::MAX_APPEALS,
            reminder_ttl_minutes: 120,
            cleanup_after_hours: 24,
            utc_offset_hours: 3,
            db_path: "paceline.db".to_string(),
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl PacelineConfig {
    /// Load from disk, falling back to defaults on a missing file, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Config file does not exist; using defaults");
            Self::default()
        };
        if let Ok(token) = std::env::var("PACELINE_BOT_TOKEN") {
            config.bot_token = token;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.bot_token.is_empty(), "bot token is not configured");
        anyhow::ensure!(self.group_chat_id != 0, "group chat id is not configured");
        anyhow::ensure!(self.tick_interval_secs > 0, "tick interval must be positive");
        anyhow::ensure!(self.max_strikes > 0, "max strikes must be positive");
        Ok(())
    }
}
