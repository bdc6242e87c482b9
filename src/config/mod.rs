// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Kiro

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Directory to watch (defaults to the user's Desktop)
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// Archive root (defaults to ~/Documents/Kiro_Archive)
    #[serde(default)]
    pub archive_root: Option<PathBuf>,

    /// Extensions considered images; empty accepts every file
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Stability wait settings
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Move journal settings
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StabilityConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Journal file; relative paths resolve against the archive root
    #[serde(default = "default_history_file")]
    pub file: PathBuf,
}

// Default value functions
fn default_poll_interval_ms() -> u64 { 500 }
fn default_timeout_secs() -> u64 { 10 }
fn default_true() -> bool { true }
fn default_history_file() -> PathBuf { PathBuf::from("kiro_history.jsonl") }

fn default_image_extensions() -> Vec<String> {
    vec!["png", "jpg", "jpeg", "bmp", "gif", "webp", "heic", "tiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            archive_root: None,
            image_extensions: default_image_extensions(),
            stability: StabilityConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_history_file(),
        }
    }
}

impl StabilityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl HistoryConfig {
    /// Journal location for a given archive root
    pub fn path_under(&self, archive_root: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            archive_root.join(&self.file)
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::KiroError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
