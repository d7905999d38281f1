//! Application Configuration
//!
//! Loaded from a JSON file; missing fields take their defaults. The database
//! path and log directory can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rolling_logger::LoggerConfig;

pub const DB_PATH_ENV: &str = "CHECKLIST_DB_PATH";
pub const LOG_DIR_ENV: &str = "CHECKLIST_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file, or ":memory:"
    pub db_path: PathBuf,
    /// File logging is off when unset
    pub log_dir: Option<PathBuf>,
    pub app_name: String,
    pub log_max_bytes: u64,
    pub log_max_files: usize,
    pub log_buffer_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("checklist.db"),
            log_dir: None,
            app_name: "DecorChecklist".to_string(),
            log_max_bytes: 5 * 1024 * 1024,
            log_max_files: 3,
            log_buffer_lines: 500,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        AppConfig::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|v| !v.is_empty()) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn logger_config(&self) -> Option<LoggerConfig> {
        let log_dir = self.log_dir.clone()?;
        let mut config = LoggerConfig::new(log_dir, &self.app_name);
        config.max_bytes = self.log_max_bytes;
        config.max_files = self.log_max_files;
        config.buffer_lines = self.log_buffer_lines;
        Some(config)
    }
}
