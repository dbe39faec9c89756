//! Application configuration

use crate::engine::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::repository::{ArmingStatus, DEFAULT_MAX_SENSORS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "CATPOINT_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub confidence_threshold: f32,
    pub max_sensors: usize,
    pub initial_arming_status: ArmingStatus,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_sensors: DEFAULT_MAX_SENSORS,
            initial_arming_status: ArmingStatus::Disarmed,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub level: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            level: "info".to_string(),
            file_name: "catpoint-panel.log".to_string(),
        }
    }
}

fn default_log_directory() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var("ProgramData")
            .map(|p| PathBuf::from(p).join("Catpoint").join("logs"))
            .unwrap_or_else(|_| PathBuf::from("C:/ProgramData/Catpoint/logs"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".catpoint").join("logs"))
            .unwrap_or_else(|_| std::env::temp_dir().join("catpoint-logs"))
    }
}

impl Config {
    /// Parse a TOML config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path first, then `CATPOINT_CONFIG`, then defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match std::env::var(CONFIG_ENV_VAR) {
            Ok(v) if !v.trim().is_empty() => Self::from_file(Path::new(v.trim())),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within 0..=100, got {}",
                self.confidence_threshold
            )));
        }
        if self.max_sensors == 0 {
            return Err(ConfigError::Invalid("max_sensors must be at least 1".to_string()));
        }
        Ok(())
    }
}
