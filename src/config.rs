use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CaltrakError;
use crate::export::ExportFormat;
use crate::logging::{LogConfig, LogFormat, LogLevel};
use crate::models::UnitSystem;
use crate::session::{JsonSessionFile, DEFAULT_MAX_HISTORY};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Logging output
    #[serde(default)]
    pub logging: LogConfig,

    /// Session history settings
    #[serde(default)]
    pub sessions: SessionSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Unit system assumed when `--units` is not given
    pub default_units: UnitSystem,

    /// Output format for `calculate` when `--format` is not given
    pub output_format: ExportFormat,
}

/// Session history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sessions kept before the oldest is evicted
    pub max_history: usize,

    /// History file location
    pub history_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            logging: LogConfig::default(),
            sessions: SessionSettings::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            default_units: UnitSystem::Metric,
            output_format: ExportFormat::Text,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            max_history: DEFAULT_MAX_HISTORY,
            history_file: JsonSessionFile::default_path(),
        }
    }
}

/// Keys accepted by `config --get/--set`
pub const CONFIG_KEYS: &[&str] = &[
    "settings.default_units",
    "settings.output_format",
    "logging.level",
    "logging.format",
    "logging.file_path",
    "sessions.max_history",
    "sessions.history_file",
];

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".caltrak")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring unreadable config {}: {:#}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Read a single setting as a string
    pub fn get_value(&self, key: &str) -> crate::error::Result<String> {
        let value = match key {
            "settings.default_units" => self.settings.default_units.to_string(),
            "settings.output_format" => self.settings.output_format.as_str().to_string(),
            "logging.level" => self.logging.level.to_filter(),
            "logging.format" => format!("{:?}", self.logging.format).to_lowercase(),
            "logging.file_path" => self
                .logging
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "sessions.max_history" => self.sessions.max_history.to_string(),
            "sessions.history_file" => self.sessions.history_file.display().to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Update a single setting from a string
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        match key {
            "settings.default_units" => {
                self.settings.default_units =
                    value.parse::<UnitSystem>().map_err(CaltrakError::Configuration)?;
            }
            "settings.output_format" => {
                self.settings.output_format = value
                    .parse::<ExportFormat>()
                    .map_err(|e| CaltrakError::Configuration(e.to_string()))?;
            }
            "logging.level" => {
                self.logging.level = value.parse::<LogLevel>().map_err(CaltrakError::Configuration)?;
            }
            "logging.format" => {
                self.logging.format = value.parse::<LogFormat>().map_err(CaltrakError::Configuration)?;
            }
            "logging.file_path" => {
                self.logging.file_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "sessions.max_history" => {
                let max_history: usize = value
                    .parse()
                    .map_err(|_| CaltrakError::Configuration(format!("Invalid history size: {}", value)))?;
                if max_history == 0 {
                    return Err(CaltrakError::Configuration(
                        "sessions.max_history must be at least 1".to_string(),
                    ));
                }
                self.sessions.max_history = max_history;
            }
            "sessions.history_file" => {
                self.sessions.history_file = PathBuf::from(value);
            }
            _ => return Err(unknown_key(key)),
        }
        self.metadata.updated_at = Utc::now();
        Ok(())
    }

    /// All settings as key/value pairs, in `CONFIG_KEYS` order
    pub fn list_values(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get_value(key).ok().map(|value| (*key, value)))
            .collect()
    }
}

fn unknown_key(key: &str) -> CaltrakError {
    CaltrakError::Configuration(format!(
        "Unknown configuration key: {} (known keys: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.settings, config.settings);
        assert_eq!(parsed.sessions.max_history, DEFAULT_MAX_HISTORY);
    }

    #[test]
    fn test_get_and_set_values() {
        let mut config = AppConfig::default();
        config.set_value("settings.default_units", "imperial").unwrap();
        config.set_value("logging.level", "debug").unwrap();
        config.set_value("sessions.max_history", "10").unwrap();

        assert_eq!(config.get_value("settings.default_units").unwrap(), "imperial");
        assert_eq!(config.get_value("logging.level").unwrap(), "debug");
        assert_eq!(config.sessions.max_history, 10);

        assert!(matches!(
            config.set_value("sessions.max_history", "0"),
            Err(CaltrakError::Configuration(_))
        ));
        assert!(config.set_value("settings.colour", "red").is_err());
        assert!(config.get_value("nope").is_err());
        assert_eq!(config.list_values().len(), CONFIG_KEYS.len());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.settings.output_format = ExportFormat::Json;
        config.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.settings.output_format, ExportFormat::Json);
    }

    #[test]
    fn test_missing_sections_default() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2025-01-01T00:00:00Z"
            updated_at = "2025-01-01T00:00:00Z"

            [settings]
            default_units = "imperial"
            output_format = "csv"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.settings.default_units, UnitSystem::Imperial);
        assert_eq!(config.logging, LogConfig::default());
    }
}
