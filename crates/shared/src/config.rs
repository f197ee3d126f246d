//! Configuration management for the seasonal AniList ETL.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// GraphQL document used when no `query_path` is configured.
pub const DEFAULT_QUERY: &str = include_str!("../queries/season_media.graphql");

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Database settings
    pub database: DatabaseConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// AniList fetch settings
    #[serde(default)]
    pub anilist: AniListConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path (relative to data directory or absolute)
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// AniList API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AniListConfig {
    /// GraphQL endpoint
    pub endpoint: String,

    /// Path to the GraphQL query document. Empty means the bundled query.
    pub query_path: String,

    /// Stop paginating once `X-RateLimit-Remaining` drops below this
    pub rate_limit_floor: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Wait between (year, season) units in seconds
    pub cooldown_secs: u64,
}

impl Default for AniListConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://graphql.anilist.co".to_string(),
            query_path: String::new(),
            rate_limit_floor: 20,
            request_timeout_secs: 10,
            cooldown_secs: 10,
        }
    }
}

impl AniListConfig {
    /// Read the configured query document, falling back to the bundled one.
    pub fn load_query(&self) -> Result<String> {
        if self.query_path.is_empty() {
            return Ok(DEFAULT_QUERY.to_string());
        }

        std::fs::read_to_string(&self.query_path)
            .with_context(|| format!("Failed to read GraphQL query: {}", self.query_path))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            database: DatabaseConfig {
                path: "anilist.db".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            anilist: AniListConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a TOML file or create default if not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the database file
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database.path)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    /// Parse the configured default log level, falling back to INFO.
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .default_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}
