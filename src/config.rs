// Configuration File Support
//
// This module provides configuration file parsing for analytics-quota.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from the platform config directory,
// e.g. ~/.config/analytics-quota/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default analytics REST API version
pub const DEFAULT_API_VERSION: &str = "58.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Analytics platform connection
    pub platform: PlatformConfig,

    /// License grant source and premium tier settings
    pub licenses: LicensesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Analytics platform connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    /// Instance base URL, e.g. https://tenant.my.example.com
    pub base_url: Option<String>,

    /// Session token sent as a bearer credential
    pub session_token: Option<String>,

    /// REST API version used to build endpoint paths
    pub api_version: String,

    /// Timeout in seconds for each request
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            session_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }
}

/// License grant source and premium tier settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LicensesConfig {
    /// Label prefix of the premium analytics tiers
    pub premium_prefix: String,

    /// JSON file holding the tenant's license grant records
    pub grants_file: Option<PathBuf>,
}

impl Default for LicensesConfig {
    fn default() -> Self {
        Self {
            premium_prefix: crate::license::DEFAULT_PREMIUM_PREFIX.to_string(),
            grants_file: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment overrides are applied and the result is validated whether
    /// or not the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if the resulting configuration is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::debug!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "analytics-quota", "analytics-quota")
        {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("analytics-quota")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - ANALYTICS_QUOTA_BASE_URL
    /// - ANALYTICS_QUOTA_SESSION_TOKEN
    /// - ANALYTICS_QUOTA_API_VERSION
    /// - ANALYTICS_QUOTA_TIMEOUT_SECS
    /// - ANALYTICS_QUOTA_GRANTS_FILE
    /// - ANALYTICS_QUOTA_LOG_LEVEL
    /// - ANALYTICS_QUOTA_LOG_FORMAT
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("ANALYTICS_QUOTA_BASE_URL") {
            self.platform.base_url = Some(url);
        }
        if let Ok(token) = std::env::var("ANALYTICS_QUOTA_SESSION_TOKEN") {
            self.platform.session_token = Some(token);
        }
        if let Ok(version) = std::env::var("ANALYTICS_QUOTA_API_VERSION") {
            self.platform.api_version = version;
        }
        if let Ok(timeout) = std::env::var("ANALYTICS_QUOTA_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.platform.timeout_secs = timeout;
                }
            }
        }

        if let Ok(path) = std::env::var("ANALYTICS_QUOTA_GRANTS_FILE") {
            self.licenses.grants_file = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("ANALYTICS_QUOTA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ANALYTICS_QUOTA_LOG_FORMAT") {
            self.logging.format = format;
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.platform.timeout_secs == 0 {
            anyhow::bail!("Platform timeout must be > 0");
        }
        if self.platform.api_version.trim().is_empty() {
            anyhow::bail!("Platform API version must not be empty");
        }
        if let Some(url) = &self.platform.base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                anyhow::bail!("Platform base URL must start with http:// or https://: {}", url);
            }
        }

        if self.licenses.premium_prefix.trim().is_empty() {
            anyhow::bail!("License premium prefix must not be empty");
        }

        Ok(())
    }

    /// Ensure everything needed to reach the analytics API is configured
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing setting.
    pub fn require_platform(&self) -> Result<&PlatformConfig> {
        if self.platform.base_url.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!(
                "No platform base URL configured. Set [platform] base_url or ANALYTICS_QUOTA_BASE_URL"
            );
        }
        if self.platform.session_token.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!(
                "No session token configured. Set [platform] session_token or ANALYTICS_QUOTA_SESSION_TOKEN"
            );
        }
        Ok(&self.platform)
    }

    /// Endpoint layout for the configured API version
    pub fn endpoints(&self) -> crate::analytics::Endpoints {
        crate::analytics::Endpoints::new(self.platform.api_version.clone())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
