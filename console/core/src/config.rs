//! Configuration
//!
//! Console settings come from a TOML file at
//! `$XDG_CONFIG_HOME/softphone/console.toml`, environment variables, and
//! command-line overrides applied by the surface.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! agent_name = "Dana Reyes"
//!
//! [store]
//! url = "https://project.example.co"
//! api_key = "anon-key"
//! table = "call_logs"
//! timeout_secs = 10
//!
//! [calls]
//! incoming_number = "+1 234-567-8900"
//! arrival_delay_secs = 3
//! history_limit = 15
//!
//! [logging]
//! file = "/tmp/softphone.log"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialer::is_dial_char;
use crate::history::DEFAULT_HISTORY_LIMIT;

/// Path of an alternative config file
pub const ENV_CONFIG: &str = "SOFTPHONE_CONFIG";
/// Agent display name
pub const ENV_AGENT_NAME: &str = "SOFTPHONE_AGENT_NAME";
/// Store base URL
pub const ENV_STORE_URL: &str = "SOFTPHONE_STORE_URL";
/// Store API key
pub const ENV_STORE_KEY: &str = "SOFTPHONE_STORE_KEY";
/// Store table name
pub const ENV_STORE_TABLE: &str = "SOFTPHONE_STORE_TABLE";
/// Number the simulated caller rings from
pub const ENV_INCOMING_NUMBER: &str = "SOFTPHONE_INCOMING_NUMBER";
/// Seconds before a simulated call arrives
pub const ENV_ARRIVAL_DELAY: &str = "SOFTPHONE_ARRIVAL_DELAY_SECS";
/// Records kept in the activity log
pub const ENV_HISTORY_LIMIT: &str = "SOFTPHONE_HISTORY_LIMIT";
/// Log file path
pub const ENV_LOG_FILE: &str = "SOFTPHONE_LOG_FILE";

/// Number the simulated caller rings from by default
pub const DEFAULT_INCOMING_NUMBER: &str = "+1 234-567-8900";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// No store URL configured
    #[error("No call store URL configured (set {ENV_STORE_URL} or [store] url)")]
    MissingStoreUrl,

    /// No store key configured
    #[error("No call store API key configured (set {ENV_STORE_KEY} or [store] api_key)")]
    MissingStoreKey,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where configuration values came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[store]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreToml {
    /// Service base URL
    pub url: Option<String>,
    /// Project API key
    pub api_key: Option<String>,
    /// Table holding call records
    pub table: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[calls]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallsToml {
    /// Number the simulated caller rings from
    pub incoming_number: Option<String>,
    /// Seconds before a simulated call arrives
    pub arrival_delay_secs: Option<u64>,
    /// Records kept in the activity log
    pub history_limit: Option<usize>,
}

/// `[logging]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Log file path
    pub file: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleToml {
    /// Agent display name
    pub agent_name: Option<String>,
    /// Store section
    pub store: StoreToml,
    /// Calls section
    pub calls: CallsToml,
    /// Logging section
    pub logging: LoggingToml,
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Record store connection settings
#[derive(Clone, Debug)]
pub struct StoreSettings {
    /// Service base URL
    pub url: Option<String>,
    /// Project API key
    pub api_key: Option<String>,
    /// Table holding call records
    pub table: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            table: "call_logs".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StoreSettings {
    /// URL and key, both required to reach the store
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStoreUrl`] or [`ConfigError::MissingStoreKey`].
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let url = non_blank(self.url.as_deref()).ok_or(ConfigError::MissingStoreUrl)?;
        let key = non_blank(self.api_key.as_deref()).ok_or(ConfigError::MissingStoreKey)?;
        Ok((url, key))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Simulated call settings
#[derive(Clone, Debug)]
pub struct CallSettings {
    /// Number the simulated caller rings from
    pub incoming_number: String,
    /// Delay before a simulated call arrives
    pub arrival_delay: Duration,
    /// Records kept in the activity log
    pub history_limit: usize,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            incoming_number: DEFAULT_INCOMING_NUMBER.to_string(),
            arrival_delay: Duration::from_secs(3),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Console configuration
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Agent display name
    pub agent_name: String,
    /// Record store settings
    pub store: StoreSettings,
    /// Simulated call settings
    pub calls: CallSettings,
    /// Log file, if logging is enabled
    pub log_file: Option<PathBuf>,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Highest-priority source that contributed a value
    source: ConfigSource,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            agent_name: "Console Agent".to_string(),
            store: StoreSettings::default(),
            calls: CallSettings::default(),
            log_file: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ConsoleConfig {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Apply CLI overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref name) = overrides.agent_name {
            self.agent_name = name.clone();
            self.source = ConfigSource::Cli;
        }
        if let Some(ref path) = overrides.log_file {
            self.log_file = Some(path.clone());
            self.source = ConfigSource::Cli;
        }
    }

    /// Check values that would break the console
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calls.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be at least 1".to_string(),
            ));
        }
        let number = &self.calls.incoming_number;
        if number.is_empty() || !number.chars().all(is_dial_char) {
            return Err(ConfigError::ValidationError(format!(
                "incoming_number {number:?} is not a dialable number"
            )));
        }
        if self.store.table.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store table must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overrides supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Agent display name
    pub agent_name: Option<String>,
    /// Log file path
    pub log_file: Option<PathBuf>,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/softphone/console.toml` or
/// `~/.config/softphone/console.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("softphone").join("console.toml"))
}

/// Load configuration from all sources with proper priority
///
/// Uses `SOFTPHONE_CONFIG` as the file path when set.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed,
/// or if a value fails validation. A missing config file is not an error.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    let path = std::env::var(ENV_CONFIG)
        .ok()
        .map(PathBuf::from)
        .or_else(default_config_path);
    load_config_from_path(path)
}

/// Load configuration from a specific path plus the process environment
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ConsoleConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ConsoleConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ConsoleConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConsoleToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, &env)?;
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ConsoleConfig, toml: &ConsoleToml) {
    if let Some(ref name) = toml.agent_name {
        config.agent_name = name.clone();
    }

    if toml.store.url.is_some() {
        config.store.url = toml.store.url.clone();
    }
    if toml.store.api_key.is_some() {
        config.store.api_key = toml.store.api_key.clone();
    }
    if let Some(ref table) = toml.store.table {
        config.store.table = table.clone();
    }
    if let Some(secs) = toml.store.timeout_secs {
        config.store.timeout = Duration::from_secs(secs);
    }

    if let Some(ref number) = toml.calls.incoming_number {
        config.calls.incoming_number = number.clone();
    }
    if let Some(secs) = toml.calls.arrival_delay_secs {
        config.calls.arrival_delay = Duration::from_secs(secs);
    }
    if let Some(limit) = toml.calls.history_limit {
        config.calls.history_limit = limit;
    }

    if toml.logging.file.is_some() {
        config.log_file = toml.logging.file.clone();
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut ConsoleConfig, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = env(ENV_AGENT_NAME) {
        config.agent_name = name;
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env(ENV_STORE_URL) {
        config.store.url = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(key) = env(ENV_STORE_KEY) {
        config.store.api_key = Some(key);
        config.source = ConfigSource::Env;
    }
    if let Some(table) = env(ENV_STORE_TABLE) {
        config.store.table = table;
        config.source = ConfigSource::Env;
    }
    if let Some(number) = env(ENV_INCOMING_NUMBER) {
        config.calls.incoming_number = number;
        config.source = ConfigSource::Env;
    }
    if let Some(delay) = env(ENV_ARRIVAL_DELAY) {
        let secs = delay.trim().parse::<u64>().map_err(|_| {
            ConfigError::ValidationError(format!("{ENV_ARRIVAL_DELAY}={delay:?} is not a number"))
        })?;
        config.calls.arrival_delay = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(limit) = env(ENV_HISTORY_LIMIT) {
        let limit = limit.trim().parse::<usize>().map_err(|_| {
            ConfigError::ValidationError(format!("{ENV_HISTORY_LIMIT}={limit:?} is not a number"))
        })?;
        config.calls.history_limit = limit;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env(ENV_LOG_FILE) {
        config.log_file = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    Ok(())
}
