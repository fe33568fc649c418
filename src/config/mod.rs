//! Configuration management for cart-sync
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{FieldId, PlatformId, TagId};

/// Upper bound for a single backoff wait (one day)
pub const MAX_BACKOFF_LIMIT_SECS: u64 = 86_400;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Marketing platform API configuration
    pub platform: PlatformConfig,

    /// Custom field and tag identifiers
    pub fields: FieldsConfig,

    /// Retry configuration for throttled calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Outbound request pacing
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Orchestration settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Input record source
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // First, expand environment variables in the YAML string
        let expanded = expand_env_vars(yaml);
        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with prefix CART_SYNC_
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required_env("CART_SYNC_API_URL")?;
        let api_token = required_env("CART_SYNC_API_TOKEN")?;

        let mut config = Config {
            platform: PlatformConfig {
                base_url,
                api_token,
                request_timeout_secs: default_request_timeout(),
            },
            fields: FieldsConfig {
                correlation_field_id: FieldId(PlatformId::parse(&required_env(
                    "CART_SYNC_CORRELATION_FIELD_ID",
                )?)),
                cart_value_field_id: FieldId(PlatformId::parse(&required_env(
                    "CART_SYNC_CART_VALUE_FIELD_ID",
                )?)),
                tag_id: TagId(PlatformId::parse(&required_env("CART_SYNC_TAG_ID")?)),
            },
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sync: SyncConfig::default(),
            source: SourceConfig::default(),
            logging: LoggingConfig::default(),
        };

        if let Ok(path) = std::env::var("CART_SYNC_RECORDS_PATH") {
            config.source.path = Some(path);
        }
        if let Ok(level) = std::env::var("CART_SYNC_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("CART_SYNC_LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(workers) = std::env::var("CART_SYNC_MAX_CONCURRENT_RECORDS") {
            config.sync.max_concurrent_records = workers.parse().map_err(|_| {
                ConfigError::Parse("Invalid CART_SYNC_MAX_CONCURRENT_RECORDS".to_string())
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("platform.base_url".to_string()));
        }
        if self.platform.api_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired("platform.api_token".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue(
                "retry.backoff_multiplier must be a finite value of at least 1.0".to_string(),
            ));
        }
        if self.retry.max_backoff_secs > MAX_BACKOFF_LIMIT_SECS {
            return Err(ConfigError::InvalidValue(format!(
                "retry.max_backoff_secs must not exceed {}",
                MAX_BACKOFF_LIMIT_SECS
            )));
        }
        if self.retry.initial_backoff_secs > self.retry.max_backoff_secs {
            return Err(ConfigError::InvalidValue(
                "retry.initial_backoff_secs must not exceed retry.max_backoff_secs".to_string(),
            ));
        }
        if self.rate_limit.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue(
                "rate_limit.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.sync.max_concurrent_records == 0 {
            return Err(ConfigError::InvalidValue(
                "sync.max_concurrent_records must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingRequired(name.to_string()))
}

/// Marketing platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    /// API base URL, e.g. `https://account.api-us1.com/api/3`
    pub base_url: String,

    /// Value sent in the `Api-Token` header
    pub api_token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Custom field and tag identifiers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldsConfig {
    /// Field matched against a record's identity key
    pub correlation_field_id: FieldId,

    /// Field receiving the cart value
    pub cart_value_field_id: FieldId,

    /// Tag applied to contacts with an abandoned cart
    pub tag_id: TagId,
}

/// Retry configuration for throttled API calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff duration in seconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,

    /// Maximum backoff duration in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Whether to add jitter to backoff
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_backoff() -> u64 {
    60
}

fn default_max_backoff() -> u64 {
    3600 // 1 hour
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Rate limiting configuration for the platform client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Minimum interval between requests in milliseconds
    #[serde(default)]
    pub min_interval_ms: u64,

    /// Maximum number of in-flight requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 0,
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    1
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Records processed at the same time (1 = strictly sequential)
    #[serde(default = "default_max_concurrent_records")]
    pub max_concurrent_records: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_records: default_max_concurrent_records(),
        }
    }
}

fn default_max_concurrent_records() -> usize {
    1
}

/// Input record source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Path to a JSON or YAML file of records
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
