//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file and defines constants for
//! HTTP cache headers, the capacity-provider sentinel, metadata endpoint
//! defaults, logging format, and default paths. `AppConfig` is the root
//! configuration struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Error responses - short TTL so a transient upstream fault does not stick
/// in intermediary caches
pub const HTTP_CACHE_ERROR_MAX_AGE: u32 = 5;

/// The placement report reflects live control-plane state and must never be
/// served stale by an intermediary.
pub const CACHE_CONTROL_REPORT: &str = "no-store";

pub const CACHE_CONTROL_ERROR: &str = formatcp!("public, max-age={}", HTTP_CACHE_ERROR_MAX_AGE);

// =============================================================================
// Capacity Provider Reporting
// =============================================================================

/// Value reported for a task whose describe record carries no
/// capacity-provider name (i.e. the task was not placed by a capacity
/// provider strategy).
pub const NO_CAPACITY_PROVIDER_SENTINEL: &str = "NON_DEFAULT";

/// DescribeTasks accepts at most this many task ARNs per call.
pub const DESCRIBE_TASKS_MAX_BATCH: usize = 100;

// =============================================================================
// Task Metadata Endpoint
// =============================================================================

/// Environment variable ECS injects with the base URL of the per-container
/// task metadata endpoint.
pub const METADATA_BASE_URL_ENV: &str = "ECS_CONTAINER_METADATA_URI_V4";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "capmap=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// ECS control-plane settings
    pub ecs: EcsConfig,
    /// Task metadata endpoint settings
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// ECS control-plane settings.
///
/// The list and describe cluster names are distinct on purpose: tasks are
/// listed from the capacity-provider cluster but described against the
/// workload cluster. Both default to the names the service has historically
/// used.
#[derive(Debug, Clone, Deserialize)]
pub struct EcsConfig {
    /// Cluster whose tasks are listed
    #[serde(default = "EcsConfig::default_list_cluster")]
    pub list_cluster: String,
    /// Cluster the listed tasks are described against
    #[serde(default = "EcsConfig::default_describe_cluster")]
    pub describe_cluster: String,
    /// AWS region override; falls back to the SDK's default region chain
    pub region: Option<String>,
}

impl EcsConfig {
    fn default_list_cluster() -> String {
        "ecs-capacityproviders".to_string()
    }

    fn default_describe_cluster() -> String {
        "container-demo".to_string()
    }
}

/// Task metadata endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Base URL override; when unset the `ECS_CONTAINER_METADATA_URI_V4`
    /// environment variable is required
    pub base_url: Option<String>,
    /// Request timeout in seconds for the metadata fetch
    #[serde(default = "MetadataConfig::default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: Self::default_timeout(),
        }
    }
}

impl MetadataConfig {
    fn default_timeout() -> u64 {
        5
    }

    /// Resolve the metadata base URL: config override first, then the ECS
    /// injected environment variable.
    pub fn resolve_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        std::env::var(METADATA_BASE_URL_ENV).map_err(|_| {
            ConfigError::Validation(format!(
                "No metadata endpoint configured. Set [metadata] base_url or the {} environment variable",
                METADATA_BASE_URL_ENV
            ))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;

        if config.ecs.list_cluster.is_empty() || config.ecs.describe_cluster.is_empty() {
            return Err(ConfigError::Validation(
                "Cluster names must not be empty. Set [ecs] list_cluster and describe_cluster"
                    .to_string(),
            ));
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
