//! Process configuration management for the assistants gateway (spec §6
//! "Configuration").
//!
//! Loads settings from, in order:
//! 1. Default values
//! 2. Config file (`$ASSISTANTS_GATEWAY_CONFIG` or
//!    `~/.assistants-gateway/config.toml`)
//! 3. Environment variables (`ASSISTANTS_GATEWAY_*`, plus the agent
//!    credential, which is environment-only)

mod schema;

pub use schema::{ConfigIssue, GatewayConfig, IssueLevel, LimitsConfig, LlmConfig, RoutingConfig, ServerConfig, ServiceEndpoints};

use std::path::PathBuf;
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Missing required field.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".assistants-gateway")
}

/// Get the config file path: `$ASSISTANTS_GATEWAY_CONFIG` if set, else the
/// default config directory's `config.toml`.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var("ASSISTANTS_GATEWAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_dir().join("config.toml"))
}

/// Load configuration from the default path, with environment overrides
/// applied.
pub async fn load_config() -> ConfigResult<GatewayConfig> {
    load_config_from(config_path()).await
}

/// Load configuration from a specific path, with environment overrides
/// applied.
pub async fn load_config_from(path: PathBuf) -> ConfigResult<GatewayConfig> {
    let config = if path.exists() {
        let content = tokio::fs::read_to_string(&path).await?;
        let config: GatewayConfig = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config file");
        config
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        GatewayConfig::default()
    };

    Ok(config.with_env())
}

/// Save configuration to the default path. The agent credential is never
/// part of the serialized form (spec §6).
pub async fn save_config(config: &GatewayConfig) -> ConfigResult<()> {
    save_config_to(config, config_path()).await
}

/// Save configuration to a specific path.
pub async fn save_config_to(config: &GatewayConfig, path: PathBuf) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(&path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Initialize the configuration directory and create a default config file
/// if one does not already exist.
pub async fn init_config() -> ConfigResult<GatewayConfig> {
    let cfg_dir = default_config_dir();
    tokio::fs::create_dir_all(&cfg_dir).await?;

    let cfg_path = config_path();
    if !cfg_path.exists() {
        let config = GatewayConfig::default();
        save_config_to(&config, cfg_path.clone()).await?;
        info!("created default config at {}", cfg_path.display());
    }

    load_config().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let cfg_dir = default_config_dir();
        assert!(cfg_dir.ends_with(".assistants-gateway"));

        // SAFETY: test runs single-threaded within this process's test
        // harness; no concurrent env access to this var elsewhere.
        unsafe {
            std::env::remove_var("ASSISTANTS_GATEWAY_CONFIG");
        }
        let cfg_path = config_path();
        assert!(cfg_path.ends_with("config.toml"));
    }
}
