use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default project config file, read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "upgradevisor.yaml";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Daemon home directory must be set")]
    EmptyHome,

    #[error("Daemon name must be set")]
    EmptyDaemonName,

    #[error("Invalid daemon name: {0:?}. Must be a plain file name")]
    InvalidDaemonName(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or ./upgradevisor.yaml when no path is given (optional)
    /// 3. Legacy daemon variables (DAEMON_HOME, DAEMON_NAME, ...)
    /// 4. Environment variables (UPGRADEVISOR_* prefix, highest priority)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if path.is_some() && !file.is_file() {
            anyhow::bail!("Config file {} does not exist", file.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(legacy_env())
            .merge(Env::prefixed("UPGRADEVISOR_").split("__"))
            .extract()
            .context(format!("Failed to load config from {}", file.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.home.as_os_str().is_empty() {
            return Err(ConfigError::EmptyHome);
        }

        if config.daemon_name.is_empty() {
            return Err(ConfigError::EmptyDaemonName);
        }

        if config.daemon_name.contains(std::path::is_separator)
            || config.daemon_name == "."
            || config.daemon_name == ".."
        {
            return Err(ConfigError::InvalidDaemonName(config.daemon_name.clone()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

/// Environment names understood by earlier daemon supervisors.
fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        let mapped = match key.as_str().to_ascii_uppercase().as_str() {
            "DAEMON_HOME" => "home",
            "DAEMON_NAME" => "daemon_name",
            "DAEMON_RESTART_AFTER_UPGRADE" => "restart_after_upgrade",
            "DAEMON_LOG_BUFFER_SIZE" => "log_buffer_size",
            "UNSAFE_SKIP_BACKUP" => "unsafe_skip_backup",
            _ => return None,
        };
        Some(mapped.into())
    })
}
