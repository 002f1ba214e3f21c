use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::upgrade::UPGRADE_INFO_FILENAME;

/// Smallest line-scanner capacity, so ordinary long log lines still scan.
pub const MIN_SCAN_BUFFER: usize = 64 * 1024;

/// Main configuration structure for the supervisor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Daemon home directory; live data lives in `<home>/data`
    #[serde(default)]
    pub home: PathBuf,

    /// File name of the daemon binary inside each `bin/` directory
    #[serde(default)]
    pub daemon_name: String,

    /// Skip the data backup taken before an upgrade is installed
    #[serde(default)]
    pub unsafe_skip_backup: bool,

    /// Relaunch the daemon once an upgrade has been installed
    #[serde(default = "default_restart_after_upgrade")]
    pub restart_after_upgrade: bool,

    /// Requested line-scanner capacity in bytes (raised to `MIN_SCAN_BUFFER`)
    #[serde(default = "default_log_buffer_size")]
    pub log_buffer_size: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_restart_after_upgrade() -> bool {
    true
}

const fn default_log_buffer_size() -> usize {
    MIN_SCAN_BUFFER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: PathBuf::new(),
            daemon_name: String::new(),
            unsafe_skip_backup: false,
            restart_after_upgrade: default_restart_after_upgrade(),
            log_buffer_size: default_log_buffer_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Live data directory of the daemon.
    pub fn data_dir(&self) -> PathBuf {
        self.home.join("data")
    }

    /// Location of the persisted upgrade-info file.
    pub fn upgrade_info_path(&self) -> PathBuf {
        self.data_dir().join(UPGRADE_INFO_FILENAME)
    }

    /// Effective scanner capacity for each output stream.
    pub fn scan_buffer_size(&self) -> usize {
        self.log_buffer_size.max(MIN_SCAN_BUFFER)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
