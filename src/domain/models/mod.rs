pub mod config;
pub mod upgrade;

pub use config::{Config, LoggingConfig, MIN_SCAN_BUFFER};
pub use upgrade::{StreamKind, SupervisorOutcome, UpgradeDescriptor, UPGRADE_INFO_FILENAME};
