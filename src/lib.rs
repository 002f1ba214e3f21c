//! Upgradevisor - daemon upgrade supervisor
//!
//! Upgradevisor launches a long-running daemon, copies its output through to
//! the console, and watches both output streams for an upgrade marker. When
//! the daemon announces that it halted for an upgrade, the supervisor stops
//! it, backs up its data directory, hands off to an upgrade installer, and
//! relaunches the new binary.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): descriptors, outcomes, errors, and the
//!   collaborator ports
//! - **Service Layer** (`services`): stream watching, result aggregation,
//!   signal forwarding, and data backup
//! - **Application Layer** (`application`): the per-launch supervisor and the
//!   relaunch loop
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, and
//!   the default home-directory adapters
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upgradevisor::application::{run_until_exit, ProcessSupervisor};
//! use upgradevisor::infrastructure::daemon_home::{HomeBinaryResolver, SymlinkInstaller};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = upgradevisor::ConfigLoader::load(None)?;
//!     let supervisor = ProcessSupervisor::new(
//!         config,
//!         Arc::new(HomeBinaryResolver::new()),
//!         Arc::new(SymlinkInstaller::new()),
//!     );
//!     let mut signals = upgradevisor::services::os_signals()?;
//!     run_until_exit(&supervisor, &["start"], || (tokio::io::stdout(), tokio::io::stderr()), &mut signals).await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{run_until_exit, wait_for_upgrade_or_exit, ProcessSupervisor};
pub use domain::errors::{BackupError, MarkerError, RunError, SupervisorError, SupervisorResult};
pub use domain::models::{Config, LoggingConfig, StreamKind, SupervisorOutcome, UpgradeDescriptor};
pub use domain::ports::{BinaryResolver, UpgradeInstaller};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{BackupService, ResultAggregator, SignalForwarder, StreamWatcher};
