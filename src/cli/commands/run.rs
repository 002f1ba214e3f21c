//! Implementation of the `upgradevisor run` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::application::{run_until_exit, ProcessSupervisor};
use crate::cli::types::RunArgs;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::daemon_home::{HomeBinaryResolver, SymlinkInstaller};
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::os_signals;

/// Supervise the daemon until it exits without requesting an upgrade.
pub async fn execute(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let _logger = LoggerImpl::init(&LogConfig::try_from(&config.logging)?)
        .context("Failed to initialize logging")?;

    info!(
        home = %config.home.display(),
        daemon = %config.daemon_name,
        skip_backup = config.unsafe_skip_backup,
        "Supervisor starting"
    );

    let supervisor = ProcessSupervisor::new(
        config,
        Arc::new(HomeBinaryResolver::new()),
        Arc::new(SymlinkInstaller::new()),
    );
    let mut signals = os_signals().context("Failed to install signal handlers")?;

    let upgrades = run_until_exit(
        &supervisor,
        args.args.as_slice(),
        || (tokio::io::stdout(), tokio::io::stderr()),
        &mut signals,
    )
    .await?;

    info!(upgrades, "Supervisor finished");
    Ok(())
}
