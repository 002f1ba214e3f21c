//! Relaunch loop around a supervised daemon.

use std::ffi::OsStr;

use nix::sys::signal::Signal;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::info;

use super::ProcessSupervisor;
use crate::domain::errors::SupervisorResult;

/// Launch the daemon until it exits without an upgrade.
///
/// After each installed upgrade the daemon is relaunched from the freshly
/// resolved binary, unless `restart_after_upgrade` is off. `sinks` builds the
/// console writers for each launch. Returns the number of upgrades installed.
pub async fn run_until_exit<S, F, O, E>(
    supervisor: &ProcessSupervisor,
    args: &[S],
    mut sinks: F,
    signals: &mut mpsc::Receiver<Signal>,
) -> SupervisorResult<usize>
where
    S: AsRef<OsStr>,
    F: FnMut() -> (O, E),
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    let mut upgrades = 0;
    loop {
        let (stdout, stderr) = sinks();
        if !supervisor.launch(args, stdout, stderr, signals).await? {
            return Ok(upgrades);
        }
        upgrades += 1;

        if !supervisor.config().restart_after_upgrade {
            info!(upgrades, "Upgrade installed, restart_after_upgrade is off");
            return Ok(upgrades);
        }
        info!(upgrades, "Relaunching daemon after upgrade");
    }
}
