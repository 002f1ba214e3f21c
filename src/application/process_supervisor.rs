//! Daemon Process Supervisor
//!
//! Launches the daemon binary, watches both of its output streams for an
//! upgrade marker, forwards operator signals, and when an upgrade is requested
//! stops the daemon, backs up its data, and hands off to the installer.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::io::AsyncWrite;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{RunError, SupervisorError, SupervisorResult};
use crate::domain::models::{Config, StreamKind, SupervisorOutcome};
use crate::domain::ports::{BinaryResolver, UpgradeInstaller};
use crate::services::{BackupService, ResultAggregator, SignalForwarder, StreamWatcher};

/// Daemon process supervisor
///
/// Owns the daemon child process for the duration of each run; it is the
/// only component that kills or signals it.
pub struct ProcessSupervisor {
    config: Config,
    resolver: Arc<dyn BinaryResolver>,
    installer: Arc<dyn UpgradeInstaller>,
    backup: BackupService,
}

impl ProcessSupervisor {
    /// Create a new supervisor
    ///
    /// # Arguments
    ///
    /// * `config` - Supervisor configuration
    /// * `resolver` - Locates and validates the daemon binary
    /// * `installer` - Installs a requested upgrade
    pub fn new(
        config: Config,
        resolver: Arc<dyn BinaryResolver>,
        installer: Arc<dyn UpgradeInstaller>,
    ) -> Self {
        Self {
            config,
            resolver,
            installer,
            backup: BackupService::new(),
        }
    }

    /// Configuration the supervisor runs with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Run the daemon once.
    ///
    /// Returns `Ok(true)` when an upgrade was requested, backed up, and
    /// installed, `Ok(false)` when the daemon exited cleanly on its own.
    /// Daemon output is copied to `stdout` and `stderr`; signals received on
    /// `signals` are forwarded to the daemon.
    pub async fn launch<S, O, E>(
        &self,
        args: &[S],
        stdout: O,
        stderr: E,
        signals: &mut mpsc::Receiver<Signal>,
    ) -> SupervisorResult<bool>
    where
        S: AsRef<OsStr>,
        O: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        let bin = self
            .resolver
            .current_bin(&self.config)
            .map_err(SupervisorError::BinaryResolution)?;
        self.resolver
            .ensure_binary(&bin)
            .map_err(|reason| SupervisorError::InvalidBinary {
                path: bin.clone(),
                reason,
            })?;

        info!(path = %bin.display(), "Starting daemon");
        let mut child = Command::new(&bin)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0)
            .spawn()
            .map_err(|source| SupervisorError::Launch {
                command: command_line(&bin, args),
                source,
            })?;
        info!(pid = child.id(), "Daemon started");

        let child_stdout = child
            .stdout
            .take()
            .ok_or(SupervisorError::MissingPipe(StreamKind::Stdout))?;
        let child_stderr = child
            .stderr
            .take()
            .ok_or(SupervisorError::MissingPipe(StreamKind::Stderr))?;

        let max_line = self.config.scan_buffer_size();
        let outcome = wait_for_upgrade_or_exit(
            child,
            StreamWatcher::new(StreamKind::Stdout, child_stdout, stdout, max_line),
            StreamWatcher::new(StreamKind::Stderr, child_stderr, stderr, max_line),
            signals,
        )
        .await;

        match outcome {
            SupervisorOutcome::UpgradeRequested(upgrade) => {
                info!(name = %upgrade.name, height = upgrade.height, "Daemon stopped for upgrade");
                self.backup
                    .backup(&self.config)
                    .await
                    .map_err(|source| SupervisorError::Backup {
                        name: upgrade.name.clone(),
                        source,
                    })?;
                self.installer
                    .do_upgrade(&self.config, &upgrade)
                    .await
                    .map_err(|reason| SupervisorError::Install {
                        name: upgrade.name.clone(),
                        reason,
                    })?;
                info!(name = %upgrade.name, "Upgrade installed");
                Ok(true)
            }
            SupervisorOutcome::ProcessExited(Some(err)) => {
                error!(error = %err, "Daemon failed");
                Err(err.into())
            }
            SupervisorOutcome::ProcessExited(None) => {
                info!("Daemon exited cleanly");
                Ok(false)
            }
        }
    }
}

/// How long the watchers may keep reading after the daemon has exited.
///
/// Helpers the daemon left behind can hold its pipes open indefinitely.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Race the daemon's exit against both stream watchers.
///
/// When it returns the daemon has exited. Its streams have closed, or the
/// watchers were given [`DRAIN_GRACE`] to finish reading.
///
/// * `UpgradeRequested` - a watcher saw a marker and the daemon was killed
/// * `ProcessExited(Some(err))` - the daemon failed on its own, or a stream
///   could not be read
/// * `ProcessExited(None)` - the daemon exited cleanly without asking for an
///   upgrade, as short-lived commands do
pub async fn wait_for_upgrade_or_exit<O, E, WO, WE>(
    mut child: Child,
    stdout: StreamWatcher<O, WO>,
    stderr: StreamWatcher<E, WE>,
    signals: &mut mpsc::Receiver<Signal>,
) -> SupervisorOutcome
where
    O: tokio::io::AsyncRead + Unpin + Send + 'static,
    E: tokio::io::AsyncRead + Unpin + Send + 'static,
    WO: AsyncWrite + Unpin + Send + 'static,
    WE: AsyncWrite + Unpin + Send + 'static,
{
    let aggregator = Arc::new(ResultAggregator::new());
    let (kill_tx, mut kill_rx) = mpsc::unbounded_channel();

    let mut stdout_task = tokio::spawn(stdout.watch(Arc::clone(&aggregator), kill_tx.clone()));
    let mut stderr_task = tokio::spawn(stderr.watch(Arc::clone(&aggregator), kill_tx));

    let forwarder = SignalForwarder::for_child(&child);
    let exit = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(()) = kill_rx.recv() => {
                // A second request races the first kill; both are harmless.
                if let Some(forwarder) = &forwarder {
                    if let Err(err) = forwarder.kill_group() {
                        debug!(error = %err, "Failed to kill daemon process group");
                    }
                }
                if let Err(err) = child.start_kill() {
                    debug!(error = %err, "Daemon already exited, ignoring kill request");
                } else {
                    info!("Killed daemon for upgrade");
                }
            }
            Some(signal) = signals.recv() => {
                if let Some(forwarder) = &forwarder {
                    forwarder.forward_or_exit(signal);
                }
            }
        }
    };

    let upgrade_before_exit = aggregator.has_upgrade();
    let exit_error = match exit {
        Ok(status) if status.success() => None,
        Ok(status) => Some(RunError::Exited { status }),
        Err(source) => Some(RunError::Wait {
            source: Arc::new(source),
        }),
    };
    let clean_exit = exit_error.is_none();
    if let Some(err) = exit_error {
        aggregator.set_error(err);
    }

    // Let the watchers finish so the tail of the daemon output reaches the
    // console and a marker printed just before a crash is still seen.
    let drained = tokio::time::timeout(
        DRAIN_GRACE,
        futures::future::join(&mut stdout_task, &mut stderr_task),
    )
    .await;
    match drained {
        Ok((stdout_done, stderr_done)) => {
            for (stream, done) in [(StreamKind::Stdout, stdout_done), (StreamKind::Stderr, stderr_done)] {
                if let Err(err) = done {
                    warn!(%stream, error = %err, "Stream watcher task failed");
                }
            }
        }
        // After a clean exit the watchers keep passing output through in the
        // background; otherwise the run is over and they are stopped.
        Err(_) if clean_exit => {
            debug!(grace = ?DRAIN_GRACE, "Daemon pipes still open after exit, detaching watchers");
        }
        Err(_) => {
            warn!(grace = ?DRAIN_GRACE, "Daemon pipes still open after exit, stopping watchers");
            stdout_task.abort();
            stderr_task.abort();
        }
    }

    if clean_exit && !upgrade_before_exit {
        return SupervisorOutcome::ProcessExited(None);
    }
    aggregator.outcome()
}

fn command_line<S: AsRef<OsStr>>(bin: &Path, args: &[S]) -> String {
    std::iter::once(bin.as_os_str())
        .chain(args.iter().map(|arg| arg.as_ref()))
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}
