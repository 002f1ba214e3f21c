//! Signal forwarding to the supervised daemon
//!
//! Signals reach a supervised run through an explicit channel. In production
//! the channel is fed by [`os_signals`]; tests feed their own.

use std::io;

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Signals relayed from the supervisor to the daemon.
///
/// The daemon runs in its own process group, so a terminal interrupt only
/// reaches it through the supervisor.
pub const FORWARDED_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTERM];

/// Relays signals to one child process
#[derive(Debug, Clone, Copy)]
pub struct SignalForwarder {
    pid: Pid,
}

impl SignalForwarder {
    /// Forwarder for a running child; `None` once the child has been reaped.
    pub fn for_child(child: &Child) -> Option<Self> {
        let pid = i32::try_from(child.id()?).ok()?;
        Some(Self {
            pid: Pid::from_raw(pid),
        })
    }

    /// Send `signal` to the child unmodified.
    ///
    /// A child that no longer exists is not an error.
    pub fn forward(&self, signal: Signal) -> nix::Result<()> {
        match kill(self.pid, signal) {
            Err(Errno::ESRCH) => {
                debug!(pid = %self.pid, ?signal, "daemon already gone, signal not delivered");
                Ok(())
            }
            result => result,
        }
    }

    /// Kill every process in the child's process group.
    ///
    /// The daemon is spawned as the leader of its own group, so helpers it
    /// forked die with it and release the output pipes.
    pub fn kill_group(&self) -> nix::Result<()> {
        match killpg(self.pid, Signal::SIGKILL) {
            Err(Errno::ESRCH) => {
                debug!(pid = %self.pid, "daemon process group already gone");
                Ok(())
            }
            result => result,
        }
    }

    /// Forward `signal`, terminating the supervisor if the child cannot be
    /// signalled.
    pub fn forward_or_exit(&self, signal: Signal) {
        info!(pid = %self.pid, ?signal, "forwarding signal to daemon");
        if let Err(err) = self.forward(signal) {
            error!(pid = %self.pid, ?signal, error = %err, "failed to signal daemon");
            std::process::exit(1);
        }
    }
}

/// Listen for the forwarded signal set on the supervisor process.
///
/// Must be called from within a tokio runtime. The listener task ends when
/// the receiver is dropped.
pub fn os_signals() -> io::Result<mpsc::Receiver<Signal>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut term = signal(SignalKind::terminate())?;
    let (tx, rx) = mpsc::channel(FORWARDED_SIGNALS.len() * 4);

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => Signal::SIGINT,
                Some(()) = quit.recv() => Signal::SIGQUIT,
                Some(()) = term.recv() => Signal::SIGTERM,
                else => break,
            };
            if tx.send(received).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
