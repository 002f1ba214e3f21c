//! Domain errors for the upgrade supervisor.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;

use super::models::StreamKind;

/// A line looked like an upgrade marker but could not be decoded.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("invalid JSON upgrade marker: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid upgrade height {value:?}")]
    Height {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Errors observed while a daemon is running.
///
/// Produced by the stream watchers and by the wait on the child process, and
/// held by the result aggregator. The variants are cheap to clone so the
/// aggregator can hand out snapshots.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("failed reading daemon {stream}")]
    StreamRead {
        stream: StreamKind,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("daemon {stream} line exceeds scanner limit of {limit} bytes")]
    LineTooLong { stream: StreamKind, limit: usize },

    #[error("malformed upgrade marker on daemon {stream}")]
    MarkerParse {
        stream: StreamKind,
        #[source]
        source: Arc<MarkerError>,
    },

    #[error("failed forwarding daemon {stream} to console")]
    Sink {
        stream: StreamKind,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("daemon exited unsuccessfully: {status}")]
    Exited { status: ExitStatus },

    #[error("failed waiting for daemon to exit")]
    Wait {
        #[source]
        source: Arc<io::Error>,
    },
}

/// Errors raised by the pre-upgrade data backup.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("error while reading {}", .path.display())]
    ReadUpgradeInfo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error while parsing {}", .path.display())]
    ParseUpgradeInfo {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} names no upgrade", .path.display())]
    EmptyUpgradeInfo { path: PathBuf },

    #[error("error while taking data backup at {}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("backup task did not complete")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors returned by a supervised launch.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("error resolving current daemon binary: {0:#}")]
    BinaryResolution(anyhow::Error),

    #[error("current binary {} invalid: {reason:#}", .path.display())]
    InvalidBinary { path: PathBuf, reason: anyhow::Error },

    #[error("launching process {command}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("daemon {0} was not piped")]
    MissingPipe(StreamKind),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("data backup failed, not installing upgrade {name:?}")]
    Backup {
        name: String,
        #[source]
        source: BackupError,
    },

    #[error("error installing upgrade {name:?}: {reason:#}")]
    Install { name: String, reason: anyhow::Error },
}

impl SupervisorError {
    /// Whether the daemon had requested an upgrade when this error happened.
    pub const fn upgrade_attempted(&self) -> bool {
        matches!(self, Self::Backup { .. } | Self::Install { .. })
    }
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
