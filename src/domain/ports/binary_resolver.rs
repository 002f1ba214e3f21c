//! Binary resolution port.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::models::Config;

/// Supplies the executable a supervised run launches.
pub trait BinaryResolver: Send + Sync {
    /// Path of the binary currently selected for the daemon.
    fn current_bin(&self, config: &Config) -> Result<PathBuf>;

    /// Check that `path` can be launched.
    fn ensure_binary(&self, path: &Path) -> Result<()>;
}
