use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::{HomeLayout, GENESIS_DIR};
use crate::domain::models::Config;
use crate::domain::ports::BinaryResolver;

/// Resolves the daemon binary through the `current` symlink of the home layout
#[derive(Debug, Default, Clone, Copy)]
pub struct HomeBinaryResolver;

impl HomeBinaryResolver {
    /// Create the resolver.
    pub const fn new() -> Self {
        Self
    }
}

impl BinaryResolver for HomeBinaryResolver {
    fn current_bin(&self, config: &Config) -> Result<PathBuf> {
        let layout = HomeLayout::new(config);
        let current = layout.current_link();

        match fs::symlink_metadata(&current) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let genesis = layout.genesis_dir();
                if !genesis.is_dir() {
                    anyhow::bail!("genesis directory {} does not exist", genesis.display());
                }
                // Relative target so the home directory can be moved.
                std::os::unix::fs::symlink(GENESIS_DIR, &current).with_context(|| {
                    format!("failed to create symlink {} -> {GENESIS_DIR}", current.display())
                })?;
                info!(link = %current.display(), "Pointed current binary at genesis");
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to inspect {}", current.display()));
            }
        }

        Ok(layout.current_bin())
    }

    fn ensure_binary(&self, path: &Path) -> Result<()> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to inspect daemon binary {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }
        if metadata.permissions().mode() & 0o111 == 0 {
            anyhow::bail!("{} is not executable", path.display());
        }
        Ok(())
    }
}
