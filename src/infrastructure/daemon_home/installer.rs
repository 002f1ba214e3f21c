use std::io;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{HomeBinaryResolver, HomeLayout, UPGRADES_DIR};
use crate::domain::models::{Config, UpgradeDescriptor, UPGRADE_INFO_FILENAME};
use crate::domain::ports::{BinaryResolver, UpgradeInstaller};

const SWAP_LINK: &str = "current.swap";

/// Installs an upgrade by repointing the `current` symlink
///
/// The upgrade binary must already be in place under
/// `upgrades/<name>/bin/<daemon>`; nothing is downloaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkInstaller;

impl SymlinkInstaller {
    /// Create the installer.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UpgradeInstaller for SymlinkInstaller {
    async fn do_upgrade(&self, config: &Config, upgrade: &UpgradeDescriptor) -> Result<()> {
        let layout = HomeLayout::new(config);
        let upgrade_dir = layout.upgrade_dir(&upgrade.name);
        let bin = layout.binary_in(&upgrade_dir);

        HomeBinaryResolver::new()
            .ensure_binary(&bin)
            .with_context(|| format!("no usable binary for upgrade {}", upgrade.name))?;

        let info_path = upgrade_dir.join(UPGRADE_INFO_FILENAME);
        let info = serde_json::to_vec_pretty(upgrade)?;
        tokio::fs::write(&info_path, info)
            .await
            .with_context(|| format!("failed to write {}", info_path.display()))?;

        // Build the new link beside `current` and rename over it.
        let swap = layout.root().join(SWAP_LINK);
        match tokio::fs::remove_file(&swap).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", swap.display()));
            }
        }
        let target = std::path::Path::new(UPGRADES_DIR).join(&upgrade.name);
        tokio::fs::symlink(&target, &swap).await.with_context(|| {
            format!("failed to create symlink {} -> {}", swap.display(), target.display())
        })?;
        let current = layout.current_link();
        tokio::fs::rename(&swap, &current)
            .await
            .with_context(|| format!("failed to replace {}", current.display()))?;

        info!(name = %upgrade.name, height = upgrade.height, link = %current.display(), "Switched current binary");
        Ok(())
    }
}
