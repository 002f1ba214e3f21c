//! Daemon home directory layout
//!
//! ```text
//! <home>/upgradevisor/
//!     genesis/bin/<daemon>
//!     upgrades/<name>/bin/<daemon>
//!     current -> genesis | upgrades/<name>
//! ```
//!
//! The default [`BinaryResolver`](crate::domain::ports::BinaryResolver) and
//! [`UpgradeInstaller`](crate::domain::ports::UpgradeInstaller) adapters both
//! work against this layout.

pub mod installer;
pub mod resolver;

pub use installer::SymlinkInstaller;
pub use resolver::HomeBinaryResolver;

use std::path::{Path, PathBuf};

use crate::domain::models::Config;

/// Supervisor-owned directory under the daemon home.
pub const ROOT_DIR: &str = "upgradevisor";
/// Directory holding the binary the chain started with.
pub const GENESIS_DIR: &str = "genesis";
/// Directory holding one sub-directory per named upgrade.
pub const UPGRADES_DIR: &str = "upgrades";
/// Symlink to the directory of the binary to launch.
pub const CURRENT_LINK: &str = "current";

/// Paths of one daemon home
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    root: PathBuf,
    daemon_name: String,
}

impl HomeLayout {
    /// Layout of the home directory named by `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.home.join(ROOT_DIR),
            daemon_name: config.daemon_name.clone(),
        }
    }

    /// Supervisor-owned root, `<home>/upgradevisor`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the binary the chain started with.
    pub fn genesis_dir(&self) -> PathBuf {
        self.root.join(GENESIS_DIR)
    }

    /// Directory of the named upgrade.
    pub fn upgrade_dir(&self, name: &str) -> PathBuf {
        self.root.join(UPGRADES_DIR).join(name)
    }

    /// Symlink to the directory of the binary to launch.
    pub fn current_link(&self) -> PathBuf {
        self.root.join(CURRENT_LINK)
    }

    /// Daemon binary inside one of the layout directories.
    pub fn binary_in(&self, dir: &Path) -> PathBuf {
        dir.join("bin").join(&self.daemon_name)
    }

    /// Daemon binary behind the `current` symlink.
    pub fn current_bin(&self) -> PathBuf {
        self.binary_in(&self.current_link())
    }
}
