//! Upgrade installer port.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{Config, UpgradeDescriptor};

/// Performs the binary swap for a requested upgrade.
///
/// Only invoked after the data backup succeeded.
#[async_trait]
pub trait UpgradeInstaller: Send + Sync {
    /// Install `upgrade` so the next resolved binary is the upgraded one.
    async fn do_upgrade(&self, config: &Config, upgrade: &UpgradeDescriptor) -> Result<()>;
}
