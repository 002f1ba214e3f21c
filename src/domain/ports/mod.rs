//! Port trait definitions (Hexagonal Architecture)
//!
//! The supervisor consumes two external collaborators through these traits:
//! - BinaryResolver: locates and validates the daemon binary to launch
//! - UpgradeInstaller: swaps in the binary for a requested upgrade
//!
//! Default adapters live in `infrastructure::daemon_home`.

pub mod binary_resolver;
pub mod upgrade_installer;

pub use binary_resolver::BinaryResolver;
pub use upgrade_installer::UpgradeInstaller;
