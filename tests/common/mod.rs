//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncWrite;
use upgradevisor::{BinaryResolver, Config, UpgradeDescriptor, UpgradeInstaller};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config rooted at `home` with a data directory and upgrade-info file in place.
pub fn config_with_upgrade_info(home: &Path, upgrade_info: Option<&str>) -> Config {
    let config = Config {
        home: home.to_path_buf(),
        daemon_name: "noded".to_string(),
        ..Default::default()
    };
    fs::create_dir_all(config.data_dir()).expect("Failed to create data dir");
    fs::write(config.data_dir().join("state.db"), b"chain state").expect("Failed to seed data");
    if let Some(info) = upgrade_info {
        fs::write(config.upgrade_info_path(), info).expect("Failed to write upgrade-info");
    }
    config
}

/// Write an executable shell script.
pub fn write_script(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("script has a parent")).expect("Failed to create bin dir");
    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod script");
}

/// Resolver that always launches `/bin/sh`; pass `-c <script>` as arguments.
pub struct ShellResolver;

impl BinaryResolver for ShellResolver {
    fn current_bin(&self, _config: &Config) -> anyhow::Result<PathBuf> {
        Ok(PathBuf::from("/bin/sh"))
    }

    fn ensure_binary(&self, _path: &Path) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Resolver whose lookup fails.
pub struct FailingResolver;

impl BinaryResolver for FailingResolver {
    fn current_bin(&self, _config: &Config) -> anyhow::Result<PathBuf> {
        anyhow::bail!("current symlink is dangling")
    }

    fn ensure_binary(&self, _path: &Path) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Resolver whose binary never validates.
pub struct RejectingResolver;

impl BinaryResolver for RejectingResolver {
    fn current_bin(&self, _config: &Config) -> anyhow::Result<PathBuf> {
        Ok(PathBuf::from("/bin/sh"))
    }

    fn ensure_binary(&self, path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("{} is not executable", path.display())
    }
}

/// Installer that records every upgrade it is asked to install.
///
/// With a flag path set, each install also creates that file so a script can
/// tell it has been "upgraded".
#[derive(Default)]
pub struct RecordingInstaller {
    installed: Mutex<Vec<UpgradeDescriptor>>,
    flag: Option<PathBuf>,
}

impl RecordingInstaller {
    pub fn with_flag(flag: PathBuf) -> Self {
        Self {
            installed: Mutex::default(),
            flag: Some(flag),
        }
    }

    pub fn installed(&self) -> Vec<UpgradeDescriptor> {
        self.installed.lock().expect("installer lock poisoned").clone()
    }
}

#[async_trait]
impl UpgradeInstaller for RecordingInstaller {
    async fn do_upgrade(&self, _config: &Config, upgrade: &UpgradeDescriptor) -> anyhow::Result<()> {
        self.installed
            .lock()
            .expect("installer lock poisoned")
            .push(upgrade.clone());
        if let Some(flag) = &self.flag {
            tokio::fs::write(flag, upgrade.name.as_bytes()).await?;
        }
        Ok(())
    }
}

/// In-memory console sink that can be inspected after the run.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("sink lock poisoned")).into_owned()
    }
}

impl AsyncWrite for SharedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("sink lock poisoned"))?
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
