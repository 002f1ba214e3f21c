//! Pre-upgrade data backup
//!
//! Snapshots `<home>/data` into `<home>/data-backup-<YYYY>-<M>-<D>` before an
//! upgrade is installed. A second backup on the same day gets a `.2`, `.3`,
//! ... suffix so an earlier snapshot is never merged into or overwritten.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate};
use tracing::info;

use crate::domain::errors::BackupError;
use crate::domain::models::{Config, UpgradeDescriptor};

/// Backup gate run before every upgrade install
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupService;

impl BackupService {
    /// Create a backup service.
    pub const fn new() -> Self {
        Self
    }

    /// Back up the data directory using today's local date.
    ///
    /// Returns the backup location, or `None` when backups are disabled.
    pub async fn backup(&self, config: &Config) -> Result<Option<PathBuf>, BackupError> {
        self.backup_on(config, Local::now().date_naive()).await
    }

    /// Back up the data directory into the destination for `date`.
    pub async fn backup_on(
        &self,
        config: &Config,
        date: NaiveDate,
    ) -> Result<Option<PathBuf>, BackupError> {
        if config.unsafe_skip_backup {
            info!("unsafe_skip_backup is set, not backing up data directory");
            return Ok(None);
        }

        let info_path = config.upgrade_info_path();
        let raw = tokio::fs::read(&info_path)
            .await
            .map_err(|source| BackupError::ReadUpgradeInfo {
                path: info_path.clone(),
                source,
            })?;
        let upgrade = UpgradeDescriptor::from_upgrade_info(&raw).map_err(|source| {
            BackupError::ParseUpgradeInfo {
                path: info_path.clone(),
                source,
            }
        })?;
        if !upgrade.is_named() {
            return Err(BackupError::EmptyUpgradeInfo { path: info_path });
        }

        let source = config.data_dir();
        let destination = backup_destination(&config.home, date);
        let started = Instant::now();
        info!(
            upgrade = %upgrade.name,
            from = %source.display(),
            to = %destination.display(),
            "starting data backup"
        );

        let target = destination.clone();
        tokio::task::spawn_blocking(move || copy_dir_recursive(&source, &target)).await??;

        info!(
            to = %destination.display(),
            elapsed = ?started.elapsed(),
            "data backup saved"
        );
        Ok(Some(destination))
    }
}

/// First unused backup directory for `date` under `home`.
pub fn backup_destination(home: &Path, date: NaiveDate) -> PathBuf {
    let base = format!(
        "data-backup-{}-{}-{}",
        date.year(),
        date.month(),
        date.day()
    );
    let first = home.join(&base);
    if !exists(&first) {
        return first;
    }

    let mut n = 2u32;
    loop {
        let candidate = home.join(format!("{base}.{n}"));
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// Dangling symlinks count as taken.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Copy the tree at `source_root` into the new directory `destination_root`.
fn copy_dir_recursive(source_root: &Path, destination_root: &Path) -> Result<(), BackupError> {
    if !fs::metadata(source_root)
        .map_err(copy_err(source_root))?
        .is_dir()
    {
        return Err(BackupError::Copy {
            path: source_root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source_root.to_path_buf(), destination_root.to_path_buf()));

    while let Some((from_dir, to_dir)) = queue.pop_front() {
        fs::create_dir_all(&to_dir).map_err(copy_err(&to_dir))?;

        for entry in fs::read_dir(&from_dir).map_err(copy_err(&from_dir))? {
            let entry = entry.map_err(copy_err(&from_dir))?;
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let file_type = entry.file_type().map_err(copy_err(&from))?;

            if file_type.is_dir() {
                queue.push_back((from, to));
            } else if file_type.is_symlink() {
                let link = fs::read_link(&from).map_err(copy_err(&from))?;
                std::os::unix::fs::symlink(&link, &to).map_err(copy_err(&to))?;
            } else {
                fs::copy(&from, &to).map_err(copy_err(&from))?;
            }
        }
    }

    Ok(())
}

fn copy_err(path: &Path) -> impl FnOnce(io::Error) -> BackupError {
    let path = path.to_path_buf();
    move |source| BackupError::Copy { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    fn home_with_data() -> (TempDir, Config) {
        let home = tempfile::tempdir().unwrap();
        let config = Config {
            home: home.path().to_path_buf(),
            daemon_name: "noded".to_string(),
            ..Default::default()
        };
        fs::create_dir_all(config.data_dir().join("application.db")).unwrap();
        fs::write(config.data_dir().join("application.db/000001.ldb"), b"state").unwrap();
        fs::write(config.data_dir().join("priv_validator_state.json"), b"{}").unwrap();
        (home, config)
    }

    fn write_upgrade_info(config: &Config, contents: &str) {
        fs::write(config.upgrade_info_path(), contents).unwrap();
    }

    #[test]
    fn test_destination_is_not_zero_padded() {
        let dest = backup_destination(Path::new("/home/node"), date());
        assert_eq!(dest, PathBuf::from("/home/node/data-backup-2026-3-7"));
    }

    #[test]
    fn test_destination_gets_suffix_when_taken() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join("data-backup-2026-3-7")).unwrap();
        fs::create_dir(home.path().join("data-backup-2026-3-7.2")).unwrap();

        let dest = backup_destination(home.path(), date());
        assert_eq!(dest, home.path().join("data-backup-2026-3-7.3"));
    }

    #[tokio::test]
    async fn test_skip_backup_is_noop() {
        let home = tempfile::tempdir().unwrap();
        let config = Config {
            home: home.path().to_path_buf(),
            unsafe_skip_backup: true,
            ..Default::default()
        };

        let result = BackupService::new().backup_on(&config, date()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(fs::read_dir(home.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_backup_copies_data_tree() {
        let (home, config) = home_with_data();
        write_upgrade_info(&config, r#"{"name":"v2","height":100}"#);
        std::os::unix::fs::symlink("priv_validator_state.json", config.data_dir().join("link"))
            .unwrap();

        let dest = BackupService::new()
            .backup_on(&config, date())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(dest, home.path().join("data-backup-2026-3-7"));
        assert_eq!(
            fs::read(dest.join("application.db/000001.ldb")).unwrap(),
            b"state"
        );
        assert!(dest.join("upgrade-info.json").is_file());
        assert_eq!(
            fs::read_link(dest.join("link")).unwrap(),
            PathBuf::from("priv_validator_state.json")
        );
    }

    #[tokio::test]
    async fn test_second_backup_same_day_does_not_merge() {
        let (home, config) = home_with_data();
        write_upgrade_info(&config, r#"{"name":"v2","height":100}"#);
        let service = BackupService::new();

        let first = service.backup_on(&config, date()).await.unwrap().unwrap();
        let second = service.backup_on(&config, date()).await.unwrap().unwrap();

        assert_eq!(first, home.path().join("data-backup-2026-3-7"));
        assert_eq!(second, home.path().join("data-backup-2026-3-7.2"));
    }

    #[tokio::test]
    async fn test_missing_upgrade_info_fails() {
        let (_home, config) = home_with_data();
        let err = BackupService::new()
            .backup_on(&config, date())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::ReadUpgradeInfo { .. }));
    }

    #[tokio::test]
    async fn test_malformed_upgrade_info_fails() {
        let (_home, config) = home_with_data();
        write_upgrade_info(&config, "not json");
        let err = BackupService::new()
            .backup_on(&config, date())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::ParseUpgradeInfo { .. }));
    }

    #[tokio::test]
    async fn test_empty_upgrade_name_fails() {
        let (home, config) = home_with_data();
        write_upgrade_info(&config, r#"{"name":"","height":100}"#);
        let err = BackupService::new()
            .backup_on(&config, date())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::EmptyUpgradeInfo { .. }));
        assert!(!home.path().join("data-backup-2026-3-7").exists());
    }
}
