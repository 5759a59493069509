//! Backup and restore around project file mutations
//!
//! `begin` snapshots each file that exists as `<file>.backup`. `commit`
//! discards the snapshots, `rollback` puts them back and removes files that
//! did not exist when the transaction began.

use crate::error::FixError;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix appended to backed-up file names
pub const BACKUP_SUFFIX: &str = ".backup";

#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    backup: Option<PathBuf>,
}

/// Snapshot of a set of files that can be committed or rolled back
#[derive(Debug)]
pub struct ManifestTransaction {
    snapshots: Vec<Snapshot>,
}

impl ManifestTransaction {
    /// Backs up every existing file in `files`
    ///
    /// If one copy fails, the backups already made are removed.
    pub fn begin<P: AsRef<Path>>(files: &[P]) -> Result<Self, FixError> {
        let mut transaction = Self {
            snapshots: Vec::with_capacity(files.len()),
        };

        for file in files {
            let path = file.as_ref().to_path_buf();
            let backup = if path.is_file() {
                let backup = backup_path(&path);
                if let Err(e) = fs::copy(&path, &backup) {
                    transaction.discard_backups();
                    return Err(FixError::Backup { path, source: e });
                }
                debug!(path = %path.display(), "backed up");
                Some(backup)
            } else {
                None
            };
            transaction.snapshots.push(Snapshot { path, backup });
        }

        Ok(transaction)
    }

    /// Backup files created by this transaction
    pub fn backups(&self) -> impl Iterator<Item = &Path> {
        self.snapshots.iter().filter_map(|s| s.backup.as_deref())
    }

    /// Keeps the current state and deletes the backups
    pub fn commit(mut self) {
        self.discard_backups();
    }

    /// Restores every file to its state at `begin`
    ///
    /// All files are attempted; the first error is returned.
    pub fn rollback(self) -> Result<(), FixError> {
        let mut first_error = None;

        for snapshot in &self.snapshots {
            let result = match &snapshot.backup {
                Some(backup) => restore(&snapshot.path, backup),
                None if snapshot.path.exists() => {
                    fs::remove_file(&snapshot.path).map_err(|e| FixError::Restore {
                        path: snapshot.path.clone(),
                        source: e,
                    })
                }
                None => Ok(()),
            };

            if let Err(e) = result {
                warn!(error = %e, "rollback incomplete");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Runs `f` inside a transaction over `files`
    ///
    /// Commits on success. On failure the files are restored and the
    /// original error is returned.
    pub fn run<P, T, F>(files: &[P], f: F) -> Result<T, FixError>
    where
        P: AsRef<Path>,
        F: FnOnce() -> Result<T, FixError>,
    {
        let transaction = Self::begin(files)?;
        match f() {
            Ok(value) => {
                transaction.commit();
                Ok(value)
            }
            Err(e) => {
                if let Err(restore_err) = transaction.rollback() {
                    warn!(error = %restore_err, "could not restore project files");
                }
                Err(e)
            }
        }
    }

    fn discard_backups(&mut self) {
        for backup in self.snapshots.iter_mut().filter_map(|s| s.backup.take()) {
            if let Err(e) = fs::remove_file(&backup) {
                warn!(path = %backup.display(), error = %e, "failed to remove backup");
            }
        }
    }
}

/// `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn restore(path: &Path, backup: &Path) -> Result<(), FixError> {
    let restore_err = |e| FixError::Restore {
        path: path.to_path_buf(),
        source: e,
    };
    fs::copy(backup, path).map_err(restore_err)?;
    fs::remove_file(backup).map_err(restore_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("package.json");
        let lock = dir.path().join("package-lock.json");
        fs::write(&manifest, "original manifest").unwrap();
        fs::write(&lock, "original lock").unwrap();
        (dir, manifest, lock)
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/p/package.json")),
            PathBuf::from("/p/package.json.backup")
        );
    }

    #[test]
    fn test_begin_creates_backups() {
        let (_dir, manifest, lock) = setup();
        let transaction = ManifestTransaction::begin(&[&manifest, &lock]).unwrap();

        assert_eq!(transaction.backups().count(), 2);
        assert_eq!(
            fs::read_to_string(backup_path(&manifest)).unwrap(),
            "original manifest"
        );
        transaction.commit();
    }

    #[test]
    fn test_begin_skips_missing_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("package-lock.json");
        let transaction = ManifestTransaction::begin(&[&missing]).unwrap();
        assert_eq!(transaction.backups().count(), 0);
    }

    #[test]
    fn test_commit_removes_backups() {
        let (_dir, manifest, lock) = setup();
        let transaction = ManifestTransaction::begin(&[&manifest, &lock]).unwrap();
        fs::write(&manifest, "updated").unwrap();
        transaction.commit();

        assert_eq!(fs::read_to_string(&manifest).unwrap(), "updated");
        assert!(!backup_path(&manifest).exists());
        assert!(!backup_path(&lock).exists());
    }

    #[test]
    fn test_rollback_restores_contents() {
        let (_dir, manifest, lock) = setup();
        let transaction = ManifestTransaction::begin(&[&manifest, &lock]).unwrap();
        fs::write(&manifest, "broken").unwrap();
        fs::remove_file(&lock).unwrap();

        transaction.rollback().unwrap();

        assert_eq!(fs::read_to_string(&manifest).unwrap(), "original manifest");
        assert_eq!(fs::read_to_string(&lock).unwrap(), "original lock");
        assert!(!backup_path(&manifest).exists());
    }

    #[test]
    fn test_rollback_removes_created_files() {
        let dir = TempDir::new().unwrap();
        let lock = dir.path().join("package-lock.json");
        let transaction = ManifestTransaction::begin(&[&lock]).unwrap();
        fs::write(&lock, "generated").unwrap();

        transaction.rollback().unwrap();
        assert!(!lock.exists());
    }

    #[test]
    fn test_run_commits_on_success() {
        let (_dir, manifest, lock) = setup();
        let value = ManifestTransaction::run(&[&manifest, &lock], || {
            fs::write(&manifest, "updated").unwrap();
            Ok(7)
        })
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "updated");
        assert!(!backup_path(&manifest).exists());
    }

    #[test]
    fn test_run_rolls_back_on_error() {
        let (_dir, manifest, lock) = setup();
        let result: Result<(), FixError> = ManifestTransaction::run(&[&manifest, &lock], || {
            fs::write(&manifest, "half written").unwrap();
            Err(FixError::Write {
                path: manifest.clone(),
                source: std::io::Error::other("disk full"),
            })
        });

        assert!(matches!(result, Err(FixError::Write { .. })));
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "original manifest");
        assert!(!backup_path(&manifest).exists());
        assert!(!backup_path(&lock).exists());
    }
}
