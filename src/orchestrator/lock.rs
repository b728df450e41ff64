//! Advisory lock held for the duration of a migration run
//!
//! Two runs over the same root would race on the same project files, so a run takes an
//! exclusive `flock` on `<root>/.sdkmigrate.lock` before touching anything. The lock is
//! released when the guard is dropped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::error::MigrateError;

pub const LOCK_FILE_NAME: &str = ".sdkmigrate.lock";

/// Exclusive lock on a migration root
#[derive(Debug)]
pub struct MigrationLock {
    /// Kept open to hold the lock
    file: File,
    path: PathBuf,
}

impl MigrationLock {
    /// Take the lock without blocking. Fails with [`MigrateError::LockContention`] when
    /// another run holds it.
    pub fn acquire(root: &Path) -> Result<Self, MigrateError> {
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| MigrateError::LockError {
                path: path.clone(),
                source: e,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!(path = %path.display(), "Acquired migration lock");
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!(path = %path.display(), "Migration lock already held");
                Err(MigrateError::LockContention { path })
            }
            Err(e) => Err(MigrateError::LockError { path, source: e }),
        }
    }

    /// Whether some process holds the lock on `root`
    pub fn is_held(root: &Path) -> bool {
        let path = root.join(LOCK_FILE_NAME);
        let Ok(file) = File::open(&path) else {
            return false;
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = file.unlock();
                false
            }
            Err(_) => true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
        info!(path = %self.path.display(), "Released migration lock");
    }
}
