//! Backup of original files before they are overwritten

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::MigrateError;

/// Directory under the migration root that holds backup sessions
pub const BACKUP_DIR_NAME: &str = ".sdkmigrate-backup";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A backup spanning one migration run.
///
/// `backup` is called right before a file is modified; `finalize` runs once at the end
/// of the run, whatever its outcome.
pub trait BackupSession: Send + Sync {
    fn backup(&self, path: &Path) -> Result<(), MigrateError>;

    /// Write the session manifest. Returns its path, if any.
    fn finalize(&self) -> Result<Option<PathBuf>, MigrateError>;
}

/// Session that keeps nothing (dry runs and `--no-backup`)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackup;

impl BackupSession for NoBackup {
    fn backup(&self, _path: &Path) -> Result<(), MigrateError> {
        Ok(())
    }

    fn finalize(&self) -> Result<Option<PathBuf>, MigrateError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupEntry {
    /// Path relative to the migration root, forward slashes
    pub original: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
struct BackupManifest<'a> {
    session_id: &'a str,
    root: String,
    created_at: String,
    finalized_at: String,
    files: &'a [BackupEntry],
}

/// Copies originals into `<root>/.sdkmigrate-backup/<timestamp>-<id>/`, mirroring their
/// relative paths, and records a SHA-256 manifest.
#[derive(Debug)]
pub struct FsBackupSession {
    root: PathBuf,
    dir: PathBuf,
    session_id: String,
    created_at: String,
    entries: Mutex<Vec<BackupEntry>>,
}

impl FsBackupSession {
    pub fn open(root: &Path) -> Result<Self, MigrateError> {
        let now = chrono::Utc::now();
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        let dir = root
            .join(BACKUP_DIR_NAME)
            .join(format!("{}-{}", now.format("%Y%m%dT%H%M%S"), &session_id[..8]));
        fs::create_dir_all(&dir).map_err(|e| MigrateError::BackupError {
            path: dir.clone(),
            source: e,
        })?;
        info!(dir = %dir.display(), "Opened backup session");

        Ok(Self {
            root: root.to_path_buf(),
            dir,
            session_id,
            created_at: now.to_rfc3339(),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> Vec<BackupEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl BackupSession for FsBackupSession {
    fn backup(&self, path: &Path) -> Result<(), MigrateError> {
        let backup_error = |e: std::io::Error| MigrateError::BackupError {
            path: path.to_path_buf(),
            source: e,
        };
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let original = relative.to_string_lossy().replace('\\', "/");

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| backup_error(std::io::Error::other("backup session poisoned")))?;
        if entries.iter().any(|e| e.original == original) {
            return Ok(());
        }

        let content = fs::read(path).map_err(backup_error)?;
        let target = self.dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(backup_error)?;
        }
        fs::write(&target, &content).map_err(backup_error)?;

        let mut hasher = Sha256::new();
        hasher.update(&content);
        entries.push(BackupEntry {
            original,
            sha256: hex::encode(hasher.finalize()),
            size: content.len() as u64,
        });
        debug!(file = %path.display(), "Backed up");
        Ok(())
    }

    fn finalize(&self) -> Result<Option<PathBuf>, MigrateError> {
        let path = self.dir.join(MANIFEST_FILE_NAME);
        let write_error = |e: std::io::Error| MigrateError::BackupError {
            path: path.clone(),
            source: e,
        };
        let entries = self.entries();
        let manifest = BackupManifest {
            session_id: &self.session_id,
            root: self.root.to_string_lossy().into_owned(),
            created_at: self.created_at.clone(),
            finalized_at: chrono::Utc::now().to_rfc3339(),
            files: &entries,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| write_error(std::io::Error::other(e)))?;
        fs::write(&path, json).map_err(write_error)?;
        info!(manifest = %path.display(), files = entries.len(), "Finalized backup session");
        Ok(Some(path))
    }
}
