//! Error types for rust-sdkmigrate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while migrating project files
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Failed to read project file: {path}")]
    ProjectReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse project file: {path}")]
    ProjectParseError {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Project file has no property groups or item groups: {path}")]
    EmptyProject { path: PathBuf },

    #[error("Failed to transform {item_type} item '{include}': {message}")]
    ItemTransformError {
        item_type: String,
        include: String,
        message: String,
    },

    #[error("Another migration holds the lock at {path}")]
    LockContention { path: PathBuf },

    #[error("Failed to acquire migration lock at {path}")]
    LockError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pre-flight analysis found {count} blocking issue(s): {summary}")]
    PreflightFailed { count: usize, summary: String },

    #[error("Failed to back up {path}")]
    BackupError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    ConfigError { path: PathBuf, message: String },

    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Fatal errors abort the whole batch instead of a single project.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::LockContention { .. }
                | MigrateError::LockError { .. }
                | MigrateError::PreflightFailed { .. }
        )
    }
}
