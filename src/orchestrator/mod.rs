//! Batch orchestration: lock, scan, pre-flight, parallel migration, version settlement,
//! backup and reporting

mod backup;
mod batch;
mod cancel;
mod lock;
mod preflight;
mod report;
mod scan;
mod state;

pub use backup::{BackupEntry, BackupSession, FsBackupSession, NoBackup, BACKUP_DIR_NAME, MANIFEST_FILE_NAME};
pub use batch::MigrationOrchestrator;
pub use cancel::CancellationToken;
pub use lock::{MigrationLock, LOCK_FILE_NAME};
pub use preflight::{
    central_file_dir, run_preflight, PreflightContext, PreflightIssue, PreflightReport, Severity,
};
pub use report::{MigrationReport, ReportTotals};
pub use scan::{is_project_file, scan_projects};
pub use state::SolutionPhase;
