//! Pre-flight checks run before any file is touched

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::classify::{FsProbe, SdkTypeClassifier, SdkVariant};
use crate::conflicts::{read_central_file, CENTRAL_FILE_NAME};
use crate::error::MigrateError;
use crate::project::load_project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Always aborts the batch
    Critical,
    /// Aborts unless the run is forced
    Overridable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightIssue {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for PreflightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Critical => write!(f, "critical: {}", self.message),
            Severity::Overridable => write!(f, "warning: {}", self.message),
        }
    }
}

/// What the run is about to do
#[derive(Debug, Clone)]
pub struct PreflightContext<'a> {
    pub root: &'a Path,
    pub projects: &'a [PathBuf],
    /// Projects are rewritten in place
    pub writes_in_place: bool,
    pub central_package_management: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub issues: Vec<PreflightIssue>,
}

impl PreflightReport {
    /// Issues that stop the run given `force`
    pub fn blocking(&self, force: bool) -> Vec<&PreflightIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Critical || !force)
            .collect()
    }

    pub fn check(&self, force: bool) -> Result<(), MigrateError> {
        let blocking = self.blocking(force);
        if blocking.is_empty() {
            for issue in &self.issues {
                warn!(%issue, "Pre-flight issue overridden");
            }
            return Ok(());
        }
        Err(MigrateError::PreflightFailed {
            count: blocking.len(),
            summary: blocking
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.issues.push(PreflightIssue { severity, message });
    }
}

pub fn run_preflight(context: &PreflightContext<'_>, classifier: &SdkTypeClassifier) -> PreflightReport {
    let mut report = PreflightReport::default();

    if !context.root.exists() {
        report.push(
            Severity::Critical,
            format!("root {} does not exist", context.root.display()),
        );
        return report;
    }

    if context.central_package_management {
        let central = central_file_dir(context.root).join(CENTRAL_FILE_NAME);
        if central.is_file() {
            if let Err(e) = read_central_file(&central) {
                report.push(
                    Severity::Critical,
                    format!("central package file {} is unreadable: {:#}", central.display(), e),
                );
            }
        }
    }

    for path in context.projects {
        if context.writes_in_place && is_read_only(path) {
            report.push(
                Severity::Critical,
                format!("{} is read-only", path.display()),
            );
        }

        // Load failures are reported per project later
        if let Ok(project) = load_project(path) {
            if project.is_sdk_style() {
                continue;
            }
            let classification = classifier.classify(&project, &FsProbe);
            if let SdkVariant::Unmigratable { reason } = classification.variant {
                report.push(
                    Severity::Overridable,
                    format!("{} cannot be migrated ({})", path.display(), reason),
                );
            }
        }
    }

    report
}

/// Directory the central package file lives in: the root, or the directory of a
/// single project file given as root
pub fn central_file_dir(root: &Path) -> &Path {
    if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    }
}

fn is_read_only(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(false)
}
