//! Human-readable migration report

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::conflicts::VersionConflict;
use crate::error::MigrateError;
use crate::model::{MigrationResult, ProjectState, SkipReason};

/// Per-run counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub total: usize,
    pub written: usize,
    pub already_modern: usize,
    pub unmigratable: usize,
    pub failed: usize,
}

/// Outcome of a whole migration run
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub root: PathBuf,
    pub dry_run: bool,
    /// One entry per project that was started, sorted by path
    pub results: Vec<MigrationResult>,
    /// Every package requested by more than zero projects, with the version it settled on
    pub conflicts: Vec<VersionConflict>,
    /// Batch-level warnings (central file overrides, backup problems)
    pub warnings: Vec<String>,
    /// Central package file written (or, in dry-run mode, that would be written)
    pub central_file: Option<PathBuf>,
    pub backup_manifest: Option<PathBuf>,
    /// Projects never started because the run was cancelled
    pub not_started: Vec<PathBuf>,
}

impl MigrationReport {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
            ..Default::default()
        }
    }

    pub fn totals(&self) -> ReportTotals {
        let mut totals = ReportTotals {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.state {
                ProjectState::Written => totals.written += 1,
                ProjectState::Skipped(SkipReason::AlreadyModern) => totals.already_modern += 1,
                ProjectState::Skipped(SkipReason::Unmigratable(_)) => totals.unmigratable += 1,
                ProjectState::Failed(_) => totals.failed += 1,
                _ => {}
            }
        }
        totals
    }

    /// Any project failed. Unmigratable projects are skips, not failures.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.is_failed())
    }

    pub fn was_cancelled(&self) -> bool {
        !self.not_started.is_empty()
    }

    pub fn result_for(&self, project: &Path) -> Option<&MigrationResult> {
        self.results.iter().find(|r| r.project_path == project)
    }

    /// Conflicts where more than one distinct version was requested
    pub fn version_conflicts(&self) -> impl Iterator<Item = &VersionConflict> {
        self.conflicts.iter().filter(|c| c.is_conflict())
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn write_to(&self, path: &Path) -> Result<(), MigrateError> {
        std::fs::write(path, self.render()).map_err(|e| MigrateError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(path)
            .to_string_lossy()
    }

    fn render_project(&self, out: &mut impl fmt::Write, result: &MigrationResult) -> fmt::Result {
        writeln!(out, "--- {} ---", self.relative(&result.project_path))?;
        writeln!(out, "Status: {}", result.state)?;
        if let Some(ref variant) = result.sdk_variant {
            if variant.is_migratable() {
                writeln!(out, "SDK variant: {}", variant)?;
            }
        }
        if let Some(ref output) = result.output_path {
            if result.state == ProjectState::Written {
                let verb = if self.dry_run { "Would write" } else { "Wrote" };
                writeln!(out, "{}: {}", verb, output.display())?;
            }
        }

        section(out, "Errors", &result.errors)?;
        section(out, "Warnings", &result.warnings)?;
        section(out, "Removed elements", &result.removed_elements)?;

        let packages: Vec<String> = result
            .migrated_packages
            .iter()
            .map(|p| match p.version {
                Some(ref v) => format!("{} {}", p.package_id, v),
                None => p.package_id.clone(),
            })
            .collect();
        section(out, "Packages", &packages)?;

        let unconverted: Vec<String> = result
            .unconverted_references
            .iter()
            .map(|u| match u.hint_path {
                Some(ref hint) => format!("{} [{}] ({})", u.identity, hint, u.reason),
                None => format!("{} ({})", u.identity, u.reason),
            })
            .collect();
        section(out, "Unconverted references", &unconverted)?;
        writeln!(out)
    }
}

/// Heading plus one indented line per entry; nothing when `lines` is empty
fn section<T: fmt::Display>(out: &mut impl fmt::Write, heading: &str, lines: &[T]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(out, "{} ({}):", heading, lines.len())?;
    for line in lines {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writeln!(out, "=== SDK-Style Migration Report ===")?;
        writeln!(out, "Root: {}", self.root.display())?;
        if self.dry_run {
            writeln!(out, "Mode: dry run (nothing written)")?;
        }
        writeln!(out)?;

        let totals = self.totals();
        writeln!(
            out,
            "Projects: {} total, {} migrated, {} already SDK-style, {} unmigratable, {} failed",
            totals.total, totals.written, totals.already_modern, totals.unmigratable, totals.failed
        )?;
        if self.was_cancelled() {
            writeln!(out, "Cancelled: {} project(s) not started", self.not_started.len())?;
        }
        writeln!(out)?;

        for result in &self.results {
            self.render_project(&mut out, result)?;
        }

        let conflicts: Vec<&VersionConflict> = self.version_conflicts().collect();
        if !conflicts.is_empty() {
            writeln!(out, "--- Version conflicts ({}) ---", conflicts.len())?;
            for conflict in conflicts {
                writeln!(
                    out,
                    "{} -> {} ({})",
                    conflict.package_id,
                    conflict.resolved_version,
                    conflict.strategy_used.name()
                )?;
                for request in &conflict.requested_versions {
                    writeln!(out, "  {} requested by {}", request.version, request.origin)?;
                }
                for warning in &conflict.warnings {
                    writeln!(out, "  warning: {}", warning)?;
                }
            }
            writeln!(out)?;
        }

        if let Some(ref central) = self.central_file {
            writeln!(out, "Central package file: {}", central.display())?;
        }
        if let Some(ref manifest) = self.backup_manifest {
            writeln!(out, "Backup manifest: {}", manifest.display())?;
        }
        section(&mut out, "Warnings", &self.warnings)?;
        section(
            &mut out,
            "Not started",
            &self
                .not_started
                .iter()
                .map(|p| self.relative(p).into_owned())
                .collect::<Vec<_>>(),
        )?;

        f.write_str(&out)
    }
}
