//! Batch migration: every project under a root, then cross-project version settlement

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::classify::{ClassifierOptions, FsProbe, SdkTypeClassifier, SdkVariant};
use crate::config::MigrateOptions;
use crate::conflicts::{
    merge_existing, read_central_file, CentralPackageFile, PackageVersionConflictResolver,
    VersionRequest, CENTRAL_FILE_NAME,
};
use crate::error::MigrateError;
use crate::migrate::{
    apply_package_versions, write_project, FsSourceTree, ItemAndPropertyMigrator, MigrationOutput, SourceTree,
};
use crate::model::{push_unique, MigrationResult, PackageReference, ProjectState, SkipReason};
use crate::project::{load_project, EvaluatedProject, Item};
use crate::references::{AssemblyReferenceResolver, PackageResolver, ResolutionCache, StaticPackageResolver};

use super::backup::{BackupSession, FsBackupSession, NoBackup};
use super::cancel::CancellationToken;
use super::lock::MigrationLock;
use super::preflight::{central_file_dir, run_preflight, PreflightContext};
use super::report::MigrationReport;
use super::scan::scan_projects;
use super::state::SolutionPhase;

/// A migrated project waiting for cross-project version settlement
struct PendingProject {
    output: MigrationOutput,
    frameworks: Vec<String>,
}

/// How one project's in-memory migration ended
enum ProjectOutcome {
    Finished(MigrationResult, Option<PendingProject>),
    /// Cancelled before producing anything; reported as not started
    Interrupted,
}

/// Drives a migration run through its phases:
/// `Idle → LockAcquired → Scanning → MigratingProjects → Aggregating → Validating →
/// Finalizing`.
///
/// Nothing is written until every project has been migrated in memory, so package
/// versions can be settled across the whole batch first.
pub struct MigrationOrchestrator {
    options: MigrateOptions,
    classifier: SdkTypeClassifier,
    references: AssemblyReferenceResolver,
    migrator: ItemAndPropertyMigrator,
    conflicts: PackageVersionConflictResolver,
    tree: Arc<dyn SourceTree + Send + Sync>,
}

impl MigrationOrchestrator {
    /// Orchestrator using the built-in package catalog plus `options.extra_packages`
    pub fn new(options: MigrateOptions) -> Self {
        let mut catalog = StaticPackageResolver::builtin();
        for info in &options.extra_packages {
            catalog.insert(info.clone());
        }
        Self::with_resolver(options, Arc::new(catalog))
    }

    pub fn with_resolver(options: MigrateOptions, resolver: Arc<dyn PackageResolver>) -> Self {
        let classifier = SdkTypeClassifier::new(ClassifierOptions {
            target_framework_override: options.target_framework.clone(),
            modern_fallback: options.modern_fallback_framework.clone(),
        });
        Self {
            classifier,
            references: AssemblyReferenceResolver::new(resolver.clone(), Arc::new(ResolutionCache::new())),
            migrator: ItemAndPropertyMigrator::new(Some(resolver.clone())),
            conflicts: PackageVersionConflictResolver::new(Some(resolver)),
            tree: Arc::new(FsSourceTree),
            options,
        }
    }

    /// Enumerate source files through `tree` instead of the file system
    pub fn with_source_tree(mut self, tree: Arc<dyn SourceTree + Send + Sync>) -> Self {
        self.tree = tree;
        self
    }

    pub fn options(&self) -> &MigrateOptions {
        &self.options
    }

    /// Run the batch. Fatal conditions (lock contention, a failed pre-flight gate) are
    /// errors; per-project failures are recorded in the report.
    pub fn run(&self, cancel: &CancellationToken) -> Result<MigrationReport> {
        let root = self.options.root.as_path();
        let mut report = MigrationReport::new(root, self.options.dry_run);

        if !root.exists() {
            let context = PreflightContext {
                root,
                projects: &[],
                writes_in_place: self.options.writes_in_place(),
                central_package_management: self.options.central_package_management,
            };
            run_preflight(&context, &self.classifier).check(self.options.force)?;
        }

        let base = central_file_dir(root);
        let _lock = if self.options.dry_run {
            None
        } else {
            Some(MigrationLock::acquire(base)?)
        };
        let phase = advance(SolutionPhase::Idle);

        let phase = advance(phase);
        let projects = scan_projects(root, cancel)?;
        info!(count = projects.len(), root = %root.display(), "Found projects");

        let context = PreflightContext {
            root,
            projects: &projects,
            writes_in_place: self.options.writes_in_place(),
            central_package_management: self.options.central_package_management,
        };
        run_preflight(&context, &self.classifier).check(self.options.force)?;

        let backup: Box<dyn BackupSession> = if self.options.dry_run || !self.options.backup {
            Box::new(NoBackup)
        } else {
            Box::new(FsBackupSession::open(base)?)
        };

        let outcome = self.migrate_batch(&projects, backup.as_ref(), cancel, &mut report, phase);

        info!(phase = %SolutionPhase::Finalizing, "Solution phase");
        match backup.finalize() {
            Ok(manifest) => report.backup_manifest = manifest,
            Err(e) => {
                warn!(error = %e, "Failed to finalize backup session");
                report.warnings.push(format!("{:#}", anyhow::Error::from(e)));
            }
        }
        if let Some(ref path) = self.options.report_path {
            report.write_to(path)?;
        }
        outcome?;

        let totals = report.totals();
        info!(
            written = totals.written,
            skipped = totals.already_modern + totals.unmigratable,
            failed = totals.failed,
            "Migration finished"
        );
        Ok(report)
    }

    fn migrate_batch(
        &self,
        projects: &[PathBuf],
        backup: &dyn BackupSession,
        cancel: &CancellationToken,
        report: &mut MigrationReport,
        phase: SolutionPhase,
    ) -> Result<()> {
        let phase = advance(phase);
        let results: Mutex<Vec<MigrationResult>> = Mutex::new(Vec::with_capacity(projects.len()));
        let pending: DashMap<PathBuf, PendingProject> = DashMap::new();
        let not_started: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism.max(1))
            .build()
            .context("Failed to build worker pool")?;
        pool.install(|| {
            projects.par_iter().for_each(|path| {
                if cancel.is_cancelled() {
                    lock_push(&not_started, path.clone());
                    return;
                }
                let (result, output) = match self.migrate_one(path, cancel) {
                    ProjectOutcome::Finished(result, output) => (result, output),
                    ProjectOutcome::Interrupted => {
                        lock_push(&not_started, path.clone());
                        return;
                    }
                };
                debug!(project = %path.display(), state = %result.state, "Project finished");
                if let Some(output) = output {
                    pending.insert(path.clone(), output);
                }
                lock_push(&results, result);
            });
        });

        let mut results = into_inner(results);
        results.sort_by(|a, b| a.project_path.cmp(&b.project_path));
        report.not_started = into_inner(not_started);
        report.not_started.sort();
        if report.was_cancelled() {
            warn!(not_started = report.not_started.len(), "Migration cancelled");
        }

        let phase = advance(phase);
        let mut pending: BTreeMap<PathBuf, PendingProject> = pending.into_iter().collect();
        let versions = self.settle_versions(&pending, report)?;
        let central = self
            .options
            .central_package_management
            .then(|| CentralPackageFile::new(&versions));

        advance(phase);
        if let Some(ref central) = central {
            let path = central_file_dir(&self.options.root).join(CENTRAL_FILE_NAME);
            let content = central.render()?;
            if !self.options.dry_run {
                if path.is_file() {
                    backup.backup(&path)?;
                }
                fs::write(&path, content).map_err(|e| MigrateError::WriteError {
                    path: path.clone(),
                    source: e,
                })?;
                info!(path = %path.display(), packages = central.entries().len(), "Wrote central package file");
            }
            report.central_file = Some(path);
        }

        for result in results.iter_mut() {
            let Some(project) = pending.remove(&result.project_path) else {
                continue;
            };
            self.finish_project(result, project.output, &versions, central.as_ref(), backup);
        }
        report.results = results;
        Ok(())
    }

    /// Parse, classify, resolve references and migrate one project in memory
    fn migrate_one(&self, path: &Path, cancel: &CancellationToken) -> ProjectOutcome {
        let mut result = MigrationResult::new(path.to_path_buf());

        result.state = ProjectState::Parsing;
        let project = match load_project(path) {
            Ok(project) => project,
            Err(e) => {
                warn!(project = %path.display(), error = %e, "Failed to load project");
                result.fail(format!("{:#}", e));
                return ProjectOutcome::Finished(result, None);
            }
        };
        if project.is_sdk_style() {
            info!(project = %path.display(), "Already SDK-style; skipping");
            result.success = true;
            result.state = ProjectState::Skipped(SkipReason::AlreadyModern);
            return ProjectOutcome::Finished(result, None);
        }

        result.state = ProjectState::Classifying;
        let classification = self.classifier.classify(&project, &FsProbe);
        result.sdk_variant = Some(classification.variant.clone());
        if let SdkVariant::Unmigratable { ref reason } = classification.variant {
            info!(project = %path.display(), reason = %reason, "Project cannot be migrated");
            result.errors.push(reason.clone());
            result.state = ProjectState::Skipped(SkipReason::Unmigratable(reason.clone()));
            return ProjectOutcome::Finished(result, None);
        }

        result.state = ProjectState::Migrating;
        let references: Vec<&Item> = project.items_of_type("Reference").collect();
        let resolved = self.references.resolve(
            &references,
            &classification.target_framework,
            &declared_packages(&project),
        );
        match self
            .migrator
            .migrate(&project, &classification, &resolved, self.tree.as_ref(), cancel)
        {
            Ok(output) => {
                result.success = true;
                result.warnings = output.warnings.clone();
                result.removed_elements = output.removed_elements.clone();
                result.migrated_packages = output.migrated_packages.clone();
                result.unconverted_references = output.unconverted.clone();
                result.output_path = Some(self.options.output_path_for(path));
                let frameworks = if classification.frameworks.is_empty() {
                    vec![classification.target_framework.clone()]
                } else {
                    classification.frameworks.clone()
                };
                ProjectOutcome::Finished(result, Some(PendingProject { output, frameworks }))
            }
            Err(MigrateError::Cancelled) => {
                info!(project = %path.display(), "Cancelled during source enumeration");
                ProjectOutcome::Interrupted
            }
            Err(e) => {
                warn!(project = %path.display(), error = %e, "Migration failed");
                result.fail(e.to_string());
                ProjectOutcome::Finished(result, None)
            }
        }
    }

    /// Pick one version per package across the batch. Returns package id → version.
    fn settle_versions(
        &self,
        pending: &BTreeMap<PathBuf, PendingProject>,
        report: &mut MigrationReport,
    ) -> Result<BTreeMap<String, String>> {
        let mut requests: BTreeMap<String, Vec<VersionRequest>> = BTreeMap::new();
        let mut frameworks: Vec<String> = Vec::new();
        for (path, project) in pending {
            let origin = origin_name(path);
            for package in &project.output.migrated_packages {
                let Some(ref version) = package.version else {
                    continue;
                };
                add_request(&mut requests, &package.package_id, VersionRequest::new(version.clone(), origin.clone()));
            }
            for tfm in &project.frameworks {
                if !frameworks.contains(tfm) {
                    frameworks.push(tfm.clone());
                }
            }
        }

        let mut existing = Vec::new();
        if self.options.central_package_management {
            let path = central_file_dir(&self.options.root).join(CENTRAL_FILE_NAME);
            if path.is_file() {
                existing = read_central_file(&path)?;
                for (package_id, version) in &existing {
                    add_request(&mut requests, package_id, VersionRequest::new(version.clone(), CENTRAL_FILE_NAME));
                }
            }
        }

        let conflicts = self
            .conflicts
            .resolve_all(&requests, &frameworks, self.options.strategy);
        let mut versions: BTreeMap<String, String> = conflicts
            .iter()
            .map(|c| (c.package_id.clone(), c.resolved_version.clone()))
            .collect();
        for conflict in conflicts.iter().filter(|c| c.is_conflict()) {
            info!(
                package = %conflict.package_id,
                version = %conflict.resolved_version,
                strategy = %conflict.strategy_used,
                "Settled version conflict"
            );
        }
        report.conflicts = conflicts;
        report.warnings.extend(merge_existing(&mut versions, &existing));
        Ok(versions)
    }

    /// Apply settled versions, render, validate and write one project
    fn finish_project(
        &self,
        result: &mut MigrationResult,
        mut output: MigrationOutput,
        versions: &BTreeMap<String, String>,
        central: Option<&CentralPackageFile>,
        backup: &dyn BackupSession,
    ) {
        let applied = apply_package_versions(&mut output.project, versions, central);
        result.removed_elements.extend(applied.removed);
        result.warnings.extend(applied.warnings);
        for package in result.migrated_packages.iter_mut() {
            if let Some((_, version)) = versions
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&package.package_id))
            {
                package.version = Some(version.clone());
            }
        }

        let rendered = match write_project(&output.project) {
            Ok(rendered) => rendered,
            Err(e) => {
                result.fail(format!("{:#}", e));
                return;
            }
        };
        if let Err(e) = roxmltree::Document::parse(&rendered) {
            result.fail(format!("Migrated project is not well-formed XML: {}", e));
            return;
        }

        let Some(target) = result.output_path.clone() else {
            return;
        };
        if self.options.dry_run {
            result.state = ProjectState::Written;
            return;
        }
        match write_output(&result.project_path, &target, &rendered, backup) {
            Ok(()) => {
                info!(project = %result.project_path.display(), output = %target.display(), "Wrote SDK-style project");
                result.state = ProjectState::Written;
            }
            Err(e) => {
                warn!(project = %result.project_path.display(), error = %e, "Failed to write project");
                result.fail(format!("{:#}", anyhow::Error::from(e)));
            }
        }
    }
}

/// Packages the project already declares: packages.config entries and
/// `PackageReference` items
fn declared_packages(project: &EvaluatedProject) -> Vec<PackageReference> {
    let mut declared = project.packages_config.clone();
    for item in project.items_of_type("PackageReference") {
        push_unique(
            &mut declared,
            PackageReference::new(item.include.clone(), item.metadata("Version").map(str::to_string)),
        );
    }
    declared
}

fn write_output(
    source: &Path,
    target: &Path,
    content: &str,
    backup: &dyn BackupSession,
) -> Result<(), MigrateError> {
    let write_error = |e: std::io::Error| MigrateError::WriteError {
        path: target.to_path_buf(),
        source: e,
    };
    if source == target {
        backup.backup(source)?;
    } else if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(target, content).map_err(write_error)
}

/// Append a request, grouping package ids case-insensitively
fn add_request(requests: &mut BTreeMap<String, Vec<VersionRequest>>, package_id: &str, request: VersionRequest) {
    let key = requests
        .keys()
        .find(|k| k.eq_ignore_ascii_case(package_id))
        .cloned()
        .unwrap_or_else(|| package_id.to_string());
    requests.entry(key).or_default().push(request);
}

/// Project name used as the origin of its version requests
fn origin_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn advance(phase: SolutionPhase) -> SolutionPhase {
    let next = phase.next().unwrap_or(phase);
    info!(phase = %next, "Solution phase");
    next
}

fn lock_push<T>(shared: &Mutex<Vec<T>>, value: T) {
    match shared.lock() {
        Ok(mut guard) => guard.push(value),
        Err(poisoned) => poisoned.into_inner().push(value),
    }
}

fn into_inner<T>(shared: Mutex<Vec<T>>) -> Vec<T> {
    shared.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::BACKUP_DIR_NAME;
    use tempfile::TempDir;

    const LEGACY_LIBRARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" Condition="Exists('$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props')" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <RootNamespace>Lib</RootNamespace>
    <AssemblyName>Lib</AssemblyName>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>
"#;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let project = write(temp_dir.path(), "Lib/Lib.csproj", LEGACY_LIBRARY);
        write(temp_dir.path(), "Lib/Class1.cs", "class Class1 {}");

        let mut options = MigrateOptions::new(temp_dir.path());
        options.dry_run = true;
        let report = MigrationOrchestrator::new(options)
            .run(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.totals().written, 1);
        assert_eq!(fs::read_to_string(&project).unwrap(), LEGACY_LIBRARY);
        assert!(!temp_dir.path().join(BACKUP_DIR_NAME).exists());
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "Lib/Lib.csproj", LEGACY_LIBRARY);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut options = MigrateOptions::new(temp_dir.path());
        options.dry_run = true;
        let result = MigrationOrchestrator::new(options).run(&cancel);
        assert!(matches!(
            result.unwrap_err().downcast_ref::<MigrateError>(),
            Some(MigrateError::Cancelled)
        ));
    }

    /// Cancels the run the first time sources are enumerated
    struct CancellingTree;

    impl SourceTree for CancellingTree {
        fn source_files(&self, _: &Path, _: &str, cancel: &CancellationToken) -> Result<Vec<PathBuf>, MigrateError> {
            cancel.cancel();
            cancel.check()?;
            Ok(Vec::new())
        }

        fn nested_project_dirs(&self, _: &Path) -> Vec<PathBuf> {
            Vec::new()
        }
    }

    #[test]
    fn test_cancelled_during_migration_is_not_a_failure() {
        let temp_dir = TempDir::new().unwrap();
        let project = write(temp_dir.path(), "Lib/Lib.csproj", LEGACY_LIBRARY);

        let mut options = MigrateOptions::new(temp_dir.path());
        options.dry_run = true;
        let cancel = CancellationToken::new();
        let report = MigrationOrchestrator::new(options)
            .with_source_tree(Arc::new(CancellingTree))
            .run(&cancel)
            .unwrap();

        assert!(cancel.is_cancelled());
        assert!(report.was_cancelled());
        assert!(!report.has_failures());
        assert_eq!(report.totals().failed, 0);
        assert!(report.results.is_empty());
        assert_eq!(report.not_started, vec![project]);
    }

    #[test]
    fn test_origin_name_is_file_stem() {
        assert_eq!(origin_name(Path::new("/repo/App/App.csproj")), "App");
    }
}
