//! rust-sdkmigrate: converts legacy MSBuild project files into SDK-style projects
//!
//! This library classifies legacy `.csproj`/`.vbproj`/`.fsproj` files, converts binary
//! references into package references, suppresses items the SDK includes implicitly,
//! and settles package versions across every project of a solution.

pub mod classify;
pub mod config;
pub mod conflicts;
pub mod error;
pub mod identity;
pub mod migrate;
pub mod model;
pub mod orchestrator;
pub mod project;
pub mod references;
mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use classify::{Classification, SdkVariant};
pub use config::{MigrateOptions, MigrationConfig};
pub use error::MigrateError;
pub use orchestrator::{CancellationToken, MigrationOrchestrator, MigrationReport};

/// Migrate every legacy project under `options.root`
pub fn migrate_directory(options: MigrateOptions, cancel: &CancellationToken) -> Result<MigrationReport> {
    MigrationOrchestrator::new(options).run(cancel)
}

/// What a single project would migrate to, without changing anything
#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    pub project_path: PathBuf,
    pub already_sdk_style: bool,
    pub classification: Classification,
}

/// Load and classify one project
pub fn analyze_project(path: &Path, options: &MigrateOptions) -> Result<ProjectAnalysis> {
    let project = project::load_project(path)?;
    let classifier = classify::SdkTypeClassifier::new(classify::ClassifierOptions {
        target_framework_override: options.target_framework.clone(),
        modern_fallback: options.modern_fallback_framework.clone(),
    });
    let classification = classifier.classify(&project, &classify::FsProbe);

    Ok(ProjectAnalysis {
        project_path: path.to_path_buf(),
        already_sdk_style: project.is_sdk_style(),
        classification,
    })
}
