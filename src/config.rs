//! Run options and the optional `sdkmigrate.toml` file

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::classify::DEFAULT_MODERN_FRAMEWORK;
use crate::conflicts::ConflictStrategy;
use crate::error::MigrateError;
use crate::references::PackageInfo;

pub const CONFIG_FILE_NAME: &str = "sdkmigrate.toml";

/// Options for a migration run
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Directory scanned for project files
    pub root: PathBuf,
    /// Report what would change without writing anything
    pub dry_run: bool,
    /// Write migrated projects under this directory (mirroring their relative paths)
    /// instead of in place
    pub output_dir: Option<PathBuf>,
    /// Target framework for every project, overriding the legacy declarations
    pub target_framework: Option<String>,
    /// Modern framework added to multi-targeted projects
    pub modern_fallback_framework: String,
    pub backup: bool,
    /// Proceed despite overridable pre-flight warnings
    pub force: bool,
    /// Worker threads
    pub parallelism: usize,
    /// Write `Directory.Packages.props` and drop versions from projects
    pub central_package_management: bool,
    pub strategy: ConflictStrategy,
    pub report_path: Option<PathBuf>,
    /// Catalog entries added to the built-in package catalog
    pub extra_packages: Vec<PackageInfo>,
}

impl MigrateOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            output_dir: None,
            target_framework: None,
            modern_fallback_framework: DEFAULT_MODERN_FRAMEWORK.to_string(),
            backup: true,
            force: false,
            parallelism: 1,
            central_package_management: false,
            strategy: ConflictStrategy::default(),
            report_path: None,
            extra_packages: Vec::new(),
        }
    }

    /// Take every value the file sets. Call before applying command-line flags.
    pub fn apply_config(&mut self, config: MigrationConfig) {
        if let Some(parallelism) = config.parallelism {
            self.parallelism = parallelism.max(1);
        }
        if let Some(strategy) = config.strategy {
            self.strategy = strategy;
        }
        if let Some(central) = config.central_package_management {
            self.central_package_management = central;
        }
        if let Some(fallback) = config.modern_fallback_framework {
            self.modern_fallback_framework = fallback;
        }
        if let Some(tfm) = config.target_framework {
            self.target_framework = Some(tfm);
        }
        self.extra_packages.extend(config.packages);
    }

    /// Where the migrated version of `project` goes
    pub fn output_path_for(&self, project: &Path) -> PathBuf {
        match self.output_dir {
            Some(ref dir) => match project.strip_prefix(&self.root) {
                Ok(relative) => dir.join(relative),
                Err(_) => dir.join(project.file_name().unwrap_or_default()),
            },
            None => project.to_path_buf(),
        }
    }

    /// Projects are rewritten where they are
    pub fn writes_in_place(&self) -> bool {
        !self.dry_run && self.output_dir.is_none()
    }
}

/// Contents of `sdkmigrate.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    pub parallelism: Option<usize>,
    pub strategy: Option<ConflictStrategy>,
    pub central_package_management: Option<bool>,
    pub modern_fallback_framework: Option<String>,
    pub target_framework: Option<String>,
    /// `[[package]]` tables
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageInfo>,
}

impl MigrationConfig {
    pub fn from_file(path: &Path) -> Result<Self, MigrateError> {
        let content = std::fs::read_to_string(path).map_err(|e| MigrateError::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, MigrateError> {
        toml::from_str(content).map_err(|e| MigrateError::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `sdkmigrate.toml` in `root`, if present
    pub fn discover(root: &Path) -> Result<Option<Self>, MigrateError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}
