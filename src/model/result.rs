//! Per-project migration outcome

use std::fmt;
use std::path::PathBuf;

use crate::classify::SdkVariant;

use super::package::{PackageReference, UnconvertedReference};

/// Why a project was not migrated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The project is already an SDK-style project
    AlreadyModern,
    /// The classifier determined the project cannot be converted
    Unmigratable(String),
}

/// Per-project state machine:
/// `Pending → Parsing → Classifying → Migrating → Written | Skipped | Failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectState {
    Pending,
    Parsing,
    Classifying,
    Migrating,
    Written,
    Skipped(SkipReason),
    Failed(String),
}

impl ProjectState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectState::Written | ProjectState::Skipped(_) | ProjectState::Failed(_)
        )
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectState::Pending => write!(f, "pending"),
            ProjectState::Parsing => write!(f, "parsing"),
            ProjectState::Classifying => write!(f, "classifying"),
            ProjectState::Migrating => write!(f, "migrating"),
            ProjectState::Written => write!(f, "written"),
            ProjectState::Skipped(SkipReason::AlreadyModern) => {
                write!(f, "skipped (already SDK-style)")
            }
            ProjectState::Skipped(SkipReason::Unmigratable(reason)) => {
                write!(f, "skipped (unmigratable: {})", reason)
            }
            ProjectState::Failed(error) => write!(f, "failed ({})", error),
        }
    }
}

/// A legacy element intentionally left out of the migrated project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedElement {
    /// Human-readable element description (e.g., `Compile Include="Program.cs"`)
    pub element: String,
    pub reason: String,
}

impl RemovedElement {
    pub fn new(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RemovedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.element, self.reason)
    }
}

/// Outcome of migrating one project
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub project_path: PathBuf,
    pub success: bool,
    pub state: ProjectState,
    /// Where the SDK-style project was (or, in dry-run mode, would be) written
    pub output_path: Option<PathBuf>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub removed_elements: Vec<RemovedElement>,
    pub migrated_packages: Vec<PackageReference>,
    pub unconverted_references: Vec<UnconvertedReference>,
    pub sdk_variant: Option<SdkVariant>,
}

impl MigrationResult {
    pub fn new(project_path: PathBuf) -> Self {
        Self {
            project_path,
            success: false,
            state: ProjectState::Pending,
            output_path: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            removed_elements: Vec::new(),
            migrated_packages: Vec::new(),
            unconverted_references: Vec::new(),
            sdk_variant: None,
        }
    }

    /// Mark the project as failed, recording the error.
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.success = false;
        self.errors.push(error.clone());
        self.state = ProjectState::Failed(error);
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ProjectState::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.state, ProjectState::Skipped(_))
    }
}
