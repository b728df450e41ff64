//! Migration result types shared across the pipeline

mod package;
mod result;

pub use package::{push_unique, PackageReference, UnconvertedReference};
pub use result::{MigrationResult, ProjectState, RemovedElement, SkipReason};
