//! Package version conflicts and central version management

mod central;
mod resolver;
mod strategy;

pub use central::{
    categorize, parse_central_file_str, read_central_file, CentralEntry, CentralPackageFile,
    PackageCategory, CENTRAL_FILE_NAME,
};
pub use resolver::{
    merge_existing, pick_highest, PackageVersionConflictResolver, VersionConflict,
    VersionRequest,
};
pub use strategy::ConflictStrategy;
