//! Assembly identities, package folders and package versions

mod assembly;
mod package_folder;
mod version;

pub use assembly::AssemblyIdentity;
pub use package_folder::PackageFolder;
pub use version::{compare_versions, is_prerelease, PackageVersion};
