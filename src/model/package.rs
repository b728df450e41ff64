//! Package references produced by migration

use std::collections::BTreeMap;

use crate::identity::AssemblyIdentity;

/// A managed package reference (`<PackageReference Include="id" Version="v"/>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    /// Package id (e.g., "Newtonsoft.Json")
    pub package_id: String,
    /// Package version (e.g., "12.0.3"); `None` when centrally managed or unknown
    pub version: Option<String>,
    /// Came from a dependency rather than a direct declaration (packages.config
    /// `developmentDependency`, or packages only pulled in by another package)
    pub is_transitive: bool,
    /// Target framework recorded in packages.config, if any
    pub target_framework: Option<String>,
    /// Extra metadata carried through to the emitted item (e.g. PrivateAssets)
    pub metadata: BTreeMap<String, String>,
}

impl PackageReference {
    pub fn new(package_id: impl Into<String>, version: Option<String>) -> Self {
        Self {
            package_id: package_id.into(),
            version,
            is_transitive: false,
            target_framework: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Case-insensitive uniqueness key
    pub fn key(&self) -> String {
        self.package_id.to_ascii_lowercase()
    }

    /// `{packageId}.{version}`, the folder name a packages.config restore produces
    pub fn folder_name(&self) -> Option<String> {
        self.version
            .as_ref()
            .map(|v| format!("{}.{}", self.package_id, v))
    }
}

/// A binary reference that could not be safely turned into a package reference.
///
/// These are always re-emitted as `<Reference>` items and reported; they are never
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconvertedReference {
    pub identity: AssemblyIdentity,
    pub hint_path: Option<String>,
    pub private: Option<bool>,
    pub metadata: BTreeMap<String, String>,
    pub reason: String,
}

/// Add `package` to `packages` unless a package with the same id is present.
///
/// Returns true when the package was added.
pub fn push_unique(packages: &mut Vec<PackageReference>, package: PackageReference) -> bool {
    let key = package.key();
    if packages.iter().any(|p| p.key() == key) {
        false
    } else {
        packages.push(package);
        true
    }
}
