//! Package folder names as laid out by a packages.config restore
//!
//! `..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll` lives in the
//! folder `Newtonsoft.Json.12.0.3`, which splits into id `Newtonsoft.Json` and version
//! `12.0.3`.

use crate::util::to_forward_slashes;

use super::version::PackageVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFolder {
    pub package_id: String,
    pub version: String,
    /// The folder name as it appeared in the path
    pub folder_name: String,
}

impl PackageFolder {
    /// Split `{packageId}.{version}` at the first dot-separated segment from which the
    /// remainder parses as a version.
    pub fn parse(folder_name: &str) -> Option<Self> {
        let segments: Vec<&str> = folder_name.split('.').collect();
        for split in 1..segments.len() {
            if !segments[split].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            let version = segments[split..].join(".");
            if PackageVersion::parse(&version).is_some() {
                return Some(Self {
                    package_id: segments[..split].join("."),
                    version,
                    folder_name: folder_name.to_string(),
                });
            }
        }
        None
    }

    /// Extract the package folder from a hint path containing a `packages` segment.
    pub fn from_hint_path(hint_path: &str) -> Option<Self> {
        let normalized = to_forward_slashes(hint_path);
        let mut segments = normalized.split('/');
        segments.find(|s| s.eq_ignore_ascii_case("packages"))?;
        segments.next().and_then(Self::parse)
    }

    /// Case-insensitive match against `{id}.{version}`
    pub fn matches(&self, package_id: &str, version: &str) -> bool {
        self.folder_name
            .eq_ignore_ascii_case(&format!("{}.{}", package_id, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folder() {
        let folder = PackageFolder::parse("Newtonsoft.Json.12.0.3").unwrap();
        assert_eq!(folder.package_id, "Newtonsoft.Json");
        assert_eq!(folder.version, "12.0.3");

        let folder = PackageFolder::parse("xunit.core.2.4.0-beta.1").unwrap();
        assert_eq!(folder.package_id, "xunit.core");
        assert_eq!(folder.version, "2.4.0-beta.1");

        assert!(PackageFolder::parse("NoVersionHere").is_none());
    }

    #[test]
    fn test_from_hint_path() {
        let folder = PackageFolder::from_hint_path(
            r"..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll",
        )
        .unwrap();
        assert_eq!(folder.package_id, "Newtonsoft.Json");
        assert!(folder.matches("newtonsoft.json", "12.0.3"));
        assert!(PackageFolder::from_hint_path(r"lib\Vendor.dll").is_none());
    }
}
