//! Package lookup
//!
//! [`PackageResolver`] is the seam to whatever knows about packages: a registry client,
//! a local feed, or the built-in [`StaticPackageResolver`] catalog.

use serde::Deserialize;

use crate::classify::matches_framework_pattern;
use crate::identity::compare_versions;

/// A package that provides an assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCandidate {
    pub package_id: String,
    pub default_version: String,
}

/// Knowledge about packages needed to convert references and settle version conflicts.
///
/// Implementations must be shareable across worker threads.
pub trait PackageResolver: Send + Sync {
    /// Package providing `assembly_name` when targeting `target_framework`
    fn resolve_assembly(&self, assembly_name: &str, target_framework: &str) -> Option<PackageCandidate>;

    /// Every assembly the package ships; `None` when unknown
    fn package_assemblies(&self, package_id: &str) -> Option<Vec<String>>;

    /// Public key tokens the package's assemblies are signed with (lowercase hex)
    fn public_key_tokens(&self, package_id: &str) -> Vec<String>;

    /// Known versions, in no particular order
    fn available_versions(&self, package_id: &str) -> Vec<String>;

    /// Framework patterns `version` supports; `None` when unknown
    fn compatible_frameworks(&self, package_id: &str, version: &str) -> Option<Vec<String>>;

    /// Ids of packages this package depends on
    fn dependencies(&self, _package_id: &str) -> Vec<String> {
        Vec::new()
    }
}

/// One catalog entry. Also the shape of a `[[package]]` table in `sdkmigrate.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageInfo {
    pub id: String,
    pub default_version: String,
    #[serde(default)]
    pub assemblies: Vec<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub public_key_tokens: Vec<String>,
    /// Framework patterns; empty means unknown
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PackageInfo {
    fn provides(&self, assembly_name: &str) -> bool {
        self.assemblies
            .iter()
            .any(|a| a.eq_ignore_ascii_case(assembly_name))
    }

    fn supports(&self, target_framework: &str) -> bool {
        self.frameworks.is_empty()
            || self
                .frameworks
                .iter()
                .any(|p| matches_framework_pattern(p, target_framework))
    }
}

/// In-memory package catalog
#[derive(Debug, Clone, Default)]
pub struct StaticPackageResolver {
    packages: Vec<PackageInfo>,
}

impl StaticPackageResolver {
    pub fn new(packages: Vec<PackageInfo>) -> Self {
        Self { packages }
    }

    /// Catalog of widely used packages from the packages.config era.
    pub fn builtin() -> Self {
        fn entry(
            id: &str,
            default_version: &str,
            assemblies: &[&str],
            versions: &[&str],
            tokens: &[&str],
            frameworks: &[&str],
        ) -> PackageInfo {
            let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
            PackageInfo {
                id: id.to_string(),
                default_version: default_version.to_string(),
                assemblies: strings(assemblies),
                versions: strings(versions),
                public_key_tokens: strings(tokens),
                frameworks: strings(frameworks),
                dependencies: Vec::new(),
            }
        }

        let mut packages = vec![
            entry(
                "Newtonsoft.Json",
                "13.0.3",
                &["Newtonsoft.Json"],
                &["9.0.1", "10.0.3", "11.0.2", "12.0.1", "12.0.2", "12.0.3", "13.0.1", "13.0.3"],
                &["30ad4fe6b2a6aeed"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "log4net",
                "2.0.15",
                &["log4net"],
                &["2.0.8", "2.0.12", "2.0.15"],
                &["669e0ddf0bb1aa2a"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "NLog",
                "5.2.8",
                &["NLog"],
                &["4.7.15", "5.2.8"],
                &["5120e14c03d0593c"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "EntityFramework",
                "6.4.4",
                &["EntityFramework", "EntityFramework.SqlServer"],
                &["6.2.0", "6.4.4"],
                &["b77a5c561934e089"],
                &["netframework", "netstandard2.1", "netcoreapp3.0", "netcoreapp3.1", "net"],
            ),
            entry(
                "AutoMapper",
                "10.1.1",
                &["AutoMapper"],
                &["6.2.2", "8.1.1", "10.1.1"],
                &["be96cd2c38ef1005"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "Castle.Core",
                "5.1.1",
                &["Castle.Core"],
                &["4.4.1", "5.1.1"],
                &["407dd0808d44fbdc"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "Moq",
                "4.20.70",
                &["Moq"],
                &["4.16.1", "4.18.4", "4.20.70"],
                &["69f491c39445e920"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "NUnit",
                "3.14.0",
                &["nunit.framework"],
                &["3.12.0", "3.13.3", "3.14.0"],
                &["2638cd05610744eb"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "Serilog",
                "3.1.1",
                &["Serilog"],
                &["2.10.0", "2.12.0", "3.1.1"],
                &["24c2f752a8e58a10"],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
            entry(
                "System.ValueTuple",
                "4.5.0",
                &["System.ValueTuple"],
                &["4.3.0", "4.4.0", "4.5.0"],
                &["cc7b13ffcd2ddd51"],
                &["netframework", "netstandard"],
            ),
            entry(
                "Dapper",
                "2.1.28",
                &["Dapper"],
                &["1.50.5", "2.0.123", "2.1.28"],
                &[],
                &["netframework", "netstandard", "netcoreapp", "net"],
            ),
        ];
        if let Some(moq) = packages.iter_mut().find(|p| p.id == "Moq") {
            moq.dependencies.push("Castle.Core".to_string());
        }
        Self { packages }
    }

    /// Add or replace a catalog entry (matched by id, case-insensitive).
    pub fn insert(&mut self, info: PackageInfo) {
        match self
            .packages
            .iter_mut()
            .find(|p| p.id.eq_ignore_ascii_case(&info.id))
        {
            Some(existing) => *existing = info,
            None => self.packages.push(info),
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn find(&self, package_id: &str) -> Option<&PackageInfo> {
        self.packages
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(package_id))
    }
}

impl PackageResolver for StaticPackageResolver {
    fn resolve_assembly(&self, assembly_name: &str, target_framework: &str) -> Option<PackageCandidate> {
        self.packages
            .iter()
            .find(|p| p.provides(assembly_name) && p.supports(target_framework))
            .map(|p| PackageCandidate {
                package_id: p.id.clone(),
                default_version: p.default_version.clone(),
            })
    }

    fn package_assemblies(&self, package_id: &str) -> Option<Vec<String>> {
        self.find(package_id)
            .filter(|p| !p.assemblies.is_empty())
            .map(|p| p.assemblies.clone())
    }

    fn public_key_tokens(&self, package_id: &str) -> Vec<String> {
        self.find(package_id)
            .map(|p| {
                p.public_key_tokens
                    .iter()
                    .map(|t| t.to_ascii_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn available_versions(&self, package_id: &str) -> Vec<String> {
        let Some(info) = self.find(package_id) else {
            return Vec::new();
        };
        let mut versions = info.versions.clone();
        if !versions.contains(&info.default_version) {
            versions.push(info.default_version.clone());
        }
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }

    fn compatible_frameworks(&self, package_id: &str, _version: &str) -> Option<Vec<String>> {
        self.find(package_id)
            .filter(|p| !p.frameworks.is_empty())
            .map(|p| p.frameworks.clone())
    }

    fn dependencies(&self, package_id: &str) -> Vec<String> {
        self.find(package_id)
            .map(|p| p.dependencies.clone())
            .unwrap_or_default()
    }
}
