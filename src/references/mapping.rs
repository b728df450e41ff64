//! Framework-aware assembly → package mapping
//!
//! Some .NET Framework assemblies moved into packages on newer targets, and some
//! packages ship different assemblies per framework. Each entry lists, per framework
//! pattern, the assemblies the package provides there. Patterns are exact monikers or
//! the family wildcards understood by [`matches_framework_pattern`].

use crate::classify::matches_framework_pattern;

pub struct FrameworkMapping {
    pub package_id: &'static str,
    pub version: &'static str,
    pub frameworks: &'static [(&'static str, &'static [&'static str])],
}

macro_rules! modern_only {
    ($($assembly:expr),+) => {
        &[
            ("netcoreapp", &[$($assembly),+]),
            ("net", &[$($assembly),+]),
            ("netstandard", &[$($assembly),+]),
        ]
    };
}

pub static FRAMEWORK_MAPPINGS: &[FrameworkMapping] = &[
    FrameworkMapping {
        package_id: "System.Configuration.ConfigurationManager",
        version: "8.0.0",
        frameworks: modern_only!("System.Configuration"),
    },
    FrameworkMapping {
        package_id: "System.ServiceModel.Primitives",
        version: "6.2.0",
        frameworks: modern_only!("System.ServiceModel"),
    },
    FrameworkMapping {
        package_id: "System.Drawing.Common",
        version: "8.0.0",
        frameworks: modern_only!("System.Drawing"),
    },
    FrameworkMapping {
        package_id: "System.Runtime.Caching",
        version: "8.0.0",
        frameworks: modern_only!("System.Runtime.Caching"),
    },
    FrameworkMapping {
        package_id: "System.Management",
        version: "8.0.0",
        frameworks: modern_only!("System.Management"),
    },
    FrameworkMapping {
        package_id: "System.DirectoryServices",
        version: "8.0.0",
        frameworks: modern_only!("System.DirectoryServices"),
    },
    FrameworkMapping {
        package_id: "System.ComponentModel.Composition",
        version: "8.0.0",
        frameworks: modern_only!("System.ComponentModel.Composition"),
    },
    FrameworkMapping {
        package_id: "System.Data.SqlClient",
        version: "4.8.6",
        frameworks: modern_only!("System.Data.SqlClient"),
    },
    FrameworkMapping {
        package_id: "Microsoft.AspNet.WebApi.Client",
        version: "6.0.0",
        frameworks: &[
            ("netframework", &["System.Net.Http.Formatting"]),
            ("netstandard", &["System.Net.Http.Formatting"]),
            ("netcoreapp", &["System.Net.Http.Formatting"]),
            ("net", &["System.Net.Http.Formatting"]),
        ],
    },
    FrameworkMapping {
        package_id: "Microsoft.AspNet.WebApi.Core",
        version: "5.3.0",
        frameworks: &[("netframework", &["System.Web.Http"])],
    },
    FrameworkMapping {
        package_id: "Microsoft.AspNet.Mvc",
        version: "5.3.0",
        frameworks: &[("netframework", &["System.Web.Mvc"])],
    },
];

/// A mapping hit: the package and every assembly it provides on the framework
#[derive(Debug, Clone)]
pub struct MappingHit {
    pub package_id: &'static str,
    pub version: &'static str,
    pub assemblies: &'static [&'static str],
}

/// Find the package providing `assembly_name` on `target_framework`.
pub fn lookup(assembly_name: &str, target_framework: &str) -> Option<MappingHit> {
    FRAMEWORK_MAPPINGS.iter().find_map(|mapping| {
        mapping
            .frameworks
            .iter()
            .filter(|(pattern, _)| matches_framework_pattern(pattern, target_framework))
            .find(|(_, assemblies)| assemblies.iter().any(|a| a.eq_ignore_ascii_case(assembly_name)))
            .map(|(_, assemblies)| MappingHit {
                package_id: mapping.package_id,
                version: mapping.version,
                assemblies: *assemblies,
            })
    })
}
