//! Assemblies that never need a package

/// Assemblies shipped in the shared framework of .NET Core / .NET 5+. A bare reference to
/// one of these needs no package on a modern target.
const SHARED_FRAMEWORK_ASSEMBLIES: &[&str] = &[
    "mscorlib",
    "netstandard",
    "Microsoft.CSharp",
    "Microsoft.VisualBasic",
    "System",
    "System.Core",
    "System.Collections",
    "System.ComponentModel.DataAnnotations",
    "System.Data",
    "System.Data.DataSetExtensions",
    "System.Globalization",
    "System.IO",
    "System.IO.Compression",
    "System.IO.Compression.FileSystem",
    "System.Linq",
    "System.Net",
    "System.Net.Http",
    "System.Numerics",
    "System.Runtime",
    "System.Runtime.Serialization",
    "System.Security",
    "System.ServiceModel.Web",
    "System.Threading",
    "System.Threading.Tasks",
    "System.Transactions",
    "System.Web.Extensions",
    "System.Xml",
    "System.Xml.Linq",
    "System.Xml.Serialization",
];

/// References the SDK adds on its own when targeting .NET Framework
const SDK_IMPLICIT_FRAMEWORK_REFERENCES: &[&str] = &[
    "System",
    "System.Core",
    "System.Data",
    "System.Drawing",
    "System.IO.Compression.FileSystem",
    "System.Numerics",
    "System.Runtime.Serialization",
    "System.Xml",
    "System.Xml.Linq",
];

pub fn is_shared_framework_assembly(name: &str) -> bool {
    SHARED_FRAMEWORK_ASSEMBLIES
        .iter()
        .any(|a| a.eq_ignore_ascii_case(name))
}

pub fn is_sdk_implicit_framework_reference(name: &str) -> bool {
    SDK_IMPLICIT_FRAMEWORK_REFERENCES
        .iter()
        .any(|a| a.eq_ignore_ascii_case(name))
}
