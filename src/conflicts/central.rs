//! Central package version file (`Directory.Packages.props`)

use std::fmt;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use roxmltree::Document;

use crate::error::MigrateError;
use crate::migrate::writer::{write_document, write_empty, write_text_element};
use crate::util::starts_with_ci;

pub const CENTRAL_FILE_NAME: &str = "Directory.Packages.props";

/// Package grouping in the central file; declaration order is output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageCategory {
    Framework,
    Runtime,
    ThirdParty,
    Test,
    BuildTool,
    Analyzer,
    Other,
}

impl PackageCategory {
    pub const ORDERED: &'static [PackageCategory] = &[
        PackageCategory::Framework,
        PackageCategory::Runtime,
        PackageCategory::ThirdParty,
        PackageCategory::Test,
        PackageCategory::BuildTool,
        PackageCategory::Analyzer,
        PackageCategory::Other,
    ];

    /// Analyzers and build tools apply to every project and are emitted as
    /// `GlobalPackageReference`.
    pub fn is_global(&self) -> bool {
        matches!(self, PackageCategory::Analyzer | PackageCategory::BuildTool)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PackageCategory::Framework => "Framework",
            PackageCategory::Runtime => "Runtime",
            PackageCategory::ThirdParty => "Third party",
            PackageCategory::Test => "Test",
            PackageCategory::BuildTool => "Build tools",
            PackageCategory::Analyzer => "Analyzers",
            PackageCategory::Other => "Other",
        }
    }
}

impl fmt::Display for PackageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

const TEST_PREFIXES: &[&str] = &[
    "xunit",
    "nunit",
    "mstest.",
    "microsoft.net.test.sdk",
    "moq",
    "nsubstitute",
    "fluentassertions",
    "coverlet.",
    "fakeiteasy",
    "autofixture",
];

const BUILD_TOOL_PREFIXES: &[&str] = &[
    "microsoft.sourcelink.",
    "nerdbank.gitversioning",
    "gitversion.msbuild",
    "minver",
    "microsoft.build.tasks.git",
    "microsoft.net.compilers",
    "microsoft.codedom.providers.dotnetcompilerplatform",
];

const FRAMEWORK_PREFIXES: &[&str] = &[
    "system.",
    "microsoft.netcore.",
    "microsoft.win32.",
    "netstandard.library",
    "microsoft.netframework.referenceassemblies",
];

const RUNTIME_PREFIXES: &[&str] = &[
    "microsoft.extensions.",
    "microsoft.aspnetcore.",
    "microsoft.entityframeworkcore",
    "microsoft.data.",
];

/// Categorize a package by its id.
pub fn categorize(package_id: &str) -> PackageCategory {
    let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| starts_with_ci(package_id, p));
    let lower = package_id.to_ascii_lowercase();

    if lower.contains("analyzers") || lower.starts_with("roslynator") || lower == "sonaranalyzer.csharp" {
        PackageCategory::Analyzer
    } else if has_prefix(BUILD_TOOL_PREFIXES) {
        PackageCategory::BuildTool
    } else if has_prefix(TEST_PREFIXES) {
        PackageCategory::Test
    } else if has_prefix(FRAMEWORK_PREFIXES) {
        PackageCategory::Framework
    } else if has_prefix(RUNTIME_PREFIXES) {
        PackageCategory::Runtime
    } else if starts_with_ci(package_id, "microsoft.") {
        PackageCategory::Other
    } else {
        PackageCategory::ThirdParty
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralEntry {
    pub package_id: String,
    pub version: String,
    pub category: PackageCategory,
}

/// Contents of a central package version file
#[derive(Debug, Clone, Default)]
pub struct CentralPackageFile {
    entries: Vec<CentralEntry>,
}

impl CentralPackageFile {
    /// Build from resolved `(package id, version)` pairs.
    pub fn new<'a>(versions: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut entries: Vec<CentralEntry> = versions
            .into_iter()
            .map(|(id, version)| CentralEntry {
                package_id: id.clone(),
                version: version.clone(),
                category: categorize(id),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.package_id.to_ascii_lowercase().cmp(&b.package_id.to_ascii_lowercase()))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[CentralEntry] {
        &self.entries
    }

    /// Ids of packages referenced globally; projects must not reference them again.
    pub fn global_packages(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.category.is_global())
            .map(|e| e.package_id.as_str())
    }

    pub fn is_global(&self, package_id: &str) -> bool {
        self.global_packages().any(|p| p.eq_ignore_ascii_case(package_id))
    }

    pub fn render(&self) -> Result<String> {
        write_document("Project", &[], |writer| {
            writer.write_event(Event::Start(BytesStart::new("PropertyGroup")))?;
            write_text_element(writer, "ManagePackageVersionsCentrally", &[], "true")?;
            writer.write_event(Event::End(BytesEnd::new("PropertyGroup")))?;

            for category in PackageCategory::ORDERED {
                let entries: Vec<&CentralEntry> = self
                    .entries
                    .iter()
                    .filter(|e| e.category == *category)
                    .collect();
                if entries.is_empty() {
                    continue;
                }
                let element = if category.is_global() {
                    "GlobalPackageReference"
                } else {
                    "PackageVersion"
                };
                writer.write_event(Event::Start(
                    BytesStart::new("ItemGroup").with_attributes([("Label", category.label())]),
                ))?;
                for entry in entries {
                    write_empty(
                        writer,
                        element,
                        &[("Include", entry.package_id.as_str()), ("Version", entry.version.as_str())],
                    )?;
                }
                writer.write_event(Event::End(BytesEnd::new("ItemGroup")))?;
            }
            Ok(())
        })
    }
}

/// Read `PackageVersion`/`GlobalPackageReference` declarations from an existing file.
pub fn read_central_file(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path).map_err(|e| MigrateError::ProjectReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_central_file_str(&content, path)
}

pub fn parse_central_file_str(content: &str, path: &Path) -> Result<Vec<(String, String)>> {
    let doc = Document::parse(content).map_err(|e| MigrateError::ProjectParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let declarations = doc
        .descendants()
        .filter(|n| {
            n.is_element()
                && matches!(n.tag_name().name(), "PackageVersion" | "GlobalPackageReference")
        })
        .filter_map(|n| {
            let id = n.attribute("Include").or_else(|| n.attribute("Update"))?;
            let version = n.attribute("Version").map(str::to_string).or_else(|| {
                n.children()
                    .find(|c| c.has_tag_name("Version"))
                    .and_then(|c| c.text())
                    .map(|t| t.trim().to_string())
            })?;
            Some((id.to_string(), version))
        })
        .collect();
    Ok(declarations)
}
