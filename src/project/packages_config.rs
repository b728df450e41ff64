//! packages.config support
//!
//! Format:
//! ```xml
//! <packages>
//!   <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net472" />
//!   <package id="StyleCop.Analyzers" version="1.1.118" developmentDependency="true" />
//! </packages>
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use roxmltree::Document;

use crate::error::MigrateError;
use crate::model::PackageReference;

use super::evaluated::EvaluatedProject;
use super::legacy_parser::read_with_encoding_fallback;

/// Locate and parse the packages.config belonging to a project.
///
/// Looks for `packages.<ProjectName>.config` first, then `packages.config`.
pub fn find_packages_config(project: &EvaluatedProject) -> Result<Vec<PackageReference>> {
    match packages_config_path(project) {
        Some(path) => parse_packages_config(&path),
        None => Ok(Vec::new()),
    }
}

/// Path of the packages.config file used by `project`, if one exists.
pub fn packages_config_path(project: &EvaluatedProject) -> Option<PathBuf> {
    let dir = project.project_dir();
    [
        dir.join(format!("packages.{}.config", project.name())),
        dir.join("packages.config"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Parse a packages.config file
pub fn parse_packages_config(path: &Path) -> Result<Vec<PackageReference>> {
    let content = read_with_encoding_fallback(path).map_err(|e| MigrateError::ProjectReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_packages_config_str(&content, path)
}

pub fn parse_packages_config_str(content: &str, path: &Path) -> Result<Vec<PackageReference>> {
    let doc = Document::parse(content).map_err(|e| MigrateError::ProjectParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut packages = Vec::new();
    for node in doc.descendants() {
        if node.tag_name().name() != "package" {
            continue;
        }
        let Some(id) = node.attribute("id") else {
            continue;
        };

        let mut package = PackageReference::new(id, node.attribute("version").map(str::to_string));
        package.target_framework = node.attribute("targetFramework").map(str::to_string);
        if node
            .attribute("developmentDependency")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            package
                .metadata
                .insert("PrivateAssets".to_string(), "all".to_string());
        }
        packages.push(package);
    }

    Ok(packages)
}
