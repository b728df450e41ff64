//! Project discovery

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::MigrateError;

use super::cancel::CancellationToken;

/// Extensions picked up by the scan. Unmigratable kinds are included so they show up in
/// the report as skipped.
const PROJECT_EXTENSIONS: &[&str] = &[
    "csproj", "vbproj", "fsproj", "sqlproj", "dcproj", "shproj", "wixproj", "vcxproj", "ccproj",
];

/// Directory names never descended into
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules", "packages"];

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d))
}

pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PROJECT_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
}

/// Project files under `root`, sorted. `root` may also be a single project file.
pub fn scan_projects(root: &Path, cancel: &CancellationToken) -> Result<Vec<PathBuf>, MigrateError> {
    if root.is_file() {
        return Ok(if is_project_file(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut projects = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
    {
        cancel.check()?;
        if entry.file_type().is_file() && is_project_file(entry.path()) {
            projects.push(entry.into_path());
        }
    }
    projects.sort();
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_projects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for path in ["src/App/App.csproj", "src/Db/Db.sqlproj", "src/App/obj/App.csproj", "README.md", ".git/x.csproj"] {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "").unwrap();
        }

        let projects = scan_projects(root, &CancellationToken::new()).unwrap();
        assert_eq!(
            projects,
            vec![root.join("src/App/App.csproj"), root.join("src/Db/Db.sqlproj")]
        );
    }
}
