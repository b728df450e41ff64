//! `Compile Remove` generation
//!
//! The SDK compiles every source file under the project directory. Files the legacy
//! project did not compile, and the directories of nested projects, have to be removed
//! explicitly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::{DirEntry, WalkDir};

use crate::error::MigrateError;
use crate::orchestrator::CancellationToken;
use crate::project::EvaluatedProject;
use crate::util::{normalize_relative, path_key, to_msbuild_path};

use super::descriptor::DescriptorItem;
use super::implicit::ImplicitRules;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Source files on disk, as seen from a project directory
pub trait SourceTree {
    /// Files under `root` with `extension` (e.g. `.cs`), relative to `root`. Build
    /// output and hidden directories are skipped.
    fn source_files(
        &self,
        root: &Path,
        extension: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>, MigrateError>;

    /// Subdirectories of `root`, relative to it, that contain another project file
    fn nested_project_dirs(&self, root: &Path) -> Vec<PathBuf>;
}

/// [`SourceTree`] over the real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceTree;

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.eq_ignore_ascii_case("bin") || name.eq_ignore_ascii_case("obj")
}

fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.to_ascii_lowercase().ends_with("proj"))
}

impl SourceTree for FsSourceTree {
    fn source_files(
        &self,
        root: &Path,
        extension: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>, MigrateError> {
        let wanted = extension.trim_start_matches('.');
        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
            .filter_map(|e| e.ok())
        {
            cancel.check()?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || !path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
            {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
        Ok(files)
    }

    fn nested_project_dirs(&self, root: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(2)
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_project_file(e.path()))
            .filter_map(|e| {
                e.path()
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(Path::to_path_buf)
            })
            .collect();
        dirs.sort();
        dirs.dedup();

        // A project nested inside another nested project is covered by the outer removal
        let mut outermost: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !outermost.iter().any(|outer| dir.starts_with(outer)) {
                outermost.push(dir);
            }
        }
        outermost
    }
}

/// Files the legacy project compiles: literal paths plus wildcard includes with their
/// `Exclude` patterns. Keys are lowercase, forward-slash relative paths.
#[derive(Debug, Default)]
struct CompiledSet {
    literals: HashSet<String>,
    globs: Vec<(Pattern, Vec<Pattern>)>,
}

fn split_paths<'a>(project: &'a EvaluatedProject, value: &'a str) -> impl Iterator<Item = String> + 'a {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(move |s| path_key(&normalize_relative(&project.expand(s))))
}

fn is_wildcard(path: &str) -> bool {
    path.contains(['*', '?'])
}

impl CompiledSet {
    fn from_project(project: &EvaluatedProject) -> Self {
        let mut set = CompiledSet::default();
        for item in project.all_items().into_iter().filter(|i| i.is_type("Compile")) {
            let excludes: Vec<Pattern> = item
                .exclude
                .as_deref()
                .map(|e| split_paths(project, e).filter_map(|p| Pattern::new(&p).ok()).collect())
                .unwrap_or_default();
            for include in split_paths(project, &item.include) {
                if is_wildcard(&include) {
                    if let Ok(pattern) = Pattern::new(&include) {
                        set.globs.push((pattern, excludes.clone()));
                    }
                } else {
                    set.literals.insert(include);
                }
            }
        }
        set
    }

    fn contains(&self, key: &str) -> bool {
        self.literals.contains(key)
            || self.globs.iter().any(|(include, excludes)| {
                include.matches_with(key, MATCH_OPTIONS)
                    && !excludes.iter().any(|e| e.matches_with(key, MATCH_OPTIONS))
            })
    }
}

/// `Compile Remove` items for nested project directories and for source files on disk
/// the legacy project does not compile.
pub fn compute_exclusions(
    project: &EvaluatedProject,
    rules: &ImplicitRules,
    tree: &dyn SourceTree,
    cancel: &CancellationToken,
) -> Result<Vec<DescriptorItem>, MigrateError> {
    let Some(extension) = rules.source_extension else {
        return Ok(Vec::new());
    };
    let root = project.project_dir();

    let nested = tree.nested_project_dirs(root);
    let mut removals: Vec<DescriptorItem> = nested
        .iter()
        .map(|dir| DescriptorItem::remove("Compile", format!("{}\\**", to_msbuild_path(dir))))
        .collect();
    let nested_prefixes: Vec<String> = nested.iter().map(|d| format!("{}/", path_key(d))).collect();

    let compiled = CompiledSet::from_project(project);
    for file in tree.source_files(root, extension, cancel)? {
        let key = path_key(&file);
        if nested_prefixes.iter().any(|prefix| key.starts_with(prefix)) {
            continue;
        }
        if !compiled.contains(&key) {
            removals.push(DescriptorItem::remove("Compile", to_msbuild_path(&file)));
        }
    }
    Ok(removals)
}
