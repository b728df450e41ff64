//! Shared utility helpers.

use std::path::{Component, Path, PathBuf};

/// Case-insensitive ends_with check without allocating.
#[inline]
pub fn ends_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[haystack.len() - needle.len()..]
            .eq_ignore_ascii_case(needle.as_bytes())
}

/// Case-insensitive starts_with check without allocating.
#[inline]
pub fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// Case-insensitive substring search without allocating an uppercase copy.
#[inline]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle_bytes = needle.as_bytes();
    let haystack_bytes = haystack.as_bytes();
    if needle_bytes.len() > haystack_bytes.len() {
        return false;
    }
    haystack_bytes
        .windows(needle_bytes.len())
        .any(|window| window.eq_ignore_ascii_case(needle_bytes))
}

/// Converts an MSBuild include path (backslash separated) to forward slashes.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Converts a path to the backslash form MSBuild files conventionally use.
pub fn to_msbuild_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

/// Lexically normalizes a relative include path: `a\.\b\..\c.cs` -> `a/c.cs`.
///
/// Leading `..` components are kept since they point outside the project.
pub fn normalize_relative(path: &str) -> PathBuf {
    let mut out: Vec<String> = Vec::new();
    for component in Path::new(&to_forward_slashes(path)).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.last().is_some_and(|c| c != "..") {
                    out.pop();
                } else {
                    out.push("..".to_string());
                }
            }
            other => out.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    out.iter().collect()
}

/// Case-insensitive path key used to compare include paths.
pub fn path_key(path: &Path) -> String {
    to_forward_slashes(&path.to_string_lossy()).to_ascii_lowercase()
}
