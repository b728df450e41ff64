//! Implicit-inclusion rules of the target SDK
//!
//! SDK-style projects glob most items automatically. An item the SDK would already
//! include must not be listed again (or it is included twice); an item the SDK includes
//! but with different metadata must become an `Update`.

use crate::classify::{Classification, SdkVariant};
use crate::project::Item;
use crate::util::{ends_with_ci, starts_with_ci, to_forward_slashes};

/// Extensions the web SDK includes as `Content`
const WEB_CONTENT_EXTENSIONS: &[&str] = &[".json", ".config", ".cshtml", ".razor"];

/// The implicit-inclusion behavior for one project, selected once from its variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitRules {
    /// Source extension globbed as `Compile` (`.cs`, `.vb`); `None` for F#, where
    /// compile order is significant
    pub source_extension: Option<&'static str>,
    pub web_content: bool,
    pub wpf: bool,
}

/// Source extension of a project language, by project file extension
pub fn source_extension(project_extension: &str) -> Option<&'static str> {
    match project_extension.to_ascii_lowercase().as_str() {
        "csproj" => Some(".cs"),
        "vbproj" => Some(".vb"),
        _ => None,
    }
}

impl ImplicitRules {
    pub fn for_project(project_extension: &str, classification: &Classification) -> Self {
        Self {
            source_extension: source_extension(project_extension),
            web_content: classification.variant.includes_web_content(),
            wpf: classification.flags.use_wpf || classification.variant == SdkVariant::WindowsDesktop,
        }
    }

    /// Whether the SDK includes the item's path on its own. Conditions are the caller's
    /// concern.
    pub fn is_implicit(&self, item: &Item) -> bool {
        let include = item.include.trim();
        if include.is_empty()
            || !is_inside_project(include)
            || is_build_output(include)
            || item.metadata("Link").is_some()
        {
            return false;
        }

        if item.is_type("Compile") {
            self.source_extension
                .is_some_and(|ext| ends_with_ci(include, ext))
        } else if item.is_type("EmbeddedResource") {
            ends_with_ci(include, ".resx")
        } else if item.is_type("None") {
            true
        } else if item.is_type("Content") {
            self.web_content && is_web_content(include)
        } else if item.is_type("Page") || item.is_type("ApplicationDefinition") {
            self.wpf && ends_with_ci(include, ".xaml")
        } else {
            false
        }
    }

    /// Metadata that only restates what the SDK or the IDE derives anyway
    pub fn is_suppressible(&self, item: &Item, name: &str, value: &str) -> bool {
        let value = value.trim();
        if item.is_type("Compile") || item.is_type("EmbeddedResource") {
            name.eq_ignore_ascii_case("SubType")
                || (name.eq_ignore_ascii_case("DependentUpon")
                    && follows_sibling_convention(&item.include, value))
        } else if item.is_type("Page") || item.is_type("ApplicationDefinition") {
            (name.eq_ignore_ascii_case("Generator") && value.eq_ignore_ascii_case("MSBuild:Compile"))
                || (name.eq_ignore_ascii_case("SubType") && value.eq_ignore_ascii_case("Designer"))
        } else if item.is_type("None") || item.is_type("Content") {
            name.eq_ignore_ascii_case("SubType") && value.eq_ignore_ascii_case("Designer")
        } else {
            false
        }
    }

    /// Metadata that is not suppressible, in document order
    pub fn behavior_metadata<'a>(&self, item: &'a Item) -> Vec<&'a (String, String)> {
        item.metadata
            .iter()
            .filter(|(name, value)| !self.is_suppressible(item, name, value))
            .collect()
    }
}

/// Relative and not climbing out of the project directory
pub fn is_inside_project(include: &str) -> bool {
    let path = to_forward_slashes(include);
    !(path.starts_with("../")
        || path.starts_with('/')
        || path.contains("/../")
        || path.contains(':')
        || path.starts_with("$("))
}

/// Under `bin` or `obj`, which the SDK's default item globs exclude
pub fn is_build_output(include: &str) -> bool {
    let path = to_forward_slashes(include);
    let first = path
        .trim_start_matches("./")
        .split('/')
        .next()
        .unwrap_or_default();
    first.eq_ignore_ascii_case("bin") || first.eq_ignore_ascii_case("obj")
}

fn is_web_content(include: &str) -> bool {
    let path = to_forward_slashes(include);
    starts_with_ci(&path, "wwwroot/")
        || WEB_CONTENT_EXTENSIONS
            .iter()
            .any(|ext| ends_with_ci(&path, ext))
}

/// File name up to the first dot: `Form1.Designer.cs` → `Form1`
fn base_stem(path: &str) -> &str {
    let file = path.rsplit(['\\', '/']).next().unwrap_or(path);
    file.split('.').next().unwrap_or(file)
}

/// `DependentUpon` names a sibling file with the same base name, e.g.
/// `Form1.resx` → `Form1.cs` or `Form1.Designer.cs` → `Form1.cs`.
fn follows_sibling_convention(include: &str, dependent_upon: &str) -> bool {
    !dependent_upon.contains(['\\', '/'])
        && base_stem(include).eq_ignore_ascii_case(base_stem(dependent_upon))
}
