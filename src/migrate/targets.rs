//! Import and target migration

use tracing::debug;

use crate::model::RemovedElement;
use crate::project::{Import, Target};
use crate::util::{contains_ci, to_forward_slashes};

/// Imports the SDK brings in on its own (matched as path suffixes or fragments)
const SDK_OWNED_IMPORTS: &[&str] = &[
    "Microsoft.Common.props",
    "Microsoft.CSharp.targets",
    "Microsoft.VisualBasic.targets",
    "Microsoft.FSharp.targets",
    "Microsoft.Portable.CSharp.targets",
    "Microsoft.Portable.VisualBasic.targets",
    "Microsoft.WebApplication.targets",
    "Microsoft.TestTools.targets",
    "Microsoft.TypeScript.Default.props",
    "Microsoft.TypeScript.targets",
];

/// Legacy extension points the SDK no longer calls
const LEGACY_HOOKS: &[(&str, &str, Hook)] = &[
    ("BeforeBuild", "CustomBeforeBuild", Hook::Before),
    ("AfterBuild", "CustomAfterBuild", Hook::After),
];

#[derive(Debug, Clone, Copy)]
enum Hook {
    Before,
    After,
}

#[derive(Debug, Default)]
pub(crate) struct TargetOutput<T> {
    /// Kept elements with their index in the source list
    pub kept: Vec<(usize, T)>,
    pub removed: Vec<RemovedElement>,
    pub warnings: Vec<String>,
}

fn is_sdk_owned_import(project: &str) -> bool {
    SDK_OWNED_IMPORTS
        .iter()
        .any(|owned| contains_ci(project, owned))
}

/// Build imports restored from a `packages` folder
fn is_package_folder_import(project: &str) -> bool {
    let path = to_forward_slashes(project).to_ascii_lowercase();
    path.starts_with("packages/") || path.contains("/packages/")
}

pub(crate) fn migrate_imports(imports: &[Import]) -> TargetOutput<Import> {
    let mut out = TargetOutput::default();
    for (index, import) in imports.iter().enumerate() {
        let element = format!("Import Project=\"{}\"", import.project);
        if import.sdk.is_some() {
            out.kept.push((index, import.clone()));
        } else if is_sdk_owned_import(&import.project) {
            debug!(import = %import.project, "Dropping SDK-owned import");
            out.removed.push(RemovedElement::new(element, "imported implicitly by the SDK"));
        } else if is_package_folder_import(&import.project) {
            out.removed.push(RemovedElement::new(
                element,
                "package build import, restored through PackageReference",
            ));
        } else {
            out.warnings.push(format!(
                "Import '{}' kept; review whether it is still needed",
                import.project
            ));
            out.kept.push((index, import.clone()));
        }
    }
    out
}

pub(crate) fn migrate_targets(targets: &[Target]) -> TargetOutput<Target> {
    let mut out = TargetOutput::default();
    for (index, target) in targets.iter().enumerate() {
        let element = format!("Target Name=\"{}\"", target.name);

        if target.name.eq_ignore_ascii_case("EnsureNuGetPackageBuildImports") {
            out.removed.push(RemovedElement::new(
                element,
                "package restore check is built into the SDK",
            ));
            continue;
        }

        let hook = LEGACY_HOOKS
            .iter()
            .find(|(legacy, _, _)| target.name.eq_ignore_ascii_case(legacy));
        match hook {
            Some(_) if target.is_empty() => {
                out.removed.push(RemovedElement::new(element, "empty placeholder target"));
            }
            Some((legacy, renamed, hook)) => {
                let mut migrated = target.clone();
                migrated.name = renamed.to_string();
                let attribute = match hook {
                    Hook::Before => {
                        migrated.before_targets = Some("Build".to_string());
                        "BeforeTargets"
                    }
                    Hook::After => {
                        migrated.after_targets = Some("Build".to_string());
                        "AfterTargets"
                    }
                };
                out.warnings.push(format!(
                    "Target '{}' renamed to '{}' with {}=\"Build\"",
                    legacy, renamed, attribute
                ));
                out.kept.push((index, migrated));
            }
            None => {
                out.warnings.push(format!(
                    "Target '{}' kept verbatim; review it manually",
                    target.name
                ));
                out.kept.push((index, target.clone()));
            }
        }
    }
    out
}
