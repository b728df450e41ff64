//! Item and property migration of one legacy project
//!
//! Produces the in-memory [`SdkProject`] plus the bookkeeping the report needs:
//! warnings, removed elements, migrated packages and unconverted references.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::{map_legacy_framework, with_windows_platform, Classification, SdkVariant};
use crate::conflicts::CentralPackageFile;
use crate::error::MigrateError;
use crate::model::{push_unique, PackageReference, RemovedElement, UnconvertedReference};
use crate::orchestrator::CancellationToken;
use crate::project::{Choose, ElementRef, EvaluatedProject, Item, When};
use crate::references::{PackageResolver, ResolvedReferences};
use crate::util::ends_with_ci;

use super::conditions::{rewrite_choose, rewrite_condition, rewrite_property_group};
use super::descriptor::{DescriptorItem, ProjectNode, SdkItemGroup, SdkProject, SdkPropertyGroup};
use super::exclusions::{compute_exclusions, SourceTree};
use super::implicit::ImplicitRules;
use super::items::{ItemContext, ItemOutput};
use super::properties::{filter_conditional_group, ProjectSettings};

/// SDK used when a variant has none of its own
pub const DEFAULT_SDK: &str = "Microsoft.NET.Sdk";

/// Everything produced by migrating one project
#[derive(Debug, Clone)]
pub struct MigrationOutput {
    pub project: SdkProject,
    pub warnings: Vec<String>,
    pub removed_elements: Vec<RemovedElement>,
    /// Every package the migrated project references, including ones it already declared
    pub migrated_packages: Vec<PackageReference>,
    pub unconverted: Vec<UnconvertedReference>,
}

impl MigrationOutput {
    fn new(sdk: &str) -> Self {
        Self {
            project: SdkProject::new(sdk),
            warnings: Vec::new(),
            removed_elements: Vec::new(),
            migrated_packages: Vec::new(),
            unconverted: Vec::new(),
        }
    }
}

/// Converts the property and item content of a legacy project
#[derive(Clone, Default)]
pub struct ItemAndPropertyMigrator {
    /// Used to drop packages.config entries that are dependencies of other entries
    resolver: Option<Arc<dyn PackageResolver>>,
}

impl ItemAndPropertyMigrator {
    pub fn new(resolver: Option<Arc<dyn PackageResolver>>) -> Self {
        Self { resolver }
    }

    /// Migrate `project`. Only an empty project is an error; item-level problems become
    /// warnings.
    pub fn migrate(
        &self,
        project: &EvaluatedProject,
        classification: &Classification,
        resolved: &ResolvedReferences,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<MigrationOutput, MigrateError> {
        if project.is_empty() {
            return Err(MigrateError::EmptyProject {
                path: project.path.clone(),
            });
        }

        let sdk = classification.variant.sdk_name().unwrap_or(DEFAULT_SDK);
        let mut out = MigrationOutput::new(sdk);
        out.warnings.extend(classification.notes.iter().cloned());

        let identifier = project.property("TargetFrameworkIdentifier");
        let profile = project.property("TargetFrameworkProfile");
        let to_moniker = |version: &str| {
            map_legacy_framework(version, identifier.as_deref(), profile.as_deref()).moniker
        };
        let rewriter: Option<&dyn Fn(&str) -> String> = if classification.multi_targeting {
            Some(&to_moniker as &dyn Fn(&str) -> String)
        } else {
            None
        };

        let mut placed: HashMap<ElementRef, ProjectNode> = HashMap::new();
        let main = self.migrate_properties(project, classification, rewriter, &mut placed, &mut out);

        let rules = ImplicitRules::for_project(&project.extension(), classification);
        let context = ItemContext {
            project,
            rules: &rules,
            resolved,
            target_framework: &classification.target_framework,
        };
        let removals = compute_exclusions(project, &rules, tree, cancel)?;
        let removals = self.migrate_items(project, &context, removals, rewriter, &mut placed, &mut out);
        let packages = self.migrate_packages(project, resolved, &mut out);

        for (index, choose) in project.chooses.iter().enumerate() {
            let mut choose = choose.clone();
            if let Some(rewrite) = rewriter {
                rewrite_choose(&mut choose, rewrite);
            }
            placed.insert(ElementRef::Choose(index), ProjectNode::Choose(choose));
        }

        let imports = super::targets::migrate_imports(&project.imports);
        for (index, mut import) in imports.kept {
            rewrite_option(&mut import.condition, rewriter);
            placed.insert(ElementRef::Import(index), ProjectNode::Import(import));
        }
        out.removed_elements.extend(imports.removed);
        out.warnings.extend(imports.warnings);

        let targets = super::targets::migrate_targets(&project.targets);
        for (index, mut target) in targets.kept {
            rewrite_option(&mut target.condition, rewriter);
            placed.insert(ElementRef::Target(index), ProjectNode::Target(target));
        }
        out.removed_elements.extend(targets.removed);
        out.warnings.extend(targets.warnings);

        out.project.nodes = arrange(&project.layout(), placed, main, removals, packages);
        out.project.prune_empty_groups();
        out.unconverted = resolved.unconverted.clone();
        out.warnings.extend(resolved.warnings.iter().cloned());

        debug!(
            project = %project.path.display(),
            sdk,
            removed = out.removed_elements.len(),
            packages = out.migrated_packages.len(),
            "Migrated project content"
        );
        Ok(out)
    }

    fn migrate_properties(
        &self,
        project: &EvaluatedProject,
        classification: &Classification,
        rewriter: Option<&dyn Fn(&str) -> String>,
        placed: &mut HashMap<ElementRef, ProjectNode>,
        out: &mut MigrationOutput,
    ) -> SdkPropertyGroup {
        let name = project.name();
        let mut dropped = Vec::new();
        let mut settings = ProjectSettings::default();
        let mut conditional = Vec::new();

        for (index, group) in project.property_groups.iter().enumerate() {
            if group.is_conditional() {
                let mut kept = filter_conditional_group(group, name, &mut dropped);
                if let Some(rewrite) = rewriter {
                    rewrite_property_group(&mut kept, rewrite);
                }
                if !kept.properties.is_empty() {
                    conditional.push((index, kept));
                }
            } else {
                settings.merge(ProjectSettings::from_group(group, name, &mut dropped));
            }
        }

        for (property, reason) in dropped {
            out.removed_elements
                .push(RemovedElement::new(format!("Property {}", property.name), reason));
        }

        let mut main = SdkPropertyGroup::default();
        let flags = &classification.flags;
        let desktop = flags.use_wpf || flags.use_windows_forms;
        let mut frameworks: Vec<String> = classification
            .frameworks
            .iter()
            .map(|f| if desktop { with_windows_platform(f) } else { f.clone() })
            .collect();
        if frameworks.is_empty() {
            frameworks.push(classification.target_framework.clone());
        }
        if frameworks.len() > 1 {
            main.set("TargetFrameworks", frameworks.join(";"));
        } else {
            main.set("TargetFramework", frameworks.remove(0));
        }

        for mut property in settings.into_properties() {
            if property.condition.is_some() {
                rewrite_option(&mut property.condition, rewriter);
                main.properties.push(property);
            } else {
                main.set(&property.name, property.value);
            }
        }

        if flags.use_wpf {
            main.set("UseWPF", "true");
        }
        if flags.use_windows_forms {
            main.set("UseWindowsForms", "true");
        }
        match classification.variant {
            SdkVariant::Maui => main.set("UseMaui", "true"),
            SdkVariant::WebFunctions => {
                main.set("AzureFunctionsVersion", "v4");
                if flags.needs_isolated_worker_migration {
                    out.warnings.push(
                        "In-process Azure Functions project; move it to the isolated worker model"
                            .to_string(),
                    );
                } else {
                    main.set("OutputType", "Exe");
                }
            }
            SdkVariant::LegacyWebFramework => out.warnings.push(
                "System.Web project migrated with MSBuild.SDK.SystemWeb; it still targets .NET Framework"
                    .to_string(),
            ),
            _ => {}
        }
        if flags.is_test_project {
            main.set("IsPackable", "false");
        }
        if compiles_assembly_info(project) {
            main.set("GenerateAssemblyInfo", "false");
        }

        for (index, group) in conditional {
            placed.insert(
                ElementRef::PropertyGroup(index),
                ProjectNode::PropertyGroup(SdkPropertyGroup {
                    condition: group.condition,
                    label: group.label,
                    properties: group.properties,
                }),
            );
        }
        main
    }

    fn migrate_items(
        &self,
        project: &EvaluatedProject,
        context: &ItemContext<'_>,
        mut removals: Vec<DescriptorItem>,
        rewriter: Option<&dyn Fn(&str) -> String>,
        placed: &mut HashMap<ElementRef, ProjectNode>,
        out: &mut MigrationOutput,
    ) -> SdkItemGroup {
        for (index, group) in project.item_groups.iter().enumerate() {
            let mut items = ItemOutput::default();
            for item in &group.items {
                if let Err(e) = context.migrate_item(item, group.condition.as_deref(), &mut items) {
                    warn!(project = %project.path.display(), error = %e, "Skipping item");
                    out.warnings.push(e.to_string());
                }
            }
            removals.extend(items.removals);
            out.removed_elements.extend(items.removed);
            out.warnings.extend(items.warnings);

            let mut sdk_group = SdkItemGroup {
                condition: group.condition.clone(),
                label: group.label.clone(),
                items: items.items,
            };
            if let Some(rewrite) = rewriter {
                rewrite_option(&mut sdk_group.condition, Some(rewrite));
                for item in &mut sdk_group.items {
                    rewrite_option(&mut item.condition, Some(rewrite));
                }
            }
            placed.insert(ElementRef::ItemGroup(index), ProjectNode::ItemGroup(sdk_group));
        }

        for choose in &project.chooses {
            collect_choose_removals(choose, context, &mut removals);
        }

        let mut unique: Vec<DescriptorItem> = Vec::new();
        for removal in removals {
            if !unique.contains(&removal) {
                unique.push(removal);
            }
        }
        SdkItemGroup {
            items: unique,
            ..Default::default()
        }
    }

    /// `PackageReference` items for packages.config entries and converted references.
    /// Records every package the project ends up referencing.
    fn migrate_packages(
        &self,
        project: &EvaluatedProject,
        resolved: &ResolvedReferences,
        out: &mut MigrationOutput,
    ) -> SdkItemGroup {
        for item in project.items_of_type("PackageReference") {
            let mut package = PackageReference::new(item.include.trim(), item.metadata("Version").map(str::to_string));
            package.metadata = item
                .metadata
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("Version"))
                .cloned()
                .collect();
            push_unique(&mut out.migrated_packages, package);
        }

        let mut emitted: Vec<PackageReference> = Vec::new();
        for package in &project.packages_config {
            if let Some(parent) = self.dependent_of(package, &project.packages_config) {
                out.removed_elements.push(RemovedElement::new(
                    format!("package {} {}", package.package_id, package.version.as_deref().unwrap_or("")),
                    format!("dependency of {}, restored transitively", parent),
                ));
                continue;
            }
            if push_unique(&mut out.migrated_packages, package.clone()) {
                emitted.push(package.clone());
            }
        }
        for package in &resolved.packages {
            if push_unique(&mut out.migrated_packages, package.clone()) {
                emitted.push(package.clone());
            }
        }

        SdkItemGroup {
            items: emitted.iter().map(package_item).collect(),
            ..Default::default()
        }
    }

    /// Id of another packages.config entry that depends on `package`
    fn dependent_of(&self, package: &PackageReference, all: &[PackageReference]) -> Option<String> {
        let resolver = self.resolver.as_ref()?;
        all.iter()
            .filter(|other| other.key() != package.key())
            .find(|other| {
                resolver
                    .dependencies(&other.package_id)
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(&package.package_id))
            })
            .map(|other| other.package_id.clone())
    }
}

/// Lay the migrated nodes out in the legacy document order. Elements ahead of the first
/// property or item group stay ahead of the main property group. `Compile Remove` items
/// open the item groups and package references close them.
fn arrange(
    layout: &[ElementRef],
    mut placed: HashMap<ElementRef, ProjectNode>,
    main: SdkPropertyGroup,
    removals: SdkItemGroup,
    packages: SdkItemGroup,
) -> Vec<ProjectNode> {
    let leading = layout.iter().position(ElementRef::is_group).unwrap_or(layout.len());
    let mut nodes: Vec<ProjectNode> = layout[..leading]
        .iter()
        .filter_map(|element| placed.remove(element))
        .collect();
    nodes.push(ProjectNode::PropertyGroup(main));

    let mut first_items = None;
    let mut last_items = None;
    let mut last_group = nodes.len();
    for element in &layout[leading..] {
        let Some(node) = placed.remove(element) else {
            continue;
        };
        nodes.push(node);
        match element {
            ElementRef::ItemGroup(_) => {
                first_items.get_or_insert(nodes.len() - 1);
                last_items = Some(nodes.len());
                last_group = nodes.len();
            }
            ElementRef::PropertyGroup(_) => last_group = nodes.len(),
            _ => {}
        }
    }

    let packages_at = last_items.unwrap_or(last_group);
    nodes.insert(packages_at, ProjectNode::ItemGroup(packages));
    nodes.insert(first_items.unwrap_or(packages_at), ProjectNode::ItemGroup(removals));
    nodes
}

fn rewrite_option(condition: &mut Option<String>, rewriter: Option<&dyn Fn(&str) -> String>) {
    if let (Some(c), Some(rewrite)) = (condition.as_mut(), rewriter) {
        *c = rewrite_condition(c, rewrite);
    }
}

fn collect_choose_removals(choose: &Choose, context: &ItemContext<'_>, out: &mut Vec<DescriptorItem>) {
    let branches: Vec<&When> = choose.whens.iter().chain(choose.otherwise.iter()).collect();
    for branch in branches {
        let items: Vec<&Item> = branch.item_groups.iter().flat_map(|g| &g.items).collect();
        out.extend(items.into_iter().filter_map(|item| context.choose_removal(item)));
        for nested in &branch.chooses {
            collect_choose_removals(nested, context, out);
        }
    }
}

/// `AssemblyInfo.cs` / `AssemblyInfo.vb` is compiled, so the SDK must not generate
/// the same attributes.
fn compiles_assembly_info(project: &EvaluatedProject) -> bool {
    project.items_of_type("Compile").any(|item| {
        let include = item.include.trim();
        ends_with_ci(include, "AssemblyInfo.cs") || ends_with_ci(include, "AssemblyInfo.vb")
    })
}

fn package_item(package: &PackageReference) -> DescriptorItem {
    let mut item = DescriptorItem::include("PackageReference", &package.package_id);
    if let Some(ref version) = package.version {
        item.metadata.push(("Version".to_string(), version.clone()));
    }
    item.metadata
        .extend(package.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    item
}

/// Elements removed and warnings raised while applying settled versions
#[derive(Debug, Clone, Default)]
pub struct AppliedVersions {
    pub removed: Vec<RemovedElement>,
    pub warnings: Vec<String>,
}

/// Apply resolved versions to the project's `PackageReference` items, keyed by package
/// id (case-insensitive). With a central file, `Version` is dropped and references to
/// global packages are removed.
pub fn apply_package_versions(
    project: &mut SdkProject,
    versions: &BTreeMap<String, String>,
    central: Option<&CentralPackageFile>,
) -> AppliedVersions {
    let mut removed = Vec::new();
    let mut warnings = Vec::new();
    for group in project.item_groups_mut() {
        group.items.retain(|item| {
            let global = item.is_type("PackageReference")
                && central.is_some_and(|c| c.is_global(item.spec.value()));
            if global {
                removed.push(RemovedElement::new(
                    format!("PackageReference Include=\"{}\"", item.spec.value()),
                    "referenced globally from the central package file",
                ));
            }
            !global
        });

        for item in group.items.iter_mut().filter(|i| i.is_type("PackageReference")) {
            let id = item.spec.value();
            let settled = versions.iter().find(|(k, _)| k.eq_ignore_ascii_case(id));
            if central.is_some() {
                if settled.is_none() {
                    warn!(package = %id, "No central version for package");
                    warnings.push(format!(
                        "Package '{}' has no version; add a PackageVersion entry to the central package file",
                        id
                    ));
                }
                item.set_metadata("Version", None);
                continue;
            }
            if let Some((_, version)) = settled {
                item.set_metadata("Version", Some(version.clone()));
            }
        }
    }
    project.prune_empty_groups();
    AppliedVersions { removed, warnings }
}
