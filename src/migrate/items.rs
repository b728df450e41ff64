//! Item migration
//!
//! Decides per legacy item whether it is omitted (implicit), emitted as an `Update`,
//! emitted as an `Include`, or removed with a reason.

use crate::classify::is_net_framework;
use crate::error::MigrateError;
use crate::identity::AssemblyIdentity;
use crate::model::RemovedElement;
use crate::project::{EvaluatedProject, Item};
use crate::references::{is_sdk_implicit_framework_reference, ResolvedReferences};

use super::descriptor::DescriptorItem;
use super::implicit::ImplicitRules;

/// Item types that have no meaning in SDK-style projects
const OBSOLETE_ITEM_TYPES: &[(&str, &str)] = &[
    ("Folder", "empty folders are not tracked by SDK-style projects"),
    ("BootstrapperPackage", "ClickOnce bootstrapper metadata is not supported"),
    ("Service", "legacy IDE service registration is not needed"),
];

/// Metadata the SDK resolves itself for project references
const PROJECT_REFERENCE_DROPPED_METADATA: &[&str] = &["Project", "Name"];

pub(crate) struct ItemContext<'a> {
    pub project: &'a EvaluatedProject,
    pub rules: &'a ImplicitRules,
    pub resolved: &'a ResolvedReferences,
    pub target_framework: &'a str,
}

/// Migration output for the items of one legacy group
#[derive(Debug, Default)]
pub(crate) struct ItemOutput {
    /// Items emitted in the group mirroring the legacy group
    pub items: Vec<DescriptorItem>,
    /// `Remove` items that must be unconditional
    pub removals: Vec<DescriptorItem>,
    pub removed: Vec<RemovedElement>,
    pub warnings: Vec<String>,
}

impl<'a> ItemContext<'a> {
    /// Migrate one item. `group_condition` is the condition of the enclosing group.
    pub fn migrate_item(
        &self,
        item: &Item,
        group_condition: Option<&str>,
        out: &mut ItemOutput,
    ) -> Result<(), MigrateError> {
        // Update/Remove items are already in SDK form
        if item.include.trim().is_empty() && (item.update.is_some() || item.remove.is_some()) {
            out.items.push(verbatim(item));
            return Ok(());
        }
        if item.include.trim().is_empty() {
            return Err(transform_error(item, "empty Include"));
        }
        if !self.project.can_expand(&item.include) {
            return Err(transform_error(item, "unresolvable property reference"));
        }

        if let Some((_, reason)) = OBSOLETE_ITEM_TYPES.iter().find(|(t, _)| item.is_type(t)) {
            out.removed.push(RemovedElement::new(item.describe(), *reason));
            return Ok(());
        }

        if item.is_type("None") && is_packages_config(&item.include) {
            out.removed.push(RemovedElement::new(
                item.describe(),
                "packages.config is replaced by PackageReference items",
            ));
            return Ok(());
        }

        if item.is_type("Reference") {
            self.migrate_reference(item, out);
        } else if item.is_type("ProjectReference") {
            let mut migrated = verbatim(item);
            migrated.metadata.retain(|(name, _)| {
                !PROJECT_REFERENCE_DROPPED_METADATA
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(name))
            });
            out.items.push(migrated);
        } else if item.is_type("PackageReference") || item.is_type("COMReference") {
            out.items.push(verbatim(item));
        } else {
            self.migrate_globbable(item, group_condition, out);
        }
        Ok(())
    }

    fn migrate_globbable(&self, item: &Item, group_condition: Option<&str>, out: &mut ItemOutput) {
        let mut expanded = item.clone();
        expanded.include = self.project.expand(&item.include);

        if !self.rules.is_implicit(&expanded) {
            out.items.push(verbatim(item));
            return;
        }

        if item.condition.is_some() || group_condition.is_some() {
            // Implicit items cannot be made conditional; exclude them, then include
            // them again under the condition.
            out.removals.push(DescriptorItem::remove(&item.item_type, &item.include));
            out.items.push(verbatim(item));
            return;
        }

        let behavior = self.rules.behavior_metadata(item);
        if behavior.is_empty() {
            out.removed.push(RemovedElement::new(
                item.describe(),
                "included implicitly by the SDK",
            ));
            return;
        }

        let mut update = DescriptorItem::update(&item.item_type, &item.include);
        update.metadata = behavior.into_iter().cloned().collect();
        out.items.push(update);
    }

    /// `Remove` for an implicit item kept structurally under a `Choose` branch
    pub fn choose_removal(&self, item: &Item) -> Option<DescriptorItem> {
        if !self.project.can_expand(&item.include) {
            return None;
        }
        let mut expanded = item.clone();
        expanded.include = self.project.expand(&item.include);
        self.rules
            .is_implicit(&expanded)
            .then(|| DescriptorItem::remove(&item.item_type, &item.include))
    }

    fn migrate_reference(&self, item: &Item, out: &mut ItemOutput) {
        let resolved = self.resolved;
        let identity = AssemblyIdentity::parse(&item.include);

        if resolved.covered.contains(item) {
            out.removed.push(RemovedElement::new(
                item.describe(),
                "provided by a package reference",
            ));
        } else if resolved.skipped_builtin.contains(item) {
            out.removed.push(RemovedElement::new(
                item.describe(),
                "part of the shared framework",
            ));
        } else if resolved.preserved.contains(item) {
            if is_net_framework(self.target_framework)
                && is_sdk_implicit_framework_reference(&identity.name)
            {
                out.removed.push(RemovedElement::new(
                    item.describe(),
                    "referenced implicitly by the SDK",
                ));
            } else {
                out.items.push(verbatim(item));
            }
        } else if let Some(unconverted) = resolved.unconverted.iter().find(|u| {
            u.identity == identity && u.hint_path.as_deref() == item.metadata("HintPath")
        }) {
            let mut kept = verbatim(item);
            kept.set_metadata("HintPath", unconverted.hint_path.clone());
            out.items.push(kept);
        } else if identity.name.is_empty() {
            out.items.push(verbatim(item));
        } else {
            out.removed.push(RemovedElement::new(
                item.describe(),
                "converted to a package reference",
            ));
        }
    }
}

fn is_packages_config(include: &str) -> bool {
    let file = include.rsplit(['\\', '/']).next().unwrap_or(include);
    let lower = file.to_ascii_lowercase();
    lower == "packages.config" || (lower.starts_with("packages.") && lower.ends_with(".config"))
}

fn transform_error(item: &Item, message: &str) -> MigrateError {
    MigrateError::ItemTransformError {
        item_type: item.item_type.clone(),
        include: item.include.clone(),
        message: message.to_string(),
    }
}

/// The item as-is, in `Include` form unless it already uses `Update`/`Remove`.
pub(crate) fn verbatim(item: &Item) -> DescriptorItem {
    let mut descriptor = match (&item.update, &item.remove) {
        (Some(update), _) if item.include.is_empty() => DescriptorItem::update(&item.item_type, update),
        (None, Some(remove)) if item.include.is_empty() => DescriptorItem::remove(&item.item_type, remove),
        _ => DescriptorItem::include(&item.item_type, &item.include),
    };
    descriptor.exclude = item.exclude.clone();
    descriptor.condition = item.condition.clone();
    descriptor.metadata = item.metadata.clone();
    descriptor
}
