//! Conversion of binary `Reference` items into package references
//!
//! A reference is only converted when a package is found *and* the package is proven to
//! ship the referenced assembly. Anything that cannot be proven stays a `Reference` and
//! is reported as an [`UnconvertedReference`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::is_net_framework;
use crate::identity::{AssemblyIdentity, PackageFolder, PackageVersion};
use crate::model::{push_unique, PackageReference, UnconvertedReference};
use crate::project::Item;

use super::builtin::is_shared_framework_assembly;
use super::cache::ResolutionCache;
use super::mapping;
use super::package_resolver::{PackageCandidate, PackageResolver};

pub const REASON_NO_PACKAGE: &str = "no matching package found";
pub const REASON_VALIDATION_FAILED: &str = "validation failed";
pub const REASON_TOKEN_MISMATCH: &str = "public key token mismatch";

/// Outcome of resolving a project's `Reference` items
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    /// Packages to emit as `PackageReference`
    pub packages: Vec<PackageReference>,
    /// References kept as `Reference` because they could not be safely converted
    pub unconverted: Vec<UnconvertedReference>,
    /// Bare framework references kept as-is (.NET Framework targets)
    pub preserved: Vec<Item>,
    /// Hint-path references already provided by a migrated package
    pub covered: Vec<Item>,
    /// Bare references to assemblies in the shared framework
    pub skipped_builtin: Vec<Item>,
    pub warnings: Vec<String>,
}

/// Resolves `Reference` items to packages through the framework mapping table, then a
/// [`PackageResolver`], with a shared [`ResolutionCache`] in front of both.
#[derive(Clone)]
pub struct AssemblyReferenceResolver {
    resolver: Arc<dyn PackageResolver>,
    cache: Arc<ResolutionCache>,
}

impl AssemblyReferenceResolver {
    pub fn new(resolver: Arc<dyn PackageResolver>, cache: Arc<ResolutionCache>) -> Self {
        Self { resolver, cache }
    }

    pub fn package_resolver(&self) -> &Arc<dyn PackageResolver> {
        &self.resolver
    }

    /// Resolve `Reference` items for `target_framework`. `already_migrated` holds packages
    /// the project declares elsewhere (packages.config, `PackageReference` items).
    pub fn resolve(
        &self,
        references: &[&Item],
        target_framework: &str,
        already_migrated: &[PackageReference],
    ) -> ResolvedReferences {
        let mut out = ResolvedReferences::default();

        for item in references {
            let identity = AssemblyIdentity::parse(&item.include);
            if identity.name.is_empty() {
                out.warnings
                    .push(format!("Skipped {}: empty assembly name", item.describe()));
                continue;
            }

            match item.metadata("HintPath") {
                Some(hint_path) => {
                    let folder = PackageFolder::from_hint_path(hint_path);
                    if let Some(ref folder) = folder {
                        if is_covered(folder, already_migrated) {
                            debug!(reference = %identity.name, folder = %folder.folder_name, "Reference covered by package");
                            out.covered.push((*item).clone());
                            continue;
                        }
                    }
                    self.convert(item, &identity, folder.as_ref(), target_framework, already_migrated, &mut out);
                }
                None if is_net_framework(target_framework) => {
                    out.preserved.push((*item).clone());
                }
                None if is_shared_framework_assembly(&identity.name) => {
                    out.skipped_builtin.push((*item).clone());
                }
                None => {
                    self.convert(item, &identity, None, target_framework, already_migrated, &mut out);
                }
            }
        }

        out
    }

    fn convert(
        &self,
        item: &Item,
        identity: &AssemblyIdentity,
        folder: Option<&PackageFolder>,
        target_framework: &str,
        already_migrated: &[PackageReference],
        out: &mut ResolvedReferences,
    ) {
        let Some(candidate) = self.lookup(&identity.name, target_framework) else {
            out.unconverted.push(unconverted(item, identity, REASON_NO_PACKAGE));
            return;
        };

        if let Err(reason) = self.validate(identity, &candidate, target_framework) {
            warn!(reference = %identity, package = %candidate.package_id, reason, "Reference not converted");
            out.warnings.push(format!(
                "Reference '{}' not converted to package '{}': {}",
                identity.name, candidate.package_id, reason
            ));
            out.unconverted.push(unconverted(item, identity, reason));
            return;
        }

        if already_migrated
            .iter()
            .any(|p| p.package_id.eq_ignore_ascii_case(&candidate.package_id))
        {
            out.covered.push(item.clone());
            return;
        }

        let version = self.select_version(identity, folder, &candidate, &mut out.warnings);
        debug!(reference = %identity.name, package = %candidate.package_id, %version, "Reference converted");
        push_unique(
            &mut out.packages,
            PackageReference::new(candidate.package_id, Some(version)),
        );
    }

    fn lookup(&self, assembly_name: &str, target_framework: &str) -> Option<PackageCandidate> {
        self.cache.get_or_resolve(assembly_name, target_framework, || {
            mapping::lookup(assembly_name, target_framework)
                .map(|hit| PackageCandidate {
                    package_id: hit.package_id.to_string(),
                    default_version: hit.version.to_string(),
                })
                .or_else(|| self.resolver.resolve_assembly(assembly_name, target_framework))
        })
    }

    /// Known assemblies of a candidate: the mapping table's list for this framework when
    /// the candidate came from there, otherwise the resolver's.
    fn known_assemblies(&self, assembly_name: &str, candidate: &PackageCandidate, target_framework: &str) -> Option<Vec<String>> {
        match mapping::lookup(assembly_name, target_framework) {
            Some(hit) if hit.package_id.eq_ignore_ascii_case(&candidate.package_id) => {
                Some(hit.assemblies.iter().map(|a| a.to_string()).collect())
            }
            _ => self.resolver.package_assemblies(&candidate.package_id),
        }
    }

    fn validate(
        &self,
        identity: &AssemblyIdentity,
        candidate: &PackageCandidate,
        target_framework: &str,
    ) -> Result<(), &'static str> {
        let tokens = self.resolver.public_key_tokens(&candidate.package_id);
        let token = identity.public_key_token.as_deref();

        if let Some(token) = token {
            if !tokens.is_empty() && !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                return Err(REASON_TOKEN_MISMATCH);
            }
        }

        match self.known_assemblies(&identity.name, candidate, target_framework) {
            Some(assemblies) => {
                if assemblies.iter().any(|a| identity.same_name(a)) {
                    Ok(())
                } else {
                    Err(REASON_VALIDATION_FAILED)
                }
            }
            None => match token {
                Some(token) if tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) => Ok(()),
                _ => Err(REASON_VALIDATION_FAILED),
            },
        }
    }

    /// Hint-path folder version, then a known version matching the assembly version,
    /// then the package default.
    fn select_version(
        &self,
        identity: &AssemblyIdentity,
        folder: Option<&PackageFolder>,
        candidate: &PackageCandidate,
        warnings: &mut Vec<String>,
    ) -> String {
        if let Some(folder) = folder.filter(|f| f.package_id.eq_ignore_ascii_case(&candidate.package_id)) {
            return folder.version.clone();
        }

        let known = self.resolver.available_versions(&candidate.package_id);
        if let Some(assembly_version) = identity.version.as_deref().and_then(PackageVersion::parse) {
            if let Some(exact) = known
                .iter()
                .find(|v| PackageVersion::parse(v).is_some_and(|v| v == assembly_version))
            {
                return exact.clone();
            }
            let same_line = known
                .iter()
                .filter_map(|v| PackageVersion::parse(v))
                .filter(|v| v.same_major_minor(assembly_version.major, assembly_version.minor))
                .max();
            if let Some(version) = same_line {
                return version.original;
            }
        }

        warnings.push(format!(
            "No version of '{}' matches assembly '{}'; using default {}",
            candidate.package_id, identity, candidate.default_version
        ));
        candidate.default_version.clone()
    }
}

fn is_covered(folder: &PackageFolder, already_migrated: &[PackageReference]) -> bool {
    already_migrated.iter().any(|p| {
        p.version
            .as_deref()
            .is_some_and(|v| folder.matches(&p.package_id, v))
    })
}

fn unconverted(item: &Item, identity: &AssemblyIdentity, reason: &str) -> UnconvertedReference {
    let private = item
        .metadata("Private")
        .map(|p| p.trim().eq_ignore_ascii_case("true"));
    let metadata: BTreeMap<String, String> = item
        .metadata
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("HintPath") && !k.eq_ignore_ascii_case("Private"))
        .cloned()
        .collect();
    UnconvertedReference {
        identity: identity.clone(),
        hint_path: item.metadata("HintPath").map(str::to_string),
        private,
        metadata,
        reason: reason.to_string(),
    }
}
