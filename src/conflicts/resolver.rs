//! Cross-project package version conflict resolution

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::classify::matches_framework_pattern;
use crate::identity::{compare_versions, is_prerelease, PackageVersion};
use crate::references::PackageResolver;

use super::strategy::ConflictStrategy;

/// One project's request for a package version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    pub version: String,
    /// Who asked, typically the requesting project's name
    pub origin: String,
}

impl VersionRequest {
    pub fn new(version: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            origin: origin.into(),
        }
    }
}

/// The outcome of settling one package's versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub package_id: String,
    pub requested_versions: Vec<VersionRequest>,
    pub resolved_version: String,
    pub strategy_used: ConflictStrategy,
    pub warnings: Vec<String>,
}

impl VersionConflict {
    /// More than one distinct version was requested
    pub fn is_conflict(&self) -> bool {
        distinct_versions(&self.requested_versions).len() > 1
    }
}

/// Versions in request order, deduplicated by version equality
fn distinct_versions(requests: &[VersionRequest]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for request in requests {
        if !distinct
            .iter()
            .any(|v| compare_versions(v, &request.version) == Ordering::Equal)
        {
            distinct.push(request.version.clone());
        }
    }
    distinct
}

fn highest<'a>(versions: impl IntoIterator<Item = &'a String>) -> Option<String> {
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
}

fn lowest<'a>(versions: impl IntoIterator<Item = &'a String>) -> Option<String> {
    versions
        .into_iter()
        .min_by(|a, b| compare_versions(a, b))
        .cloned()
}

/// Highest of `versions`; the degenerate [`ConflictStrategy::UseHighest`] case.
pub fn pick_highest(versions: &[String]) -> Option<String> {
    highest(versions)
}

#[derive(Clone, Default)]
pub struct PackageVersionConflictResolver {
    resolver: Option<Arc<dyn PackageResolver>>,
}

impl PackageVersionConflictResolver {
    pub fn new(resolver: Option<Arc<dyn PackageResolver>>) -> Self {
        Self { resolver }
    }

    /// Pick one version for `package_id`. `requests` must not be empty.
    pub fn resolve(
        &self,
        package_id: &str,
        requests: &[VersionRequest],
        target_frameworks: &[String],
        strategy: ConflictStrategy,
    ) -> VersionConflict {
        let distinct = distinct_versions(requests);
        let mut warnings = Vec::new();

        let resolved = match strategy {
            ConflictStrategy::UseHighest => highest(&distinct),
            ConflictStrategy::UseLowest => lowest(&distinct),
            ConflictStrategy::UseLatestStable => self.latest_stable(package_id, &distinct),
            ConflictStrategy::UseMostCommon => most_common(requests, &distinct),
            ConflictStrategy::SemanticCompatible => {
                let majors: Vec<u64> = distinct
                    .iter()
                    .filter_map(|v| PackageVersion::parse(v))
                    .map(|v| v.major)
                    .collect();
                let same_major = majors.len() == distinct.len() && majors.windows(2).all(|w| w[0] == w[1]);
                if !same_major {
                    warnings.push(format!(
                        "Package '{}': requested versions {} span major versions; using highest",
                        package_id,
                        distinct.join(", ")
                    ));
                }
                highest(&distinct)
            }
            ConflictStrategy::FrameworkCompatible => {
                let compatible = self.highest_framework_compatible(package_id, &distinct, target_frameworks);
                if compatible.is_none() {
                    warnings.push(format!(
                        "Package '{}': no requested version is known to support {}; using highest",
                        package_id,
                        target_frameworks.join(", ")
                    ));
                }
                compatible.or_else(|| highest(&distinct))
            }
        }
        .unwrap_or_default();

        for version in &distinct {
            if compare_versions(version, &resolved) == Ordering::Equal {
                continue;
            }
            let origins: Vec<&str> = requests
                .iter()
                .filter(|r| compare_versions(&r.version, version) == Ordering::Equal)
                .map(|r| r.origin.as_str())
                .collect();
            warnings.push(format!(
                "Package '{}': version {} requested by {} replaced by {}",
                package_id,
                version,
                origins.join(", "),
                resolved
            ));
        }

        if distinct.len() > 1 {
            info!(package = package_id, resolved = %resolved, %strategy, "Resolved version conflict");
        }

        VersionConflict {
            package_id: package_id.to_string(),
            requested_versions: requests.to_vec(),
            resolved_version: resolved,
            strategy_used: strategy,
            warnings,
        }
    }

    /// Resolve every package in `requests`, keyed by package id.
    pub fn resolve_all(
        &self,
        requests: &BTreeMap<String, Vec<VersionRequest>>,
        target_frameworks: &[String],
        strategy: ConflictStrategy,
    ) -> Vec<VersionConflict> {
        requests
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(id, r)| self.resolve(id, r, target_frameworks, strategy))
            .collect()
    }

    fn latest_stable(&self, package_id: &str, requested: &[String]) -> Option<String> {
        let mut candidates: Vec<String> = requested.to_vec();
        if let Some(ref resolver) = self.resolver {
            for version in resolver.available_versions(package_id) {
                if !candidates
                    .iter()
                    .any(|c| compare_versions(c, &version) == Ordering::Equal)
                {
                    candidates.push(version);
                }
            }
        }
        let stable: Vec<&String> = candidates.iter().filter(|v| !is_prerelease(v)).collect();
        if stable.is_empty() {
            highest(&candidates)
        } else {
            highest(stable)
        }
    }

    fn highest_framework_compatible(
        &self,
        package_id: &str,
        versions: &[String],
        target_frameworks: &[String],
    ) -> Option<String> {
        let resolver = self.resolver.as_ref()?;
        let mut sorted: Vec<&String> = versions.iter().collect();
        sorted.sort_by(|a, b| compare_versions(b, a));
        sorted
            .into_iter()
            .find(|version| {
                resolver
                    .compatible_frameworks(package_id, version)
                    .is_some_and(|patterns| {
                        target_frameworks
                            .iter()
                            .all(|tfm| patterns.iter().any(|p| matches_framework_pattern(p, tfm)))
                    })
            })
            .cloned()
    }
}

fn most_common(requests: &[VersionRequest], distinct: &[String]) -> Option<String> {
    distinct
        .iter()
        .map(|version| {
            let count = requests
                .iter()
                .filter(|r| compare_versions(&r.version, version) == Ordering::Equal)
                .count();
            (count, version)
        })
        .max_by(|(ca, va), (cb, vb)| ca.cmp(cb).then_with(|| compare_versions(va, vb)))
        .map(|(_, v)| v.clone())
}

/// Merge versions already declared in a central file into `resolved`. An existing
/// version only wins when it is higher. Returns one warning per override.
pub fn merge_existing(
    resolved: &mut BTreeMap<String, String>,
    existing: &[(String, String)],
) -> Vec<String> {
    let mut warnings = Vec::new();
    for (package_id, existing_version) in existing {
        let key = resolved
            .keys()
            .find(|k| k.eq_ignore_ascii_case(package_id))
            .cloned();
        match key {
            Some(key) => {
                let Some(current) = resolved.get_mut(&key) else {
                    continue;
                };
                if compare_versions(existing_version, current) == Ordering::Greater {
                    warn!(
                        package = %key,
                        existing = %existing_version,
                        migrated = %current,
                        "Central file declares a higher version; keeping it"
                    );
                    warnings.push(format!(
                        "Package '{}': existing central version {} overrides migrated version {}",
                        key, existing_version, current
                    ));
                    *current = existing_version.clone();
                }
            }
            None => {
                resolved.insert(package_id.clone(), existing_version.clone());
            }
        }
    }
    warnings
}
