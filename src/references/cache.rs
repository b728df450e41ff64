//! Read-through cache of assembly → package lookups, shared by all projects of a batch

use dashmap::DashMap;

use super::package_resolver::PackageCandidate;

/// Concurrent cache keyed by (lowercase assembly name, target framework).
///
/// Two workers missing the same key both compute it; the second insert wins and
/// both values are equal.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<(String, String), Option<PackageCandidate>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve(
        &self,
        assembly_name: &str,
        target_framework: &str,
        resolve: impl FnOnce() -> Option<PackageCandidate>,
    ) -> Option<PackageCandidate> {
        let key = (
            assembly_name.to_ascii_lowercase(),
            target_framework.to_ascii_lowercase(),
        );
        if let Some(hit) = self.entries.get(&key) {
            return hit.value().clone();
        }
        let value = resolve();
        self.entries.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
