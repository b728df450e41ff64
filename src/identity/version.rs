//! Package version parsing and comparison
//!
//! Package versions are NuGet-style: up to four numeric components, an optional
//! `-prerelease` label and optional `+metadata`. Prerelease labels are ordered with
//! semver rules via `semver::Prerelease`. Version ranges (`[1.0,2.0)`) parse to their
//! lower bound.

use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// A parsed package version
#[derive(Debug, Clone)]
pub struct PackageVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    pub prerelease: Option<Prerelease>,
    /// The string this version was parsed from (range brackets removed)
    pub original: String,
}

impl PackageVersion {
    /// Parse a version string, returning `None` if it is not a recognizable version.
    ///
    /// Examples:
    /// - "12.0.3" → 12.0.3.0
    /// - "4.5.0.0" → 4.5.0.0
    /// - "2.0.0-beta.1" → 2.0.0.0 with prerelease `beta.1`
    /// - "[1.2,2.0)" → 1.2.0.0
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = strip_range(s.trim())?;

        let without_metadata = trimmed.split('+').next().unwrap_or(trimmed);
        let (numeric, prerelease) = match without_metadata.split_once('-') {
            Some((n, p)) => (n, Some(p)),
            None => (without_metadata, None),
        };

        let components: Vec<&str> = numeric.split('.').collect();
        if components.is_empty() || components.len() > 4 {
            return None;
        }
        let mut numbers = [0u64; 4];
        for (slot, component) in numbers.iter_mut().zip(&components) {
            *slot = component.parse().ok()?;
        }

        let prerelease = match prerelease {
            Some(label) if !label.is_empty() => Some(Prerelease::new(label).ok()?),
            Some(_) => return None,
            None => None,
        };

        Some(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            revision: numbers[3],
            prerelease,
            original: trimmed.to_string(),
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Same major and minor component.
    pub fn same_major_minor(&self, major: u64, minor: u64) -> bool {
        self.major == major && self.minor == minor
    }
}

/// Remove range brackets and return the lower bound of a range expression.
fn strip_range(s: &str) -> Option<&str> {
    if let Some(rest) = s.strip_prefix('[').or_else(|| s.strip_prefix('(')) {
        let inner = rest.trim_end_matches([']', ')']);
        let lower = inner.split(',').next().unwrap_or(inner).trim();
        if lower.is_empty() {
            None
        } else {
            Some(lower)
        }
    } else if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Compare two version strings. Unparsable strings order below every parsed version
/// and ordinally among themselves, which keeps the order total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (PackageVersion::parse(a), PackageVersion::parse(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// True when the version string carries a prerelease label.
pub fn is_prerelease(version: &str) -> bool {
    match PackageVersion::parse(version) {
        Some(v) => v.is_prerelease(),
        None => version.contains('-'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let v = PackageVersion::parse("4.5.1.2").unwrap();
        assert_eq!((v.major, v.minor, v.patch, v.revision), (4, 5, 1, 2));
        assert!(!v.is_prerelease());
        assert!(PackageVersion::parse("1.2.3.4.5").is_none());
        assert!(PackageVersion::parse("latest").is_none());
    }

    #[test]
    fn test_prerelease_orders_before_release() {
        assert_eq!(compare_versions("2.0.0-beta.1", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0-beta.2", "2.0.0-beta.10"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0-rc.1", "2.0.0-beta.9"), Ordering::Greater);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_versions("2.10.0", "2.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_range_lower_bound() {
        let v = PackageVersion::parse("[1.2,2.0)").unwrap();
        assert_eq!((v.major, v.minor), (1, 2));
        assert!(PackageVersion::parse("(,2.0]").is_none());
    }

    #[test]
    fn test_unparsable_orders_below_versions() {
        assert_eq!(compare_versions("abc", "abd"), Ordering::Less);
        assert_eq!(compare_versions("1.2x", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("9.9x", "0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0", "latest"), Ordering::Greater);
    }

    #[test]
    fn test_order_is_total_across_permutations() {
        let versions = ["1.10.0", "1.9.0", "1.2x", "2.0.0-beta.1", "abc", "1.9"];
        let mut expected: Vec<&str> = versions.to_vec();
        expected.sort_by(|a, b| compare_versions(a, b));

        let mut rotated = versions.to_vec();
        for _ in 0..versions.len() {
            rotated.rotate_left(1);
            let mut sorted = rotated.clone();
            sorted.sort_by(|a, b| compare_versions(a, b));
            let keys: Vec<Option<PackageVersion>> = sorted.iter().map(|v| PackageVersion::parse(v)).collect();
            let expected_keys: Vec<Option<PackageVersion>> =
                expected.iter().map(|v| PackageVersion::parse(v)).collect();
            assert_eq!(keys, expected_keys);
        }
        assert_eq!(expected.first(), Some(&"1.2x"));
        assert_eq!(expected.last(), Some(&"2.0.0-beta.1"));
    }
}
