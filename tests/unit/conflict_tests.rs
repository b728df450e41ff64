//! Version conflict strategies and the central package file

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rust_sdkmigrate::conflicts::{
    categorize, parse_central_file_str, pick_highest, CentralPackageFile, ConflictStrategy, PackageCategory,
    PackageVersionConflictResolver, VersionRequest,
};
use rust_sdkmigrate::identity::compare_versions;
use rust_sdkmigrate::references::{PackageInfo, StaticPackageResolver};

fn foo_requests() -> Vec<VersionRequest> {
    vec![
        VersionRequest::new("1.0.0", "App"),
        VersionRequest::new("2.1.0", "Core"),
        VersionRequest::new("2.0.5", "Shared"),
    ]
}

fn resolve(requests: &[VersionRequest], strategy: ConflictStrategy) -> String {
    PackageVersionConflictResolver::new(None)
        .resolve("Foo", requests, &["net472".to_string()], strategy)
        .resolved_version
}

// ============================================================================
// Strategies
// ============================================================================

#[test]
fn test_highest_lists_every_request() {
    let conflict = PackageVersionConflictResolver::new(None).resolve(
        "Foo",
        &foo_requests(),
        &["net472".to_string()],
        ConflictStrategy::UseHighest,
    );

    assert_eq!(conflict.resolved_version, "2.1.0");
    assert_eq!(conflict.requested_versions, foo_requests());
    assert!(conflict.is_conflict());
    assert_eq!(conflict.warnings.len(), 2);
    assert!(conflict
        .warnings
        .contains(&"Package 'Foo': version 1.0.0 requested by App replaced by 2.1.0".to_string()));
}

#[test]
fn test_highest_and_lowest_bound_every_request() {
    let requests = foo_requests();
    let highest = resolve(&requests, ConflictStrategy::UseHighest);
    let lowest = resolve(&requests, ConflictStrategy::UseLowest);

    for request in &requests {
        assert_ne!(compare_versions(&highest, &request.version), std::cmp::Ordering::Less);
        assert_ne!(compare_versions(&lowest, &request.version), std::cmp::Ordering::Greater);
    }
    assert_eq!(lowest, "1.0.0");
}

#[test]
fn test_single_version_is_not_a_conflict() {
    let requests = vec![VersionRequest::new("4.1.0", "A"), VersionRequest::new("4.1", "B")];
    let conflict = PackageVersionConflictResolver::new(None).resolve(
        "Foo",
        &requests,
        &[],
        ConflictStrategy::UseHighest,
    );
    assert!(!conflict.is_conflict());
    assert!(conflict.warnings.is_empty());
}

#[test]
fn test_most_common_tie_goes_higher() {
    let requests = vec![
        VersionRequest::new("1.0.0", "A"),
        VersionRequest::new("1.0.0", "B"),
        VersionRequest::new("2.0.0", "C"),
        VersionRequest::new("2.0.0", "D"),
        VersionRequest::new("1.5.0", "E"),
    ];
    assert_eq!(resolve(&requests, ConflictStrategy::UseMostCommon), "2.0.0");
}

#[test]
fn test_latest_stable_skips_prereleases() {
    let requests = vec![
        VersionRequest::new("2.0.0-beta.2", "A"),
        VersionRequest::new("1.4.0", "B"),
    ];
    assert_eq!(resolve(&requests, ConflictStrategy::UseLatestStable), "1.4.0");

    let only_prerelease = vec![
        VersionRequest::new("2.0.0-beta.1", "A"),
        VersionRequest::new("2.0.0-beta.2", "B"),
    ];
    assert_eq!(resolve(&only_prerelease, ConflictStrategy::UseLatestStable), "2.0.0-beta.2");
}

#[test]
fn test_semantic_warns_across_majors() {
    let conflict = PackageVersionConflictResolver::new(None).resolve(
        "Foo",
        &foo_requests(),
        &[],
        ConflictStrategy::SemanticCompatible,
    );
    assert_eq!(conflict.resolved_version, "2.1.0");
    assert!(conflict.warnings[0].contains("span major versions"));
}

#[test]
fn test_framework_compatible_without_knowledge_falls_back() {
    let catalog = StaticPackageResolver::new(vec![PackageInfo {
        id: "Foo".to_string(),
        default_version: "2.1.0".to_string(),
        assemblies: vec!["Foo".to_string()],
        versions: Vec::new(),
        public_key_tokens: Vec::new(),
        frameworks: vec!["netstandard".to_string()],
        dependencies: Vec::new(),
    }]);
    let resolver = PackageVersionConflictResolver::new(Some(Arc::new(catalog)));
    let conflict = resolver.resolve(
        "Foo",
        &foo_requests(),
        &["net472".to_string()],
        ConflictStrategy::FrameworkCompatible,
    );
    assert_eq!(conflict.resolved_version, "2.1.0");
    assert!(conflict.warnings[0].contains("no requested version is known to support net472"));
}

#[test]
fn test_unparsable_versions_do_not_depend_on_order() {
    let versions: Vec<String> = ["1.10.0", "1.9.0", "1.2x"].iter().map(|v| v.to_string()).collect();
    let mut reversed = versions.clone();
    reversed.reverse();

    assert_eq!(pick_highest(&versions), Some("1.10.0".to_string()));
    assert_eq!(pick_highest(&reversed), Some("1.10.0".to_string()));

    let requests: Vec<VersionRequest> = versions.iter().map(|v| VersionRequest::new(v.as_str(), "App")).collect();
    let reversed_requests: Vec<VersionRequest> = requests.iter().rev().cloned().collect();
    for strategy in [ConflictStrategy::UseHighest, ConflictStrategy::UseLowest] {
        assert_eq!(resolve(&requests, strategy), resolve(&reversed_requests, strategy));
    }
}

#[test]
fn test_strategy_names_parse() {
    for strategy in ConflictStrategy::ALL {
        assert_eq!(strategy.name().parse::<ConflictStrategy>(), Ok(*strategy));
    }
    assert!("newest".parse::<ConflictStrategy>().is_err());
}

// ============================================================================
// Central package file
// ============================================================================

#[test]
fn test_categories() {
    assert_eq!(categorize("xunit"), PackageCategory::Test);
    assert_eq!(categorize("StyleCop.Analyzers"), PackageCategory::Analyzer);
    assert_eq!(categorize("Newtonsoft.Json"), PackageCategory::ThirdParty);
}

#[test]
fn test_central_file_round_trips_versions() {
    let mut versions = BTreeMap::new();
    versions.insert("Newtonsoft.Json".to_string(), "13.0.3".to_string());
    versions.insert("Foo".to_string(), "2.1.0".to_string());

    let rendered = CentralPackageFile::new(&versions).render().unwrap();
    assert!(rendered.starts_with("<Project>"));
    assert!(rendered.contains("<ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>"));

    let mut parsed = parse_central_file_str(&rendered, Path::new("Directory.Packages.props")).unwrap();
    parsed.sort();
    assert_eq!(
        parsed,
        vec![
            ("Foo".to_string(), "2.1.0".to_string()),
            ("Newtonsoft.Json".to_string(), "13.0.3".to_string()),
        ]
    );
}
