//! Assembly reference to package resolution

use std::sync::Arc;

use rust_sdkmigrate::model::PackageReference;
use rust_sdkmigrate::project::Item;
use rust_sdkmigrate::references::{
    AssemblyReferenceResolver, PackageInfo, ResolutionCache, StaticPackageResolver,
    REASON_NO_PACKAGE, REASON_TOKEN_MISMATCH,
};

fn resolver() -> AssemblyReferenceResolver {
    AssemblyReferenceResolver::new(
        Arc::new(StaticPackageResolver::builtin()),
        Arc::new(ResolutionCache::new()),
    )
}

fn newtonsoft(token: &str) -> Item {
    Item::new(
        "Reference",
        format!(
            "Newtonsoft.Json, Version=12.0.0.0, Culture=neutral, PublicKeyToken={}, processorArchitecture=MSIL",
            token
        ),
    )
    .with_metadata(
        "HintPath",
        r"..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll",
    )
}

#[test]
fn test_hint_path_version_wins() {
    let item = newtonsoft("30ad4fe6b2a6aeed");
    let resolved = resolver().resolve(&[&item], "net472", &[]);

    assert_eq!(
        resolved.packages,
        vec![PackageReference::new("Newtonsoft.Json", Some("12.0.3".to_string()))]
    );
    assert!(resolved.unconverted.is_empty());
    assert!(resolved.warnings.is_empty());
}

#[test]
fn test_token_mismatch_keeps_reference() {
    let item = newtonsoft("deadbeefdeadbeef");
    let resolved = resolver().resolve(&[&item], "net472", &[]);

    assert!(resolved.packages.is_empty());
    assert_eq!(resolved.unconverted.len(), 1);
    let kept = &resolved.unconverted[0];
    assert_eq!(kept.reason, REASON_TOKEN_MISMATCH);
    assert_eq!(kept.identity.name, "Newtonsoft.Json");
    assert_eq!(
        kept.hint_path.as_deref(),
        Some(r"..\packages\Newtonsoft.Json.12.0.3\lib\net45\Newtonsoft.Json.dll")
    );
    assert!(resolved.warnings[0].contains("public key token mismatch"));
}

#[test]
fn test_reference_covered_by_declared_package() {
    let item = newtonsoft("30ad4fe6b2a6aeed");
    let declared = vec![PackageReference::new("Newtonsoft.Json", Some("12.0.3".to_string()))];
    let resolved = resolver().resolve(&[&item], "net472", &declared);

    assert!(resolved.packages.is_empty());
    assert_eq!(resolved.covered, vec![item]);
}

#[test]
fn test_framework_references_by_target() {
    let system = Item::new("Reference", "System.Xml");

    let on_framework = resolver().resolve(&[&system], "net48", &[]);
    assert_eq!(on_framework.preserved, vec![system.clone()]);

    let on_modern = resolver().resolve(&[&system], "net8.0", &[]);
    assert_eq!(on_modern.skipped_builtin, vec![system]);
}

#[test]
fn test_unknown_assembly_is_unconverted() {
    let item = Item::new("Reference", "Contoso.Internal, Version=1.0.0.0")
        .with_metadata("HintPath", r"..\lib\Contoso.Internal.dll");
    let resolved = resolver().resolve(&[&item], "net472", &[]);

    assert_eq!(resolved.unconverted.len(), 1);
    assert_eq!(resolved.unconverted[0].reason, REASON_NO_PACKAGE);
}

#[test]
fn test_custom_catalog_entry() {
    let mut catalog = StaticPackageResolver::new(Vec::new());
    catalog.insert(PackageInfo {
        id: "Contoso.Internal".to_string(),
        default_version: "3.2.0".to_string(),
        assemblies: vec!["Contoso.Internal".to_string()],
        versions: vec!["3.1.0".to_string(), "3.2.0".to_string()],
        public_key_tokens: Vec::new(),
        frameworks: Vec::new(),
        dependencies: Vec::new(),
    });
    let resolver = AssemblyReferenceResolver::new(Arc::new(catalog), Arc::new(ResolutionCache::new()));

    let item = Item::new("Reference", "Contoso.Internal, Version=3.1.0.0");
    let resolved = resolver.resolve(&[&item], "net8.0", &[]);
    assert_eq!(
        resolved.packages,
        vec![PackageReference::new("Contoso.Internal", Some("3.1.0".to_string()))]
    );
}
