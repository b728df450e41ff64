//! End-to-end migration of a single legacy class library

use std::fs;

use pretty_assertions::assert_eq;
use rust_sdkmigrate::model::{ProjectState, SkipReason};
use rust_sdkmigrate::orchestrator::{BACKUP_DIR_NAME, LOCK_FILE_NAME, MANIFEST_FILE_NAME};

use crate::common::{normalize, TestContext};

const PROJECT: &str = "Contoso.Core/Contoso.Core.csproj";

const EXPECTED_LIBRARY: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net472</TargetFramework>
    <GenerateAssemblyInfo>false</GenerateAssemblyInfo>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="12.0.3"/>
  </ItemGroup>
</Project>
"#;

// ============================================================================
// In-place migration
// ============================================================================

#[test]
fn test_library_migrates_in_place() {
    let ctx = TestContext::with_fixture("legacy_library");
    let report = ctx.migrate(ctx.options());

    assert!(!report.has_failures(), "Report:\n{}", report.render());
    assert_eq!(report.totals().written, 1);
    assert_eq!(normalize(&ctx.read(PROJECT)), EXPECTED_LIBRARY);
}

#[test]
fn test_library_report_records_removed_elements() {
    let ctx = TestContext::with_fixture("legacy_library");
    let report = ctx.migrate(ctx.options());
    let result = report
        .result_for(&ctx.path(PROJECT))
        .expect("Project should be in the report");

    let removed: Vec<String> = result.removed_elements.iter().map(|r| r.to_string()).collect();
    assert!(removed.contains(&r#"Compile Include="Widget.cs" (included implicitly by the SDK)"#.to_string()));
    assert!(removed.iter().any(|r| r.starts_with("Property ProjectGuid")));
    assert!(removed.iter().any(|r| r.contains("Microsoft.CSharp.targets")));
    assert!(removed
        .iter()
        .any(|r| r.starts_with("Reference Include=\"Newtonsoft.Json") && r.ends_with("(converted to a package reference)")));
    assert!(removed.contains(&r#"Reference Include="System.Core" (referenced implicitly by the SDK)"#.to_string()));

    assert_eq!(result.migrated_packages.len(), 1);
    assert_eq!(result.migrated_packages[0].package_id, "Newtonsoft.Json");
    assert_eq!(result.migrated_packages[0].version.as_deref(), Some("12.0.3"));
    assert!(result.unconverted_references.is_empty());
}

#[test]
fn test_original_is_backed_up_and_lock_released() {
    let ctx = TestContext::with_fixture("legacy_library");
    let original = ctx.read(PROJECT);
    let report = ctx.migrate(ctx.options());

    let manifest = report.backup_manifest.clone().expect("Backup manifest should be written");
    assert_eq!(manifest.file_name().unwrap(), MANIFEST_FILE_NAME);
    let session_dir = manifest.parent().unwrap();
    assert!(session_dir.starts_with(ctx.path(BACKUP_DIR_NAME)));
    assert_eq!(
        fs::read_to_string(session_dir.join(PROJECT)).unwrap(),
        original
    );

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert_eq!(json["files"][0]["original"], PROJECT);

    assert!(!ctx.path(LOCK_FILE_NAME).exists());
}

#[test]
fn test_no_backup_option() {
    let ctx = TestContext::with_fixture("legacy_library");
    let mut options = ctx.options();
    options.backup = false;
    let report = ctx.migrate(options);

    assert!(report.backup_manifest.is_none());
    assert!(!ctx.path(BACKUP_DIR_NAME).exists());
}

#[test]
fn test_second_run_skips_migrated_project() {
    let ctx = TestContext::with_fixture("legacy_library");
    ctx.migrate(ctx.options());
    let migrated = ctx.read(PROJECT);

    let report = ctx.migrate(ctx.options());
    let result = report.result_for(&ctx.path(PROJECT)).unwrap();
    assert_eq!(result.state, ProjectState::Skipped(SkipReason::AlreadyModern));
    assert!(result.success);
    assert_eq!(ctx.read(PROJECT), migrated);
}

// ============================================================================
// Dry run and output directory
// ============================================================================

#[test]
fn test_dry_run_leaves_tree_untouched() {
    let ctx = TestContext::with_fixture("legacy_library");
    let original = ctx.read(PROJECT);
    let mut options = ctx.options();
    options.dry_run = true;
    let report = ctx.migrate(options);

    assert!(report.dry_run);
    assert_eq!(report.totals().written, 1);
    assert_eq!(ctx.read(PROJECT), original);
    assert!(!ctx.path(BACKUP_DIR_NAME).exists());
    assert!(report.render().contains("Would write:"));
}

#[test]
fn test_output_dir_mirrors_layout() {
    let ctx = TestContext::with_fixture("legacy_library");
    let original = ctx.read(PROJECT);
    let out = tempfile::TempDir::new().unwrap();
    let mut options = ctx.options();
    options.output_dir = Some(out.path().to_path_buf());
    ctx.migrate(options);

    assert_eq!(ctx.read(PROJECT), original);
    let written = fs::read_to_string(out.path().join(PROJECT)).unwrap();
    assert_eq!(normalize(&written), EXPECTED_LIBRARY);
}

#[test]
fn test_report_file_is_written() {
    let ctx = TestContext::with_fixture("legacy_library");
    let report_path = ctx.path("migration-report.txt");
    let mut options = ctx.options();
    options.report_path = Some(report_path.clone());
    ctx.migrate(options);

    let text = fs::read_to_string(report_path).unwrap();
    assert!(text.starts_with("=== SDK-Style Migration Report ==="));
    assert!(text.contains("--- Contoso.Core/Contoso.Core.csproj ---"));
    assert!(text.contains("Newtonsoft.Json 12.0.3"));
}
