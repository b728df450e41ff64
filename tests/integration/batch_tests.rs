//! Solution-wide migration: version settlement, central package management, skips and
//! fatal gates

use std::fs;

use rust_sdkmigrate::conflicts::{ConflictStrategy, VersionRequest, CENTRAL_FILE_NAME};
use rust_sdkmigrate::model::{ProjectState, SkipReason};
use rust_sdkmigrate::orchestrator::MigrationLock;
use rust_sdkmigrate::{migrate_directory, CancellationToken, MigrateError, MigrateOptions};

use crate::common::TestContext;
use crate::{assert_xml_contains, assert_xml_lacks};

/// Options for the mixed solution; the database project needs `force`
fn forced(ctx: &TestContext) -> MigrateOptions {
    let mut options = ctx.options();
    options.force = true;
    options
}

fn migrate_error(ctx: &TestContext, options: MigrateOptions) -> MigrateError {
    let err = migrate_directory(options, &CancellationToken::new())
        .expect_err("Migration should fail before touching projects");
    match err.downcast::<MigrateError>() {
        Ok(e) => e,
        Err(other) => panic!("Unexpected error for {}: {:#}", ctx.root.display(), other),
    }
}

// ============================================================================
// Per-project outcomes
// ============================================================================

#[test]
fn test_mixed_solution_outcomes() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let db_original = ctx.read("Db/Db.sqlproj");
    let report = ctx.migrate(forced(&ctx));

    let totals = report.totals();
    assert_eq!(totals.total, 5);
    assert_eq!(totals.written, 3);
    assert_eq!(totals.already_modern, 1);
    assert_eq!(totals.unmigratable, 1);
    assert!(!report.has_failures(), "Report:\n{}", report.render());

    let db = report.result_for(&ctx.path("Db/Db.sqlproj")).unwrap();
    assert_eq!(
        db.state,
        ProjectState::Skipped(SkipReason::Unmigratable("database project".to_string()))
    );
    assert!(!db.success);
    assert_eq!(db.errors, vec!["database project".to_string()]);
    assert_eq!(ctx.read("Db/Db.sqlproj"), db_original);

    let modern = report.result_for(&ctx.path("Modern/Modern.csproj")).unwrap();
    assert_eq!(modern.state, ProjectState::Skipped(SkipReason::AlreadyModern));
}

#[test]
fn test_console_app_items() {
    let ctx = TestContext::with_fixture("mixed_solution");
    ctx.migrate(forced(&ctx));
    let app = ctx.read("App/App.csproj");

    assert!(app.starts_with(r#"<Project Sdk="Microsoft.NET.Sdk">"#));
    assert_xml_contains!(app, "<OutputType>Exe</OutputType>");
    assert_xml_contains!(app, r#"<None Update="appsettings.json">"#);
    assert_xml_contains!(app, "<CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>");
    assert_xml_contains!(app, r#"<ProjectReference Include="..\Core\Core.csproj"/>"#);
    assert_xml_contains!(app, r#"<PackageReference Include="Newtonsoft.Json" Version="12.0.3"/>"#);

    assert_xml_lacks!(app, "Program.cs");
    assert_xml_lacks!(app, "App.config");
    assert_xml_lacks!(app, "packages.config");
    assert_xml_lacks!(app, "HintPath");
    assert_xml_lacks!(app, "EnsureNuGetPackageBuildImports");
    assert_xml_lacks!(app, "NuGetPackageImportStamp");
    assert_xml_lacks!(app, "Microsoft.CSharp.targets");
    assert_xml_lacks!(app, "<Name>Core</Name>");
}

#[test]
fn test_uncompiled_source_and_package_imports() {
    let ctx = TestContext::with_fixture("mixed_solution");
    ctx.migrate(forced(&ctx));
    let core = ctx.read("Core/Core.csproj");

    assert_xml_contains!(core, r#"<Compile Remove="Scratch.cs"/>"#);
    assert_xml_lacks!(core, "Thing.cs");
    assert_xml_lacks!(core, "Foo.targets");
    assert_xml_lacks!(core, "<OutputType>");
}

#[test]
fn test_broken_project_does_not_stop_batch() {
    let ctx = TestContext::with_fixture("mixed_solution");
    fs::create_dir_all(ctx.path("Broken")).unwrap();
    fs::write(ctx.path("Broken/Broken.csproj"), "<Project><PropertyGroup>").unwrap();

    let report = ctx.migrate(forced(&ctx));
    assert!(report.has_failures());
    assert_eq!(report.totals().failed, 1);
    assert_eq!(report.totals().written, 3);

    let broken = report.result_for(&ctx.path("Broken/Broken.csproj")).unwrap();
    assert!(broken.is_failed());
    assert!(broken.errors[0].contains("Failed to parse project file"));
}

// ============================================================================
// Version settlement
// ============================================================================

#[test]
fn test_highest_version_wins_across_projects() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let report = ctx.migrate(forced(&ctx));

    let foo = report
        .conflicts
        .iter()
        .find(|c| c.package_id == "Foo")
        .expect("Foo should be settled");
    assert_eq!(foo.resolved_version, "2.1.0");
    assert_eq!(foo.strategy_used, ConflictStrategy::UseHighest);
    let requested: Vec<(&str, &str)> = foo
        .requested_versions
        .iter()
        .map(|r| (r.version.as_str(), r.origin.as_str()))
        .collect();
    assert_eq!(requested, vec![("1.0.0", "App"), ("2.1.0", "Core"), ("2.0.5", "Shared")]);
    assert!(foo.is_conflict());

    for project in ["App/App.csproj", "Core/Core.csproj", "Shared/Shared.csproj"] {
        assert_xml_contains!(ctx.read(project), r#"<PackageReference Include="Foo" Version="2.1.0"/>"#);
    }
    assert!(report.render().contains("Foo -> 2.1.0 (highest)"));
}

#[test]
fn test_lowest_strategy() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let mut options = forced(&ctx);
    options.strategy = ConflictStrategy::UseLowest;
    ctx.migrate(options);

    assert_xml_contains!(ctx.read("Core/Core.csproj"), r#"<PackageReference Include="Foo" Version="1.0.0"/>"#);
}

// ============================================================================
// Central package management
// ============================================================================

#[test]
fn test_central_package_file_written() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let mut options = forced(&ctx);
    options.central_package_management = true;
    let report = ctx.migrate(options);

    assert_eq!(report.central_file, Some(ctx.path(CENTRAL_FILE_NAME)));
    let central = ctx.read(CENTRAL_FILE_NAME);
    assert_xml_contains!(central, "<ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>");
    assert_xml_contains!(central, r#"<PackageVersion Include="Foo" Version="2.1.0"/>"#);
    assert_xml_contains!(central, r#"<PackageVersion Include="Newtonsoft.Json" Version="12.0.3"/>"#);

    let app = ctx.read("App/App.csproj");
    assert_xml_contains!(app, r#"<PackageReference Include="Foo"/>"#);
    assert_xml_lacks!(app, "Version=");
}

#[test]
fn test_existing_central_versions_merge() {
    let ctx = TestContext::with_fixture("mixed_solution");
    fs::write(
        ctx.path(CENTRAL_FILE_NAME),
        r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
  </PropertyGroup>
  <ItemGroup>
    <PackageVersion Include="Newtonsoft.Json" Version="13.0.1" />
    <PackageVersion Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>
"#,
    )
    .unwrap();

    let mut options = forced(&ctx);
    options.central_package_management = true;
    let report = ctx.migrate(options);

    let central = ctx.read(CENTRAL_FILE_NAME);
    assert_xml_contains!(central, r#"<PackageVersion Include="Newtonsoft.Json" Version="13.0.1"/>"#);
    assert_xml_contains!(central, r#"<PackageVersion Include="Serilog" Version="3.1.1"/>"#);

    let json = report
        .conflicts
        .iter()
        .find(|c| c.package_id == "Newtonsoft.Json")
        .expect("Newtonsoft.Json should be settled");
    assert!(json.is_conflict());
    assert!(json
        .requested_versions
        .contains(&VersionRequest::new("13.0.1", CENTRAL_FILE_NAME)));
    assert_eq!(json.resolved_version, "13.0.1");
    assert!(json
        .warnings
        .contains(&"Package 'Newtonsoft.Json': version 12.0.3 requested by App replaced by 13.0.1".to_string()));

    let manifest = report.backup_manifest.expect("Backup manifest should be written");
    let backed_up = manifest.parent().unwrap().join(CENTRAL_FILE_NAME);
    assert!(fs::read_to_string(backed_up).unwrap().contains("13.0.1"));
}

#[test]
fn test_higher_existing_central_version_survives_lowest_strategy() {
    let ctx = TestContext::with_fixture("mixed_solution");
    fs::write(
        ctx.path(CENTRAL_FILE_NAME),
        r#"<Project>
  <ItemGroup>
    <PackageVersion Include="Newtonsoft.Json" Version="13.0.1" />
  </ItemGroup>
</Project>
"#,
    )
    .unwrap();

    let mut options = forced(&ctx);
    options.central_package_management = true;
    options.strategy = ConflictStrategy::UseLowest;
    let report = ctx.migrate(options);

    assert_xml_contains!(
        ctx.read(CENTRAL_FILE_NAME),
        r#"<PackageVersion Include="Newtonsoft.Json" Version="13.0.1"/>"#
    );
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("existing central version 13.0.1 overrides migrated version 12.0.3")));
}

// ============================================================================
// Fatal gates
// ============================================================================

#[test]
fn test_unmigratable_project_blocks_without_force() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let app_original = ctx.read("App/App.csproj");

    let err = migrate_error(&ctx, ctx.options());
    assert!(matches!(err, MigrateError::PreflightFailed { count: 1, .. }));
    assert!(err.to_string().contains("Db.sqlproj"));
    assert_eq!(ctx.read("App/App.csproj"), app_original);
}

#[test]
fn test_missing_root_is_fatal() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let options = MigrateOptions::new(ctx.path("does-not-exist"));
    let err = migrate_error(&ctx, options);
    assert!(matches!(err, MigrateError::PreflightFailed { .. }));
}

#[test]
fn test_lock_contention_is_fatal() {
    let ctx = TestContext::with_fixture("mixed_solution");
    let app_original = ctx.read("App/App.csproj");
    let _held = MigrationLock::acquire(&ctx.root).unwrap();

    let err = migrate_error(&ctx, forced(&ctx));
    assert!(matches!(err, MigrateError::LockContention { .. }));
    assert_eq!(ctx.read("App/App.csproj"), app_original);
}
