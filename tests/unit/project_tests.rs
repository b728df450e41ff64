//! Loading and classifying legacy project files

use std::fs;
use std::path::Path;

use rust_sdkmigrate::classify::{ClassifierOptions, SdkTypeClassifier, SdkVariant};
use rust_sdkmigrate::project::{load_project, parse_project_str};
use tempfile::TempDir;

const LIBRARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Debug</Configuration>
    <RootNamespace>Contoso</RootNamespace>
    <AssemblyName>$(RootNamespace).Core</AssemblyName>
    <TargetFrameworkVersion>v4.6.1</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)' == 'Debug' ">
    <DebugSymbols>true</DebugSymbols>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)' == 'Release' ">
    <Optimize>true</Optimize>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Widget.cs" />
    <None Include="readme.txt">
      <CopyToOutputDirectory>Always</CopyToOutputDirectory>
    </None>
  </ItemGroup>
</Project>
"#;

fn no_files(_: &Path) -> bool {
    false
}

fn classify(xml: &str, file_name: &str) -> rust_sdkmigrate::Classification {
    let project = parse_project_str(xml, Path::new(file_name)).unwrap();
    SdkTypeClassifier::default().classify(&project, &no_files)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_properties_evaluate_in_order() {
    let project = parse_project_str(LIBRARY, Path::new("/repo/Core/Core.csproj")).unwrap();

    assert_eq!(project.property("Configuration").as_deref(), Some("Debug"));
    assert_eq!(project.property("assemblyname").as_deref(), Some("Contoso.Core"));
    assert_eq!(project.property("DebugSymbols").as_deref(), Some("true"));
    assert_eq!(project.property("Optimize"), None);
    assert_eq!(project.property("MSBuildProjectName").as_deref(), Some("Core"));
    assert!(!project.is_sdk_style());
}

#[test]
fn test_item_metadata_from_child_elements() {
    let project = parse_project_str(LIBRARY, Path::new("Core.csproj")).unwrap();
    let none = project.items_of_type("None").next().unwrap();

    assert_eq!(none.include, "readme.txt");
    assert_eq!(none.metadata("copytooutputdirectory"), Some("Always"));
    assert_eq!(none.describe(), r#"None Include="readme.txt""#);
}

#[test]
fn test_load_reads_packages_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Core.csproj");
    fs::write(&path, LIBRARY).unwrap();
    fs::write(
        temp_dir.path().join("packages.config"),
        r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Dapper" version="2.0.123" targetFramework="net461" />
</packages>
"#,
    )
    .unwrap();

    let project = load_project(&path).unwrap();
    assert_eq!(project.packages_config.len(), 1);
    assert_eq!(project.packages_config[0].package_id, "Dapper");
    assert_eq!(project.packages_config[0].version.as_deref(), Some("2.0.123"));
}

#[test]
fn test_load_windows_1252_project() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Legacy.csproj");
    let mut bytes = b"<Project><PropertyGroup><Company>Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</Company></PropertyGroup></Project>");
    fs::write(&path, bytes).unwrap();

    let project = load_project(&path).unwrap();
    assert_eq!(project.property("Company").as_deref(), Some("Café"));
}

#[test]
fn test_malformed_project_is_an_error() {
    let err = parse_project_str("<Project><ItemGroup>", Path::new("Broken.csproj")).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse project file"));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_library_classification() {
    let classification = classify(LIBRARY, "Core.csproj");
    assert_eq!(classification.variant, SdkVariant::StandardLibrary);
    assert_eq!(classification.target_framework, "net461");
    assert_eq!(classification.frameworks, vec!["net461".to_string()]);
    assert!(!classification.multi_targeting);
}

#[test]
fn test_database_project_is_unmigratable() {
    let classification = classify(LIBRARY, "Db.sqlproj");
    assert_eq!(
        classification.variant,
        SdkVariant::Unmigratable {
            reason: "database project".to_string()
        }
    );
    assert!(!classification.is_migratable());
}

#[test]
fn test_conditional_framework_versions_multi_target() {
    let xml = r#"<Project>
  <PropertyGroup Condition=" '$(Configuration)' == 'Legacy' ">
    <TargetFrameworkVersion>v4.5</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)' != 'Legacy' ">
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
</Project>
"#;
    let classification = classify(xml, "Multi.csproj");
    assert!(classification.multi_targeting);
    assert_eq!(
        classification.frameworks,
        vec!["net45".to_string(), "net48".to_string(), "net8.0".to_string()]
    );
}

#[test]
fn test_framework_override() {
    let project = parse_project_str(LIBRARY, Path::new("Core.csproj")).unwrap();
    let classifier = SdkTypeClassifier::new(ClassifierOptions {
        target_framework_override: Some("net8.0".to_string()),
        ..Default::default()
    });
    let classification = classifier.classify(&project, &no_files);
    assert_eq!(classification.target_framework, "net8.0");
    assert!(!classification.multi_targeting);
}

#[test]
fn test_wpf_items_set_flag() {
    let xml = r#"<Project>
  <PropertyGroup>
    <OutputType>WinExe</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <ApplicationDefinition Include="App.xaml" />
    <Page Include="MainWindow.xaml" />
  </ItemGroup>
</Project>
"#;
    let classification = classify(xml, "Desktop.csproj");
    assert!(classification.flags.use_wpf);
    assert!(!classification.flags.use_windows_forms);
}

#[test]
fn test_host_json_selects_functions() {
    let project = parse_project_str(LIBRARY, Path::new("/repo/Fn/Fn.csproj")).unwrap();
    let probe = |path: &Path| path.ends_with("host.json");
    let classification = SdkTypeClassifier::default().classify(&project, &probe);
    assert_eq!(classification.variant, SdkVariant::WebFunctions);
}
