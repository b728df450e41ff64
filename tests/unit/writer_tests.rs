//! In-memory migration rendered through the project writer

use std::path::{Path, PathBuf};

use rust_sdkmigrate::classify::SdkTypeClassifier;
use rust_sdkmigrate::migrate::{write_project, ItemAndPropertyMigrator, SourceTree};
use rust_sdkmigrate::project::parse_project_str;
use rust_sdkmigrate::references::ResolvedReferences;
use rust_sdkmigrate::{CancellationToken, MigrateError};

/// Fixed set of files, relative to the project directory
struct ListedTree {
    files: Vec<PathBuf>,
    nested: Vec<PathBuf>,
}

impl SourceTree for ListedTree {
    fn source_files(&self, _: &Path, extension: &str, _: &CancellationToken) -> Result<Vec<PathBuf>, MigrateError> {
        let wanted = extension.trim_start_matches('.');
        Ok(self
            .files
            .iter()
            .filter(|f| f.extension().is_some_and(|e| e == wanted))
            .cloned()
            .collect())
    }

    fn nested_project_dirs(&self, _: &Path) -> Vec<PathBuf> {
        self.nested.clone()
    }
}

fn no_files(_: &Path) -> bool {
    false
}

fn render(content: &str, tree: &ListedTree) -> String {
    let project = parse_project_str(content, Path::new("/repo/App/App.csproj")).unwrap();
    let classification = SdkTypeClassifier::default().classify(&project, &no_files);
    let output = ItemAndPropertyMigrator::default()
        .migrate(
            &project,
            &classification,
            &ResolvedReferences::default(),
            tree,
            &CancellationToken::new(),
        )
        .unwrap();
    write_project(&output.project).unwrap().replace("\r\n", "\n")
}

fn empty_tree() -> ListedTree {
    ListedTree {
        files: Vec::new(),
        nested: Vec::new(),
    }
}

#[test]
fn test_uncompiled_sources_are_removed() {
    let tree = ListedTree {
        files: vec![
            PathBuf::from("Class1.cs"),
            PathBuf::from("Old").join("Unused.cs"),
            PathBuf::from("Tools").join("Tool.cs"),
        ],
        nested: vec![PathBuf::from("Tools")],
    };
    let xml = render(
        r#"<Project ToolsVersion="15.0">
  <PropertyGroup>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
  </ItemGroup>
</Project>"#,
        &tree,
    );

    assert!(xml.contains(r#"<Compile Remove="Tools\**"/>"#), "{}", xml);
    assert!(xml.contains(r#"<Compile Remove="Old\Unused.cs"/>"#), "{}", xml);
    assert!(!xml.contains("Class1.cs"));
    assert!(!xml.contains("Tool.cs"));
}

#[test]
fn test_multi_targeting_rendered() {
    let xml = render(
        r#"<Project ToolsVersion="15.0">
  <PropertyGroup>
    <TargetFrameworkVersion>v4.5</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition="'$(TargetFrameworkVersion)' == 'v4.8'">
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
    <DefineConstants>NET48</DefineConstants>
  </PropertyGroup>
</Project>"#,
        &empty_tree(),
    );

    assert!(xml.contains("<TargetFrameworks>net45;net48;net8.0</TargetFrameworks>"), "{}", xml);
    assert!(xml.contains(r#"<PropertyGroup Condition="'$(TargetFramework)' == 'net48'">"#), "{}", xml);
    assert!(xml.contains("<DefineConstants>NET48</DefineConstants>"));
    assert!(!xml.contains("TargetFrameworkVersion"));
}

#[test]
fn test_legacy_web_project_sdk() {
    let xml = render(
        r#"<Project ToolsVersion="15.0">
  <PropertyGroup>
    <ProjectTypeGuids>{349c5851-65df-11da-9384-00065b846f21};{fae04ec0-301f-11d3-bf4b-00c04f79efbc}</ProjectTypeGuids>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
</Project>"#,
        &empty_tree(),
    );

    assert!(xml.starts_with(r#"<Project Sdk="MSBuild.SDK.SystemWeb">"#), "{}", xml);
    assert!(!xml.contains("ProjectTypeGuids"));
}

#[test]
fn test_custom_target_kept() {
    let xml = render(
        r#"<Project ToolsVersion="15.0">
  <PropertyGroup>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
  <Target Name="Stamp" AfterTargets="Build">
    <Exec Command="stamp.exe" />
  </Target>
</Project>"#,
        &empty_tree(),
    );

    assert!(xml.contains(r#"<Target Name="Stamp" AfterTargets="Build">"#), "{}", xml);
    assert!(xml.contains(r#"<Exec Command="stamp.exe"/>"#));
}

#[test]
fn test_leading_props_import_stays_first() {
    let xml = render(
        r#"<Project ToolsVersion="15.0">
  <Import Project="..\build\Common.props" />
  <PropertyGroup>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
    <DocumentationFile>$(CommonDocDir)\App.xml</DocumentationFile>
  </PropertyGroup>
</Project>"#,
        &empty_tree(),
    );

    let import = xml.find(r#"<Import Project="..\build\Common.props"/>"#).expect("import kept");
    let group = xml.find("<PropertyGroup>").expect("property group");
    assert!(import < group, "{}", xml);
    assert!(xml.contains(r"<DocumentationFile>$(CommonDocDir)\App.xml</DocumentationFile>"));
}
