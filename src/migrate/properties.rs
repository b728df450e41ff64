//! Property migration
//!
//! Unconditional property groups collapse into one [`ProjectSettings`]; SDK-owned
//! properties and properties equal to SDK defaults are dropped.

use crate::project::{Property, PropertyGroup};
use crate::util::contains_ci;

/// Properties the SDK sets itself; never carried over
const SDK_OWNED_PROPERTIES: &[&str] = &[
    "ProjectGuid",
    "ProjectTypeGuids",
    "TargetFrameworkVersion",
    "TargetFrameworkIdentifier",
    "TargetFrameworkProfile",
    "FileAlignment",
    "SchemaVersion",
    "ProductVersion",
    "OldToolsVersion",
    "UpgradeBackupLocation",
    "AppDesignerFolder",
    "NuGetPackageImportStamp",
    "RestorePackages",
    "SolutionDir",
    "ProjectTypeGuid",
    "TargetFrameworkMoniker",
    // ClickOnce publishing boilerplate
    "PublishUrl",
    "Install",
    "InstallFrom",
    "UpdateEnabled",
    "UpdateMode",
    "UpdateInterval",
    "UpdateIntervalUnits",
    "UpdatePeriodically",
    "UpdateRequired",
    "MapFileExtensions",
    "ApplicationRevision",
    "ApplicationVersion",
    "IsWebBootstrapper",
    "UseApplicationTrust",
    "BootstrapperEnabled",
];

pub fn is_sdk_owned(name: &str) -> bool {
    SDK_OWNED_PROPERTIES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

/// Build configuration a property group applies to, judged from its condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationScope {
    Any,
    Debug,
    Release,
}

impl ConfigurationScope {
    pub fn from_condition(condition: Option<&str>) -> Self {
        match condition {
            Some(c) if contains_ci(c, "debug") => ConfigurationScope::Debug,
            Some(c) if contains_ci(c, "release") => ConfigurationScope::Release,
            _ => ConfigurationScope::Any,
        }
    }
}

/// Whether `name = value` restates an SDK default in `scope`.
pub fn is_sdk_default(name: &str, value: &str, scope: ConfigurationScope, project_name: &str) -> bool {
    let value = value.trim();
    let is = |expected: &str| value.eq_ignore_ascii_case(expected);
    let debug = scope == ConfigurationScope::Debug;
    let release = scope == ConfigurationScope::Release;

    match name.to_ascii_lowercase().as_str() {
        "outputtype" => is("Library"),
        "assemblyname" | "rootnamespace" => value == project_name,
        "outputpath" => {
            let normalized = value.replace('/', "\\").trim_end_matches('\\').to_ascii_lowercase();
            normalized == "bin\\$(configuration)"
                || (debug && normalized == "bin\\debug")
                || (release && normalized == "bin\\release")
        }
        "defineconstants" => {
            (debug && (is("DEBUG;TRACE") || is("DEBUG")))
                || ((release || scope == ConfigurationScope::Any) && is("TRACE"))
        }
        "errorreport" => is("prompt"),
        "warninglevel" => is("4"),
        "deterministic" => is("true"),
        "platformtarget" => is("AnyCPU"),
        "prefer32bit" | "treatwarningsaserrors" | "allowunsafeblocks" | "signassembly" => is("false"),
        "debugsymbols" => debug && is("true"),
        "debugtype" => (debug && (is("full") || is("portable"))) || (release && (is("pdbonly") || is("portable"))),
        "optimize" => (debug && is("false")) || (release && is("true")),
        "configuration" => is("Debug"),
        "platform" => is("AnyCPU"),
        _ => false,
    }
}

macro_rules! project_settings {
    ($($field:ident => $name:literal),+ $(,)?) => {
        /// Well-known properties of the unconditional property groups, plus anything else
        /// in declaration order.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct ProjectSettings {
            $(pub $field: Option<String>,)+
            /// Properties without a dedicated field, in declaration order
            pub other: Vec<Property>,
        }

        impl ProjectSettings {
            fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
                $(
                    if name.eq_ignore_ascii_case($name) {
                        return Some(&mut self.$field);
                    }
                )+
                None
            }

            pub fn get(&self, name: &str) -> Option<&str> {
                $(
                    if name.eq_ignore_ascii_case($name) {
                        return self.$field.as_deref();
                    }
                )+
                self.other
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name) && p.condition.is_none())
                    .map(|p| p.value.as_str())
            }

            /// Override every field `other` sets to a non-empty value.
            pub fn merge(&mut self, other: ProjectSettings) {
                $(
                    if other.$field.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                        self.$field = other.$field;
                    }
                )+
                for property in other.other {
                    match self.other.iter_mut().find(|p| {
                        p.name.eq_ignore_ascii_case(&property.name) && p.condition == property.condition
                    }) {
                        Some(existing) if !property.value.trim().is_empty() => existing.value = property.value,
                        Some(_) => {}
                        None => self.other.push(property),
                    }
                }
            }

            /// Well-known properties first, in a fixed order, then the rest.
            pub fn into_properties(self) -> Vec<Property> {
                let mut properties = Vec::new();
                $(
                    if let Some(value) = self.$field {
                        properties.push(Property {
                            name: $name.to_string(),
                            value,
                            condition: None,
                        });
                    }
                )+
                properties.extend(self.other);
                properties
            }
        }
    };
}

project_settings! {
    output_type => "OutputType",
    root_namespace => "RootNamespace",
    assembly_name => "AssemblyName",
    lang_version => "LangVersion",
    nullable => "Nullable",
    platform_target => "PlatformTarget",
    allow_unsafe_blocks => "AllowUnsafeBlocks",
    treat_warnings_as_errors => "TreatWarningsAsErrors",
    warnings_as_errors => "WarningsAsErrors",
    no_warn => "NoWarn",
    documentation_file => "DocumentationFile",
    application_icon => "ApplicationIcon",
    application_manifest => "ApplicationManifest",
    startup_object => "StartupObject",
    sign_assembly => "SignAssembly",
    assembly_originator_key_file => "AssemblyOriginatorKeyFile",
    delay_sign => "DelaySign",
    register_for_com_interop => "RegisterForComInterop",
    com_visible => "ComVisible",
    auto_generate_binding_redirects => "AutoGenerateBindingRedirects",
}

impl ProjectSettings {
    /// Collect the carried properties of one unconditional group. `dropped` receives
    /// the names of properties left out, with the reason.
    pub fn from_group(
        group: &PropertyGroup,
        project_name: &str,
        dropped: &mut Vec<(Property, &'static str)>,
    ) -> Self {
        let mut settings = ProjectSettings::default();
        for property in &group.properties {
            if is_sdk_owned(&property.name) {
                dropped.push((property.clone(), "set by the SDK"));
                continue;
            }
            let scope = ConfigurationScope::from_condition(property.condition.as_deref());
            if is_sdk_default(&property.name, &property.value, scope, project_name) {
                dropped.push((property.clone(), "equal to the SDK default"));
                continue;
            }
            if property.condition.is_some() {
                settings.other.push(property.clone());
                continue;
            }
            match settings.slot(&property.name) {
                Some(slot) => *slot = Some(property.value.clone()),
                None => settings.other.push(property.clone()),
            }
        }
        settings
    }
}

/// Filter a conditional group: drop SDK-owned properties and SDK defaults for the
/// group's configuration. Returns the kept group (possibly empty).
pub fn filter_conditional_group(
    group: &PropertyGroup,
    project_name: &str,
    dropped: &mut Vec<(Property, &'static str)>,
) -> PropertyGroup {
    let scope = ConfigurationScope::from_condition(group.condition.as_deref());
    let properties = group
        .properties
        .iter()
        .filter(|property| {
            if is_sdk_owned(&property.name) {
                dropped.push(((*property).clone(), "set by the SDK"));
                false
            } else if is_sdk_default(&property.name, &property.value, scope, project_name) {
                dropped.push(((*property).clone(), "equal to the SDK default"));
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();
    PropertyGroup {
        condition: group.condition.clone(),
        label: group.label.clone(),
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str, value: &str) -> Property {
        Property {
            name: name.to_string(),
            value: value.to_string(),
            condition: None,
        }
    }

    #[test]
    fn test_defaults() {
        let any = ConfigurationScope::Any;
        assert!(is_sdk_default("OutputType", "Library", any, "App"));
        assert!(!is_sdk_default("OutputType", "Exe", any, "App"));
        assert!(is_sdk_default("AssemblyName", "App", any, "App"));
        assert!(!is_sdk_default("AssemblyName", "App.Core", any, "App"));
        assert!(is_sdk_default("OutputPath", r"bin\Debug\", ConfigurationScope::Debug, "App"));
        assert!(!is_sdk_default("OutputPath", r"..\build\", ConfigurationScope::Debug, "App"));
        assert!(is_sdk_default("DefineConstants", "DEBUG;TRACE", ConfigurationScope::Debug, "App"));
        assert!(!is_sdk_default("DefineConstants", "DEBUG;TRACE;NET45", ConfigurationScope::Debug, "App"));
    }

    #[test]
    fn test_scope_from_condition() {
        assert_eq!(
            ConfigurationScope::from_condition(Some(" '$(Configuration)|$(Platform)' == 'Release|AnyCPU' ")),
            ConfigurationScope::Release
        );
        assert_eq!(ConfigurationScope::from_condition(None), ConfigurationScope::Any);
    }

    #[test]
    fn test_from_group_and_merge() {
        let group = PropertyGroup {
            properties: vec![
                property("ProjectGuid", "{1234}"),
                property("OutputType", "Exe"),
                property("RootNamespace", "App"),
                property("AssemblyName", "MyApp"),
                property("SignAssembly", "true"),
                property("CustomThing", "x"),
            ],
            ..Default::default()
        };
        let mut dropped = Vec::new();
        let mut settings = ProjectSettings::from_group(&group, "App", &mut dropped);
        assert_eq!(dropped.len(), 2);
        assert_eq!(settings.output_type.as_deref(), Some("Exe"));
        assert_eq!(settings.other.len(), 1);

        let later = PropertyGroup {
            properties: vec![property("AssemblyName", ""), property("LangVersion", "latest")],
            ..Default::default()
        };
        settings.merge(ProjectSettings::from_group(&later, "App", &mut dropped));
        assert_eq!(settings.assembly_name.as_deref(), Some("MyApp"));
        assert_eq!(settings.lang_version.as_deref(), Some("latest"));

        let names: Vec<String> = settings.into_properties().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["OutputType", "AssemblyName", "LangVersion", "SignAssembly", "CustomThing"]
        );
    }

    #[test]
    fn test_conditional_group_filtering() {
        let group = PropertyGroup {
            condition: Some("'$(Configuration)|$(Platform)' == 'Debug|AnyCPU'".to_string()),
            label: None,
            properties: vec![
                property("DebugSymbols", "true"),
                property("Optimize", "false"),
                property("DefineConstants", "DEBUG;TRACE;EXTRA"),
            ],
        };
        let mut dropped = Vec::new();
        let kept = filter_conditional_group(&group, "App", &mut dropped);
        assert_eq!(kept.properties.len(), 1);
        assert_eq!(dropped.len(), 2);
    }
}
