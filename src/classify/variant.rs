//! SDK variants and classification results

use std::fmt;

/// The SDK flavor a legacy project migrates to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkVariant {
    StandardLibrary,
    Web,
    WebFunctions,
    Worker,
    BlazorWasm,
    WindowsDesktop,
    Maui,
    /// Classic ASP.NET on .NET Framework
    LegacyWebFramework,
    Unmigratable {
        reason: String,
    },
}

impl SdkVariant {
    /// Value of the `Sdk` attribute on the migrated project's root element
    pub fn sdk_name(&self) -> Option<&'static str> {
        match self {
            SdkVariant::StandardLibrary | SdkVariant::WebFunctions | SdkVariant::Maui => {
                Some("Microsoft.NET.Sdk")
            }
            SdkVariant::Web => Some("Microsoft.NET.Sdk.Web"),
            SdkVariant::Worker => Some("Microsoft.NET.Sdk.Worker"),
            SdkVariant::BlazorWasm => Some("Microsoft.NET.Sdk.BlazorWebAssembly"),
            SdkVariant::WindowsDesktop => Some("Microsoft.NET.Sdk.WindowsDesktop"),
            SdkVariant::LegacyWebFramework => Some("MSBuild.SDK.SystemWeb"),
            SdkVariant::Unmigratable { .. } => None,
        }
    }

    /// Variants whose SDK includes web content (`wwwroot`, `*.json`, `*.cshtml`, ...)
    pub fn includes_web_content(&self) -> bool {
        matches!(
            self,
            SdkVariant::Web | SdkVariant::BlazorWasm | SdkVariant::LegacyWebFramework
        )
    }

    pub fn is_migratable(&self) -> bool {
        !matches!(self, SdkVariant::Unmigratable { .. })
    }
}

impl fmt::Display for SdkVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkVariant::StandardLibrary => write!(f, "StandardLibrary"),
            SdkVariant::Web => write!(f, "Web"),
            SdkVariant::WebFunctions => write!(f, "WebFunctions"),
            SdkVariant::Worker => write!(f, "Worker"),
            SdkVariant::BlazorWasm => write!(f, "BlazorWasm"),
            SdkVariant::WindowsDesktop => write!(f, "WindowsDesktop"),
            SdkVariant::Maui => write!(f, "Maui"),
            SdkVariant::LegacyWebFramework => write!(f, "LegacyWebFramework"),
            SdkVariant::Unmigratable { reason } => write!(f, "Unmigratable ({})", reason),
        }
    }
}

/// Routing flags computed alongside the variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationFlags {
    /// In-process functions project that should move to the isolated worker model
    pub needs_isolated_worker_migration: bool,
    /// Depends on System.Web-era web framework features
    pub web_framework_specific: bool,
    pub use_wpf: bool,
    pub use_windows_forms: bool,
    pub is_test_project: bool,
}

/// Result of classifying a legacy project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub variant: SdkVariant,
    pub multi_targeting: bool,
    /// All target frameworks; a single entry unless multi-targeting
    pub frameworks: Vec<String>,
    /// Primary target framework used for framework-dependent decisions
    pub target_framework: String,
    pub flags: ClassificationFlags,
    /// Lossy mappings and other remarks for the report
    pub notes: Vec<String>,
}

impl Classification {
    pub fn unmigratable(reason: impl Into<String>) -> Self {
        Self {
            variant: SdkVariant::Unmigratable {
                reason: reason.into(),
            },
            multi_targeting: false,
            frameworks: Vec::new(),
            target_framework: String::new(),
            flags: ClassificationFlags::default(),
            notes: Vec::new(),
        }
    }

    pub fn is_migratable(&self) -> bool {
        self.variant.is_migratable()
    }
}
