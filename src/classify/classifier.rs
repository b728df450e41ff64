//! Legacy project classification
//!
//! Decides which SDK a legacy project migrates to. Checks run in order of
//! specificity and the first match wins:
//!
//! 1. file extension hard stops (database, orchestration, shared projects, ...)
//! 2. declared package fingerprints (functions, Blazor, MAUI, worker hosts)
//! 3. legacy project type GUIDs (web, UWP, Office add-ins, Xamarin)
//! 4. explicit desktop UI items (WPF pages, WinForms forms)
//! 5. plain library/application fallback

use std::path::Path;

use tracing::debug;

use crate::identity::{AssemblyIdentity, PackageFolder};
use crate::project::EvaluatedProject;
use crate::util::starts_with_ci;

use super::frameworks::{
    is_net_framework, map_legacy_framework, needs_desktop_sdk, DEFAULT_MODERN_FRAMEWORK,
};
use super::variant::{Classification, ClassificationFlags, SdkVariant};

/// Existence check for files next to the project, injected so classification stays pure
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl<F: Fn(&Path) -> bool> FileProbe for F {
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Extensions of project types that need structural rewrites outside this tool
const UNMIGRATABLE_EXTENSIONS: &[(&str, &str)] = &[
    ("sqlproj", "database project"),
    ("dcproj", "container orchestration project"),
    ("shproj", "shared project"),
    ("projitems", "shared project"),
    ("wixproj", "installer project"),
    ("vcxproj", "native C++ project"),
    ("ccproj", "cloud service project"),
];

mod project_type {
    pub const WEB_APPLICATION: &str = "349c5851-65df-11da-9384-00065b846f21";
    pub const WEB_SITE: &str = "e24c65dc-7377-472b-9aba-bc803b73c61a";
    pub const MVC: &[&str] = &[
        "603c0e0b-db56-11dc-be95-000d561079b0",
        "f85e285d-a4e0-4152-9332-ab1d724d3325",
        "e53f8fea-eae0-44a6-8774-ffd645390401",
        "e3e379df-f4c6-4180-9b81-6769533abe47",
    ];
    pub const UWP: &str = "a5a43c5b-de2a-4c0c-9213-0a381af9435a";
    pub const OFFICE: &str = "baa0c2d2-18e2-41b9-852f-f413020caa33";
    pub const XAMARIN: &[&str] = &[
        "efba0ad7-5a72-4c68-af49-83d382785dcf",
        "feacfbd2-3405-455c-9665-78fe426c6842",
    ];
    pub const WPF: &str = "60dc8134-eba5-43b8-bcc9-bb4bc16c2548";
    pub const TEST: &str = "3ac096d0-a1c2-e12c-1390-a8335801fdab";
}

const TEST_PACKAGES: &[&str] = &[
    "microsoft.net.test.sdk",
    "mstest.testframework",
    "xunit",
    "nunit",
];

/// Classifier settings
#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    /// Replaces whatever frameworks the legacy project declares
    pub target_framework_override: Option<String>,
    /// Always added to multi-targeted projects so they run on a current runtime
    pub modern_fallback: String,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            target_framework_override: None,
            modern_fallback: DEFAULT_MODERN_FRAMEWORK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SdkTypeClassifier {
    options: ClassifierOptions,
}

impl SdkTypeClassifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }

    /// Classify a legacy project. Never fails: projects that cannot be converted get
    /// [`SdkVariant::Unmigratable`].
    pub fn classify(&self, project: &EvaluatedProject, probe: &dyn FileProbe) -> Classification {
        let extension = project.extension();
        if let Some((_, reason)) = UNMIGRATABLE_EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
        {
            return Classification::unmigratable(*reason);
        }

        let (frameworks, multi_targeting, mut notes) = self.resolve_frameworks(project);
        let target_framework = frameworks
            .first()
            .cloned()
            .unwrap_or_else(|| self.options.modern_fallback.clone());

        let packages = declared_packages(project);
        let guids = project_type_guids(project);
        let mut flags = ClassificationFlags {
            is_test_project: guids.iter().any(|g| g == project_type::TEST)
                || packages
                    .iter()
                    .any(|p| TEST_PACKAGES.contains(&p.as_str())),
            ..Default::default()
        };

        let variant = if let Some(variant) = fingerprint_variant(&packages, &mut flags) {
            variant
        } else if probe.exists(&project.project_dir().join("host.json")) {
            SdkVariant::WebFunctions
        } else if let Some(variant) = guid_variant(&guids, &target_framework, &mut flags) {
            variant
        } else {
            SdkVariant::StandardLibrary
        };

        if let SdkVariant::Unmigratable { reason } = variant {
            return Classification::unmigratable(reason);
        }

        let variant = self.apply_desktop_probes(project, &guids, &target_framework, variant, &mut flags);
        if variant == SdkVariant::Maui && guids.iter().any(|g| project_type::XAMARIN.contains(&g.as_str())) {
            notes.push("Xamarin project: platform-specific code needs manual porting to MAUI".to_string());
        }

        debug!(
            project = %project.path.display(),
            %variant,
            %target_framework,
            multi_targeting,
            "Classified project"
        );

        Classification {
            variant,
            multi_targeting,
            frameworks,
            target_framework,
            flags,
            notes,
        }
    }

    /// Desktop UI items select the WindowsDesktop SDK only for frameworks that need it;
    /// otherwise they just turn on the matching feature flag.
    fn apply_desktop_probes(
        &self,
        project: &EvaluatedProject,
        guids: &[String],
        target_framework: &str,
        variant: SdkVariant,
        flags: &mut ClassificationFlags,
    ) -> SdkVariant {
        let items = project.all_items();
        flags.use_wpf = guids.iter().any(|g| g == project_type::WPF)
            || items
                .iter()
                .any(|i| i.is_type("ApplicationDefinition") || i.is_type("Page"));
        flags.use_windows_forms = items.iter().any(|i| {
            i.is_type("Compile")
                && i.metadata("SubType").is_some_and(|s| {
                    s.eq_ignore_ascii_case("Form") || s.eq_ignore_ascii_case("UserControl")
                })
        });

        if variant == SdkVariant::StandardLibrary
            && (flags.use_wpf || flags.use_windows_forms)
            && needs_desktop_sdk(target_framework)
        {
            SdkVariant::WindowsDesktop
        } else {
            variant
        }
    }

    /// Resolve the target framework list.
    ///
    /// Returns `(frameworks, multi_targeting, notes)`.
    fn resolve_frameworks(&self, project: &EvaluatedProject) -> (Vec<String>, bool, Vec<String>) {
        let mut notes = Vec::new();

        if let Some(ref tfm) = self.options.target_framework_override {
            return (vec![tfm.clone()], false, notes);
        }

        let identifier = project.property("TargetFrameworkIdentifier");
        let profile = project.property("TargetFrameworkProfile");

        let mut distinct: Vec<String> = Vec::new();
        for (value, _condition) in project.property_declarations("TargetFrameworkVersion") {
            if !value.is_empty() && !distinct.iter().any(|d| d.eq_ignore_ascii_case(&value)) {
                distinct.push(value);
            }
        }

        let mut map = |version: &str| {
            let mapped = map_legacy_framework(version, identifier.as_deref(), profile.as_deref());
            if let Some(note) = mapped.note {
                notes.push(note);
            }
            mapped.moniker
        };

        match distinct.len() {
            0 => {
                if let Some(tfms) = project.property("TargetFrameworks") {
                    let list: Vec<String> = tfms
                        .split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                    let multi = list.len() > 1;
                    (list, multi, notes)
                } else if let Some(tfm) = project.property("TargetFramework") {
                    (vec![tfm], false, notes)
                } else {
                    // MSBuild's own default when nothing is declared
                    let tfm = map("v4.0");
                    notes.push("No TargetFrameworkVersion declared, assuming v4.0".to_string());
                    (vec![tfm], false, notes)
                }
            }
            1 => {
                let tfm = map(&distinct[0]);
                (vec![tfm], false, notes)
            }
            _ => {
                let mut frameworks: Vec<String> = Vec::new();
                for version in &distinct {
                    let tfm = map(version);
                    if !frameworks.contains(&tfm) {
                        frameworks.push(tfm);
                    }
                }
                if !frameworks.contains(&self.options.modern_fallback) {
                    frameworks.push(self.options.modern_fallback.clone());
                }
                (frameworks, true, notes)
            }
        }
    }
}

/// Lowercase package ids the project declares, from PackageReference items,
/// packages.config, and package folders in reference hint paths.
fn declared_packages(project: &EvaluatedProject) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    let mut add = |id: &str| {
        let id = id.trim().to_ascii_lowercase();
        if !id.is_empty() && !packages.contains(&id) {
            packages.push(id);
        }
    };

    for item in project.all_items() {
        if item.is_type("PackageReference") {
            add(&item.include);
        } else if item.is_type("Reference") {
            add(&AssemblyIdentity::parse(&item.include).name);
            if let Some(folder) = item.metadata("HintPath").and_then(PackageFolder::from_hint_path) {
                add(&folder.package_id);
            }
        }
    }
    for package in &project.packages_config {
        add(&package.package_id);
    }
    packages
}

fn project_type_guids(project: &EvaluatedProject) -> Vec<String> {
    project
        .property("ProjectTypeGuids")
        .unwrap_or_default()
        .split(';')
        .map(|g| g.trim().trim_matches(['{', '}']).to_ascii_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

fn fingerprint_variant(packages: &[String], flags: &mut ClassificationFlags) -> Option<SdkVariant> {
    let has = |prefix: &str| packages.iter().any(|p| starts_with_ci(p, prefix));
    let has_exact = |id: &str| packages.iter().any(|p| p == id);

    if has("microsoft.azure.functions.worker") {
        return Some(SdkVariant::WebFunctions);
    }
    if has_exact("microsoft.net.sdk.functions") || has("microsoft.azure.webjobs") {
        flags.needs_isolated_worker_migration = true;
        return Some(SdkVariant::WebFunctions);
    }
    if has("microsoft.aspnetcore.components.webassembly") {
        return Some(SdkVariant::BlazorWasm);
    }
    if has("microsoft.maui") || has_exact("xamarin.forms") {
        return Some(SdkVariant::Maui);
    }
    if has_exact("microsoft.extensions.hosting.windowsservices")
        || has_exact("microsoft.extensions.hosting.systemd")
    {
        return Some(SdkVariant::Worker);
    }
    if has_exact("microsoft.aspnetcore")
        || has_exact("microsoft.aspnetcore.app")
        || has_exact("microsoft.aspnetcore.server.kestrel")
    {
        return Some(SdkVariant::Web);
    }
    None
}

fn guid_variant(
    guids: &[String],
    target_framework: &str,
    flags: &mut ClassificationFlags,
) -> Option<SdkVariant> {
    let has = |guid: &str| guids.iter().any(|g| g == guid);

    if has(project_type::UWP) {
        return Some(SdkVariant::Unmigratable {
            reason: "UWP project".to_string(),
        });
    }
    if has(project_type::OFFICE) {
        return Some(SdkVariant::Unmigratable {
            reason: "Office add-in project".to_string(),
        });
    }
    if project_type::XAMARIN.iter().any(|g| has(g)) {
        return Some(SdkVariant::Maui);
    }
    if has(project_type::WEB_APPLICATION)
        || has(project_type::WEB_SITE)
        || project_type::MVC.iter().any(|g| has(g))
    {
        // Old-framework web projects still need a web-capable SDK
        if is_net_framework(target_framework) {
            flags.web_framework_specific = true;
            return Some(SdkVariant::LegacyWebFramework);
        }
        return Some(SdkVariant::Web);
    }
    None
}
