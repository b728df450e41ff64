//! Target framework monikers
//!
//! Maps legacy `TargetFrameworkVersion`/`TargetFrameworkIdentifier`/`TargetFrameworkProfile`
//! triples to SDK-style target framework monikers and groups monikers into families.

/// Framework family of a target framework moniker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkFamily {
    /// `net20` .. `net481`
    NetFramework,
    /// `netcoreapp1.0` .. `netcoreapp3.1`
    NetCoreApp,
    /// `net5.0` and later
    Net,
    /// `netstandard1.0` .. `netstandard2.1`
    NetStandard,
    Unknown,
}

/// Frameworks that still need the dedicated `Microsoft.NET.Sdk.WindowsDesktop` SDK.
/// Later frameworks use `UseWPF`/`UseWindowsForms` on the default SDK.
pub const DESKTOP_SDK_FRAMEWORKS: &[&str] = &["netcoreapp3.0", "netcoreapp3.1"];

/// Default moniker unioned into multi-targeted projects
pub const DEFAULT_MODERN_FRAMEWORK: &str = "net8.0";

/// Portable class library profiles and the .NET Standard version they correspond to
const PORTABLE_PROFILES: &[(&str, &str)] = &[
    ("Profile7", "netstandard1.1"),
    ("Profile31", "netstandard1.0"),
    ("Profile32", "netstandard1.2"),
    ("Profile44", "netstandard1.2"),
    ("Profile49", "netstandard1.0"),
    ("Profile78", "netstandard1.0"),
    ("Profile84", "netstandard1.0"),
    ("Profile111", "netstandard1.1"),
    ("Profile151", "netstandard1.2"),
    ("Profile157", "netstandard1.0"),
    ("Profile259", "netstandard1.0"),
];

/// Used for portable profiles missing from the table
const UNMAPPED_PORTABLE_FALLBACK: &str = "netstandard2.0";

/// Strip any platform suffix: `net8.0-windows` → `net8.0`, `net40-client` → `net40`
fn base_moniker(tfm: &str) -> String {
    tfm.trim()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub fn framework_family(tfm: &str) -> FrameworkFamily {
    let base = base_moniker(tfm);
    if base.starts_with("netstandard") {
        FrameworkFamily::NetStandard
    } else if base.starts_with("netcoreapp") {
        FrameworkFamily::NetCoreApp
    } else if let Some(rest) = base.strip_prefix("net") {
        if rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_digit()) {
            FrameworkFamily::Unknown
        } else if rest.contains('.') {
            FrameworkFamily::Net
        } else if rest.chars().all(|c| c.is_ascii_digit()) {
            FrameworkFamily::NetFramework
        } else {
            FrameworkFamily::Unknown
        }
    } else {
        FrameworkFamily::Unknown
    }
}

pub fn is_net_framework(tfm: &str) -> bool {
    framework_family(tfm) == FrameworkFamily::NetFramework
}

/// Whether `tfm` requires the dedicated desktop SDK
pub fn needs_desktop_sdk(tfm: &str) -> bool {
    let base = base_moniker(tfm);
    DESKTOP_SDK_FRAMEWORKS.iter().any(|f| *f == base)
}

/// Match a framework pattern: an exact moniker, or one of the family wildcards
/// `netframework`, `netcoreapp`, `net`, `netstandard`.
pub fn matches_framework_pattern(pattern: &str, tfm: &str) -> bool {
    let family = framework_family(tfm);
    match pattern.to_ascii_lowercase().as_str() {
        "netframework" => family == FrameworkFamily::NetFramework,
        "netcoreapp" => family == FrameworkFamily::NetCoreApp,
        "net" => family == FrameworkFamily::Net,
        "netstandard" => family == FrameworkFamily::NetStandard,
        exact => base_moniker(tfm) == exact || tfm.eq_ignore_ascii_case(exact),
    }
}

/// Append the `-windows` platform suffix needed for WPF/WinForms on `net5.0+`.
pub fn with_windows_platform(tfm: &str) -> String {
    if framework_family(tfm) == FrameworkFamily::Net && !tfm.contains('-') {
        format!("{}-windows", tfm)
    } else {
        tfm.to_string()
    }
}

pub fn portable_profile_to_netstandard(profile: &str) -> Option<&'static str> {
    PORTABLE_PROFILES
        .iter()
        .find(|(p, _)| p.eq_ignore_ascii_case(profile.trim()))
        .map(|(_, tfm)| *tfm)
}

/// A legacy framework mapped to a moniker, with a note when the mapping was lossy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFramework {
    pub moniker: String,
    pub note: Option<String>,
}

/// Map a legacy framework declaration to a target framework moniker.
///
/// - (`v4.7.2`, `.NETFramework`) → `net472`
/// - (`v4.0`, `.NETFramework`, `Client`) → `net40`
/// - (`v4.5`, `.NETPortable`, `Profile259`) → `netstandard1.0`
/// - (`v3.1`, `.NETCoreApp`) → `netcoreapp3.1`
pub fn map_legacy_framework(
    version: &str,
    identifier: Option<&str>,
    profile: Option<&str>,
) -> MappedFramework {
    let number = version.trim().trim_start_matches(['v', 'V']);
    let identifier = identifier.unwrap_or(".NETFramework").trim();

    match identifier.to_ascii_lowercase().as_str() {
        ".netportable" => {
            let profile = profile.unwrap_or_default();
            match portable_profile_to_netstandard(profile) {
                Some(tfm) => MappedFramework {
                    moniker: tfm.to_string(),
                    note: None,
                },
                None => MappedFramework {
                    moniker: UNMAPPED_PORTABLE_FALLBACK.to_string(),
                    note: Some(format!(
                        "Portable profile '{}' has no .NET Standard equivalent, using {}",
                        profile, UNMAPPED_PORTABLE_FALLBACK
                    )),
                },
            }
        }
        ".netcoreapp" => {
            let moniker = if number.starts_with(|c: char| c >= '5' && c.is_ascii_digit())
                || number.split('.').next().is_some_and(|m| m.len() > 1)
            {
                format!("net{}", number)
            } else {
                format!("netcoreapp{}", number)
            };
            MappedFramework {
                moniker,
                note: None,
            }
        }
        ".netstandard" => MappedFramework {
            moniker: format!("netstandard{}", number),
            note: None,
        },
        ".netframework" => MappedFramework {
            moniker: format!("net{}", number.replace('.', "")),
            note: profile
                .filter(|p| p.eq_ignore_ascii_case("client"))
                .map(|_| "Client profile dropped; SDK projects target the full framework".to_string()),
        },
        other => MappedFramework {
            moniker: format!("net{}", number.replace('.', "")),
            note: Some(format!(
                "Unrecognized framework identifier '{}', treated as .NET Framework",
                other
            )),
        },
    }
}
