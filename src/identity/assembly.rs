//! Strong-name assembly identities as written in `Reference Include` attributes

use std::fmt;

/// A parsed assembly identity.
///
/// `Include="Newtonsoft.Json, Version=12.0.0.0, Culture=neutral, PublicKeyToken=30ad4fe6b2a6aeed"`
/// parses to name `Newtonsoft.Json`, version `12.0.0.0`, no culture (neutral) and token
/// `30ad4fe6b2a6aeed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    pub name: String,
    pub version: Option<String>,
    /// `None` for culture-neutral assemblies
    pub culture: Option<String>,
    /// Lowercase hex; `None` when absent or `null`
    pub public_key_token: Option<String>,
}

impl AssemblyIdentity {
    /// Parse a comma-delimited identity string. Unknown keys (e.g. `processorArchitecture`)
    /// are ignored.
    pub fn parse(include: &str) -> Self {
        let mut parts = include.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();

        let mut identity = AssemblyIdentity {
            name,
            version: None,
            culture: None,
            public_key_token: None,
        };

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" if !value.is_empty() => identity.version = Some(value.to_string()),
                "culture" => {
                    if !value.is_empty() && !value.eq_ignore_ascii_case("neutral") {
                        identity.culture = Some(value.to_string());
                    }
                }
                "publickeytoken" => {
                    if !value.is_empty() && !value.eq_ignore_ascii_case("null") {
                        identity.public_key_token = Some(value.to_ascii_lowercase());
                    }
                }
                _ => {}
            }
        }

        identity
    }

    /// Name-only comparison used for lookups.
    pub fn same_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Full identity comparison used for validation. Absent components on `other`
    /// are treated as wildcards.
    pub fn matches(&self, other: &AssemblyIdentity) -> bool {
        if !self.same_name(&other.name) {
            return false;
        }
        let component_matches = |ours: &Option<String>, theirs: &Option<String>| match theirs {
            Some(t) => ours.as_deref().is_some_and(|o| o.eq_ignore_ascii_case(t)),
            None => true,
        };
        component_matches(&self.version, &other.version)
            && component_matches(&self.culture, &other.culture)
            && component_matches(&self.public_key_token, &other.public_key_token)
    }

    /// `major.minor` prefix of the assembly version, if any.
    pub fn major_minor(&self) -> Option<(u64, u64)> {
        let version = self.version.as_deref()?;
        let mut parts = version.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
        Some((major, minor))
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ref version) = self.version {
            write!(f, ", Version={}", version)?;
        }
        write!(f, ", Culture={}", self.culture.as_deref().unwrap_or("neutral"))?;
        match self.public_key_token {
            Some(ref token) => write!(f, ", PublicKeyToken={}", token),
            None => write!(f, ", PublicKeyToken=null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_identity() {
        let id = AssemblyIdentity::parse(
            "Newtonsoft.Json, Version=12.0.0.0, Culture=neutral, PublicKeyToken=30AD4FE6B2A6AEED, processorArchitecture=MSIL",
        );
        assert_eq!(id.name, "Newtonsoft.Json");
        assert_eq!(id.version.as_deref(), Some("12.0.0.0"));
        assert_eq!(id.culture, None);
        assert_eq!(id.public_key_token.as_deref(), Some("30ad4fe6b2a6aeed"));
        assert_eq!(id.major_minor(), Some((12, 0)));
    }

    #[test]
    fn test_parse_bare_name() {
        let id = AssemblyIdentity::parse("System.Configuration");
        assert_eq!(id.name, "System.Configuration");
        assert!(id.version.is_none());
        assert!(id.public_key_token.is_none());
    }

    #[test]
    fn test_null_token() {
        let id = AssemblyIdentity::parse("MyLib, Version=1.0.0.0, PublicKeyToken=null");
        assert!(id.public_key_token.is_none());
    }

    #[test]
    fn test_matches_treats_missing_as_wildcard() {
        let full = AssemblyIdentity::parse("Foo, Version=1.0.0.0, PublicKeyToken=abcdef0123456789");
        let partial = AssemblyIdentity::parse("foo");
        assert!(full.matches(&partial));
        assert!(!partial.matches(&full));
    }
}
