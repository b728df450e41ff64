//! Version conflict strategies

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How to pick one version when projects request different versions of a package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ConflictStrategy {
    #[default]
    #[serde(rename = "highest")]
    UseHighest,
    #[serde(rename = "lowest")]
    UseLowest,
    /// Highest version without a prerelease label, unless only prereleases exist
    #[serde(rename = "latest-stable")]
    UseLatestStable,
    /// Version requested by the most projects; ties go to the higher version
    #[serde(rename = "most-common")]
    UseMostCommon,
    /// Highest version when all requests share a major version
    #[serde(rename = "semantic")]
    SemanticCompatible,
    /// Highest version proven compatible with every target framework
    #[serde(rename = "framework")]
    FrameworkCompatible,
}

impl ConflictStrategy {
    pub const ALL: &'static [ConflictStrategy] = &[
        ConflictStrategy::UseHighest,
        ConflictStrategy::UseLowest,
        ConflictStrategy::UseLatestStable,
        ConflictStrategy::UseMostCommon,
        ConflictStrategy::SemanticCompatible,
        ConflictStrategy::FrameworkCompatible,
    ];

    /// Name used on the command line and in `sdkmigrate.toml`
    pub fn name(&self) -> &'static str {
        match self {
            ConflictStrategy::UseHighest => "highest",
            ConflictStrategy::UseLowest => "lowest",
            ConflictStrategy::UseLatestStable => "latest-stable",
            ConflictStrategy::UseMostCommon => "most-common",
            ConflictStrategy::SemanticCompatible => "semantic",
            ConflictStrategy::FrameworkCompatible => "framework",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|s| s.name()).collect();
                format!("unknown strategy '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
