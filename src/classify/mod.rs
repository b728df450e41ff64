//! Project classification: which SDK a legacy project migrates to

mod classifier;
mod frameworks;
mod variant;

pub use classifier::{ClassifierOptions, FileProbe, FsProbe, SdkTypeClassifier};
pub use frameworks::{
    framework_family, is_net_framework, map_legacy_framework, matches_framework_pattern,
    needs_desktop_sdk, portable_profile_to_netstandard, with_windows_platform, FrameworkFamily,
    MappedFramework, DEFAULT_MODERN_FRAMEWORK,
};
pub use variant::{Classification, ClassificationFlags, SdkVariant};
