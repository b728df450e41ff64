//! Legacy-to-SDK-style content migration and the project writer

mod conditions;
mod descriptor;
mod exclusions;
mod implicit;
mod items;
mod migrator;
mod properties;
mod targets;
pub(crate) mod writer;

pub use conditions::{mentions_framework_version, rewrite_condition};
pub use descriptor::{
    DescriptorItem, ItemSpec, ProjectNode, SdkItemGroup, SdkProject, SdkPropertyGroup,
};
pub use exclusions::{compute_exclusions, FsSourceTree, SourceTree};
pub use implicit::{is_build_output, is_inside_project, source_extension, ImplicitRules};
pub use migrator::{apply_package_versions, AppliedVersions, ItemAndPropertyMigrator, MigrationOutput, DEFAULT_SDK};
pub use properties::{is_sdk_default, is_sdk_owned, ConfigurationScope, ProjectSettings};
pub use writer::{write_project, LINE_ENDING};
