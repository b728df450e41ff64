//! Reference → package resolution

mod assembly_resolver;
mod builtin;
mod cache;
mod mapping;
mod package_resolver;

pub use assembly_resolver::{
    AssemblyReferenceResolver, ResolvedReferences, REASON_NO_PACKAGE, REASON_TOKEN_MISMATCH,
    REASON_VALIDATION_FAILED,
};
pub use builtin::{is_sdk_implicit_framework_reference, is_shared_framework_assembly};
pub use cache::ResolutionCache;
pub use mapping::{lookup as lookup_framework_mapping, FrameworkMapping, MappingHit, FRAMEWORK_MAPPINGS};
pub use package_resolver::{PackageCandidate, PackageInfo, PackageResolver, StaticPackageResolver};
