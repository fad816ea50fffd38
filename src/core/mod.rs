//! Core data model: variant identities, attribute filters, and dependency
//! declarations.

pub mod attributes;
pub mod dependency;
pub mod usage;
pub mod variant;

pub use attributes::VariantAttributes;
pub use dependency::{Dependency, DependencySet, PublishedVariant};
pub use usage::Usage;
pub use variant::{
    IdentityError, MachineArchitecture, OperatingSystemFamily, TargetMachine, ToolProviderRef,
    ToolchainRef, VariantIdentity,
};
