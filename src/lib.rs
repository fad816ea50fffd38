//! Stevedore - per-variant dependency scopes and header-archive
//! materialization for native builds.
//!
//! For each binary variant a native build defines, this crate derives the
//! three dependency resolution scopes the binary needs (compile-time
//! headers, link-time libraries, runtime libraries) from a single variant
//! identity, and converts packaged header archives into plain directory
//! trees the compiler can consume, exactly once per archive.

pub mod binary;
pub mod core;
pub mod include_path;
pub mod materialize;
pub mod resolver;
pub mod scope;
pub mod util;

pub use binary::NativeBinary;
pub use crate::core::{
    Dependency, DependencySet, MachineArchitecture, OperatingSystemFamily, PublishedVariant,
    TargetMachine, ToolProviderRef, ToolchainRef, Usage, VariantAttributes, VariantIdentity,
};
pub use include_path::IncludePath;
pub use materialize::{ArtifactTransform, HeaderArchiveTransform, MaterializeError, TransformCache};
pub use resolver::{ResolutionEngine, ResolveError};
pub use scope::{DependencyScope, ScopeError, ScopeSet};
pub use util::context::GlobalContext;
