//! Native binary aggregate.
//!
//! Ties one variant identity to its three dependency scopes and its
//! materialized include path. Creating the binary wires everything up;
//! nothing resolves until a consumer reads one of the file sets.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::dependency::DependencySet;
use crate::core::variant::VariantIdentity;
use crate::include_path::IncludePath;
use crate::resolver::{ResolutionEngine, ResolveError};
use crate::scope::{ScopeError, ScopeSet};

/// One binary variant and its resolvable dependency file sets.
#[derive(Debug, Clone)]
pub struct NativeBinary {
    identity: VariantIdentity,
    scopes: ScopeSet,
    include_path: IncludePath,
    engine: Arc<ResolutionEngine>,
}

impl NativeBinary {
    /// Define a binary variant.
    ///
    /// `header_dirs` are the component's own declared header directories;
    /// `dependencies` is the base declaration set all three scopes inherit.
    /// Fails fast on an incomplete identity, before any scope exists.
    pub fn new(
        engine: Arc<ResolutionEngine>,
        identity: VariantIdentity,
        dependencies: DependencySet,
        header_dirs: Vec<PathBuf>,
    ) -> Result<Self, ScopeError> {
        let scopes = ScopeSet::for_variant(&engine, &identity, dependencies)?;
        let include_path =
            IncludePath::new(header_dirs, scopes.compile().clone(), Arc::clone(&engine));

        Ok(NativeBinary {
            identity,
            scopes,
            include_path,
            engine,
        })
    }

    /// The binary's variant identity.
    pub fn identity(&self) -> &VariantIdentity {
        &self.identity
    }

    /// The binary's three dependency scopes.
    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    /// The compile step's include path (lazy; extraction happens on first
    /// read).
    pub fn compile_include_path(&self) -> &IncludePath {
        &self.include_path
    }

    /// Resolve the link-libraries file set.
    pub fn link_libraries(&self) -> Result<Vec<PathBuf>, ResolveError> {
        self.engine.resolve(self.scopes.link())
    }

    /// Resolve the runtime-libraries file set.
    pub fn runtime_libraries(&self) -> Result<Vec<PathBuf>, ResolveError> {
        self.engine.resolve(self.scopes.runtime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::core::attributes::VariantAttributes;
    use crate::core::dependency::{Dependency, PublishedVariant};
    use crate::core::usage::Usage;
    use crate::core::variant::{
        MachineArchitecture, OperatingSystemFamily, TargetMachine, ToolProviderRef, ToolchainRef,
    };

    fn identity(name: &str) -> VariantIdentity {
        VariantIdentity::builder(name)
            .debuggable(true)
            .target_machine(TargetMachine::new(
                OperatingSystemFamily::Linux,
                MachineArchitecture::X86_64,
            ))
            .toolchain(ToolchainRef::new("clang"))
            .tool_provider(ToolProviderRef::new("clang-linux"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_binary_wires_three_scopes() {
        let tmp = TempDir::new().unwrap();
        let engine = Arc::new(ResolutionEngine::with_transform_root(
            tmp.path().join("transforms"),
        ));
        let identity = identity("appDebug");

        let mut deps = DependencySet::new();
        deps.add(Dependency::new("zlib"));

        engine.publish(
            "zlib",
            PublishedVariant::new(
                VariantAttributes::for_identity(&identity, Usage::NativeLink),
                tmp.path().join("libz.a"),
            ),
        );
        engine.publish(
            "zlib",
            PublishedVariant::new(
                VariantAttributes::for_identity(&identity, Usage::NativeRuntime),
                tmp.path().join("libz.so"),
            ),
        );

        let binary = NativeBinary::new(engine, identity, deps, vec![]).unwrap();

        assert_eq!(binary.link_libraries().unwrap(), vec![tmp.path().join("libz.a")]);
        assert_eq!(
            binary.runtime_libraries().unwrap(),
            vec![tmp.path().join("libz.so")]
        );
        assert!(binary.compile_include_path().dirs().unwrap().is_empty());
    }
}
