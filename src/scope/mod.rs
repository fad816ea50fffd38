//! Dependency scope construction.
//!
//! One binary variant owns three resolution scopes: compile headers, link
//! libraries, runtime libraries. All three inherit the binary's base
//! dependency declarations and carry filter attributes derived from the
//! same [`VariantIdentity`], differing only in usage tag. Creating the
//! scope set also registers the header-archive transform with the engine,
//! so archives published under `c-plus-plus-api` become obtainable in
//! directory form without being re-declared per binary.

use std::sync::Arc;

use thiserror::Error;

use crate::core::attributes::VariantAttributes;
use crate::core::dependency::DependencySet;
use crate::core::usage::Usage;
use crate::core::variant::{IdentityError, VariantIdentity};
use crate::materialize::HeaderArchiveTransform;
use crate::resolver::ResolutionEngine;

/// Error building a binary's scope set.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The supplied identity is missing required coordinates.
    #[error("cannot build dependency scopes")]
    IncompleteIdentity {
        #[from]
        source: IdentityError,
    },
}

/// One attribute-filtered dependency resolution scope.
///
/// Exists only to be resolved by its binary (never published for
/// consumption), and is immutable once built: the filter attributes can
/// never drift apart from the sibling scopes'.
#[derive(Debug, Clone)]
pub struct DependencyScope {
    name: String,
    attributes: VariantAttributes,
    dependencies: DependencySet,
}

impl DependencyScope {
    fn new(name: String, attributes: VariantAttributes, dependencies: DependencySet) -> Self {
        DependencyScope {
            name,
            attributes,
            dependencies,
        }
    }

    /// Get the scope's name (e.g. "mainDebug-cpp-compile").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the usage tag this scope is declared under.
    pub fn usage(&self) -> Usage {
        self.attributes.usage
    }

    /// Get the full attribute filter.
    pub fn attributes(&self) -> &VariantAttributes {
        &self.attributes
    }

    /// Get the inherited base dependency declarations.
    pub fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    /// Scopes built here are resolution-only, never published.
    pub fn is_consumable(&self) -> bool {
        false
    }
}

/// The three dependency scopes of one binary variant.
#[derive(Debug, Clone)]
pub struct ScopeSet {
    compile: DependencyScope,
    link: DependencyScope,
    runtime: DependencyScope,
}

impl ScopeSet {
    /// Build the compile, link, and runtime scopes for a binary variant.
    ///
    /// Validates the identity before constructing anything: on failure no
    /// scope exists and nothing has been registered. On success the
    /// header-archive transform is registered (idempotently) with the
    /// engine for the `c-plus-plus-api` to `cplusplus-api-dirs` mapping.
    pub fn for_variant(
        engine: &ResolutionEngine,
        identity: &VariantIdentity,
        dependencies: DependencySet,
    ) -> Result<ScopeSet, ScopeError> {
        identity.validate()?;

        let scope = |usage: Usage, suffix: &str| {
            DependencyScope::new(
                format!("{}-{}", identity.name(), suffix),
                VariantAttributes::for_identity(identity, usage),
                dependencies.clone(),
            )
        };

        let set = ScopeSet {
            compile: scope(Usage::CppApi, "cpp-compile"),
            link: scope(Usage::NativeLink, "native-link"),
            runtime: scope(Usage::NativeRuntime, "native-runtime"),
        };

        engine.register_transform(
            Usage::CppApi,
            Usage::CppApiDirs,
            Arc::new(HeaderArchiveTransform::new(engine.transform_cache())),
        );

        tracing::debug!("created dependency scopes for variant `{}`", identity.name());
        Ok(set)
    }

    /// The compile-headers scope.
    pub fn compile(&self) -> &DependencyScope {
        &self.compile
    }

    /// The link-libraries scope.
    pub fn link(&self) -> &DependencyScope {
        &self.link
    }

    /// The runtime-libraries scope.
    pub fn runtime(&self) -> &DependencyScope {
        &self.runtime
    }
}
