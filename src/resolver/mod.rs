//! Dependency resolution engine.
//!
//! The in-memory embodiment of the resolution collaborator: components
//! publish variants (artifact + attributes), scopes resolve by structural
//! attribute match, and artifact views resolve under an alternate usage
//! tag, running registered transforms on demand when only the declared
//! shape was published.
//!
//! The engine does no version solving and no fetching; selecting among
//! published variants by attribute filter is its entire capability.

pub mod errors;
pub mod registry;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::core::attributes::VariantAttributes;
use crate::core::dependency::PublishedVariant;
use crate::core::usage::Usage;
use crate::materialize::{ArtifactTransform, TransformCache};
use crate::scope::DependencyScope;
use crate::util::context::GlobalContext;

pub use errors::ResolveError;
pub use registry::TransformRegistry;

/// Attribute-filtering resolution engine shared by every binary in a build.
///
/// Safe to call from multiple worker threads: the published-variant table
/// and the transform registry sit behind locks, and transforms serialize
/// same-artifact work through their own cache.
pub struct ResolutionEngine {
    published: RwLock<HashMap<String, Vec<PublishedVariant>>>,
    transforms: TransformRegistry,
    transform_cache: Arc<TransformCache>,
}

impl ResolutionEngine {
    /// Create an engine writing transform outputs under the context's
    /// transform root.
    pub fn new(ctx: &GlobalContext) -> Self {
        Self::with_transform_root(ctx.transform_root())
    }

    /// Create an engine with an explicit transform output root.
    pub fn with_transform_root(root: impl Into<PathBuf>) -> Self {
        ResolutionEngine {
            published: RwLock::new(HashMap::new()),
            transforms: TransformRegistry::new(),
            transform_cache: Arc::new(TransformCache::new(root)),
        }
    }

    /// The shared transform output cache.
    pub fn transform_cache(&self) -> Arc<TransformCache> {
        Arc::clone(&self.transform_cache)
    }

    /// The transform registry.
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Record a variant a component publishes.
    pub fn publish(&self, component: impl Into<String>, variant: PublishedVariant) {
        let component = component.into();
        tracing::debug!(
            "published `{}` under {}",
            component,
            variant.attributes()
        );
        let mut published = self.published.write().unwrap();
        match published.entry(component) {
            Entry::Occupied(mut entry) => entry.get_mut().push(variant),
            Entry::Vacant(entry) => {
                entry.insert(vec![variant]);
            }
        }
    }

    /// Register a transform mapping one usage's artifacts to another's.
    /// Idempotent; see [`TransformRegistry::register`].
    pub fn register_transform(
        &self,
        from: Usage,
        to: Usage,
        transform: Arc<dyn ArtifactTransform>,
    ) {
        self.transforms.register(from, to, transform);
    }

    /// Resolve a scope to its artifact file set under its declared usage.
    pub fn resolve(&self, scope: &DependencyScope) -> Result<Vec<PathBuf>, ResolveError> {
        self.resolve_view(scope, scope.usage())
    }

    /// Resolve a scope under an alternate usage tag (an artifact view).
    ///
    /// Per declared dependency: variants published directly under the view
    /// usage pass through; otherwise variants published under the scope's
    /// own usage go through the registered `(scope usage, view usage)`
    /// transform. A component publishing under the relevant usages whose
    /// other attributes all mismatch is an error; one publishing only under
    /// unrelated usages contributes nothing.
    pub fn resolve_view(
        &self,
        scope: &DependencyScope,
        view: Usage,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let view_filter = scope.attributes().with_usage(view);
        let published = self.published.read().unwrap();

        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |files: &mut Vec<PathBuf>, path: PathBuf| {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        };

        for dependency in scope.dependencies().iter() {
            let variants = published.get(dependency.name()).ok_or_else(|| {
                ResolveError::UnknownComponent {
                    component: dependency.name().to_string(),
                }
            })?;

            let direct = select(variants, &view_filter);
            if !direct.is_empty() {
                for variant in direct {
                    push(&mut files, variant.artifact().to_path_buf());
                }
                continue;
            }

            let declared = select(variants, scope.attributes());
            if !declared.is_empty() {
                let transform = self
                    .transforms
                    .get(scope.usage(), view)
                    .ok_or_else(|| ResolveError::NoRegisteredTransform {
                        component: dependency.name().to_string(),
                        from: scope.usage(),
                        to: view,
                    })?;

                for variant in declared {
                    let outputs = transform.transform(variant.artifact()).map_err(|source| {
                        ResolveError::Transform {
                            component: dependency.name().to_string(),
                            source,
                        }
                    })?;
                    for output in outputs {
                        push(&mut files, output);
                    }
                }
                continue;
            }

            // Nothing matched in full. Published under the relevant usage
            // with mismatched attributes is a hard error; published only
            // under other usages means this scope simply doesn't see it.
            if has_usage(variants, view) || has_usage(variants, scope.usage()) {
                return Err(ResolveError::NoMatchingVariant {
                    component: dependency.name().to_string(),
                    requested: view_filter.to_string(),
                    available: variants.iter().map(|v| v.attributes().to_string()).collect(),
                });
            }

            tracing::debug!(
                "`{}` publishes nothing under {} for scope `{}`",
                dependency.name(),
                view,
                scope.name()
            );
        }

        tracing::debug!(
            "resolved scope `{}` under {}: {} file(s)",
            scope.name(),
            view,
            files.len()
        );
        Ok(files)
    }
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("components", &self.published.read().unwrap().len())
            .field("transforms", &self.transforms)
            .finish()
    }
}

fn select<'a>(
    variants: &'a [PublishedVariant],
    filter: &VariantAttributes,
) -> Vec<&'a PublishedVariant> {
    variants
        .iter()
        .filter(|variant| filter.matches(variant.attributes()))
        .collect()
}

fn has_usage(variants: &[PublishedVariant], usage: Usage) -> bool {
    variants.iter().any(|variant| variant.attributes().usage == usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::core::dependency::{Dependency, DependencySet};
    use crate::core::variant::{
        MachineArchitecture, OperatingSystemFamily, TargetMachine, ToolProviderRef, ToolchainRef,
        VariantIdentity,
    };
    use crate::scope::ScopeSet;

    fn identity(name: &str, debuggable: bool) -> VariantIdentity {
        VariantIdentity::builder(name)
            .debuggable(debuggable)
            .target_machine(TargetMachine::new(
                OperatingSystemFamily::Linux,
                MachineArchitecture::X86_64,
            ))
            .toolchain(ToolchainRef::new("gcc"))
            .tool_provider(ToolProviderRef::new("gcc-linux"))
            .build()
            .unwrap()
    }

    fn deps(names: &[&str]) -> DependencySet {
        names.iter().map(|n| Dependency::new(*n)).collect()
    }

    #[test]
    fn test_usage_filters_independently_per_scope() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity = identity("mainDebug", true);

        // libfoo publishes only a link-time library.
        let link_attrs = VariantAttributes::for_identity(&identity, Usage::NativeLink);
        engine.publish(
            "libfoo",
            PublishedVariant::new(link_attrs, tmp.path().join("libfoo.a")),
        );

        let scopes = ScopeSet::for_variant(&engine, &identity, deps(&["libfoo"])).unwrap();

        let link = engine.resolve(scopes.link()).unwrap();
        assert_eq!(link, vec![tmp.path().join("libfoo.a")]);

        assert!(engine.resolve(scopes.compile()).unwrap().is_empty());
        assert!(engine.resolve(scopes.runtime()).unwrap().is_empty());
    }

    #[test]
    fn test_attribute_mismatch_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));

        let debug = identity("mainDebug", true);
        let release = identity("mainRelease", false);

        // Published for the debug variant only.
        engine.publish(
            "libfoo",
            PublishedVariant::new(
                VariantAttributes::for_identity(&debug, Usage::NativeLink),
                tmp.path().join("libfoo.a"),
            ),
        );

        let scopes = ScopeSet::for_variant(&engine, &release, deps(&["libfoo"])).unwrap();
        let err = engine.resolve(scopes.link()).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatchingVariant { .. }));
    }

    #[test]
    fn test_unknown_component_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity = identity("mainDebug", true);

        let scopes = ScopeSet::for_variant(&engine, &identity, deps(&["ghost"])).unwrap();
        let err = engine.resolve(scopes.link()).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownComponent { .. }));
    }

    #[test]
    fn test_binaries_do_not_leak_dependencies() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity_a = identity("appDebug", true);
        let identity_b = identity("toolDebug", true);
        assert_eq!(
            VariantAttributes::for_identity(&identity_a, Usage::NativeLink),
            VariantAttributes::for_identity(&identity_b, Usage::NativeLink)
        );

        let link_attrs = VariantAttributes::for_identity(&identity_a, Usage::NativeLink);
        engine.publish(
            "libfoo",
            PublishedVariant::new(link_attrs, tmp.path().join("libfoo.a")),
        );
        engine.publish(
            "libbar",
            PublishedVariant::new(link_attrs, tmp.path().join("libbar.a")),
        );

        let scopes_a = ScopeSet::for_variant(&engine, &identity_a, deps(&["libfoo"])).unwrap();
        let scopes_b = ScopeSet::for_variant(&engine, &identity_b, deps(&["libbar"])).unwrap();

        assert_eq!(
            engine.resolve(scopes_a.link()).unwrap(),
            vec![tmp.path().join("libfoo.a")]
        );
        assert_eq!(
            engine.resolve(scopes_b.link()).unwrap(),
            vec![tmp.path().join("libbar.a")]
        );
    }

    #[test]
    fn test_view_without_transform_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity = identity("mainDebug", true);

        let link_attrs = VariantAttributes::for_identity(&identity, Usage::NativeLink);
        engine.publish(
            "libfoo",
            PublishedVariant::new(link_attrs, tmp.path().join("libfoo.a")),
        );

        let scopes = ScopeSet::for_variant(&engine, &identity, deps(&["libfoo"])).unwrap();

        // No transform maps native-link to the directory form.
        let err = engine
            .resolve_view(scopes.link(), Usage::CppApiDirs)
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoRegisteredTransform { .. }));
    }

    #[test]
    fn test_view_prefers_directly_published_shape() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity = identity("mainDebug", true);

        // Upstream publishes both the archive and the exploded form; the
        // view must take the exploded form without transforming anything.
        let compile_attrs = VariantAttributes::for_identity(&identity, Usage::CppApi);
        let exploded = tmp.path().join("exploded");
        std::fs::create_dir(&exploded).unwrap();
        engine.publish(
            "libfoo",
            PublishedVariant::new(compile_attrs, tmp.path().join("headers.zip")),
        );
        engine.publish(
            "libfoo",
            PublishedVariant::new(compile_attrs.with_usage(Usage::CppApiDirs), &exploded),
        );

        let scopes = ScopeSet::for_variant(&engine, &identity, deps(&["libfoo"])).unwrap();
        let dirs = engine
            .resolve_view(scopes.compile(), Usage::CppApiDirs)
            .unwrap();

        assert_eq!(dirs, vec![exploded]);
        // The archive was never touched.
        assert!(!tmp.path().join("transforms").exists());
    }

    #[test]
    fn test_resolution_dedups_artifacts() {
        let tmp = TempDir::new().unwrap();
        let engine = ResolutionEngine::with_transform_root(tmp.path().join("transforms"));
        let identity = identity("mainDebug", true);

        let link_attrs = VariantAttributes::for_identity(&identity, Usage::NativeLink);
        let shared = tmp.path().join("libshared.a");
        engine.publish("libfoo", PublishedVariant::new(link_attrs, &shared));
        engine.publish("libbar", PublishedVariant::new(link_attrs, &shared));

        let scopes =
            ScopeSet::for_variant(&engine, &identity, deps(&["libfoo", "libbar"])).unwrap();
        assert_eq!(engine.resolve(scopes.link()).unwrap(), vec![shared]);
    }
}
