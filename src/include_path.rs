//! Materialized include path.
//!
//! The compile step's view of where headers live: the component's own
//! declared header directories plus whatever the compile scope resolves to
//! in directory form. Nothing is resolved, and no archive is extracted,
//! until the path is actually read.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::core::usage::Usage;
use crate::resolver::{ResolutionEngine, ResolveError};
use crate::scope::DependencyScope;

/// Lazily-evaluated union of component header dirs and materialized
/// compile-scope directories.
///
/// The first successful read resolves the compile scope under the
/// `cplusplus-api-dirs` artifact view (which extracts archives on demand)
/// and caches the result; later reads within the build see the same value.
/// A failed read caches nothing, so a later read retries.
#[derive(Debug, Clone)]
pub struct IncludePath {
    component_dirs: Vec<PathBuf>,
    scope: DependencyScope,
    engine: Arc<ResolutionEngine>,
    resolved: Arc<OnceLock<Vec<PathBuf>>>,
}

impl IncludePath {
    /// Capture the inputs without resolving anything.
    pub fn new(
        component_dirs: Vec<PathBuf>,
        scope: DependencyScope,
        engine: Arc<ResolutionEngine>,
    ) -> Self {
        IncludePath {
            component_dirs,
            scope,
            engine,
            resolved: Arc::new(OnceLock::new()),
        }
    }

    /// The include directories, in stable order with no duplicates.
    pub fn dirs(&self) -> Result<Vec<PathBuf>, ResolveError> {
        if let Some(cached) = self.resolved.get() {
            return Ok(cached.clone());
        }

        let materialized = self
            .engine
            .resolve_view(&self.scope, Usage::CppApiDirs)?;

        let mut dirs = Vec::new();
        let mut seen = HashSet::new();
        for dir in self.component_dirs.iter().cloned().chain(materialized) {
            if seen.insert(dir.clone()) {
                dirs.push(dir);
            }
        }

        tracing::debug!(
            "include path for `{}`: {} dir(s)",
            self.scope.name(),
            dirs.len()
        );

        // First resolution wins if two threads raced here; both computed
        // from the same immutable inputs.
        let _ = self.resolved.set(dirs);
        Ok(self
            .resolved
            .get()
            .expect("include path cache was just set")
            .clone())
    }
}
