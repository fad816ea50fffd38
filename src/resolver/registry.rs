//! Transform registry.
//!
//! An explicit registry object owned by the resolution engine, keyed by
//! `(source usage, target usage)`. Nothing here is global or static: two
//! engines hold two independent registries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::usage::Usage;
use crate::materialize::ArtifactTransform;

/// Registered artifact transforms, keyed by usage pair.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: RwLock<HashMap<(Usage, Usage), Arc<dyn ArtifactTransform>>>,
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TransformRegistry::default()
    }

    /// Register a transform from one usage to another.
    ///
    /// Idempotent: a mapping that already exists is left untouched, so a
    /// transform declared once per binary never runs twice for the same
    /// artifact and re-registration is never an error.
    pub fn register(&self, from: Usage, to: Usage, transform: Arc<dyn ArtifactTransform>) {
        let mut transforms = self.transforms.write().unwrap();
        match transforms.entry((from, to)) {
            std::collections::hash_map::Entry::Occupied(_) => {
                tracing::debug!("transform {} -> {} already registered", from, to);
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                tracing::debug!("registered transform {} -> {}", from, to);
                entry.insert(transform);
            }
        }
    }

    /// Look up the transform for a usage pair.
    pub fn get(&self, from: Usage, to: Usage) -> Option<Arc<dyn ArtifactTransform>> {
        self.transforms.read().unwrap().get(&(from, to)).cloned()
    }

    /// Number of registered mappings.
    pub fn len(&self) -> usize {
        self.transforms.read().unwrap().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<(Usage, Usage)> =
            self.transforms.read().unwrap().keys().copied().collect();
        f.debug_struct("TransformRegistry").field("keys", &keys).finish()
    }
}
