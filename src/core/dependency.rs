//! Dependency declarations and published variants.
//!
//! A component declares dependencies once; every binary variant of that
//! component inherits the same base set into its compile, link, and runtime
//! scopes. On the other side, a depended-on component publishes variants:
//! each one an artifact path tagged with the attributes it was built for.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::attributes::VariantAttributes;

/// A declared dependency on another component, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    name: String,
}

impl Dependency {
    /// Declare a dependency on the named component.
    pub fn new(name: impl Into<String>) -> Self {
        Dependency { name: name.into() }
    }

    /// Get the component name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The base set of declared dependencies a binary's scopes inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySet {
    dependencies: Vec<Dependency>,
}

impl DependencySet {
    /// Create an empty set.
    pub fn new() -> Self {
        DependencySet::default()
    }

    /// Add a declaration. Duplicate names are kept once.
    pub fn add(&mut self, dependency: Dependency) {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }

    /// Iterate the declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut set = DependencySet::new();
        for dep in iter {
            set.add(dep);
        }
        set
    }
}

/// One published variant of a component: an artifact plus the attributes
/// it satisfies.
///
/// The artifact path is externally produced and read-only from this crate's
/// point of view. It is either a directory (already-exploded headers, a
/// library search dir) or a single-file archive; which one is decided by
/// looking at the filesystem, never at the file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVariant {
    attributes: VariantAttributes,
    artifact: PathBuf,
}

impl PublishedVariant {
    /// Publish an artifact under the given attributes.
    pub fn new(attributes: VariantAttributes, artifact: impl Into<PathBuf>) -> Self {
        PublishedVariant {
            attributes,
            artifact: artifact.into(),
        }
    }

    /// Get the attributes this variant was published under.
    pub fn attributes(&self) -> &VariantAttributes {
        &self.attributes
    }

    /// Get the artifact path.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}
