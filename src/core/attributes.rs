//! Attribute matching.
//!
//! A VariantAttributes record is the filter the resolution engine applies
//! when selecting among a component's published variants. It is a fixed
//! schema, not an open attribute map: the five dimensions here are the
//! whole vocabulary, and comparison is plain structural equality.

use serde::{Deserialize, Serialize};

use crate::core::usage::Usage;
use crate::core::variant::{MachineArchitecture, OperatingSystemFamily, VariantIdentity};

/// The attribute filter for one dependency scope or published variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantAttributes {
    pub usage: Usage,
    pub debuggable: bool,
    pub optimized: bool,
    pub os_family: OperatingSystemFamily,
    pub architecture: MachineArchitecture,
}

impl VariantAttributes {
    /// Derive the attribute filter for a scope of the given usage.
    ///
    /// This is the single place scope attributes come from: all three
    /// scopes of a binary call it with the same identity, so their filters
    /// agree on everything but the usage tag.
    pub fn for_identity(identity: &VariantIdentity, usage: Usage) -> Self {
        let machine = identity.target_machine();
        VariantAttributes {
            usage,
            debuggable: identity.is_debuggable(),
            optimized: identity.is_optimized(),
            os_family: machine.os_family,
            architecture: machine.architecture,
        }
    }

    /// The same attributes under a different usage tag.
    ///
    /// Used by artifact views to request an alternate artifact shape while
    /// holding every other dimension fixed.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Check whether a published variant's attributes satisfy this filter.
    pub fn matches(&self, published: &VariantAttributes) -> bool {
        self == published
    }
}

impl std::fmt::Display for VariantAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} debuggable={} optimized={} {}/{}",
            self.usage, self.debuggable, self.optimized, self.os_family, self.architecture
        )
    }
}
