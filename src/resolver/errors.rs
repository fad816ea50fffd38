//! Resolution error types.

use thiserror::Error;

use crate::core::usage::Usage;
use crate::materialize::MaterializeError;

/// Error resolving a dependency scope.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The scope declares a component nothing has been published for.
    #[error("unknown component `{component}`: nothing has been published for it")]
    UnknownComponent { component: String },

    /// The component publishes under the requested usage, but no variant
    /// matches the scope's other attributes.
    #[error("no variant of `{component}` matches `{requested}`")]
    NoMatchingVariant {
        component: String,
        requested: String,
        available: Vec<String>,
    },

    /// An artifact view needs a transform no one registered.
    #[error("no transform registered from `{from}` to `{to}` (needed for `{component}`)")]
    NoRegisteredTransform {
        component: String,
        from: Usage,
        to: Usage,
    },

    /// A registered transform failed on a component's artifact.
    #[error("failed to materialize artifact of `{component}`")]
    Transform {
        component: String,
        #[source]
        source: MaterializeError,
    },
}
