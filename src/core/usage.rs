//! Usage vocabulary.
//!
//! A usage tag says what role a dependency graph or published artifact
//! plays: compile headers, link libraries, or runtime libraries. The tags
//! form a closed set, so an invalid tag is unrepresentable.

use serde::{Deserialize, Serialize};

/// The role a dependency scope or published artifact plays for a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usage {
    /// Compile-time header packages
    #[serde(rename = "c-plus-plus-api")]
    CppApi,

    /// Link-time libraries
    #[serde(rename = "native-link")]
    NativeLink,

    /// Runtime libraries
    #[serde(rename = "native-runtime")]
    NativeRuntime,

    /// Header packages in extracted directory form.
    ///
    /// Synthetic: never declared by a scope, only requested through an
    /// artifact view to obtain the post-transform shape of [`Usage::CppApi`]
    /// artifacts.
    #[serde(rename = "cplusplus-api-dirs")]
    CppApiDirs,
}

impl Usage {
    /// Get the vocabulary string for this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::CppApi => "c-plus-plus-api",
            Usage::NativeLink => "native-link",
            Usage::NativeRuntime => "native-runtime",
            Usage::CppApiDirs => "cplusplus-api-dirs",
        }
    }

    /// The three tags a scope may be declared under.
    pub fn declarable() -> [Usage; 3] {
        [Usage::CppApi, Usage::NativeLink, Usage::NativeRuntime]
    }

    /// Check if this is the synthetic directory-form tag.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Usage::CppApiDirs)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
