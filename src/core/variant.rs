//! Variant identity.
//!
//! A VariantIdentity pins down one build configuration of a binary
//! (debug/release, target machine, toolchain). All three dependency scopes
//! of a binary derive their filter attributes from the same identity, which
//! keeps the compile, link, and runtime graphs filtered consistently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operating system family a binary targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystemFamily {
    Linux,
    MacOs,
    Windows,
}

impl OperatingSystemFamily {
    /// Get the vocabulary string for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystemFamily::Linux => "linux",
            OperatingSystemFamily::MacOs => "macos",
            OperatingSystemFamily::Windows => "windows",
        }
    }
}

impl std::fmt::Display for OperatingSystemFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine architecture a binary targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineArchitecture {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86-64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl MachineArchitecture {
    /// Get the vocabulary string for this architecture.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineArchitecture::X86 => "x86",
            MachineArchitecture::X86_64 => "x86-64",
            MachineArchitecture::Aarch64 => "aarch64",
        }
    }
}

impl std::fmt::Display for MachineArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The machine a binary runs on: OS family plus architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetMachine {
    pub os_family: OperatingSystemFamily,
    pub architecture: MachineArchitecture,
}

impl TargetMachine {
    /// Create a target machine.
    pub fn new(os_family: OperatingSystemFamily, architecture: MachineArchitecture) -> Self {
        TargetMachine {
            os_family,
            architecture,
        }
    }
}

impl std::fmt::Display for TargetMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os_family, self.architecture)
    }
}

/// Reference to a toolchain by name (e.g. "gcc", "clang").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainRef {
    name: String,
}

impl ToolchainRef {
    /// Create a toolchain reference.
    pub fn new(name: impl Into<String>) -> Self {
        ToolchainRef { name: name.into() }
    }

    /// Get the toolchain name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Reference to the provider of platform-specific tools for a toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolProviderRef {
    name: String,
}

impl ToolProviderRef {
    /// Create a tool provider reference.
    pub fn new(name: impl Into<String>) -> Self {
        ToolProviderRef { name: name.into() }
    }

    /// Get the provider name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Error constructing or validating a variant identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("variant identity has no name")]
    MissingName,

    #[error("variant `{name}` has no target machine")]
    MissingTargetMachine { name: String },

    #[error("variant `{name}` has no toolchain")]
    MissingToolchain { name: String },

    #[error("variant `{name}` has no platform tool provider")]
    MissingToolProvider { name: String },
}

/// Immutable descriptor of one binary variant's build coordinates.
///
/// Constructed through [`VariantIdentity::builder`]; never mutated after
/// construction. Equality covers every filter attribute plus the target
/// machine, so two identities compare equal exactly when their scopes
/// would filter identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantIdentity {
    name: String,
    debuggable: bool,
    optimized: bool,
    target_machine: TargetMachine,
    toolchain: ToolchainRef,
    tool_provider: ToolProviderRef,
}

impl VariantIdentity {
    /// Start building an identity for a named binary variant.
    pub fn builder(name: impl Into<String>) -> VariantIdentityBuilder {
        VariantIdentityBuilder {
            name: name.into(),
            debuggable: false,
            optimized: false,
            target_machine: None,
            toolchain: None,
            tool_provider: None,
        }
    }

    /// Get the variant's display name (e.g. "mainDebug").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this variant carries debug information.
    pub fn is_debuggable(&self) -> bool {
        self.debuggable
    }

    /// Check if this variant is optimized.
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Get the machine this variant targets.
    pub fn target_machine(&self) -> TargetMachine {
        self.target_machine
    }

    /// Get the toolchain reference.
    pub fn toolchain(&self) -> &ToolchainRef {
        &self.toolchain
    }

    /// Get the platform tool provider reference.
    pub fn tool_provider(&self) -> &ToolProviderRef {
        &self.tool_provider
    }

    /// Validate that the identity is complete enough to filter scopes.
    ///
    /// Scope creation calls this before constructing anything, so an
    /// incomplete identity never leaves a partial scope set behind.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.name.is_empty() {
            return Err(IdentityError::MissingName);
        }
        if self.toolchain.name().is_empty() {
            return Err(IdentityError::MissingToolchain {
                name: self.name.clone(),
            });
        }
        if self.tool_provider.name().is_empty() {
            return Err(IdentityError::MissingToolProvider {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VariantIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.target_machine)
    }
}

/// Builder for [`VariantIdentity`].
#[derive(Debug, Clone)]
pub struct VariantIdentityBuilder {
    name: String,
    debuggable: bool,
    optimized: bool,
    target_machine: Option<TargetMachine>,
    toolchain: Option<ToolchainRef>,
    tool_provider: Option<ToolProviderRef>,
}

impl VariantIdentityBuilder {
    /// Set whether the variant carries debug information.
    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.debuggable = debuggable;
        self
    }

    /// Set whether the variant is optimized.
    pub fn optimized(mut self, optimized: bool) -> Self {
        self.optimized = optimized;
        self
    }

    /// Set the target machine.
    pub fn target_machine(mut self, machine: TargetMachine) -> Self {
        self.target_machine = Some(machine);
        self
    }

    /// Set the toolchain reference.
    pub fn toolchain(mut self, toolchain: ToolchainRef) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    /// Set the platform tool provider reference.
    pub fn tool_provider(mut self, provider: ToolProviderRef) -> Self {
        self.tool_provider = Some(provider);
        self
    }

    /// Build the identity.
    ///
    /// Only field presence is required here; completeness of the names is
    /// checked by [`VariantIdentity::validate`] when scopes are built, per
    /// the fail-fast policy there.
    pub fn build(self) -> Result<VariantIdentity, IdentityError> {
        let target_machine =
            self.target_machine
                .ok_or_else(|| IdentityError::MissingTargetMachine {
                    name: self.name.clone(),
                })?;
        let toolchain = self.toolchain.ok_or_else(|| IdentityError::MissingToolchain {
            name: self.name.clone(),
        })?;
        let tool_provider =
            self.tool_provider
                .ok_or_else(|| IdentityError::MissingToolProvider {
                    name: self.name.clone(),
                })?;

        Ok(VariantIdentity {
            name: self.name,
            debuggable: self.debuggable,
            optimized: self.optimized,
            target_machine,
            toolchain,
            tool_provider,
        })
    }
}
