//! The configuration blob an extension ships in its `extension.json`.
//!
//! Only `dependencies` is interpreted by the registry. Every other key is
//! kept verbatim in `extra` so the blob round-trips through the registry
//! document unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::version::VersionConstraint;

/// Opaque per-extension configuration with typed dependencies.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ExtensionConfig {
    /// Declared dependencies, in declaration order.
    #[serde(default, alias = "periodicDependencies")]
    pub dependencies: Vec<Dependency>,
    /// Arbitrary extension-specific configuration values.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionConfig {
    /// Minimum host version declared inside the blob, if any.
    ///
    /// Accepts the legacy `periodicCompatibility` key.
    pub fn host_compatibility(&self) -> Option<&str> {
        self.extra
            .get("hostCompatibility")
            .or_else(|| self.extra.get("periodicCompatibility"))
            .and_then(Value::as_str)
    }

    /// Dependencies that must be present, ordered first, and enabled.
    pub fn required_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| !d.optional)
    }
}

/// A dependency on another extension.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the extension depended upon.
    #[serde(alias = "extname")]
    pub name: String,
    /// Accepted versions of the dependency. Absent means any.
    #[serde(
        default,
        rename = "versionRange",
        alias = "version",
        skip_serializing_if = "Option::is_none"
    )]
    pub version_range: Option<String>,
    /// Optional dependencies only influence ordering.
    #[serde(default)]
    pub optional: bool,
}

impl Dependency {
    /// A required dependency with no version constraint.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_range: None,
            optional: false,
        }
    }

    /// An optional dependency with no version constraint.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(name)
        }
    }

    /// Constrain the accepted versions.
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    /// Parse the declared range. `None` when every version is accepted.
    pub fn constraint(&self) -> Result<Option<VersionConstraint>> {
        match self.version_range.as_deref().map(str::trim) {
            None | Some("") | Some("*") | Some("latest") => Ok(None),
            Some(range) => VersionConstraint::parse(range).map(Some),
        }
    }
}
