//! Host settings from `extman.toml`
//!
//! Settings are resolved in two layers, later overriding earlier:
//!
//! 1. **Settings file** - `extman.toml` in the host root (optional)
//! 2. **Environment** - `EXTMAN_HOST_VERSION`, `EXTMAN_ENABLE_ON_INSTALL`,
//!    `EXTMAN_SKIP_REGISTRY`
//!
//! # Example
//!
//! ```
//! use extman_registry::settings::HostSettings;
//!
//! let settings = HostSettings::parse(r#"
//! host_version = "2.4.0"
//! enable_on_install = true
//! "#).unwrap();
//!
//! assert_eq!(settings.host_version().unwrap(), semver::Version::new(2, 4, 0));
//! assert!(settings.enable_on_install);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use extman_fs::{ConfigStore, HostLayout, NormalizedPath};

use crate::error::{Error, Result};
use crate::version::parse_version;

/// Settings file name, relative to the host root.
pub const FILENAME: &str = "extman.toml";

pub const ENV_HOST_VERSION: &str = "EXTMAN_HOST_VERSION";
pub const ENV_ENABLE_ON_INSTALL: &str = "EXTMAN_ENABLE_ON_INSTALL";
pub const ENV_SKIP_REGISTRY: &str = "EXTMAN_SKIP_REGISTRY";

/// Settings of one host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSettings {
    /// Version of the running host.
    pub host_version: Option<String>,
    /// Registry document location.
    pub registry: Option<String>,
    /// Uninstall log location.
    pub uninstall_log: Option<String>,
    /// Root for staged public assets.
    pub public_dir: Option<String>,
    /// Root for staged configuration templates.
    pub config_dir: Option<String>,
    /// Enable every extension as it is installed.
    pub enable_on_install: bool,
    /// Stage assets without touching the registry.
    pub skip_registry_update: bool,
}

impl HostSettings {
    /// Parse settings from TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    /// Load `extman.toml` from `root`, then apply the environment.
    ///
    /// A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let mut settings = Self::load_file(root)?;
        settings.apply_env_from(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load `extman.toml` from `root` without consulting the environment.
    pub fn load_file(root: &Path) -> Result<Self> {
        let path = NormalizedPath::new(root).join(FILENAME);
        if !path.is_file() {
            tracing::debug!(path = %path, "No settings file, using defaults");
            return Ok(Self::default());
        }
        ConfigStore::new()
            .load(&path)
            .map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Boolean variables count as set unless their value is `0` or `false`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(version) = lookup(ENV_HOST_VERSION).filter(|v| !v.trim().is_empty()) {
            self.host_version = Some(version);
        }
        if let Some(value) = lookup(ENV_ENABLE_ON_INSTALL) {
            self.enable_on_install = flag(&value);
        }
        if let Some(value) = lookup(ENV_SKIP_REGISTRY) {
            self.skip_registry_update = flag(&value);
        }
    }

    /// The configured host version.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` when unset or not a semantic version.
    pub fn host_version(&self) -> Result<semver::Version> {
        let raw = self.host_version.as_deref().ok_or_else(|| {
            Error::InvalidSettings(format!(
                "host_version is not set (add it to {FILENAME} or set {ENV_HOST_VERSION})"
            ))
        })?;
        parse_version(raw)
            .map_err(|e| Error::InvalidSettings(format!("host_version '{raw}': {e}")))
    }

    /// Resolve the configured locations against `root`.
    pub fn layout(&self, root: &Path) -> HostLayout {
        let mut layout = HostLayout::new(root);
        if let Some(location) = &self.registry {
            layout = layout.with_registry(location);
        }
        if let Some(location) = &self.uninstall_log {
            layout = layout.with_uninstall_log(location);
        }
        if let Some(location) = &self.public_dir {
            layout = layout.with_public_dir(location);
        }
        if let Some(location) = &self.config_dir {
            layout = layout.with_config_dir(location);
        }
        layout
    }
}

fn flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false")
}
