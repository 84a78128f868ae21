//! Host context detection
//!
//! Finds the host root from any directory below it, the way git finds its
//! repository: walk up until a directory holds `extman.toml`. Commands then
//! work from anywhere inside the host.

use std::path::{Path, PathBuf};

use extman_registry::settings::{FILENAME, HostSettings};
use extman_registry::ExtensionManager;

use crate::error::{CliError, Result};

/// Resolved host root and settings for one invocation.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub root: PathBuf,
    pub settings: HostSettings,
}

impl HostContext {
    /// Resolve the host from an explicit root or by walking up from `cwd`.
    ///
    /// `host_version` overrides both the settings file and the environment.
    pub fn resolve(root: Option<&Path>, cwd: &Path, host_version: Option<&str>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => detect_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        };
        let mut settings = HostSettings::load(&root)?;
        if let Some(version) = host_version {
            settings.host_version = Some(version.to_string());
        }
        tracing::debug!(root = %root.display(), "Resolved host root");
        Ok(Self { root, settings })
    }

    pub fn host_version(&self) -> Result<semver::Version> {
        self.settings.host_version().map_err(|e| {
            CliError::user(format!("{e}; pass --host-version or set it in {FILENAME}"))
        })
    }

    pub fn manager(&self) -> Result<ExtensionManager> {
        self.host_version()?;
        Ok(ExtensionManager::from_settings(&self.root, &self.settings)?)
    }
}

/// Walk up from `cwd` looking for a directory containing `extman.toml`.
pub fn detect_root(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| dir.join(FILENAME).is_file())
        .map(Path::to_path_buf)
}
