//! Host directory layout.
//!
//! A host keeps its registry documents and the staged assets of every
//! extension under one root. Relative locations are resolved against that
//! root; absolute ones are used verbatim.

use std::path::Path;

use crate::NormalizedPath;

/// Default registry document location, relative to the host root.
pub const DEFAULT_REGISTRY: &str = "content/extensions/extensions.json";
/// Default uninstall log location, relative to the host root.
pub const DEFAULT_UNINSTALL_LOG: &str = "content/extensions/uninstall.json";
/// Default root for staged public assets.
pub const DEFAULT_PUBLIC_DIR: &str = "public/extensions";
/// Default root for staged configuration templates.
pub const DEFAULT_CONFIG_DIR: &str = "content/config/extensions";

/// Resolved filesystem locations for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    root: NormalizedPath,
    registry: NormalizedPath,
    uninstall_log: NormalizedPath,
    public_dir: NormalizedPath,
    config_dir: NormalizedPath,
}

impl HostLayout {
    /// Layout rooted at `root` with the default locations.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = NormalizedPath::new(root);
        Self {
            registry: root.join(DEFAULT_REGISTRY),
            uninstall_log: root.join(DEFAULT_UNINSTALL_LOG),
            public_dir: root.join(DEFAULT_PUBLIC_DIR),
            config_dir: root.join(DEFAULT_CONFIG_DIR),
            root,
        }
    }

    /// Override the registry document location.
    pub fn with_registry(mut self, location: &str) -> Self {
        self.registry = self.resolve(location);
        self
    }

    /// Override the uninstall log location.
    pub fn with_uninstall_log(mut self, location: &str) -> Self {
        self.uninstall_log = self.resolve(location);
        self
    }

    /// Override the public asset root.
    pub fn with_public_dir(mut self, location: &str) -> Self {
        self.public_dir = self.resolve(location);
        self
    }

    /// Override the configuration template root.
    pub fn with_config_dir(mut self, location: &str) -> Self {
        self.config_dir = self.resolve(location);
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn registry_path(&self) -> &NormalizedPath {
        &self.registry
    }

    pub fn uninstall_log_path(&self) -> &NormalizedPath {
        &self.uninstall_log
    }

    /// Lock file guarding mutations of the registry document.
    pub fn lock_path(&self) -> NormalizedPath {
        self.registry.with_suffix(".lock")
    }

    /// Where the public assets of `extension` are staged.
    pub fn public_dir_for(&self, extension: &str) -> NormalizedPath {
        self.public_dir.join(extension)
    }

    /// Where the configuration templates of `extension` are staged.
    pub fn config_dir_for(&self, extension: &str) -> NormalizedPath {
        self.config_dir.join(extension)
    }

    fn resolve(&self, location: &str) -> NormalizedPath {
        if Path::new(location).is_absolute() {
            NormalizedPath::new(location)
        } else {
            self.root.join(location)
        }
    }
}
