//! Descriptors shipped inside an extension source directory.
//!
//! An extension directory carries `package.json` (name and version) and
//! `extension.json` (host compatibility, dependencies, and free-form
//! settings). Both are read through [`ConfigStore`].

use std::path::Path;

use serde::Deserialize;

use extman_fs::{ConfigStore, NormalizedPath};

use crate::config::ExtensionConfig;
use crate::error::{Error, Result};
use crate::record::Candidate;

pub const PACKAGE_DESCRIPTOR: &str = "package.json";
pub const EXTENSION_DESCRIPTOR: &str = "extension.json";

/// The fields of `package.json` the registry cares about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

pub fn read_package_descriptor(path: &Path) -> Result<PackageDescriptor> {
    read(path)
}

pub fn read_extension_descriptor(path: &Path) -> Result<ExtensionConfig> {
    read(path)
}

/// Combine both descriptors into an install candidate.
///
/// A missing `hostCompatibility` leaves the field empty, which candidate
/// validation rejects.
pub fn read_candidate(package: PackageDescriptor, config: ExtensionConfig) -> Candidate {
    let host_compatibility = config.host_compatibility().unwrap_or_default().to_string();
    Candidate::new(package.name, package.version, host_compatibility).with_config(config)
}

fn read<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let normalized = NormalizedPath::new(path);
    if !normalized.is_file() {
        return Err(Error::DescriptorNotFound(path.to_path_buf()));
    }
    Ok(ConfigStore::new().load(&normalized)?)
}
