//! Loading and persisting the registry document and the uninstall log.

use serde_json::Value;

use extman_fs::{ConfigStore, HostLayout, InstallLock, NormalizedPath, io};

use crate::error::{Error, Result};
use crate::record::ExtensionRecord;
use crate::registry::{Registry, UninstallLog};

/// Handle on the two JSON documents of one host.
///
/// Every operation reads or writes the files directly; nothing is cached
/// between calls.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    registry_path: NormalizedPath,
    uninstall_log_path: NormalizedPath,
    lock_path: NormalizedPath,
    config: ConfigStore,
}

impl RegistryStore {
    pub fn from_layout(layout: &HostLayout) -> Self {
        Self {
            registry_path: layout.registry_path().clone(),
            uninstall_log_path: layout.uninstall_log_path().clone(),
            lock_path: layout.lock_path(),
            config: ConfigStore::new(),
        }
    }

    pub fn registry_path(&self) -> &NormalizedPath {
        &self.registry_path
    }

    pub fn uninstall_log_path(&self) -> &NormalizedPath {
        &self.uninstall_log_path
    }

    /// Load the registry document.
    ///
    /// # Errors
    ///
    /// - `ConfigMissing` if the document does not exist
    /// - `ConfigCorrupt` if it is not JSON or `extensions` is not an array
    /// - `MalformedRecord` naming the first record that cannot be decoded
    pub fn load(&self) -> Result<Registry> {
        let content = io::read_text(&self.registry_path).map_err(|e| {
            if e.is_not_found() {
                Error::ConfigMissing {
                    path: self.registry_path.to_native(),
                }
            } else {
                Error::Fs(e)
            }
        })?;

        let document: Value = self
            .config
            .parse(&self.registry_path, &content)
            .map_err(|e| self.corrupt(e.to_string()))?;

        let Some(entries) = document.get("extensions").and_then(Value::as_array) else {
            return Err(self.corrupt("'extensions' is not an array".to_string()));
        };

        let records = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<ExtensionRecord>(entry.clone()).map_err(|e| {
                    Error::MalformedRecord {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(path = %self.registry_path, count = records.len(), "Loaded registry");
        Ok(Registry::from_records(records))
    }

    /// Load the registry, treating a missing document as empty.
    pub fn load_or_default(&self) -> Result<Registry> {
        match self.load() {
            Err(Error::ConfigMissing { .. }) => Ok(Registry::new()),
            other => other,
        }
    }

    /// Atomically replace the registry document.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        self.config
            .save(&self.registry_path, registry)
            .map_err(|source| Error::PersistError {
                path: self.registry_path.to_native(),
                source,
            })
    }

    /// Load the uninstall log. A missing log is empty.
    ///
    /// # Errors
    ///
    /// - `Fs` if the log exists but cannot be read
    /// - `ConfigCorrupt` if it does not parse
    pub fn load_uninstall_log(&self) -> Result<UninstallLog> {
        let content = match io::read_text(&self.uninstall_log_path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(UninstallLog::new()),
            Err(e) => return Err(Error::Fs(e)),
        };
        self.config
            .parse(&self.uninstall_log_path, &content)
            .map_err(|e| Error::ConfigCorrupt {
                path: self.uninstall_log_path.to_native(),
                reason: e.to_string(),
            })
    }

    /// Atomically replace the uninstall log.
    pub fn save_uninstall_log(&self, log: &UninstallLog) -> Result<()> {
        self.config
            .save(&self.uninstall_log_path, log)
            .map_err(|source| Error::PersistError {
                path: self.uninstall_log_path.to_native(),
                source,
            })
    }

    /// Take the exclusive lock guarding the registry document.
    pub fn lock(&self) -> Result<InstallLock> {
        Ok(InstallLock::acquire(&self.lock_path)?)
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::ConfigCorrupt {
            path: self.registry_path.to_native(),
            reason,
        }
    }
}
