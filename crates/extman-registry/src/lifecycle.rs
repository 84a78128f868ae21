//! Install, enable, disable, uninstall and move.
//!
//! Every operation is a read-modify-write of the registry document: load,
//! apply the change to an owned [`Registry`], check it, and persist only when
//! every step succeeded. Callers serialize concurrent writers with
//! [`RegistryStore::lock`].

use std::path::{Path, PathBuf};

use chrono::Utc;

use extman_fs::{HostLayout, NormalizedPath, StageOutcome, copy_directory, remove_directory};

use crate::descriptor::{
    EXTENSION_DESCRIPTOR, PACKAGE_DESCRIPTOR, read_candidate, read_extension_descriptor,
    read_package_descriptor,
};
use crate::error::{Error, Result};
use crate::order::repair_order;
use crate::position::{self, MoveOutcome, Placement};
use crate::record::{Candidate, ExtensionRecord};
use crate::registry::{Registry, Upsert};
use crate::settings::HostSettings;
use crate::store::RegistryStore;
use crate::validate::{self, AuditReport};
use crate::version::parse_version;

/// Result of a lifecycle operation: the registry as persisted and a
/// human-readable summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub registry: Registry,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Enable the extension regardless of its previous state.
    pub enable: bool,
    /// Reposition the extension after order repair.
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Remove the staged public assets.
    pub remove_public: bool,
    /// Remove the staged configuration templates.
    pub remove_config: bool,
}

/// An unpacked extension directory.
#[derive(Debug, Clone)]
pub struct ExtensionSource {
    root: PathBuf,
}

impl ExtensionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_descriptor(&self) -> PathBuf {
        self.root.join(PACKAGE_DESCRIPTOR)
    }

    pub fn extension_descriptor(&self) -> PathBuf {
        self.root.join(EXTENSION_DESCRIPTOR)
    }

    pub fn public_dir(&self) -> NormalizedPath {
        NormalizedPath::new(self.root.join("public"))
    }

    pub fn config_dir(&self) -> NormalizedPath {
        NormalizedPath::new(self.root.join("config"))
    }

    /// Read both descriptors in parallel and build the install candidate.
    pub fn candidate(&self) -> Result<Candidate> {
        let (package, config) = std::thread::scope(|scope| {
            let package = scope.spawn(|| read_package_descriptor(&self.package_descriptor()));
            let config = scope.spawn(|| read_extension_descriptor(&self.extension_descriptor()));
            (
                package
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                config
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            )
        });
        Ok(read_candidate(package?, config?))
    }
}

/// Lifecycle operations over one host's registry.
#[derive(Debug, Clone)]
pub struct ExtensionManager {
    store: RegistryStore,
    layout: HostLayout,
    host_version: semver::Version,
    enable_on_install: bool,
    skip_registry_update: bool,
}

impl ExtensionManager {
    pub fn new(layout: HostLayout, host_version: semver::Version) -> Self {
        Self {
            store: RegistryStore::from_layout(&layout),
            layout,
            host_version,
            enable_on_install: false,
            skip_registry_update: false,
        }
    }

    /// Build a manager for the host at `root` from its settings.
    pub fn from_settings(root: &Path, settings: &HostSettings) -> Result<Self> {
        Ok(Self::new(settings.layout(root), settings.host_version()?)
            .with_enable_on_install(settings.enable_on_install)
            .with_skip_registry_update(settings.skip_registry_update))
    }

    pub fn with_enable_on_install(mut self, enable: bool) -> Self {
        self.enable_on_install = enable;
        self
    }

    pub fn with_skip_registry_update(mut self, skip: bool) -> Self {
        self.skip_registry_update = skip;
        self
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    pub fn host_version(&self) -> &semver::Version {
        &self.host_version
    }

    /// Merge `candidate` into the registry and persist it.
    ///
    /// The enabled flag is forced on by `options.enable` or the
    /// `enable_on_install` setting, otherwise carried over from the existing
    /// record or, failing that, from the uninstall log. An enabled record
    /// needs its non-optional dependencies enabled: a forced enable fails
    /// with `UnsatisfiedDependencies`, any other source installs disabled.
    pub fn install(&self, candidate: Candidate, options: &InstallOptions) -> Result<Outcome> {
        candidate.validate()?;

        let mut registry = self.store.load_or_default()?;
        let name = candidate.name.clone();
        let version = candidate.version.clone();

        let previously_enabled = match registry.get(&name) {
            Some(existing) => existing.enabled,
            None => self.store.load_uninstall_log()?.was_enabled(&name),
        };
        let mut enabled = options.enable || self.enable_on_install || previously_enabled;

        let upsert = registry.upsert(candidate.into_record(enabled, Utc::now()));
        tracing::debug!(extension = %name, ?upsert, enabled, "Merged extension record");

        let order = repair_order(&mut registry)?;
        if let Some(placement) = &options.placement {
            position::move_extension(&mut registry, &name, placement)?;
        }
        validate::validate(&registry, &self.host_version)?;

        let held_back = match registry.get(&name) {
            Some(record) if enabled => unsatisfied_dependencies(&registry, record),
            _ => Vec::new(),
        };
        if !held_back.is_empty() {
            if options.enable {
                return Err(Error::UnsatisfiedDependencies {
                    name,
                    count: held_back.len(),
                    missing: held_back,
                });
            }
            tracing::warn!(extension = %name, missing = ?held_back, "Dependencies not enabled, installing disabled");
            if let Some(record) = registry.get_mut(&name) {
                record.enabled = false;
            }
            enabled = false;
        }

        self.store.save(&registry)?;
        tracing::info!(extension = %name, version = %version, enabled, "Installed extension");

        let verb = match upsert {
            Upsert::Replaced(_) => "Updated",
            Upsert::Appended(_) => "Installed",
        };
        let state = if enabled { "enabled" } else { "disabled" };
        let mut message = format!("{verb} '{name}' {version} ({state})");
        if !held_back.is_empty() {
            message.push_str(&format!(
                "; left disabled until {} enabled",
                held_back.join(", ")
            ));
        }
        if order.changed() {
            message.push_str(&format!(
                "; load order repaired with {} move(s)",
                order.moves
            ));
        }

        Ok(Outcome { registry, message })
    }

    /// Install the extension unpacked at `source` and stage its assets.
    ///
    /// Staging runs after the registry is persisted; a staging failure is
    /// logged and reported in the message.
    pub fn install_from_dir(&self, source: &Path, options: &InstallOptions) -> Result<Outcome> {
        let source = ExtensionSource::new(source);
        let candidate = source.candidate()?;
        let name = candidate.name.clone();

        let (registry, mut message) = if self.skip_registry_update {
            candidate.validate()?;
            (
                self.store.load_or_default()?,
                format!("Staged '{name}' without updating the registry"),
            )
        } else {
            let outcome = self.install(candidate, options)?;
            (outcome.registry, outcome.message)
        };

        for (from, to) in [
            (source.public_dir(), self.layout.public_dir_for(&name)),
            (source.config_dir(), self.layout.config_dir_for(&name)),
        ] {
            match copy_directory(&from, &to) {
                Ok(StageOutcome::Applied) => {
                    tracing::debug!(extension = %name, dst = %to, "Staged assets");
                }
                Ok(StageOutcome::Skipped) => {}
                Err(e) => {
                    tracing::warn!(extension = %name, dst = %to, error = %e, "Staging failed");
                    message.push_str(&format!("; staging {to} failed: {e}"));
                }
            }
        }

        Ok(Outcome { registry, message })
    }

    /// Enable `name` once its non-optional dependencies are enabled.
    pub fn enable(&self, name: &str) -> Result<Outcome> {
        let mut registry = self.store.load_or_default()?;
        let record = registry
            .get(name)
            .ok_or_else(|| Error::NotInRegistry(name.to_string()))?;

        if record.enabled {
            return Ok(Outcome {
                message: format!("'{name}' is already enabled"),
                registry,
            });
        }
        if !record.installed {
            return Err(Error::InvalidExtensionMetadata {
                name: name.to_string(),
                reason: "extension is not installed".to_string(),
            });
        }

        let required = parse_version(&record.host_compatibility).map_err(|e| {
            Error::InvalidExtensionMetadata {
                name: name.to_string(),
                reason: format!("hostCompatibility '{}': {e}", record.host_compatibility),
            }
        })?;
        if required > self.host_version {
            return Err(Error::IncompatibleHost {
                name: name.to_string(),
                required: record.host_compatibility.clone(),
                host: self.host_version.clone(),
            });
        }

        let missing = unsatisfied_dependencies(&registry, record);
        if !missing.is_empty() {
            return Err(Error::UnsatisfiedDependencies {
                name: name.to_string(),
                count: missing.len(),
                missing,
            });
        }

        if let Some(record) = registry.get_mut(name) {
            record.enabled = true;
        }
        self.store.save(&registry)?;
        tracing::info!(extension = name, "Enabled extension");

        Ok(Outcome {
            message: format!("Enabled '{name}'"),
            registry,
        })
    }

    /// Disable `name`. Dependents are left as they are.
    pub fn disable(&self, name: &str) -> Result<Outcome> {
        let mut registry = self.store.load_or_default()?;
        let record = registry
            .get_mut(name)
            .ok_or_else(|| Error::NotInRegistry(name.to_string()))?;

        if !record.enabled {
            return Ok(Outcome {
                message: format!("'{name}' is already disabled"),
                registry,
            });
        }
        record.enabled = false;

        self.store.save(&registry)?;
        tracing::info!(extension = name, "Disabled extension");

        Ok(Outcome {
            message: format!("Disabled '{name}'"),
            registry,
        })
    }

    /// Remove `name`, archiving its record in the uninstall log.
    pub fn uninstall(&self, name: &str) -> Result<Outcome> {
        self.uninstall_with(name, &UninstallOptions::default())
    }

    /// Remove `name` and, when asked, its staged assets.
    pub fn uninstall_with(&self, name: &str, options: &UninstallOptions) -> Result<Outcome> {
        let mut registry = self.store.load_or_default()?;
        let Some((record, index)) = registry.remove(name) else {
            return Ok(Outcome {
                message: format!("'{name}' is not installed, nothing to uninstall"),
                registry,
            });
        };

        let mut log = self.store.load_uninstall_log()?;
        log.archive(record);
        self.store.save_uninstall_log(&log)?;
        self.store.save(&registry)?;
        tracing::info!(extension = name, index, "Uninstalled extension");

        let mut message = format!("Uninstalled '{name}'");
        let staged = [
            (options.remove_public, self.layout.public_dir_for(name)),
            (options.remove_config, self.layout.config_dir_for(name)),
        ];
        for (_, dir) in staged.iter().filter(|(wanted, _)| *wanted) {
            if let Err(e) = remove_directory(dir) {
                tracing::warn!(extension = name, path = %dir, error = %e, "Removing staged assets failed");
                message.push_str(&format!("; removing {dir} failed: {e}"));
            }
        }

        Ok(Outcome { registry, message })
    }

    /// Reposition `name` and persist when it actually moved.
    pub fn move_extension(&self, name: &str, placement: &Placement) -> Result<Outcome> {
        let mut registry = self.store.load_or_default()?;
        let message = match position::move_extension(&mut registry, name, placement)? {
            MoveOutcome::Moved { from, to } => {
                self.store.save(&registry)?;
                tracing::info!(extension = name, from, to, "Moved extension");
                format!("Moved '{name}' from position {from} to {to}")
            }
            MoveOutcome::Unchanged => format!("'{name}' is already {placement}"),
        };
        Ok(Outcome { registry, message })
    }

    /// Load the registry and collect every validation issue.
    pub fn audit(&self) -> Result<AuditReport> {
        let registry = self.store.load()?;
        Ok(validate::audit(&registry, &self.host_version))
    }
}

/// Non-optional dependencies of `record` that are absent or disabled.
fn unsatisfied_dependencies(registry: &Registry, record: &ExtensionRecord) -> Vec<String> {
    record
        .required_dependencies()
        .filter(|dep| !registry.get(&dep.name).is_some_and(|d| d.enabled))
        .map(|dep| dep.name.clone())
        .collect()
}
