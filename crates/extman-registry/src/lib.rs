//! Dependency-aware extension registry.
//!
//! This crate owns the registry document of a host: the ordered list of
//! installed extensions, their enabled state, and the uninstall log used to
//! restore that state on reinstall. It validates the load order against the
//! host version and declared dependencies, repairs it, and drives the
//! install / enable / disable / uninstall lifecycle.

pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod order;
pub mod position;
pub mod record;
pub mod registry;
pub mod settings;
pub mod store;
pub mod validate;
pub mod version;

pub use config::{Dependency, ExtensionConfig};
pub use dependency::DependencyGraph;
pub use descriptor::{PackageDescriptor, read_extension_descriptor, read_package_descriptor};
pub use error::{Error, InitError, Result};
pub use lifecycle::{ExtensionManager, ExtensionSource, InstallOptions, Outcome, UninstallOptions};
pub use loader::{CapabilityTable, load_plan};
pub use order::{DependencyPlacement, OrderReport, repair_order};
pub use position::{MoveOutcome, Placement, move_extension};
pub use record::{Candidate, ExtensionRecord};
pub use registry::{Registry, UninstallLog, Upsert};
pub use settings::HostSettings;
pub use store::RegistryStore;
pub use validate::{AuditReport, ValidationReport, Warning, audit, validate};
pub use version::{VersionConstraint, parse_version};
