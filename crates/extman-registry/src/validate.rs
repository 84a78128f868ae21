//! Registry validation against a host version.
//!
//! Rules, applied to each record in load order:
//!
//! 1. `name`, `version` and `hostCompatibility` are non-empty, the versions
//!    parse as semver, and the name is not used by an earlier record.
//! 2. A record requiring a newer host is an error when enabled and a warning
//!    otherwise.
//! 3. Every non-optional dependency is present, loaded earlier, and at a
//!    version inside the declared range.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::record::ExtensionRecord;
use crate::registry::Registry;
use crate::version::parse_version;

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A disabled extension requires a newer host than the one running.
    IncompatibleHost {
        name: String,
        required: String,
        host: semver::Version,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::IncompatibleHost {
                name,
                required,
                host,
            } => write!(
                f,
                "disabled extension '{name}' requires host version {required}, running {host}"
            ),
        }
    }
}

/// Outcome of a successful [`validate`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<Warning>,
}

/// Every finding of an [`audit`] run.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub errors: Vec<Error>,
    pub warnings: Vec<Warning>,
}

impl AuditReport {
    /// Whether the registry passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate `registry`, stopping at the first error.
pub fn validate(registry: &Registry, host: &semver::Version) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let mut seen = HashSet::new();

    for (index, record) in registry.iter().enumerate() {
        check_fields(index, record, &mut seen)?;
        if let Some(warning) = check_host(record, host)? {
            report.warnings.push(warning);
        }
        if let Some(err) = check_dependencies(registry, index, record).into_iter().next() {
            return Err(err);
        }
    }

    Ok(report)
}

/// Validate `registry`, collecting every error instead of stopping.
///
/// A record with malformed fields is reported once and its remaining rules
/// are skipped.
pub fn audit(registry: &Registry, host: &semver::Version) -> AuditReport {
    let mut report = AuditReport::default();
    let mut seen = HashSet::new();

    for (index, record) in registry.iter().enumerate() {
        if let Err(err) = check_fields(index, record, &mut seen) {
            report.errors.push(err);
            continue;
        }
        match check_host(record, host) {
            Ok(Some(warning)) => report.warnings.push(warning),
            Ok(None) => {}
            Err(err) => report.errors.push(err),
        }
        report
            .errors
            .extend(check_dependencies(registry, index, record));
    }

    report
}

fn check_fields<'a>(
    index: usize,
    record: &'a ExtensionRecord,
    seen: &mut HashSet<&'a str>,
) -> Result<()> {
    let malformed = |reason: String| Error::MalformedRecord { index, reason };

    for (field, value) in [
        ("name", &record.name),
        ("version", &record.version),
        ("hostCompatibility", &record.host_compatibility),
    ] {
        if value.trim().is_empty() {
            return Err(malformed(format!("'{field}' is empty")));
        }
    }
    parse_version(&record.version)
        .map_err(|e| malformed(format!("version '{}': {e}", record.version)))?;
    parse_version(&record.host_compatibility).map_err(|e| {
        malformed(format!(
            "hostCompatibility '{}': {e}",
            record.host_compatibility
        ))
    })?;
    if !seen.insert(record.name.as_str()) {
        return Err(malformed(format!("duplicate name '{}'", record.name)));
    }
    Ok(())
}

/// Assumes `check_fields` passed.
fn check_host(record: &ExtensionRecord, host: &semver::Version) -> Result<Option<Warning>> {
    let required = parse_version(&record.host_compatibility).map_err(|e| {
        Error::InvalidExtensionMetadata {
            name: record.name.clone(),
            reason: e.to_string(),
        }
    })?;
    if required <= *host {
        return Ok(None);
    }

    if record.enabled {
        return Err(Error::IncompatibleHost {
            name: record.name.clone(),
            required: record.host_compatibility.clone(),
            host: host.clone(),
        });
    }

    tracing::warn!(
        extension = %record.name,
        required = %record.host_compatibility,
        host = %host,
        "Disabled extension requires a newer host"
    );
    Ok(Some(Warning::IncompatibleHost {
        name: record.name.clone(),
        required: record.host_compatibility.clone(),
        host: host.clone(),
    }))
}

fn check_dependencies(registry: &Registry, index: usize, record: &ExtensionRecord) -> Vec<Error> {
    let mut errors = Vec::new();

    for dep in record.required_dependencies() {
        let Some((installed, position)) = registry.find(&dep.name) else {
            errors.push(Error::MissingDependency {
                extension: record.name.clone(),
                dependency: dep.name.clone(),
            });
            continue;
        };

        if position >= index {
            errors.push(Error::OutOfOrderDependency {
                extension: record.name.clone(),
                dependency: dep.name.clone(),
            });
            continue;
        }

        let incompatible = || Error::IncompatibleDependencyVersion {
            extension: record.name.clone(),
            dependency: dep.name.clone(),
            required: dep.version_range.clone().unwrap_or_default(),
            installed: installed.version.clone(),
        };
        match dep.constraint() {
            Ok(None) => {}
            Ok(Some(constraint)) if constraint.satisfies(&installed.version) => {}
            Ok(Some(_)) => errors.push(incompatible()),
            Err(e) => errors.push(e),
        }
    }

    errors
}
