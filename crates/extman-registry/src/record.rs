//! Extension records and install candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{Dependency, ExtensionConfig};
use crate::error::{Error, Result};
use crate::version::parse_version;

/// One entry of the registry.
///
/// Field names follow the persisted JSON document. Keys written by older
/// hosts (`periodicCompatibility`, `periodicConfig`, `installDate`) are
/// accepted on read; unknown keys are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    pub name: String,
    pub version: String,
    /// Minimum host version this extension supports.
    #[serde(alias = "periodicCompatibility")]
    pub host_compatibility: String,
    pub installed: bool,
    pub enabled: bool,
    /// Time of the last (re)install.
    #[serde(rename = "date", alias = "installDate")]
    pub install_date: DateTime<Utc>,
    #[serde(alias = "periodicConfig")]
    pub config: ExtensionConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionRecord {
    pub fn dependencies(&self) -> &[Dependency] {
        &self.config.dependencies
    }

    pub fn required_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.config.required_dependencies()
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.config.dependencies.iter().any(|d| d.name == name)
    }
}

/// Metadata for an extension about to be merged into the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub version: String,
    pub host_compatibility: String,
    pub config: ExtensionConfig,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        host_compatibility: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            host_compatibility: host_compatibility.into(),
            config: ExtensionConfig::default(),
        }
    }

    /// Add a dependency declaration.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.config.dependencies.push(dependency);
        self
    }

    pub fn with_config(mut self, config: ExtensionConfig) -> Self {
        self.config = config;
        self
    }

    /// Reject empty names, non-semver versions and unparsable dependency
    /// ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidExtensionMetadata {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        parse_version(&self.version)
            .map_err(|e| invalid(format!("version '{}' is not valid semver: {e}", self.version)))?;
        parse_version(&self.host_compatibility).map_err(|e| {
            invalid(format!(
                "host compatibility '{}' is not valid semver: {e}",
                self.host_compatibility
            ))
        })?;
        for dependency in &self.config.dependencies {
            dependency
                .constraint()
                .map_err(|e| invalid(format!("dependency '{}': {e}", dependency.name)))?;
        }
        Ok(())
    }

    /// Build the record written into the registry.
    pub fn into_record(self, enabled: bool, install_date: DateTime<Utc>) -> ExtensionRecord {
        ExtensionRecord {
            name: self.name,
            version: self.version,
            host_compatibility: self.host_compatibility,
            installed: true,
            enabled,
            install_date,
            config: self.config,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_record_round_trips_with_unknown_keys() {
        let raw = json!({
            "name": "@acme/charts",
            "version": "1.2.0",
            "hostCompatibility": "2.0.0",
            "installed": true,
            "enabled": false,
            "date": "2024-03-01T10:00:00Z",
            "config": {"dependencies": [], "theme": "dark"},
            "installedBy": "ops"
        });

        let record: ExtensionRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.extra["installedBy"], "ops");
        assert_eq!(record.config.extra["theme"], "dark");

        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_record_accepts_legacy_keys() {
        let record: ExtensionRecord = serde_json::from_value(json!({
            "name": "periodicjs.ext.admin",
            "version": "3.1.0",
            "periodicCompatibility": "2.5.0",
            "installed": true,
            "enabled": true,
            "installDate": "2014-11-05T16:14:10.123Z",
            "periodicConfig": {"periodicDependencies": [{"extname": "periodicjs.ext.login"}]}
        }))
        .unwrap();

        assert_eq!(record.host_compatibility, "2.5.0");
        assert_eq!(record.dependencies()[0].name, "periodicjs.ext.login");
        assert!(record.depends_on("periodicjs.ext.login"));
    }

    #[test]
    fn test_record_missing_field_rejected() {
        let result: std::result::Result<ExtensionRecord, _> = serde_json::from_value(json!({
            "name": "broken",
            "version": "1.0.0"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_candidate_validation() {
        assert!(Candidate::new("ok", "1.0.0", "2.0.0").validate().is_ok());
        assert!(Candidate::new("ok", "v1.0.0", "2.0.0").validate().is_ok());

        for candidate in [
            Candidate::new("", "1.0.0", "2.0.0"),
            Candidate::new("bad-version", "1.0", "2.0.0"),
            Candidate::new("bad-host", "1.0.0", "latest"),
            Candidate::new("bad-range", "1.0.0", "2.0.0")
                .with_dependency(Dependency::required("a").with_range(">=one")),
        ] {
            let err = candidate.validate().unwrap_err();
            assert!(
                matches!(err, Error::InvalidExtensionMetadata { .. }),
                "expected InvalidExtensionMetadata, got: {err:?}"
            );
        }
    }

    #[test]
    fn test_into_record_marks_installed() {
        let date = "2024-01-01T00:00:00Z".parse().unwrap();
        let record = Candidate::new("a", "1.0.0", "1.0.0").into_record(true, date);
        assert!(record.installed);
        assert!(record.enabled);
        assert_eq!(record.install_date, date);
    }
}
