//! Startup load plan and the capability table.
//!
//! The host never loads extension code by path. It registers one initializer
//! per extension it was built with, asks the registry which extensions to
//! start, and runs their initializers in registry order.
//!
//! # Example
//!
//! ```
//! use extman_registry::loader::CapabilityTable;
//!
//! #[derive(Default)]
//! struct Host {
//!     routes: Vec<&'static str>,
//! }
//!
//! let mut table = CapabilityTable::<Host>::new();
//! table.register("blog", |host: &mut Host| {
//!     host.routes.push("/blog");
//!     Ok(())
//! });
//!
//! assert!(table.contains("blog"));
//! ```

use std::collections::HashMap;

use crate::error::{Error, InitError, Result};
use crate::record::ExtensionRecord;
use crate::registry::Registry;
use crate::version::parse_version;

type Initializer<C> = Box<dyn Fn(&mut C) -> std::result::Result<(), InitError> + Send + Sync>;

/// Enabled, host-compatible records in load order.
pub fn load_plan<'a>(
    registry: &'a Registry,
    host: &semver::Version,
) -> Result<Vec<&'a ExtensionRecord>> {
    let mut plan = Vec::new();
    for (index, record) in registry.iter().enumerate() {
        if !record.enabled {
            continue;
        }
        let required =
            parse_version(&record.host_compatibility).map_err(|e| Error::MalformedRecord {
                index,
                reason: format!("hostCompatibility '{}': {e}", record.host_compatibility),
            })?;
        if required > *host {
            tracing::warn!(
                extension = %record.name,
                required = %required,
                host = %host,
                "Skipping extension that requires a newer host"
            );
            continue;
        }
        plan.push(record);
    }
    Ok(plan)
}

/// Initializers keyed by extension name, run against a host context `C`.
pub struct CapabilityTable<C> {
    initializers: HashMap<String, Initializer<C>>,
}

impl<C> Default for CapabilityTable<C> {
    fn default() -> Self {
        Self {
            initializers: HashMap::new(),
        }
    }
}

impl<C> std::fmt::Debug for CapabilityTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("extensions", &self.names())
            .finish()
    }
}

impl<C> CapabilityTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the initializer for `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, initializer: F)
    where
        F: Fn(&mut C) -> std::result::Result<(), InitError> + Send + Sync + 'static,
    {
        self.initializers.insert(name.into(), Box::new(initializer));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.initializers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.initializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initializers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.initializers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the initializers of `plan` in order.
    ///
    /// Every entry is checked before any initializer runs, so a missing one
    /// leaves the context untouched. Returns the names that were started.
    pub fn initialize(&self, plan: &[&ExtensionRecord], context: &mut C) -> Result<Vec<String>> {
        if let Some(missing) = plan.iter().find(|r| !self.contains(&r.name)) {
            return Err(Error::MissingInitializer(missing.name.clone()));
        }

        let mut started = Vec::with_capacity(plan.len());
        for record in plan {
            if let Some(initializer) = self.initializers.get(&record.name) {
                initializer(&mut *context).map_err(|source| Error::InitializerFailed {
                    name: record.name.clone(),
                    source,
                })?;
                tracing::debug!(extension = %record.name, "Initialized extension");
                started.push(record.name.clone());
            }
        }
        Ok(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Candidate;

    fn record(name: &str, host_compat: &str, enabled: bool) -> ExtensionRecord {
        Candidate::new(name, "1.0.0", host_compat).into_record(enabled, chrono::Utc::now())
    }

    fn host() -> semver::Version {
        semver::Version::new(2, 0, 0)
    }

    #[test]
    fn test_load_plan_filters() {
        let registry = Registry::from_records(vec![
            record("a", "1.0.0", true),
            record("off", "1.0.0", false),
            record("future", "5.0.0", true),
            record("b", "2.0.0", true),
        ]);
        let plan = load_plan(&registry, &host()).unwrap();
        let names: Vec<_> = plan.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_initialize_in_order() {
        let registry = Registry::from_records(vec![record("a", "1.0.0", true), record("b", "1.0.0", true)]);
        let plan = load_plan(&registry, &host()).unwrap();

        let mut table = CapabilityTable::<Vec<String>>::new();
        table.register("b", |log: &mut Vec<String>| {
            log.push("b".into());
            Ok(())
        });
        table.register("a", |log: &mut Vec<String>| {
            log.push("a".into());
            Ok(())
        });

        let mut log = Vec::new();
        let started = table.initialize(&plan, &mut log).unwrap();
        assert_eq!(log, vec!["a", "b"]);
        assert_eq!(started, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_initializer_runs_nothing() {
        let registry = Registry::from_records(vec![record("a", "1.0.0", true), record("b", "1.0.0", true)]);
        let plan = load_plan(&registry, &host()).unwrap();

        let mut table = CapabilityTable::<u32>::new();
        table.register("a", |count: &mut u32| {
            *count += 1;
            Ok(())
        });

        let mut count = 0;
        let err = table.initialize(&plan, &mut count).unwrap_err();
        assert!(matches!(err, Error::MissingInitializer(name) if name == "b"));
        assert_eq!(count, 0);
    }

    #[test]
    fn test_initializer_failure_named() {
        let registry = Registry::from_records(vec![record("a", "1.0.0", true)]);
        let plan = load_plan(&registry, &host()).unwrap();

        let mut table = CapabilityTable::<()>::new();
        table.register("a", |_: &mut ()| Err("database offline".into()));

        let err = table.initialize(&plan, &mut ()).unwrap_err();
        assert!(matches!(err, Error::InitializerFailed { ref name, .. } if name == "a"));
        assert!(err.to_string().contains("database offline"));
    }
}
