//! The ordered extension registry and the uninstall log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::ExtensionRecord;

/// What [`Registry::upsert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing record with the same name was replaced at this index.
    Replaced(usize),
    /// The record was appended at this index.
    Appended(usize),
}

/// Ordered list of extension records.
///
/// Position is load order: every non-optional dependency of the record at
/// index `i` must sit at an index below `i` for the registry to be valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    extensions: Vec<ExtensionRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records in load order.
    pub fn from_records(extensions: Vec<ExtensionRecord>) -> Self {
        Self { extensions }
    }

    pub fn records(&self) -> &[ExtensionRecord] {
        &self.extensions
    }

    pub fn into_records(self) -> Vec<ExtensionRecord> {
        self.extensions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtensionRecord> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Names in load order.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|r| r.name.as_str()).collect()
    }

    /// Index of the record called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.extensions.iter().position(|r| r.name == name)
    }

    /// The record called `name` together with its index.
    pub fn find(&self, name: &str) -> Option<(&ExtensionRecord, usize)> {
        self.position(name).map(|index| (&self.extensions[index], index))
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionRecord> {
        self.extensions.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ExtensionRecord> {
        self.extensions.iter_mut().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace the record with the same name in place, or append it.
    pub fn upsert(&mut self, record: ExtensionRecord) -> Upsert {
        match self.position(&record.name) {
            Some(index) => {
                self.extensions[index] = record;
                Upsert::Replaced(index)
            }
            None => {
                self.extensions.push(record);
                Upsert::Appended(self.extensions.len() - 1)
            }
        }
    }

    /// Remove the record called `name`, returning it and its former index.
    pub fn remove(&mut self, name: &str) -> Option<(ExtensionRecord, usize)> {
        let index = self.position(name)?;
        Some((self.extensions.remove(index), index))
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<ExtensionRecord> {
        &mut self.extensions
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ExtensionRecord;
    type IntoIter = std::slice::Iter<'a, ExtensionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.extensions.iter()
    }
}

/// Last-known record of every uninstalled extension, keyed by name.
///
/// Reinstalling an extension restores its `enabled` flag from here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UninstallLog {
    entries: BTreeMap<String, ExtensionRecord>,
}

impl UninstallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive `record`, overwriting any earlier entry for the same name.
    pub fn archive(&mut self, record: ExtensionRecord) -> Option<ExtensionRecord> {
        self.entries.insert(record.name.clone(), record)
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionRecord> {
        self.entries.get(name)
    }

    /// Whether the extension was enabled when it was last removed.
    pub fn was_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| r.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
