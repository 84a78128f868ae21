//! Order repair: move dependents behind their dependencies.
//!
//! The scan looks for the first record that loads at or before one of its
//! present dependencies (optional ones included), moves it to the slot
//! immediately after that dependency, and starts over. Records before the
//! first violation never move, so an acyclic registry settles within
//! `n * n + n` moves; anything still unsettled past that is reported as a
//! cycle.

use std::collections::{BTreeMap, BTreeSet};

use crate::dependency::DependencyGraph;
use crate::error::{Error, Result};
use crate::record::ExtensionRecord;
use crate::registry::Registry;

/// Where a dependency ended up relative to its dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPlacement {
    /// Already loaded before the dependent.
    InOrder,
    /// The dependent was moved behind it.
    Moved,
    /// Not installed.
    Absent,
}

/// Per-extension dependency placements produced by [`repair_order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReport {
    pub placements: BTreeMap<String, BTreeMap<String, DependencyPlacement>>,
    pub moves: usize,
}

impl OrderReport {
    pub fn changed(&self) -> bool {
        self.moves > 0
    }

    pub fn placement(&self, extension: &str, dependency: &str) -> Option<DependencyPlacement> {
        self.placements.get(extension)?.get(dependency).copied()
    }
}

/// Reorder `registry` so no record precedes a present dependency.
///
/// On error the registry is left untouched.
pub fn repair_order(registry: &mut Registry) -> Result<OrderReport> {
    DependencyGraph::from_registry(registry).topological_sort()?;

    let mut records = registry.records().to_vec();
    let limit = records.len() * records.len() + records.len();
    let mut moved: BTreeSet<(String, String)> = BTreeSet::new();
    let mut moves = 0;

    while let Some((index, target, dependency)) = first_violation(&records) {
        if moves >= limit {
            return Err(Error::DependencyCycle {
                participants: vec![records[index].name.clone(), dependency],
            });
        }
        let record = records.remove(index);
        tracing::debug!(
            extension = %record.name,
            dependency = %dependency,
            from = index,
            to = target,
            "Moving extension behind its dependency"
        );
        moved.insert((record.name.clone(), dependency));
        records.insert(target, record);
        moves += 1;
    }

    let placements = records
        .iter()
        .map(|record| {
            let deps = record
                .dependencies()
                .iter()
                .map(|dep| {
                    let placement = if !records.iter().any(|r| r.name == dep.name) {
                        DependencyPlacement::Absent
                    } else if moved.contains(&(record.name.clone(), dep.name.clone())) {
                        DependencyPlacement::Moved
                    } else {
                        DependencyPlacement::InOrder
                    };
                    (dep.name.clone(), placement)
                })
                .collect();
            (record.name.clone(), deps)
        })
        .collect();

    *registry.records_mut() = records;
    Ok(OrderReport { placements, moves })
}

/// First `(index, dependency index, dependency name)` where a record loads
/// no later than something it depends on.
fn first_violation(records: &[ExtensionRecord]) -> Option<(usize, usize, String)> {
    records.iter().enumerate().find_map(|(index, record)| {
        record.dependencies().iter().find_map(|dep| {
            records
                .iter()
                .position(|r| r.name == dep.name)
                .filter(|position| *position >= index)
                .map(|position| (index, position, dep.name.clone()))
        })
    })
}
