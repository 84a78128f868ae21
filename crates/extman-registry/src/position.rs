//! Explicit repositioning of a single record.
//!
//! Moves do not validate: an operator can place an extension ahead of its
//! dependency, and the next validation run will say so.

use crate::error::{Error, Result};
use crate::registry::Registry;

/// Where to put an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Immediately before the named extension.
    Before(String),
    /// Immediately after the named extension.
    After(String),
    /// At this index, clamped to the last valid index.
    AtIndex(usize),
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::Before(other) => write!(f, "before '{other}'"),
            Placement::After(other) => write!(f, "after '{other}'"),
            Placement::AtIndex(index) => write!(f, "at index {index}"),
        }
    }
}

/// What [`move_extension`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: usize, to: usize },
    /// Already in the requested place.
    Unchanged,
}

/// Move `name` to `placement`.
pub fn move_extension(
    registry: &mut Registry,
    name: &str,
    placement: &Placement,
) -> Result<MoveOutcome> {
    let from = registry
        .position(name)
        .ok_or_else(|| Error::NotInRegistry(name.to_string()))?;

    let reference = |registry: &Registry, other: &str| {
        registry
            .position(other)
            .ok_or_else(|| Error::NotInRegistry(other.to_string()))
    };

    let target = match placement {
        Placement::Before(other) => {
            let at = reference(registry, other)?;
            if other == name || from + 1 == at {
                return Ok(MoveOutcome::Unchanged);
            }
            if from < at { at - 1 } else { at }
        }
        Placement::After(other) => {
            let at = reference(registry, other)?;
            if other == name || at + 1 == from {
                return Ok(MoveOutcome::Unchanged);
            }
            if from < at { at } else { at + 1 }
        }
        Placement::AtIndex(index) => {
            let last = registry.len().saturating_sub(1);
            let to = (*index).min(last);
            if to == from {
                return Ok(MoveOutcome::Unchanged);
            }
            to
        }
    };

    let records = registry.records_mut();
    let record = records.remove(from);
    records.insert(target, record);

    tracing::debug!(extension = name, from, to = target, "Moved extension");
    Ok(MoveOutcome::Moved { from, to: target })
}
