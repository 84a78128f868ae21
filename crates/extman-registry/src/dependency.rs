//! Dependency graph and cycle detection for registry records.
//!
//! Order repair moves a dependent behind its dependency until no record
//! precedes something it depends on. That only terminates when the present
//! dependencies form a DAG, so the graph is checked first and a cycle is
//! reported instead of being iterated on.
//!
//! # Example
//!
//! ```
//! use extman_registry::dependency::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("auth");
//! graph.add_node("admin");
//! graph.add_edge("admin", "auth");
//!
//! let order = graph.topological_sort().unwrap();
//! assert_eq!(order, vec!["auth", "admin"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::registry::Registry;

/// Directed graph of dependencies between extensions.
///
/// Edges point from dependent to dependency: if A depends on B, the edge
/// is `A -> B`. Topological sort returns names in dependency-first order
/// (B before A).
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Adjacency list: key depends on each value.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no dependencies. Existing edges are kept.
    pub fn add_node(&mut self, id: impl Into<String>) {
        self.edges.entry(id.into()).or_default();
    }

    /// Declare that `from` depends on `to`.
    ///
    /// Edges to nodes that are not in the graph are ignored by the sort.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Return the number of nodes.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Return the number of edges between nodes of the graph.
    pub fn edge_count(&self) -> usize {
        self.edges
            .values()
            .flat_map(|deps| deps.iter())
            .filter(|dep| self.edges.contains_key(*dep))
            .count()
    }

    /// Get the direct dependencies of a node.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Topological sort using Kahn's algorithm.
    ///
    /// Ties are broken alphabetically so the result is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` naming every node that could not be
    /// ordered, which includes the cycle members and anything behind them.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| {
                let present = deps.iter().filter(|d| self.edges.contains_key(*d)).count();
                (id.as_str(), present)
            })
            .collect();

        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (id, deps) in &self.edges {
            for dep in deps.iter().filter(|d| self.edges.contains_key(*d)) {
                dependents.entry(dep.as_str()).or_default().push(id.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut result = Vec::with_capacity(self.edges.len());
        while let Some(current) = ready.pop_first() {
            remaining.remove(current);
            result.push(current.to_string());

            for dependent in dependents.get(current).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            return Err(Error::DependencyCycle {
                participants: remaining.keys().map(|id| id.to_string()).collect(),
            });
        }

        Ok(result)
    }

    /// Build the graph of a registry, including optional dependencies.
    ///
    /// Dependencies on extensions that are not installed produce no edge.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = Self::new();
        for record in registry {
            graph.add_node(record.name.clone());
        }
        for record in registry {
            for dep in record.dependencies() {
                if registry.contains(&dep.name) {
                    graph.add_edge(&record.name, &dep.name);
                }
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.topological_sort().unwrap().is_empty());
    }

    #[test]
    fn test_linear_chain() {
        let mut graph = DependencyGraph::new();
        graph.add_node("c");
        graph.add_node("b");
        graph.add_node("a");
        graph.add_edge("c", "b");
        graph.add_edge("b", "a");

        assert_eq!(graph.topological_sort().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diamond_dependency() {
        let mut graph = DependencyGraph::new();
        for id in ["base", "left", "right", "top"] {
            graph.add_node(id);
        }
        graph.add_edge("left", "base");
        graph.add_edge("right", "base");
        graph.add_edge("top", "left");
        graph.add_edge("top", "right");

        let sorted = graph.topological_sort().unwrap();
        assert_eq!(sorted.first().map(String::as_str), Some("base"));
        assert_eq!(sorted.last().map(String::as_str), Some("top"));
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a");
        graph.add_node("b");
        graph.add_node("free");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");

        let err = graph.topological_sort().unwrap_err();
        match err {
            Error::DependencyCycle { participants } => assert_eq!(participants, vec!["a", "b"]),
            other => panic!("expected DependencyCycle, got: {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_node("narcissus");
        graph.add_edge("narcissus", "narcissus");
        assert!(matches!(
            graph.topological_sort(),
            Err(Error::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_edges_to_unknown_nodes_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a");
        graph.add_edge("a", "not-installed");

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.dependencies_of("a"), vec!["not-installed"]);
        assert_eq!(graph.topological_sort().unwrap(), vec!["a"]);
    }
}
