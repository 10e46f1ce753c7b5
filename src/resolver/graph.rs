//! Module dependency graph.

use std::collections::HashMap;

use crate::config::Module;
use crate::error::NotFoundError;

/// A graph node: the module and its count of unresolved dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The module this node represents.
    pub module: Module,
    /// Number of incoming edges (requirements) recorded for the module.
    pub in_degree: usize,
}

/// Directed graph over modules keyed by name.
///
/// Edges point from a dependency to its dependent. Node enumeration follows
/// insertion order so that sorting is reproducible.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    order: Vec<String>,
    nodes: HashMap<String, Node>,
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` as a node with in-degree 0.
    ///
    /// A node with the same name is overwritten in place and keeps its
    /// original enumeration position.
    pub fn add_node(&mut self, module: Module) {
        let name = module.name.clone();
        let node = Node {
            module,
            in_degree: 0,
        };
        if self.nodes.insert(name.clone(), node).is_none() {
            self.order.push(name);
        }
    }

    /// Record that `to` depends on `from`.
    ///
    /// Increments the in-degree of `to` and appends `to` to the dependents
    /// of `from`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Node`] if either name has not been added.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), NotFoundError> {
        if !self.nodes.contains_key(from) {
            return Err(NotFoundError::Node(from.to_string()));
        }
        let target = self
            .nodes
            .get_mut(to)
            .ok_or_else(|| NotFoundError::Node(to.to_string()))?;
        target.in_degree += 1;
        self.dependents
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        Ok(())
    }

    /// Names of modules that require `name`, in edge-insertion order.
    #[must_use]
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Look up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Returns `true` if a node named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
