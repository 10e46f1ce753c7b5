//! Dependency resolution: graph construction and OS-filtered topological sort.
//!
//! Modules whose OS filter excludes the target OS are dropped before the
//! sort. Any module that requires a dropped module, directly or through
//! another dropped module, is dropped as well and reported as an
//! [`Exclusion`] so the caller can warn about it. The remaining modules are
//! ordered with Kahn's algorithm using a FIFO queue seeded in manifest
//! order, which makes the output fully deterministic.

mod graph;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

pub use graph::{DependencyGraph, Node};

use crate::config::{Manifest, Module};
use crate::error::{Error, NotFoundError, Result, ValidationError};

/// Why a module was left out of the resolved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The module's OS filter does not include the target OS.
    OsMismatch {
        /// The module's OS filter.
        os: Vec<String>,
    },
    /// The module requires a module that was itself excluded.
    DependsOnExcluded(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OsMismatch { os } => write!(f, "only applies to {}", os.join(", ")),
            Self::DependsOnExcluded(dep) => write!(f, "requires excluded module '{dep}'"),
        }
    }
}

/// A module left out of the resolved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    /// Module name.
    pub module: String,
    /// Reason for the exclusion.
    pub reason: ExclusionReason,
}

/// Outcome of resolving a graph for one target OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Applicable modules, every dependency before its dependents.
    pub ordered: Vec<Module>,
    /// Modules dropped for the target OS, in manifest order.
    pub excluded: Vec<Exclusion>,
}

/// Build the dependency graph for `manifest`.
///
/// Every module becomes a node in declaration order, then one edge is added
/// per `requires` entry.
///
/// # Errors
///
/// Returns [`ValidationError::DuplicateModule`] if two modules share a name
/// and [`NotFoundError::Dependency`] for the first requirement that names
/// no module.
pub fn build_graph(manifest: &Manifest) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    for module in &manifest.modules {
        if graph.contains(&module.name) {
            return Err(ValidationError::DuplicateModule(module.name.clone()).into());
        }
        graph.add_node(module.clone());
    }

    for module in &manifest.modules {
        for dependency in &module.requires {
            if !graph.contains(dependency) {
                return Err(NotFoundError::Dependency {
                    module: module.name.clone(),
                    dependency: dependency.clone(),
                }
                .into());
            }
            graph.add_edge(dependency, &module.name)?;
        }
    }

    Ok(graph)
}

/// Sort the modules of `graph` that apply to `target_os`.
///
/// # Errors
///
/// Returns [`Error::CircularDependency`] if the applicable modules contain
/// a cycle.
pub fn topological_sort(graph: &DependencyGraph, target_os: &str) -> Result<Vec<Module>> {
    resolve(graph, target_os).map(|resolution| resolution.ordered)
}

/// Sort the modules of `graph` for `target_os`, reporting exclusions.
///
/// # Errors
///
/// Returns [`Error::CircularDependency`] naming every applicable module the
/// sort could not place, in manifest order. No partial order is returned.
pub fn resolve(graph: &DependencyGraph, target_os: &str) -> Result<Resolution> {
    let excluded = exclusions(graph, target_os);
    let excluded_names: HashSet<&str> = excluded.iter().map(|e| e.module.as_str()).collect();

    // Exclusion is closed over dependents, so every edge into a working-set
    // node comes from another working-set node.
    let mut in_degree: HashMap<&str, usize> = graph
        .nodes()
        .filter(|node| !excluded_names.contains(node.module.name.as_str()))
        .map(|node| (node.module.name.as_str(), node.in_degree))
        .collect();

    let mut queue: VecDeque<&str> = graph
        .nodes()
        .map(|node| node.module.name.as_str())
        .filter(|name| in_degree.get(name) == Some(&0))
        .collect();

    let mut ordered = Vec::with_capacity(in_degree.len());
    while let Some(name) = queue.pop_front() {
        if let Some(node) = graph.node(name) {
            ordered.push(node.module.clone());
        }
        for dependent in graph.dependents(name) {
            if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(dependent.as_str());
                }
            }
        }
    }

    if ordered.len() < in_degree.len() {
        let placed: HashSet<&str> = ordered.iter().map(|m| m.name.as_str()).collect();
        let modules = graph
            .nodes()
            .map(|node| node.module.name.as_str())
            .filter(|name| in_degree.contains_key(name) && !placed.contains(name))
            .map(String::from)
            .collect();
        return Err(Error::CircularDependency { modules });
    }

    Ok(Resolution { ordered, excluded })
}

/// Compute the OS-excluded modules and everything that transitively
/// requires them, in manifest order.
fn exclusions(graph: &DependencyGraph, target_os: &str) -> Vec<Exclusion> {
    let mut reasons: HashMap<&str, ExclusionReason> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for node in graph.nodes() {
        if !node.module.applies_to(target_os) {
            reasons.insert(
                node.module.name.as_str(),
                ExclusionReason::OsMismatch {
                    os: node.module.os.clone(),
                },
            );
            queue.push_back(node.module.name.as_str());
        }
    }

    while let Some(name) = queue.pop_front() {
        for dependent in graph.dependents(name) {
            if !reasons.contains_key(dependent.as_str()) {
                reasons.insert(
                    dependent.as_str(),
                    ExclusionReason::DependsOnExcluded(name.to_string()),
                );
                queue.push_back(dependent.as_str());
            }
        }
    }

    graph
        .nodes()
        .filter_map(|node| {
            reasons
                .remove(node.module.name.as_str())
                .map(|reason| Exclusion {
                    module: node.module.name.clone(),
                    reason,
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn manifest(modules: Vec<Module>) -> Manifest {
        Manifest {
            modules,
            ..Manifest::default()
        }
    }

    fn names(modules: &[Module]) -> Vec<&str> {
        modules.iter().map(|m| m.name.as_str()).collect()
    }

    fn sort(modules: Vec<Module>, os: &str) -> Result<Vec<Module>> {
        let graph = build_graph(&manifest(modules))?;
        topological_sort(&graph, os)
    }

    /// Every applicable dependency appears strictly before its dependent.
    fn assert_dependencies_first(ordered: &[Module]) {
        let position: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.as_str(), i))
            .collect();
        for (i, module) in ordered.iter().enumerate() {
            for req in &module.requires {
                let dep = position.get(req.as_str()).expect("dependency emitted");
                assert!(*dep < i, "{req} must precede {}", module.name);
            }
        }
    }

    // ---- build_graph ----

    #[test]
    fn build_graph_adds_nodes_in_manifest_order() {
        let graph = build_graph(&manifest(vec![
            Module::new("b", "b.zsh"),
            Module::new("a", "a.zsh").with_requires(["b"]),
        ]))
        .unwrap();
        let order: Vec<_> = graph.nodes().map(|n| n.module.name.as_str()).collect();
        assert_eq!(order, ["b", "a"]);
        assert_eq!(graph.dependents("b"), ["a"]);
        assert_eq!(graph.node("a").unwrap().in_degree, 1);
    }

    #[test]
    fn build_graph_unknown_dependency_is_not_found() {
        let err = build_graph(&manifest(vec![
            Module::new("aliases", "aliases.zsh").with_requires(["core"]),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("'aliases' requires unknown module 'core'"));
    }

    #[test]
    fn build_graph_duplicate_name_is_validation_error() {
        let err = build_graph(&manifest(vec![
            Module::new("a", "a.zsh"),
            Module::new("a", "a2.zsh"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    // ---- topological_sort ----

    #[test]
    fn os_specific_dependent_included_on_matching_os() {
        let modules = vec![
            Module::new("A", "a.zsh"),
            Module::new("B", "b.zsh").with_requires(["A"]).with_os(["Mac"]),
        ];
        assert_eq!(names(&sort(modules, "Mac").unwrap()), ["A", "B"]);
    }

    #[test]
    fn os_specific_dependent_dropped_on_other_os() {
        let modules = vec![
            Module::new("A", "a.zsh"),
            Module::new("B", "b.zsh").with_requires(["A"]).with_os(["Mac"]),
        ];
        assert_eq!(names(&sort(modules, "Linux").unwrap()), ["A"]);
    }

    #[test]
    fn os_match_is_case_insensitive() {
        let modules = vec![Module::new("B", "b.zsh").with_os(["Mac"])];
        assert_eq!(names(&sort(modules, "mac").unwrap()), ["B"]);
    }

    #[test]
    fn two_module_cycle_names_both() {
        let err = sort(
            vec![
                Module::new("A", "a.zsh").with_requires(["B"]),
                Module::new("B", "b.zsh").with_requires(["A"]),
            ],
            "Linux",
        )
        .unwrap_err();
        match err {
            Error::CircularDependency { modules } => assert_eq!(modules, ["A", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn cycle_error_omits_modules_that_were_placed() {
        let err = sort(
            vec![
                Module::new("root", "r.zsh"),
                Module::new("x", "x.zsh").with_requires(["root", "y"]),
                Module::new("y", "y.zsh").with_requires(["x"]),
            ],
            "Linux",
        )
        .unwrap_err();
        match err {
            Error::CircularDependency { modules } => assert_eq!(modules, ["x", "y"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = sort(
            vec![Module::new("a", "a.zsh").with_requires(["a"])],
            "Linux",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircularDependency);
    }

    #[test]
    fn independent_modules_keep_manifest_order() {
        let modules = vec![
            Module::new("c", "c.zsh"),
            Module::new("a", "a.zsh"),
            Module::new("b", "b.zsh"),
        ];
        assert_eq!(names(&sort(modules, "Linux").unwrap()), ["c", "a", "b"]);
    }

    #[test]
    fn ready_modules_are_processed_first_in_first_out() {
        // core unlocks "late" only after "early" (seeded) has been emitted.
        let modules = vec![
            Module::new("late", "l.zsh").with_requires(["core"]),
            Module::new("core", "c.zsh"),
            Module::new("early", "e.zsh"),
        ];
        assert_eq!(
            names(&sort(modules, "Linux").unwrap()),
            ["core", "early", "late"]
        );
    }

    #[test]
    fn diamond_orders_all_dependencies_first() {
        let modules = vec![
            Module::new("d", "d.zsh").with_requires(["b", "c"]),
            Module::new("c", "c.zsh").with_requires(["a"]),
            Module::new("b", "b.zsh").with_requires(["a"]),
            Module::new("a", "a.zsh"),
        ];
        let ordered = sort(modules, "Linux").unwrap();
        assert_eq!(names(&ordered), ["a", "c", "b", "d"]);
        assert_dependencies_first(&ordered);
    }

    #[test]
    fn empty_graph_sorts_to_empty() {
        assert!(sort(Vec::new(), "Linux").unwrap().is_empty());
    }

    // ---- exclusions ----

    #[test]
    fn dependent_of_excluded_module_is_excluded_transitively() {
        let graph = build_graph(&manifest(vec![
            Module::new("brew", "brew.zsh").with_os(["Mac"]),
            Module::new("casks", "casks.zsh").with_requires(["brew"]),
            Module::new("aliases", "aliases.zsh").with_requires(["casks"]),
            Module::new("core", "core.zsh"),
        ]))
        .unwrap();
        let resolution = resolve(&graph, "Linux").unwrap();
        assert_eq!(names(&resolution.ordered), ["core"]);
        assert_eq!(
            resolution.excluded,
            vec![
                Exclusion {
                    module: "brew".to_string(),
                    reason: ExclusionReason::OsMismatch {
                        os: vec!["Mac".to_string()]
                    },
                },
                Exclusion {
                    module: "casks".to_string(),
                    reason: ExclusionReason::DependsOnExcluded("brew".to_string()),
                },
                Exclusion {
                    module: "aliases".to_string(),
                    reason: ExclusionReason::DependsOnExcluded("casks".to_string()),
                },
            ]
        );
    }

    #[test]
    fn cycle_through_excluded_module_is_not_reported() {
        let graph = build_graph(&manifest(vec![
            Module::new("a", "a.zsh").with_requires(["b"]).with_os(["Windows"]),
            Module::new("b", "b.zsh").with_requires(["a"]),
        ]))
        .unwrap();
        let resolution = resolve(&graph, "Linux").unwrap();
        assert!(resolution.ordered.is_empty());
        assert_eq!(resolution.excluded.len(), 2);
    }

    #[test]
    fn exclusion_reason_display() {
        assert_eq!(
            ExclusionReason::OsMismatch {
                os: vec!["Mac".to_string(), "Windows".to_string()]
            }
            .to_string(),
            "only applies to Mac, Windows"
        );
        assert_eq!(
            ExclusionReason::DependsOnExcluded("brew".to_string()).to_string(),
            "requires excluded module 'brew'"
        );
    }
}
