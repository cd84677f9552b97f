// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::Graph;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::errors::{DagError, Result};
use crate::task::Task;
use crate::types::Label;

/// Combined dependency graph over task names and artifact labels.
///
/// Each node maps to the set of nodes it depends on:
/// - a task depends on each of its dependency artifacts,
/// - a target artifact depends on the task producing it,
/// - a task depends on each of its implicit task dependencies.
///
/// Every node that appears anywhere is also a key, so a node without
/// dependencies is still part of the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepGraph {
    deps: BTreeMap<Label, BTreeSet<Label>>,
}

impl DepGraph {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut deps: BTreeMap<Label, BTreeSet<Label>> = BTreeMap::new();

        for task in tasks {
            let name = task.name().to_string();
            deps.entry(name.clone()).or_default();

            for dep in task.dependencies() {
                deps.entry(dep.label().to_string()).or_default();
                deps.entry(name.clone())
                    .or_default()
                    .insert(dep.label().to_string());
            }

            for target in task.targets() {
                deps.entry(target.label().to_string())
                    .or_default()
                    .insert(name.clone());
            }

            for other in task.task_dependencies() {
                deps.entry(other.clone()).or_default();
                deps.entry(name.clone()).or_default().insert(other.clone());
            }
        }

        Self { deps }
    }

    /// Restrict the graph to `labels` and everything they transitively
    /// depend on.
    ///
    /// Labels that are not nodes of the graph are silently dropped.
    pub fn subgraph<S: AsRef<str>>(&self, labels: &[S]) -> Self {
        let mut result: BTreeMap<Label, BTreeSet<Label>> = BTreeMap::new();
        let mut front: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();

        while !front.is_empty() {
            let mut next = BTreeSet::new();
            for label in front {
                if result.contains_key(label) {
                    continue;
                }
                if let Some(children) = self.deps.get(label) {
                    result.insert(label.to_string(), children.clone());
                    next.extend(children.iter().map(String::as_str));
                }
            }
            front = next;
        }

        Self { deps: result }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.deps.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn nodes(&self) -> BTreeSet<&str> {
        self.deps
            .iter()
            .flat_map(|(node, deps)| std::iter::once(node).chain(deps))
            .map(String::as_str)
            .collect()
    }

    /// Edges as `(tail, head)` pairs, where head depends on tail.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.deps
            .iter()
            .flat_map(|(head, tails)| {
                tails
                    .iter()
                    .map(move |tail| (tail.as_str(), head.as_str()))
            })
            .collect()
    }

    pub fn dependencies_of(&self, label: &str) -> impl Iterator<Item = &str> {
        self.deps
            .get(label)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// Group nodes into ready waves by in-degree counting.
    ///
    /// Wave `n` holds the nodes whose dependencies all sit in waves `< n`.
    /// Nodes inside a wave are sorted. Fails with [`DagError::DagCycle`] when
    /// nodes remain with positive in-degree after the ready queue drains.
    pub fn waves(&self) -> Result<Vec<Vec<Label>>> {
        let nodes = self.nodes();
        let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (*n, 0)).collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (tail, head) in self.edges() {
            *in_degree.entry(head).or_default() += 1;
            dependents.entry(tail).or_default().push(head);
        }

        let mut ready: Vec<&str> = nodes
            .iter()
            .copied()
            .filter(|n| in_degree.get(n).copied().unwrap_or(0) == 0)
            .collect();
        let mut waves: Vec<Vec<Label>> = Vec::new();
        let mut visited = 0usize;

        while !ready.is_empty() {
            ready.sort_unstable();
            let mut next = Vec::new();
            for node in &ready {
                visited += 1;
                for dependent in dependents.get(node).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }
            waves.push(ready.iter().map(|n| n.to_string()).collect());
            ready = next;
        }

        if visited < nodes.len() {
            let blocked: Vec<&str> = nodes
                .iter()
                .copied()
                .filter(|n| in_degree.get(n).copied().unwrap_or(0) > 0)
                .collect();
            return Err(DagError::DagCycle(format!(
                "cycle detected among nodes: {}",
                blocked.join(", ")
            )));
        }

        debug!(
            waves = waves.len(),
            nodes = visited,
            "computed topological waves"
        );
        Ok(waves)
    }

    /// Graphviz DOT text of the graph, edges pointing from dependency to
    /// dependent.
    pub fn to_dot(&self) -> String {
        let mut graph: Graph<&str, &str> = Graph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for node in self.nodes() {
            index.insert(node, graph.add_node(node));
        }
        for (tail, head) in self.edges() {
            if let (Some(&t), Some(&h)) = (index.get(tail), index.get(head)) {
                graph.add_edge(t, h, "");
            }
        }

        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}
