//! Task graph collaborator
//!
//! The query service only needs three questions answered about the
//! orchestrator's DAG, captured by [`TaskGraph`]. [`InMemoryTaskGraph`] is a
//! plain implementation for hosts without their own and for tests.

use indexmap::IndexMap;
use std::collections::HashMap;

/// A task in the DAG, optionally owning a nested planning subgraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub id: String,
    pub subgraph_id: Option<String>,
}

impl TaskNode {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subgraph_id: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_subgraph(mut self, subgraph_id: impl Into<String>) -> Self {
        self.subgraph_id = Some(subgraph_id.into());
        self
    }
}

/// A nested planning subgraph and its direct members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    pub id: String,
    pub nodes: Vec<TaskNode>,
}

impl Subgraph {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_node(mut self, node: TaskNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// True if `task_id` is a direct (non-nested) member
    #[must_use]
    pub fn has_direct_member(&self, task_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == task_id)
    }
}

/// Read-only view of the orchestrator's task DAG
pub trait TaskGraph: Send + Sync {
    fn find_node(&self, task_id: &str) -> Option<TaskNode>;

    fn get_subgraph(&self, subgraph_id: &str) -> Option<Subgraph>;

    /// Top-level tasks, plus every task inside subgraphs when asked
    fn all_tasks(&self, include_subgraphs: bool) -> Vec<TaskNode>;
}

/// Map-backed [`TaskGraph`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskGraph {
    tasks: IndexMap<String, TaskNode>,
    subgraphs: HashMap<String, Subgraph>,
}

impl InMemoryTaskGraph {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level task
    #[must_use]
    pub fn with_task(mut self, node: TaskNode) -> Self {
        self.tasks.insert(node.id.clone(), node);
        self
    }

    #[must_use]
    pub fn with_subgraph(mut self, subgraph: Subgraph) -> Self {
        self.subgraphs.insert(subgraph.id.clone(), subgraph);
        self
    }

    fn collect_nested(&self, subgraph_id: &str, out: &mut Vec<TaskNode>, depth: usize) {
        // Guard against cyclic subgraph references.
        if depth > self.subgraphs.len() {
            return;
        }
        let Some(subgraph) = self.subgraphs.get(subgraph_id) else {
            return;
        };
        for node in &subgraph.nodes {
            out.push(node.clone());
            if let Some(nested) = &node.subgraph_id {
                self.collect_nested(nested, out, depth + 1);
            }
        }
    }
}

impl TaskGraph for InMemoryTaskGraph {
    fn find_node(&self, task_id: &str) -> Option<TaskNode> {
        if let Some(node) = self.tasks.get(task_id) {
            return Some(node.clone());
        }
        self.subgraphs
            .values()
            .flat_map(|s| s.nodes.iter())
            .find(|n| n.id == task_id)
            .cloned()
    }

    fn get_subgraph(&self, subgraph_id: &str) -> Option<Subgraph> {
        self.subgraphs.get(subgraph_id).cloned()
    }

    fn all_tasks(&self, include_subgraphs: bool) -> Vec<TaskNode> {
        let mut out: Vec<TaskNode> = self.tasks.values().cloned().collect();
        if include_subgraphs {
            for node in self.tasks.values() {
                if let Some(subgraph_id) = &node.subgraph_id {
                    self.collect_nested(subgraph_id, &mut out, 0);
                }
            }
        }
        out
    }
}
