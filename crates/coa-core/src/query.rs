//! Artifact query and injection service
//!
//! Decides which artifacts a task is allowed to see, according to the
//! [`InjectionMode`]. Every branch returns [`ArtifactReference`]s built by the
//! single `From<&Artifact>` conversion.

use crate::config::InjectionMode;
use crate::graph::TaskGraph;
use coa_artifact::{Artifact, ArtifactId, ArtifactReference};
use coa_registry::ArtifactRegistry;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// What the service needs to know about the requesting task
#[derive(Clone, Copy, Default)]
pub struct TaskScope<'a> {
    pub task_id: &'a str,
    pub dependencies: &'a [String],
    pub graph: Option<&'a dyn TaskGraph>,
}

impl fmt::Debug for TaskScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScope")
            .field("task_id", &self.task_id)
            .field("dependencies", &self.dependencies)
            .field("graph", &self.graph.is_some())
            .finish()
    }
}

impl<'a> TaskScope<'a> {
    #[must_use]
    pub fn new(task_id: &'a str) -> Self {
        Self {
            task_id,
            dependencies: &[],
            graph: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: &'a [String]) -> Self {
        self.dependencies = dependencies;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_graph(mut self, graph: &'a dyn TaskGraph) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// Read-only view over the registry shaped for prompt context
#[derive(Debug, Clone)]
pub struct ArtifactQueryService {
    registry: Arc<ArtifactRegistry>,
}

fn references(artifacts: impl IntoIterator<Item = Artifact>) -> Vec<ArtifactReference> {
    let mut seen = HashSet::<ArtifactId>::new();
    artifacts
        .into_iter()
        .filter(|a| seen.insert(a.id))
        .map(ArtifactReference::from)
        .collect()
}

impl ArtifactQueryService {
    #[must_use]
    pub fn new(registry: Arc<ArtifactRegistry>) -> Self {
        Self { registry }
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    /// Dispatch on `mode`
    ///
    /// `subtask` without a graph in scope degrades to the task's own artifacts.
    pub async fn for_task(&self, mode: InjectionMode, scope: TaskScope<'_>) -> Vec<ArtifactReference> {
        match mode {
            InjectionMode::None => self.none(),
            InjectionMode::Dependencies => self.dependencies(scope.dependencies).await,
            InjectionMode::Full => self.full().await,
            InjectionMode::Subtask => match scope.graph {
                Some(graph) => self.subtask(graph, scope.task_id).await,
                None => {
                    tracing::debug!(task_id = scope.task_id, "no task graph, using own artifacts");
                    self.tasks([scope.task_id]).await
                }
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn none(&self) -> Vec<ArtifactReference> {
        Vec::new()
    }

    /// Artifacts of the given tasks, deduplicated by task id and artifact id
    pub async fn dependencies<S: AsRef<str>>(&self, task_ids: &[S]) -> Vec<ArtifactReference> {
        self.tasks(task_ids.iter().map(|id| id.as_ref())).await
    }

    /// Everything, in registration order
    pub async fn full(&self) -> Vec<ArtifactReference> {
        references(self.registry.get_all().await)
    }

    /// Artifacts visible within the task's planning subgraph
    pub async fn subtask(&self, graph: &dyn TaskGraph, task_id: &str) -> Vec<ArtifactReference> {
        let Some(node) = graph.find_node(task_id) else {
            tracing::warn!(task_id, "task not found in graph, no subtask artifacts");
            return Vec::new();
        };

        if let Some(subgraph_id) = &node.subgraph_id {
            let mut members = vec![node.id.clone()];
            collect_members(graph, subgraph_id, &mut members, &mut HashSet::new());
            return self.tasks(members.iter().map(String::as_str)).await;
        }

        let enclosing = graph
            .all_tasks(true)
            .into_iter()
            .filter_map(|n| n.subgraph_id)
            .find_map(|id| graph.get_subgraph(&id).filter(|s| s.has_direct_member(task_id)));

        match enclosing {
            Some(subgraph) => {
                tracing::debug!(task_id, subgraph = %subgraph.id, "using sibling artifacts");
                self.tasks(subgraph.nodes.iter().map(|n| n.id.as_str())).await
            }
            None => self.tasks([task_id]).await,
        }
    }

    async fn tasks<'a>(&self, task_ids: impl IntoIterator<Item = &'a str>) -> Vec<ArtifactReference> {
        let unique: IndexSet<&str> = task_ids.into_iter().collect();
        let mut artifacts = Vec::new();
        for task_id in unique {
            artifacts.extend(self.registry.get_by_task(task_id).await);
        }
        references(artifacts)
    }
}

fn collect_members(
    graph: &dyn TaskGraph,
    subgraph_id: &str,
    out: &mut Vec<String>,
    visited: &mut HashSet<String>,
) {
    if !visited.insert(subgraph_id.to_string()) {
        return;
    }
    let Some(subgraph) = graph.get_subgraph(subgraph_id) else {
        return;
    };
    for node in subgraph.nodes {
        if let Some(nested) = &node.subgraph_id {
            collect_members(graph, nested, out, visited);
        }
        out.push(node.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InMemoryTaskGraph, Subgraph, TaskNode};
    use coa_artifact::ArtifactType;

    fn artifact(path: &str, task: &str) -> Artifact {
        Artifact::builder(path)
            .created_by(task, "test")
            .artifact_type(ArtifactType::DataFetch)
            .build()
            .unwrap()
    }

    async fn seeded() -> ArtifactQueryService {
        let registry = Arc::new(ArtifactRegistry::new());
        registry
            .register_batch(vec![
                artifact("/exec/plan.md", "plan"),
                artifact("/exec/raw.csv", "fetch"),
                artifact("/exec/model.json", "fit"),
                artifact("/exec/final.md", "report"),
                artifact("/exec/alone.txt", "solo"),
            ])
            .await;
        ArtifactQueryService::new(registry)
    }

    fn graph() -> InMemoryTaskGraph {
        InMemoryTaskGraph::new()
            .with_task(TaskNode::new("plan").with_subgraph("sg-plan"))
            .with_task(TaskNode::new("report"))
            .with_task(TaskNode::new("solo"))
            .with_subgraph(
                Subgraph::new("sg-plan")
                    .with_node(TaskNode::new("fetch"))
                    .with_node(TaskNode::new("analyze").with_subgraph("sg-analyze")),
            )
            .with_subgraph(Subgraph::new("sg-analyze").with_node(TaskNode::new("fit")))
    }

    fn names(refs: &[ArtifactReference]) -> Vec<&str> {
        let mut names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    #[tokio::test]
    async fn none_is_always_empty() {
        let service = seeded().await;
        let deps = vec!["fetch".to_string()];
        let scope = TaskScope::new("report").with_dependencies(&deps);
        assert!(service.for_task(InjectionMode::None, scope).await.is_empty());
    }

    #[tokio::test]
    async fn dependencies_dedup_tasks() {
        let service = seeded().await;
        let refs = service.dependencies(&["fetch", "fetch", "fit"]).await;
        assert_eq!(names(&refs), vec!["model.json", "raw.csv"]);
    }

    #[tokio::test]
    async fn full_keeps_insertion_order() {
        let service = seeded().await;
        let refs = service.full().await;
        let ordered: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            ordered,
            vec!["plan.md", "raw.csv", "model.json", "final.md", "alone.txt"]
        );
    }

    #[tokio::test]
    async fn subtask_owner_sees_nested_members() {
        let service = seeded().await;
        let refs = service.subtask(&graph(), "plan").await;
        assert_eq!(names(&refs), vec!["model.json", "plan.md", "raw.csv"]);
    }

    #[tokio::test]
    async fn subtask_member_sees_direct_siblings() {
        let service = seeded().await;
        let refs = service.subtask(&graph(), "fetch").await;
        // "fit" lives one level deeper and is not a direct member.
        assert_eq!(names(&refs), vec!["raw.csv"]);

        let refs = service.subtask(&graph(), "fit").await;
        assert_eq!(names(&refs), vec!["model.json"]);
    }

    #[tokio::test]
    async fn subtask_without_enclosing_graph_is_own_artifacts() {
        let service = seeded().await;
        let refs = service.subtask(&graph(), "solo").await;
        assert_eq!(names(&refs), vec!["alone.txt"]);
        assert!(service.subtask(&graph(), "ghost").await.is_empty());
    }

    #[tokio::test]
    async fn subtask_scope_without_graph_falls_back() {
        let service = seeded().await;
        let refs = service
            .for_task(InjectionMode::Subtask, TaskScope::new("report"))
            .await;
        assert_eq!(names(&refs), vec!["final.md"]);
    }
}
