use roadmap_core::{
    can_add, compute_phases, Edge, EdgeStore, GraphNode, PhaseReport, RoadmapError, RoadmapResult,
};
use std::collections::BTreeSet;

use crate::repository::EdgeRepository;
use crate::views::ProjectPlan;
use crate::work_item::{NodeKind, ProjectId, WorkItem, WorkItemId};

/// Entry point for callers that read or change dependency links
///
/// Holds no graph state between calls: every operation loads a fresh
/// snapshot from the repository, so the service is safe to share.
pub struct GraphService<R> {
    repository: R,
}

impl<R: EdgeRepository> GraphService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    async fn snapshot(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<EdgeStore<WorkItemId>> {
        let edges = self.repository.list_edges(project_id, kind).await?;
        tracing::debug!(
            "Loaded {} {} edge(s) for project {}",
            edges.len(),
            kind,
            project_id
        );
        Ok(EdgeStore::load(edges))
    }

    /// Record that `from` depends on `to`
    ///
    /// Validated against a freshly loaded snapshot; rejections come back as
    /// `SelfDependency`, `DuplicateEdge` or `CycleDetected` and never reach
    /// the repository. The repository validates again under its own lock,
    /// so a writer that slipped in after the snapshot gets the same errors.
    pub async fn add_dependency(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        from: WorkItemId,
        to: WorkItemId,
    ) -> RoadmapResult<()> {
        if from == to {
            return Err(RoadmapError::SelfDependency {
                node: from.to_string(),
            });
        }

        let store = self.snapshot(project_id, kind).await?;
        if let Err(err) = can_add(&store, from, to) {
            tracing::warn!("Rejected {} dependency {} -> {}: {}", kind, from, to, err);
            return Err(err);
        }

        if let Err(err) = self
            .repository
            .insert_edge(project_id, kind, Edge::new(from, to))
            .await
        {
            if err.is_edge_rejection() {
                tracing::warn!(
                    "Rejected {} dependency {} -> {} at write: {}",
                    kind,
                    from,
                    to,
                    err
                );
            }
            return Err(err);
        }
        tracing::info!("Added {} dependency: {} depends on {}", kind, from, to);
        Ok(())
    }

    /// Drop the link `from -> to`; `EdgeNotFound` if it does not exist
    pub async fn remove_dependency(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        from: WorkItemId,
        to: WorkItemId,
    ) -> RoadmapResult<()> {
        let not_found = || RoadmapError::EdgeNotFound {
            from: from.to_string(),
            to: to.to_string(),
        };

        let store = self.snapshot(project_id, kind).await?;
        if !store.has_edge(from, to) {
            return Err(not_found());
        }

        // Another writer may have removed it since the snapshot was taken
        if !self
            .repository
            .delete_edge(project_id, kind, Edge::new(from, to))
            .await?
        {
            return Err(not_found());
        }

        tracing::info!("Removed {} dependency: {} -> {}", kind, from, to);
        Ok(())
    }

    /// Direct dependencies of a node
    pub async fn list_dependencies(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<BTreeSet<WorkItemId>> {
        let store = self.snapshot(project_id, kind).await?;
        Ok(store.dependencies_of(node).collect())
    }

    /// Direct dependents of a node
    pub async fn list_dependents(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<BTreeSet<WorkItemId>> {
        let store = self.snapshot(project_id, kind).await?;
        Ok(store.dependents_of(node).collect())
    }

    /// Phases for a whole project graph from a single edge load
    ///
    /// Never fails because of the graph's shape: cycles in stored data are
    /// reported through the report's warning.
    pub async fn compute_project_phases<I>(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        all_nodes: I,
    ) -> RoadmapResult<PhaseReport<WorkItemId>>
    where
        I: IntoIterator<Item = WorkItemId> + Send,
    {
        let store = self.snapshot(project_id, kind).await?;
        let report = compute_phases(&store, all_nodes);
        if let Some(warning) = report.warning() {
            tracing::warn!("Project {} {} graph: {}", project_id, kind, warning);
        }
        Ok(report)
    }

    /// Phases plus API views for the given items
    pub async fn project_plan(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        items: &[WorkItem],
    ) -> RoadmapResult<ProjectPlan> {
        let store = self.snapshot(project_id, kind).await?;
        let nodes = items
            .iter()
            .filter(|item| item.belongs_to(project_id, kind))
            .map(GraphNode::node_id);
        let report = compute_phases(&store, nodes);
        if let Some(warning) = report.warning() {
            tracing::warn!("Project {} {} graph: {}", project_id, kind, warning);
        }
        Ok(ProjectPlan::build(project_id, kind, items, &store, &report))
    }

    /// Nodes on a dependency cycle in stored data
    ///
    /// Detection pass for graphs written before insert-time validation
    /// existed, or by writers that bypass this service.
    pub async fn audit_cycles(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<BTreeSet<WorkItemId>> {
        let store = self.snapshot(project_id, kind).await?;
        let cyclic = store.cyclic_nodes();
        if !cyclic.is_empty() {
            tracing::warn!(
                "Project {} {} graph has {} node(s) on a cycle",
                project_id,
                kind,
                cyclic.len()
            );
        }
        Ok(cyclic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockEdgeRepository;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Minimal repository keeping edges per graph in memory
    #[derive(Default)]
    struct FakeRepository {
        edges: Mutex<HashMap<(ProjectId, NodeKind), Vec<Edge<WorkItemId>>>>,
    }

    impl FakeRepository {
        fn seeded(project_id: ProjectId, kind: NodeKind, edges: &[(Uuid, Uuid)]) -> Self {
            let repo = Self::default();
            repo.edges.lock().unwrap().insert(
                (project_id, kind),
                edges.iter().copied().map(Edge::from).collect(),
            );
            repo
        }
    }

    #[async_trait]
    impl EdgeRepository for FakeRepository {
        async fn list_edges(
            &self,
            project_id: ProjectId,
            kind: NodeKind,
        ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
            let edges = self.edges.lock().unwrap();
            Ok(edges.get(&(project_id, kind)).cloned().unwrap_or_default())
        }

        async fn insert_edge(
            &self,
            project_id: ProjectId,
            kind: NodeKind,
            edge: Edge<WorkItemId>,
        ) -> RoadmapResult<()> {
            let mut edges = self.edges.lock().unwrap();
            let graph = edges.entry((project_id, kind)).or_default();
            can_add(&EdgeStore::load(graph.iter().copied()), edge.from, edge.to)?;
            graph.push(edge);
            Ok(())
        }

        async fn delete_edge(
            &self,
            project_id: ProjectId,
            kind: NodeKind,
            edge: Edge<WorkItemId>,
        ) -> RoadmapResult<bool> {
            let mut edges = self.edges.lock().unwrap();
            let graph = edges.entry((project_id, kind)).or_default();
            let before = graph.len();
            graph.retain(|e| *e != edge);
            Ok(graph.len() < before)
        }

        async fn delete_node_edges(
            &self,
            project_id: ProjectId,
            kind: NodeKind,
            node: WorkItemId,
        ) -> RoadmapResult<usize> {
            let mut edges = self.edges.lock().unwrap();
            let graph = edges.entry((project_id, kind)).or_default();
            let before = graph.len();
            graph.retain(|e| !e.involves(node));
            Ok(before - graph.len())
        }
    }

    fn ids<const N: usize>() -> [Uuid; N] {
        std::array::from_fn(|_| Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_add_and_list_dependencies() {
        let project = Uuid::new_v4();
        let [a, b, c] = ids();
        let service = GraphService::new(FakeRepository::default());

        service.add_dependency(project, NodeKind::Task, a, b).await.unwrap();
        service.add_dependency(project, NodeKind::Task, a, c).await.unwrap();

        let deps = service
            .list_dependencies(project, NodeKind::Task, a)
            .await
            .unwrap();
        assert_eq!(deps, BTreeSet::from([b, c]));

        let dependents = service
            .list_dependents(project, NodeKind::Task, b)
            .await
            .unwrap();
        assert_eq!(dependents, BTreeSet::from([a]));
    }

    #[tokio::test]
    async fn test_kinds_are_separate_graphs() {
        let project = Uuid::new_v4();
        let [a, b] = ids();
        let service = GraphService::new(FakeRepository::default());

        service.add_dependency(project, NodeKind::Epic, a, b).await.unwrap();
        // Same pair in the task graph is neither duplicate nor cycle
        service.add_dependency(project, NodeKind::Task, b, a).await.unwrap();

        let epic_deps = service
            .list_dependencies(project, NodeKind::Epic, b)
            .await
            .unwrap();
        assert!(epic_deps.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_rejected() {
        let project = Uuid::new_v4();
        let [a, b, c] = ids();
        let service = GraphService::new(FakeRepository::default());

        service.add_dependency(project, NodeKind::Task, a, b).await.unwrap();
        service.add_dependency(project, NodeKind::Task, b, c).await.unwrap();

        let result = service.add_dependency(project, NodeKind::Task, c, a).await;
        assert!(matches!(result, Err(RoadmapError::CycleDetected { .. })));
        assert_eq!(result.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let project = Uuid::new_v4();
        let [a, b] = ids();
        let service = GraphService::new(FakeRepository::default());

        service.add_dependency(project, NodeKind::Epic, a, b).await.unwrap();
        let result = service.add_dependency(project, NodeKind::Epic, a, b).await;
        assert!(matches!(result, Err(RoadmapError::DuplicateEdge { .. })));
    }

    #[tokio::test]
    async fn test_self_dependency_rejected_without_touching_storage() {
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges().never();
        repo.expect_insert_edge().never();

        let node = Uuid::new_v4();
        let service = GraphService::new(repo);
        let result = service
            .add_dependency(Uuid::new_v4(), NodeKind::Task, node, node)
            .await;
        assert!(matches!(result, Err(RoadmapError::SelfDependency { .. })));
    }

    #[tokio::test]
    async fn test_rejected_edge_never_inserted() {
        let [a, b] = ids();
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges()
            .times(1)
            .returning(move |_, _| Ok(vec![Edge::new(a, b)]));
        repo.expect_insert_edge().never();

        let service = GraphService::new(repo);
        let result = service
            .add_dependency(Uuid::new_v4(), NodeKind::Epic, b, a)
            .await;
        assert!(matches!(result, Err(RoadmapError::CycleDetected { .. })));
    }

    #[tokio::test]
    async fn test_stale_snapshot_rejected_by_repository() {
        // The snapshot misses b -> a written by a concurrent caller
        let [a, b] = ids();
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges().times(1).returning(|_, _| Ok(Vec::new()));
        repo.expect_insert_edge().times(1).returning(move |_, _, _| {
            Err(RoadmapError::CycleDetected {
                from: a.to_string(),
                to: b.to_string(),
                path: vec![a.to_string(), b.to_string(), a.to_string()],
            })
        });

        let service = GraphService::new(repo);
        let result = service
            .add_dependency(Uuid::new_v4(), NodeKind::Task, a, b)
            .await;
        assert!(matches!(result, Err(RoadmapError::CycleDetected { .. })));
    }

    #[tokio::test]
    async fn test_remove_missing_edge_never_mutates() {
        let [a, b] = ids();
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges().returning(|_, _| Ok(Vec::new()));
        repo.expect_delete_edge().never();

        let service = GraphService::new(repo);
        let result = service
            .remove_dependency(Uuid::new_v4(), NodeKind::Task, a, b)
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, RoadmapError::EdgeNotFound { .. }));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_remove_raced_by_other_writer() {
        let [a, b] = ids();
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges()
            .returning(move |_, _| Ok(vec![Edge::new(a, b)]));
        repo.expect_delete_edge()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let service = GraphService::new(repo);
        let result = service
            .remove_dependency(Uuid::new_v4(), NodeKind::Task, a, b)
            .await;
        assert!(matches!(result, Err(RoadmapError::EdgeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_existing_edge() {
        let project = Uuid::new_v4();
        let [a, b] = ids();
        let repo = FakeRepository::seeded(project, NodeKind::Task, &[(a, b)]);
        let service = GraphService::new(repo);

        service
            .remove_dependency(project, NodeKind::Task, a, b)
            .await
            .unwrap();
        let second = service.remove_dependency(project, NodeKind::Task, a, b).await;
        assert!(matches!(second, Err(RoadmapError::EdgeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_compute_project_phases_loads_once() {
        let [a, b, c, d] = ids();
        let mut repo = MockEdgeRepository::new();
        repo.expect_list_edges().times(1).returning(move |_, _| {
            Ok(vec![Edge::new(a, b), Edge::new(a, c), Edge::new(c, d)])
        });

        let service = GraphService::new(repo);
        let report = service
            .compute_project_phases(Uuid::new_v4(), NodeKind::Epic, [a, b, c, d])
            .await
            .unwrap();

        assert_eq!(report.phase_of(a), Some(3));
        assert_eq!(report.phase_of(b), Some(1));
        assert_eq!(report.phase_of(c), Some(2));
        assert_eq!(report.phase_of(d), Some(1));
    }

    #[tokio::test]
    async fn test_phases_degrade_on_stored_cycle() {
        let project = Uuid::new_v4();
        let [x, y, z] = ids();
        let service = GraphService::new(FakeRepository::seeded(
            project,
            NodeKind::Task,
            &[(x, y), (y, x)],
        ));

        let report = service
            .compute_project_phases(project, NodeKind::Task, [x, y, z])
            .await
            .unwrap();
        assert_eq!(report.phase_of(x), Some(1));
        assert_eq!(report.phase_of(y), Some(1));
        assert_eq!(report.phase_of(z), Some(1));
        assert_eq!(
            report.warning().map(|w| w.nodes.clone()),
            Some(BTreeSet::from([x, y]))
        );

        let audit = service.audit_cycles(project, NodeKind::Task).await.unwrap();
        assert_eq!(audit, BTreeSet::from([x, y]));
    }

    #[tokio::test]
    async fn test_project_plan() {
        let project = Uuid::new_v4();
        let api = WorkItem::new(project, NodeKind::Epic, "API".into(), "Public API".into());
        let db = WorkItem::new(project, NodeKind::Epic, "DB".into(), "Schema".into());
        let service = GraphService::new(FakeRepository::seeded(
            project,
            NodeKind::Epic,
            &[(api.id, db.id)],
        ));

        let plan = service
            .project_plan(project, NodeKind::Epic, &[api.clone(), db.clone()])
            .await
            .unwrap();
        assert_eq!(plan.items[0].id, db.id);
        assert_eq!(plan.items[1].phase, 2);
        assert_eq!(plan.waves, vec![vec![db.id], vec![api.id]]);
    }
}
