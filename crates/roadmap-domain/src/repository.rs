use async_trait::async_trait;
use roadmap_core::{Edge, RoadmapResult};
use std::sync::Arc;

use crate::work_item::{NodeKind, ProjectId, WorkItem, WorkItemId};

/// Storage of "depends on" edges, scoped to one project and one item kind
///
/// Implementations own durability and concurrency. `insert_edge` must run
/// [`roadmap_core::can_add`] against the edges stored at that moment, inside
/// the same lock or transaction as the append, so two writers adding
/// opposite edges cannot both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Load every edge of one graph
    async fn list_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>>;

    /// Append an edge after re-checking it against the current edges;
    /// fails with `SelfDependency`, `DuplicateEdge` or `CycleDetected`
    async fn insert_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()>;

    /// Delete an edge; returns false if it was not present
    async fn delete_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<bool>;

    /// Delete every edge touching a node (cascade on item deletion);
    /// returns how many were removed
    async fn delete_node_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<usize>;
}

/// Storage of the work items themselves
#[async_trait]
pub trait WorkItemRepository: Send + Sync {
    async fn create_item(&self, item: WorkItem) -> RoadmapResult<WorkItem>;

    async fn get_item(&self, id: WorkItemId) -> RoadmapResult<Option<WorkItem>>;

    /// Items of a project, optionally narrowed to one kind
    async fn list_items(
        &self,
        project_id: ProjectId,
        kind: Option<NodeKind>,
    ) -> RoadmapResult<Vec<WorkItem>>;

    /// Delete an item and every edge touching it
    async fn delete_item(&self, id: WorkItemId) -> RoadmapResult<WorkItem>;
}

#[async_trait]
impl<T: EdgeRepository + ?Sized> EdgeRepository for Arc<T> {
    async fn list_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
        (**self).list_edges(project_id, kind).await
    }

    async fn insert_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        (**self).insert_edge(project_id, kind, edge).await
    }

    async fn delete_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<bool> {
        (**self).delete_edge(project_id, kind, edge).await
    }

    async fn delete_node_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<usize> {
        (**self).delete_node_edges(project_id, kind, node).await
    }
}

#[async_trait]
impl<T: WorkItemRepository + ?Sized> WorkItemRepository for Arc<T> {
    async fn create_item(&self, item: WorkItem) -> RoadmapResult<WorkItem> {
        (**self).create_item(item).await
    }

    async fn get_item(&self, id: WorkItemId) -> RoadmapResult<Option<WorkItem>> {
        (**self).get_item(id).await
    }

    async fn list_items(
        &self,
        project_id: ProjectId,
        kind: Option<NodeKind>,
    ) -> RoadmapResult<Vec<WorkItem>> {
        (**self).list_items(project_id, kind).await
    }

    async fn delete_item(&self, id: WorkItemId) -> RoadmapResult<WorkItem> {
        (**self).delete_item(id).await
    }
}
