use async_trait::async_trait;
use roadmap_core::{Edge, RoadmapResult};
use roadmap_domain::{
    EdgeRepository, NodeKind, ProjectId, WorkItem, WorkItemId, WorkItemRepository,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::StoreData;

/// Process-local store backing both repositories
///
/// Writes take the lock for the whole check-and-append, so concurrent
/// inserts cannot both pass validation against the same stale graph.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<StoreData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: StoreData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub async fn snapshot(&self) -> StoreData {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl EdgeRepository for InMemoryStore {
    async fn list_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
        Ok(self.data.read().await.list_edges(project_id, kind))
    }

    async fn insert_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        self.data.write().await.insert_edge(project_id, kind, edge)
    }

    async fn delete_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<bool> {
        Ok(self.data.write().await.delete_edge(project_id, kind, edge))
    }

    async fn delete_node_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<usize> {
        Ok(self
            .data
            .write()
            .await
            .delete_node_edges(project_id, kind, node))
    }
}

#[async_trait]
impl WorkItemRepository for InMemoryStore {
    async fn create_item(&self, item: WorkItem) -> RoadmapResult<WorkItem> {
        self.data.write().await.create_item(item)
    }

    async fn get_item(&self, id: WorkItemId) -> RoadmapResult<Option<WorkItem>> {
        Ok(self.data.read().await.get_item(id).cloned())
    }

    async fn list_items(
        &self,
        project_id: ProjectId,
        kind: Option<NodeKind>,
    ) -> RoadmapResult<Vec<WorkItem>> {
        Ok(self.data.read().await.list_items(project_id, kind))
    }

    async fn delete_item(&self, id: WorkItemId) -> RoadmapResult<WorkItem> {
        self.data.write().await.delete_item(id)
    }
}
