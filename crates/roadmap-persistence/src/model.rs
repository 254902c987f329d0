use chrono::{DateTime, Utc};
use roadmap_core::{can_add, Edge, EdgeStore, RoadmapError, RoadmapResult};
use roadmap_domain::{NodeKind, ProjectId, WorkItem, WorkItemId};
use serde::{Deserialize, Serialize};

/// One stored "depends on" row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub project_id: ProjectId,
    pub kind: NodeKind,
    pub from: WorkItemId,
    pub to: WorkItemId,
    pub created_at: DateTime<Utc>,
}

impl DependencyRecord {
    pub fn new(project_id: ProjectId, kind: NodeKind, edge: Edge<WorkItemId>) -> Self {
        Self {
            project_id,
            kind,
            from: edge.from,
            to: edge.to,
            created_at: Utc::now(),
        }
    }

    pub fn edge(&self) -> Edge<WorkItemId> {
        Edge::new(self.from, self.to)
    }

    fn in_graph(&self, project_id: ProjectId, kind: NodeKind) -> bool {
        self.project_id == project_id && self.kind == kind
    }

    fn matches(&self, project_id: ProjectId, kind: NodeKind, edge: Edge<WorkItemId>) -> bool {
        self.in_graph(project_id, kind) && self.from == edge.from && self.to == edge.to
    }
}

/// Everything a document-style store keeps: items and dependency rows
///
/// The in-memory and JSON file stores both wrap this; the methods hold the
/// uniqueness and cascade rules so the backends only deal with locking and
/// durability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub items: Vec<WorkItem>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

impl StoreData {
    pub fn list_edges(&self, project_id: ProjectId, kind: NodeKind) -> Vec<Edge<WorkItemId>> {
        self.dependencies
            .iter()
            .filter(|record| record.in_graph(project_id, kind))
            .map(DependencyRecord::edge)
            .collect()
    }

    /// Append an edge after validating it against the graph as it is now
    ///
    /// Callers hold the store's write lock, so the check and the append
    /// cannot interleave with another writer.
    pub fn insert_edge(
        &mut self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        let current = EdgeStore::load(self.list_edges(project_id, kind));
        can_add(&current, edge.from, edge.to)?;

        self.dependencies
            .push(DependencyRecord::new(project_id, kind, edge));
        Ok(())
    }

    pub fn delete_edge(
        &mut self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> bool {
        let before = self.dependencies.len();
        self.dependencies
            .retain(|record| !record.matches(project_id, kind, edge));
        self.dependencies.len() < before
    }

    pub fn delete_node_edges(
        &mut self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> usize {
        let before = self.dependencies.len();
        self.dependencies
            .retain(|record| !(record.in_graph(project_id, kind) && record.edge().involves(node)));
        before - self.dependencies.len()
    }

    pub fn create_item(&mut self, item: WorkItem) -> RoadmapResult<WorkItem> {
        item.validate()?;
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Err(RoadmapError::Validation(format!(
                "item {} already exists",
                item.id
            )));
        }
        if self
            .items
            .iter()
            .any(|existing| existing.project_id == item.project_id && existing.key == item.key)
        {
            return Err(RoadmapError::Validation(format!(
                "key {} is already used in project {}",
                item.key, item.project_id
            )));
        }

        self.items.push(item.clone());
        Ok(item)
    }

    pub fn get_item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn list_items(&self, project_id: ProjectId, kind: Option<NodeKind>) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| item.project_id == project_id)
            .filter(|item| kind.map_or(true, |kind| item.kind == kind))
            .cloned()
            .collect()
    }

    /// Remove an item and cascade its edges
    pub fn delete_item(&mut self, id: WorkItemId) -> RoadmapResult<WorkItem> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| RoadmapError::NotFound(format!("item {}", id)))?;
        let item = self.items.remove(position);
        let removed = self.delete_node_edges(item.project_id, item.kind, item.id);
        tracing::debug!("Deleted item {} and {} edge(s)", item.key, removed);
        Ok(item)
    }
}
