use crate::model::StoreData;
use crate::store::atomic_writer::AtomicWriter;
use crate::traits::{PersistenceMetadata, FORMAT_VERSION};
use async_trait::async_trait;
use roadmap_core::{Edge, RoadmapError, RoadmapResult};
use roadmap_domain::{
    EdgeRepository, NodeKind, ProjectId, WorkItem, WorkItemId, WorkItemRepository,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// On-disk layout of a roadmap file
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub version: u32,
    pub metadata: PersistenceMetadata,
    pub data: StoreData,
}

/// JSON file-based persistence store
///
/// Every mutation is a load, modify, atomic rewrite cycle under a
/// per-store mutex. Clones share the mutex; separate processes writing the
/// same file are not coordinated.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    instance_id: Uuid,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_instance_id(path, Uuid::new_v4())
    }

    /// Create a store with a specific instance ID (stamped into saved metadata)
    pub fn with_instance_id(path: impl AsRef<Path>, instance_id: Uuid) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            instance_id,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole file; a missing file reads as empty
    pub async fn load(&self) -> RoadmapResult<StoreData> {
        let Some(envelope) = AtomicWriter::read_json::<JsonEnvelope>(&self.path).await? else {
            tracing::debug!("No data at {}, starting empty", self.path.display());
            return Ok(StoreData::default());
        };

        if envelope.version != FORMAT_VERSION {
            return Err(RoadmapError::Serialization(format!(
                "Unsupported format version: {}",
                envelope.version
            )));
        }

        Ok(envelope.data)
    }

    async fn save(&self, data: StoreData) -> RoadmapResult<()> {
        let envelope = JsonEnvelope {
            version: FORMAT_VERSION,
            metadata: PersistenceMetadata::new(self.instance_id),
            data,
        };
        AtomicWriter::write_json(&self.path, &envelope).await?;

        tracing::info!(
            "Saved {} item(s) and {} dependency row(s) to {}",
            envelope.data.items.len(),
            envelope.data.dependencies.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Run a mutation against the current file contents and persist it
    ///
    /// The mutation returns its result and whether it changed anything.
    /// Nothing is written when it fails or reports no change.
    async fn update<T>(
        &self,
        mutate: impl FnOnce(&mut StoreData) -> RoadmapResult<(T, bool)> + Send,
    ) -> RoadmapResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await?;
        let (result, changed) = mutate(&mut data)?;
        if changed {
            self.save(data).await?;
        } else {
            tracing::debug!("Nothing changed, skipped writing {}", self.path.display());
        }
        Ok(result)
    }
}

#[async_trait]
impl EdgeRepository for JsonFileStore {
    async fn list_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
        Ok(self.load().await?.list_edges(project_id, kind))
    }

    async fn insert_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        self.update(|data| data.insert_edge(project_id, kind, edge).map(|()| ((), true)))
            .await
    }

    async fn delete_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<bool> {
        self.update(|data| {
            let removed = data.delete_edge(project_id, kind, edge);
            Ok((removed, removed))
        })
        .await
    }

    async fn delete_node_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<usize> {
        self.update(|data| {
            let removed = data.delete_node_edges(project_id, kind, node);
            Ok((removed, removed > 0))
        })
        .await
    }
}

#[async_trait]
impl WorkItemRepository for JsonFileStore {
    async fn create_item(&self, item: WorkItem) -> RoadmapResult<WorkItem> {
        self.update(|data| data.create_item(item).map(|item| (item, true)))
            .await
    }

    async fn get_item(&self, id: WorkItemId) -> RoadmapResult<Option<WorkItem>> {
        Ok(self.load().await?.get_item(id).cloned())
    }

    async fn list_items(
        &self,
        project_id: ProjectId,
        kind: Option<NodeKind>,
    ) -> RoadmapResult<Vec<WorkItem>> {
        Ok(self.load().await?.list_items(project_id, kind))
    }

    async fn delete_item(&self, id: WorkItemId) -> RoadmapResult<WorkItem> {
        self.update(|data| data.delete_item(id).map(|item| (item, true)))
            .await
    }
}
