use anyhow::Context as _;
use roadmap_core::{AppConfig, RoadmapError, RoadmapResult};
use roadmap_domain::{
    EdgeRepository, GraphService, NodeKind, ProjectId, WorkItem, WorkItemId, WorkItemRepository,
};
use roadmap_persistence::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage and services shared by every command handler
pub struct CliContext {
    pub items: Arc<dyn WorkItemRepository>,
    pub graph: GraphService<Arc<dyn EdgeRepository>>,
    config: AppConfig,
}

impl CliContext {
    /// Open the data file named on the command line, or the configured default
    pub fn open(file: Option<String>, config: AppConfig) -> anyhow::Result<Self> {
        let path = file
            .map(PathBuf::from)
            .or_else(|| config.default_file.clone())
            .context("--file is required (or set ROADMAP_FILE, or default_file in config)")?;

        let (items, edges) = open_store(&path)?;
        tracing::debug!("Opened roadmap data at {}", path.display());

        Ok(Self {
            items,
            graph: GraphService::new(edges),
            config,
        })
    }

    /// The kind passed on the command line, else the configured default
    pub fn resolve_kind(&self, kind: Option<NodeKind>) -> RoadmapResult<NodeKind> {
        match kind {
            Some(kind) => Ok(kind),
            None => self.config.effective_default_kind().parse(),
        }
    }

    /// Load an item and check it lives in the given graph
    pub async fn require_item(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        id: WorkItemId,
    ) -> RoadmapResult<WorkItem> {
        let item = self
            .items
            .get_item(id)
            .await?
            .ok_or_else(|| RoadmapError::NotFound(format!("item {}", id)))?;

        if !item.belongs_to(project_id, kind) {
            return Err(RoadmapError::Validation(format!(
                "item {} is not a {} of project {}",
                item.key, kind, project_id
            )));
        }
        Ok(item)
    }
}

type Stores = (Arc<dyn WorkItemRepository>, Arc<dyn EdgeRepository>);

fn shared<S>(store: S) -> Stores
where
    S: WorkItemRepository + EdgeRepository + 'static,
{
    let store = Arc::new(store);
    (
        store.clone() as Arc<dyn WorkItemRepository>,
        store as Arc<dyn EdgeRepository>,
    )
}

fn is_sqlite_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("db" | "sqlite" | "sqlite3")
    )
}

#[cfg(feature = "sqlite")]
fn open_store(path: &Path) -> anyhow::Result<Stores> {
    if is_sqlite_path(path) {
        return Ok(shared(roadmap_persistence::SqliteStore::new(path)));
    }
    Ok(shared(JsonFileStore::new(path)))
}

#[cfg(not(feature = "sqlite"))]
fn open_store(path: &Path) -> anyhow::Result<Stores> {
    if is_sqlite_path(path) {
        anyhow::bail!(
            "{} looks like a SQLite database but this build lacks the `sqlite` feature",
            path.display()
        );
    }
    Ok(shared(JsonFileStore::new(path)))
}
