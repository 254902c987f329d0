use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roadmap_core::{can_add, Edge, EdgeStore, RoadmapError, RoadmapResult};
use roadmap_domain::{
    EdgeRepository, NodeKind, ProjectId, WorkItem, WorkItemId, WorkItemRepository,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../schema.sql");

fn db_err(e: sqlx::Error) -> RoadmapError {
    RoadmapError::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// The unique violation was on the `work_items` primary key
fn is_item_id_collision(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.message().contains("work_items.id"))
}

fn parse_uuid(raw: &str) -> RoadmapResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| RoadmapError::Database(format!("bad id {raw}: {e}")))
}

/// SQLite-backed store
///
/// Edge inserts run inside `BEGIN IMMEDIATE`: the write lock is taken
/// before the graph is re-read and validated, so concurrent writers queue
/// up behind each other instead of validating against the same rows.
pub struct SqliteStore {
    path: PathBuf,
    pool: tokio::sync::OnceCell<Pool<Sqlite>>,
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pool: tokio::sync::OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn get_pool(&self) -> RoadmapResult<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async {
                let options = SqliteConnectOptions::from_str(&format!(
                    "sqlite://{}?mode=rwc",
                    self.path.display()
                ))
                .map_err(db_err)?
                .create_if_missing(true)
                .busy_timeout(Duration::from_secs(5));

                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
                    .map_err(db_err)?;

                sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(db_err)?;
                tracing::debug!("Opened sqlite store at {}", self.path.display());

                Ok(pool)
            })
            .await
    }

    fn row_to_item(row: &SqliteRow) -> RoadmapResult<WorkItem> {
        let kind: String = row.get("kind");
        let created_at: String = row.get("created_at");
        Ok(WorkItem {
            id: parse_uuid(row.get("id"))?,
            project_id: parse_uuid(row.get("project_id"))?,
            kind: kind.parse()?,
            key: row.get("key"),
            title: row.get("title"),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| RoadmapError::Database(e.to_string()))?
                .with_timezone(&Utc),
        })
    }

    async fn edges_in(
        conn: &mut SqliteConnection,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
        sqlx::query("SELECT from_id, to_id FROM dependencies WHERE project_id = ? AND kind = ?")
            .bind(project_id.to_string())
            .bind(kind.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| {
                let from = parse_uuid(row.get("from_id"))?;
                let to = parse_uuid(row.get("to_id"))?;
                Ok(Edge::new(from, to))
            })
            .collect()
    }

    /// Validate and append; must run inside the caller's write transaction
    async fn checked_insert(
        conn: &mut SqliteConnection,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        let current = EdgeStore::load(Self::edges_in(conn, project_id, kind).await?);
        can_add(&current, edge.from, edge.to)?;

        let result = sqlx::query(
            "INSERT INTO dependencies (project_id, kind, from_id, to_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(project_id.to_string())
        .bind(kind.as_str())
        .bind(edge.from.to_string())
        .bind(edge.to.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RoadmapError::DuplicateEdge {
                from: edge.from.to_string(),
                to: edge.to.to_string(),
            }),
            Err(e) => Err(db_err(e)),
        }
    }
}

#[async_trait]
impl EdgeRepository for SqliteStore {
    async fn list_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
    ) -> RoadmapResult<Vec<Edge<WorkItemId>>> {
        let mut conn = self.get_pool().await?.acquire().await.map_err(db_err)?;
        Self::edges_in(&mut conn, project_id, kind).await
    }

    async fn insert_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<()> {
        let mut conn = self.get_pool().await?.acquire().await.map_err(db_err)?;
        sqlx::raw_sql("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

        let outcome = Self::checked_insert(&mut conn, project_id, kind, edge).await;
        let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(e) = sqlx::raw_sql(finish).execute(&mut *conn).await {
            // Never hand a connection with an open transaction back to the pool
            let _ = sqlx::raw_sql("ROLLBACK").execute(&mut *conn).await;
            return Err(db_err(e));
        }
        outcome
    }

    async fn delete_edge(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        edge: Edge<WorkItemId>,
    ) -> RoadmapResult<bool> {
        let pool = self.get_pool().await?;
        let result = sqlx::query(
            "DELETE FROM dependencies
             WHERE project_id = ? AND kind = ? AND from_id = ? AND to_id = ?",
        )
        .bind(project_id.to_string())
        .bind(kind.as_str())
        .bind(edge.from.to_string())
        .bind(edge.to.to_string())
        .execute(pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_node_edges(
        &self,
        project_id: ProjectId,
        kind: NodeKind,
        node: WorkItemId,
    ) -> RoadmapResult<usize> {
        let pool = self.get_pool().await?;
        let node = node.to_string();
        let result = sqlx::query(
            "DELETE FROM dependencies
             WHERE project_id = ? AND kind = ? AND (from_id = ? OR to_id = ?)",
        )
        .bind(project_id.to_string())
        .bind(kind.as_str())
        .bind(&node)
        .bind(&node)
        .execute(pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl WorkItemRepository for SqliteStore {
    async fn create_item(&self, item: WorkItem) -> RoadmapResult<WorkItem> {
        item.validate()?;
        let pool = self.get_pool().await?;
        let result = sqlx::query(
            "INSERT INTO work_items (id, project_id, kind, key, title, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.project_id.to_string())
        .bind(item.kind.as_str())
        .bind(&item.key)
        .bind(&item.title)
        .bind(item.created_at.to_rfc3339())
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(item),
            Err(e) if is_item_id_collision(&e) => Err(RoadmapError::Validation(format!(
                "item {} already exists",
                item.id
            ))),
            Err(e) if is_unique_violation(&e) => Err(RoadmapError::Validation(format!(
                "key {} is already used in project {}",
                item.key, item.project_id
            ))),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_item(&self, id: WorkItemId) -> RoadmapResult<Option<WorkItem>> {
        let pool = self.get_pool().await?;
        sqlx::query(
            "SELECT id, project_id, kind, key, title, created_at FROM work_items WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(db_err)?
        .as_ref()
        .map(Self::row_to_item)
        .transpose()
    }

    async fn list_items(
        &self,
        project_id: ProjectId,
        kind: Option<NodeKind>,
    ) -> RoadmapResult<Vec<WorkItem>> {
        let pool = self.get_pool().await?;
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT id, project_id, kind, key, title, created_at FROM work_items
                     WHERE project_id = ? AND kind = ? ORDER BY created_at, key",
                )
                .bind(project_id.to_string())
                .bind(kind.as_str())
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, project_id, kind, key, title, created_at FROM work_items
                     WHERE project_id = ? ORDER BY created_at, key",
                )
                .bind(project_id.to_string())
                .fetch_all(pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn delete_item(&self, id: WorkItemId) -> RoadmapResult<WorkItem> {
        let item = self
            .get_item(id)
            .await?
            .ok_or_else(|| RoadmapError::NotFound(format!("item {}", id)))?;

        let pool = self.get_pool().await?;
        let mut tx = pool.begin().await.map_err(db_err)?;
        let node = id.to_string();

        let removed = sqlx::query(
            "DELETE FROM dependencies
             WHERE project_id = ? AND kind = ? AND (from_id = ? OR to_id = ?)",
        )
        .bind(item.project_id.to_string())
        .bind(item.kind.as_str())
        .bind(&node)
        .bind(&node)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        sqlx::query("DELETE FROM work_items WHERE id = ?")
            .bind(&node)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        tracing::debug!("Deleted item {} and {} edge(s)", item.key, removed);
        Ok(item)
    }
}
