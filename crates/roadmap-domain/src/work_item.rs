use chrono::{DateTime, Utc};
use roadmap_core::{GraphNode, RoadmapError, RoadmapResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type WorkItemId = Uuid;

/// Which dependency graph an item belongs to
///
/// Epic edges and task edges never mix: each kind has its own graph per
/// project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Epic,
    Task,
}

impl NodeKind {
    /// Tag stored alongside edges
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Epic => "EPIC",
            NodeKind::Task => "TASK",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = RoadmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epic" | "epics" => Ok(NodeKind::Epic),
            "task" | "tasks" => Ok(NodeKind::Task),
            other => Err(RoadmapError::Validation(format!(
                "unknown item kind '{}', expected 'epic' or 'task'",
                other
            ))),
        }
    }
}

/// An epic or a task, as far as the dependency graph needs to know it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub project_id: ProjectId,
    pub kind: NodeKind,
    /// Human display key, e.g. `WEB-12`
    pub key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(project_id: ProjectId, kind: NodeKind, key: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            kind,
            key,
            title,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> RoadmapResult<()> {
        if self.key.trim().is_empty() {
            return Err(RoadmapError::Validation("item key must not be empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(RoadmapError::Validation(
                "item title must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Check if the item lives in the given project graph
    pub fn belongs_to(&self, project_id: ProjectId, kind: NodeKind) -> bool {
        self.project_id == project_id && self.kind == kind
    }
}

impl GraphNode for WorkItem {
    type Id = WorkItemId;

    fn node_id(&self) -> WorkItemId {
        self.id
    }
}
