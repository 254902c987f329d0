use roadmap_core::{EdgeStore, PhaseReport};
use serde::{Deserialize, Serialize};

use crate::work_item::{NodeKind, ProjectId, WorkItem, WorkItemId};

/// Graph fields embedded in an epic or task API payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemView {
    pub id: WorkItemId,
    pub key: String,
    pub kind: NodeKind,
    pub title: String,
    pub phase: u32,
    /// Direct dependencies, sorted
    pub depends_on: Vec<WorkItemId>,
    /// Set when the item sits on a dependency cycle in stored data
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cyclic: bool,
}

/// Phase layout of one project graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPlan {
    pub project_id: ProjectId,
    pub kind: NodeKind,
    /// Ordered by phase, then key
    pub items: Vec<WorkItemView>,
    /// Wave `i` holds the ids with phase `i + 1`
    pub waves: Vec<Vec<WorkItemId>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cyclic_nodes: Vec<WorkItemId>,
}

impl ProjectPlan {
    /// Map items onto a computed report
    ///
    /// Items outside `(project_id, kind)` are skipped. Waves cover every node
    /// the report knows, which includes endpoints of edges whose items the
    /// caller did not pass.
    pub fn build(
        project_id: ProjectId,
        kind: NodeKind,
        items: &[WorkItem],
        store: &EdgeStore<WorkItemId>,
        report: &PhaseReport<WorkItemId>,
    ) -> Self {
        let mut views: Vec<WorkItemView> = items
            .iter()
            .filter(|item| item.belongs_to(project_id, kind))
            .map(|item| {
                let mut depends_on: Vec<WorkItemId> = store.dependencies_of(item.id).collect();
                depends_on.sort_unstable();
                WorkItemView {
                    id: item.id,
                    key: item.key.clone(),
                    kind: item.kind,
                    title: item.title.clone(),
                    phase: report.phase_of(item.id).unwrap_or(1),
                    depends_on,
                    cyclic: report.is_cyclic(item.id),
                }
            })
            .collect();
        views.sort_by(|a, b| a.phase.cmp(&b.phase).then_with(|| a.key.cmp(&b.key)));

        Self {
            project_id,
            kind,
            items: views,
            waves: report.waves(),
            cyclic_nodes: report
                .warning()
                .map(|warning| warning.nodes.iter().copied().collect())
                .unwrap_or_default(),
        }
    }

    pub fn phase_count(&self) -> usize {
        self.waves.len()
    }
}
