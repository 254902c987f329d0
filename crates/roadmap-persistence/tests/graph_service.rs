use roadmap_core::RoadmapError;
use roadmap_domain::{
    EdgeRepository, GraphService, NodeKind, ProjectId, WorkItem, WorkItemId, WorkItemRepository,
};
use roadmap_persistence::{DependencyRecord, InMemoryStore, JsonFileStore, StoreData};
use std::collections::{BTreeSet, HashMap};
use tempfile::tempdir;
use uuid::Uuid;

async fn seed_items<R: WorkItemRepository>(
    repo: &R,
    project: ProjectId,
    kind: NodeKind,
    keys: &[&str],
) -> HashMap<String, WorkItemId> {
    let mut ids = HashMap::new();
    for key in keys {
        let item = repo
            .create_item(WorkItem::new(project, kind, key.to_string(), format!("{} title", key)))
            .await
            .unwrap();
        ids.insert(key.to_string(), item.id);
    }
    ids
}

async fn phases_by_key<R: EdgeRepository>(
    service: &GraphService<R>,
    project: ProjectId,
    kind: NodeKind,
    ids: &HashMap<String, WorkItemId>,
) -> HashMap<String, u32> {
    let report = service
        .compute_project_phases(project, kind, ids.values().copied().collect::<Vec<_>>())
        .await
        .unwrap();
    ids.iter()
        .map(|(key, id)| (key.clone(), report.phase_of(*id).unwrap()))
        .collect()
}

fn expected(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[tokio::test]
async fn test_isolated_nodes_share_phase_one() {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    let ids = seed_items(&store, project, NodeKind::Epic, &["A", "B", "C"]).await;
    let service = GraphService::new(store);

    let phases = phases_by_key(&service, project, NodeKind::Epic, &ids).await;
    assert_eq!(phases, expected(&[("A", 1), ("B", 1), ("C", 1)]));
}

#[tokio::test]
async fn test_chain_and_branch_layering() {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    let ids = seed_items(&store, project, NodeKind::Task, &["A", "B", "C", "D"]).await;
    let service = GraphService::new(store.clone());

    for (from, to) in [("A", "B"), ("A", "C"), ("C", "D")] {
        service
            .add_dependency(project, NodeKind::Task, ids[from], ids[to])
            .await
            .unwrap();
    }

    let phases = phases_by_key(&service, project, NodeKind::Task, &ids).await;
    assert_eq!(
        phases,
        expected(&[("A", 3), ("B", 1), ("C", 2), ("D", 1)])
    );

    let err = service
        .add_dependency(project, NodeKind::Task, ids["D"], ids["A"])
        .await
        .unwrap_err();
    assert!(matches!(err, RoadmapError::CycleDetected { .. }));
    assert_eq!(
        store.list_edges(project, NodeKind::Task).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_epic_and_task_graphs_are_independent() {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let service = GraphService::new(store);

    service
        .add_dependency(project, NodeKind::Epic, a, b)
        .await
        .unwrap();
    // Same ids in the task graph: neither a duplicate nor a cycle there
    service
        .add_dependency(project, NodeKind::Task, b, a)
        .await
        .unwrap();

    assert_eq!(
        service
            .list_dependencies(project, NodeKind::Epic, a)
            .await
            .unwrap(),
        BTreeSet::from([b])
    );
    assert_eq!(
        service
            .list_dependents(project, NodeKind::Task, b)
            .await
            .unwrap(),
        BTreeSet::new()
    );
}

#[tokio::test]
async fn test_legacy_cycle_degrades_to_warning() {
    let project = Uuid::new_v4();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let z = Uuid::new_v4();

    // Rows written straight into the data, the way pre-validation files hold them
    let data = StoreData {
        items: Vec::new(),
        dependencies: vec![
            DependencyRecord::new(project, NodeKind::Epic, (x, y).into()),
            DependencyRecord::new(project, NodeKind::Epic, (y, x).into()),
        ],
    };
    let service = GraphService::new(InMemoryStore::with_data(data));

    let report = service
        .compute_project_phases(project, NodeKind::Epic, [x, y, z])
        .await
        .unwrap();
    assert_eq!(report.phase_of(x), Some(1));
    assert_eq!(report.phase_of(y), Some(1));
    assert_eq!(report.phase_of(z), Some(1));
    assert_eq!(
        report.warning().map(|w| w.nodes.clone()),
        Some(BTreeSet::from([x, y]))
    );

    assert_eq!(
        service.audit_cycles(project, NodeKind::Epic).await.unwrap(),
        BTreeSet::from([x, y])
    );
}

#[tokio::test]
async fn test_deleting_item_cascades_edges() {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    let ids = seed_items(&store, project, NodeKind::Epic, &["A", "B", "C"]).await;
    let service = GraphService::new(store.clone());

    service
        .add_dependency(project, NodeKind::Epic, ids["A"], ids["B"])
        .await
        .unwrap();
    service
        .add_dependency(project, NodeKind::Epic, ids["B"], ids["C"])
        .await
        .unwrap();

    store.delete_item(ids["B"]).await.unwrap();

    assert!(service
        .list_dependencies(project, NodeKind::Epic, ids["A"])
        .await
        .unwrap()
        .is_empty());
    let report = service
        .compute_project_phases(project, NodeKind::Epic, [ids["A"], ids["C"]])
        .await
        .unwrap();
    assert_eq!(report.max_phase(), 1);
}

#[tokio::test]
async fn test_json_store_keeps_graph_across_services() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roadmap.json");
    let project = Uuid::new_v4();

    let store = JsonFileStore::new(&path);
    let ids = seed_items(&store, project, NodeKind::Epic, &["API", "DB"]).await;
    GraphService::new(store)
        .add_dependency(project, NodeKind::Epic, ids["API"], ids["DB"])
        .await
        .unwrap();

    let reopened = JsonFileStore::new(&path);
    let items = reopened
        .list_items(project, Some(NodeKind::Epic))
        .await
        .unwrap();
    let service = GraphService::new(reopened);

    let plan = service
        .project_plan(project, NodeKind::Epic, &items)
        .await
        .unwrap();
    let keys: Vec<(&str, u32)> = plan
        .items
        .iter()
        .map(|view| (view.key.as_str(), view.phase))
        .collect();
    assert_eq!(keys, vec![("DB", 1), ("API", 2)]);

    let err = service
        .remove_dependency(project, NodeKind::Epic, ids["DB"], ids["API"])
        .await
        .unwrap_err();
    assert!(matches!(err, RoadmapError::EdgeNotFound { .. }));
    service
        .remove_dependency(project, NodeKind::Epic, ids["API"], ids["DB"])
        .await
        .unwrap();
}

/// Races `a -> b` against `b -> a` through two services sharing one store
async fn race_opposite_edges<R>(store: R, project: ProjectId)
where
    R: EdgeRepository + Clone + 'static,
{
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let forward = GraphService::new(store.clone());
    let backward = GraphService::new(store.clone());

    let first = tokio::spawn(async move {
        forward
            .add_dependency(project, NodeKind::Task, a, b)
            .await
    });
    let second = tokio::spawn(async move {
        backward
            .add_dependency(project, NodeKind::Task, b, a)
            .await
    });
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = results.into_iter().find_map(Result::err).unwrap();
    assert!(matches!(rejected, RoadmapError::CycleDetected { .. }));

    let audit = GraphService::new(store)
        .audit_cycles(project, NodeKind::Task)
        .await
        .unwrap();
    assert!(audit.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_edges_in_memory_store() {
    let store = InMemoryStore::new();
    for _ in 0..25 {
        race_opposite_edges(store.clone(), Uuid::new_v4()).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_edges_json_store() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("roadmap.json"));
    for _ in 0..25 {
        race_opposite_edges(store.clone(), Uuid::new_v4()).await;
    }
}

#[tokio::test]
async fn test_store_rejects_cycle_written_past_the_service() {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    store
        .insert_edge(project, NodeKind::Epic, (a, b).into())
        .await
        .unwrap();
    let err = store
        .insert_edge(project, NodeKind::Epic, (b, a).into())
        .await
        .unwrap_err();
    assert!(matches!(err, RoadmapError::CycleDetected { .. }));
}
