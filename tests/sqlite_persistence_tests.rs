#![cfg(feature = "sqlite")]

use taskset_tool::{
    SqliteStore, Task, TaskSet, TaskSetRegistry, TextStore, VisualizationManager,
};
use tempfile::NamedTempFile;

#[test]
fn sqlite_store_round_trip_registry() {
    let file = NamedTempFile::new().unwrap();

    let registry = TaskSetRegistry::open(SqliteStore::open(file.path(), "tasksets").unwrap());
    assert!(registry.is_empty());
    registry.register(TaskSet::from_tasks(
        "Control",
        [
            Task::immediate("Loop", 0xFF00_FF00, 10, 10, 2, 3, 1).unwrap(),
            Task::immediate_without_threshold("Watchdog", 0xFFFF_0000, 50, 50, 1, 0).unwrap(),
        ],
    ));
    registry.write().unwrap();

    let reopened = TaskSetRegistry::open(SqliteStore::open(file.path(), "tasksets").unwrap());
    assert_eq!(reopened.task_sets(), registry.task_sets());
    assert_eq!(
        reopened.get("Control").unwrap().task_names(),
        vec!["Loop", "Watchdog"]
    );
}

#[test]
fn registries_and_settings_share_one_database() {
    let file = NamedTempFile::new().unwrap();
    let registry = TaskSetRegistry::open(SqliteStore::open(file.path(), "tasksets").unwrap());
    let settings = VisualizationManager::open(SqliteStore::open(file.path(), "visualization").unwrap());

    registry.register(TaskSet::new("only"));
    registry.write().unwrap();
    settings.update(|v| v.set_time_scale(75)).unwrap();
    settings.write().unwrap();

    let raw = SqliteStore::open(file.path(), "visualization").unwrap();
    assert!(raw.read_text().unwrap().contains("\"TimeScale\": 75"));

    let settings_again =
        VisualizationManager::open(SqliteStore::open(file.path(), "visualization").unwrap());
    assert_eq!(settings_again.visualization().time_scale(), 75);
    let registry_again = TaskSetRegistry::open(SqliteStore::open(file.path(), "tasksets").unwrap());
    assert_eq!(registry_again.names(), vec!["only"]);
}

#[test]
fn corrupt_document_is_replaced_by_the_default() {
    let store = SqliteStore::in_memory("tasksets").unwrap();
    store.write_text("not json").unwrap();
    let registry = TaskSetRegistry::open(store);
    assert!(registry.is_empty());
    let stored = registry.manager().store().unwrap().read_text().unwrap();
    assert_eq!(stored.trim(), "[]");
}
