use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use taskset_tool::{
    FileStore, Marshaller, Task, TaskSet, TaskSetCollection, TaskSetCollectionCodec,
    TaskSetListener, TaskSetRegistry,
};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl TaskSetListener for Recorder {
    fn on_task_set_added(&self, task_set: &Arc<TaskSet>) {
        self.events.lock().push(format!("added {}", task_set.name()));
    }

    fn on_task_set_removed(&self, task_set: &Arc<TaskSet>) {
        self.events.lock().push(format!("removed {}", task_set.name()));
    }

    fn on_task_sets_reloaded(&self) {
        self.events.lock().push("reloaded".to_string());
    }
}

fn task(name: &str, priority: i32) -> Task {
    Task::immediate_without_threshold(name, 0xFF33_6699, 10, 10, 2, priority).unwrap()
}

fn set(name: &str, tasks: &[(&str, i32)]) -> TaskSet {
    TaskSet::from_tasks(name, tasks.iter().map(|(n, p)| task(n, *p)))
}

#[test]
fn register_notifies_and_replaces_unequal_sets() {
    let registry = TaskSetRegistry::detached();
    let recorder = Arc::new(Recorder::default());
    registry.add_listener(recorder.clone());

    registry.register(set("a", &[("T1", 1)]));
    registry.register(set("b", &[]));
    assert_eq!(recorder.take(), vec!["added a", "added b"]);

    // equal set: no-op
    registry.register(set("a", &[("T1", 1)]));
    assert!(recorder.take().is_empty());

    // unequal set under the same name: removal then addition
    registry.register(set("a", &[("T1", 2)]));
    assert_eq!(recorder.take(), vec!["removed a", "added a"]);
    assert_eq!(registry.names(), vec!["b", "a"]);
    assert_eq!(registry.get("a").unwrap().get("T1").unwrap().priority(), 2);
}

#[test]
fn remove_only_deletes_an_equal_set() {
    let registry = TaskSetRegistry::detached();
    let stale = set("a", &[("T1", 1)]);
    registry.register(stale.clone());
    registry.register(set("a", &[("T1", 7)]));

    assert!(!registry.remove(&stale));
    assert!(registry.contains("a"));

    let current = registry.get("a").unwrap();
    assert!(registry.remove(&current));
    assert!(registry.is_empty());
    assert!(!registry.remove(&current));
}

#[test]
fn index_of_follows_insertion_order() {
    let registry = TaskSetRegistry::detached();
    let a = set("a", &[]);
    let b = set("b", &[("T1", 1)]);
    registry.register(a.clone());
    registry.register(b.clone());

    assert_eq!(registry.index_of(&a), Some(0));
    assert_eq!(registry.index_of(&b), Some(1));
    assert_eq!(registry.index_of(&set("c", &[])), None);
    assert_eq!(registry.index_of(&set("b", &[])), None);
    assert_eq!(registry.get_index(1).unwrap().name(), "b");
    assert!(registry.get_index(2).is_none());
}

#[test]
fn remove_all_reports_every_set() {
    let registry = TaskSetRegistry::detached();
    let recorder = Arc::new(Recorder::default());
    registry.register(set("a", &[]));
    registry.register(set("b", &[]));
    let id = registry.add_listener(recorder.clone());

    registry.remove_all();
    assert!(registry.is_empty());
    assert_eq!(recorder.take(), vec!["removed a", "removed b"]);

    assert!(registry.remove_listener(id));
    registry.register(set("c", &[]));
    assert!(recorder.take().is_empty());
}

struct Reentrant {
    registry: Arc<TaskSetRegistry>,
    seen: Mutex<Vec<usize>>,
}

impl TaskSetListener for Reentrant {
    fn on_task_set_added(&self, _: &Arc<TaskSet>) {
        self.seen.lock().push(self.registry.len());
    }

    fn on_task_set_removed(&self, _: &Arc<TaskSet>) {}
}

#[test]
fn listeners_may_call_back_into_the_registry() {
    let registry = Arc::new(TaskSetRegistry::detached());
    let listener = Arc::new(Reentrant {
        registry: Arc::clone(&registry),
        seen: Mutex::new(Vec::new()),
    });
    registry.add_listener(listener.clone());
    registry.register(set("a", &[]));
    registry.register(set("b", &[]));
    assert_eq!(*listener.seen.lock(), vec![1, 2]);
}

#[test]
fn collection_persists_through_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root.tasksets");

    let registry = TaskSetRegistry::open(FileStore::new(&path));
    assert!(registry.is_empty());
    // the empty default was written back
    assert!(path.is_file());

    registry.register(set("first", &[("T1", 1), ("T2", 0)]));
    registry.register(set("second", &[("T3", 4)]));
    registry.write().unwrap();

    let reopened = TaskSetRegistry::open(FileStore::new(&path));
    assert_eq!(reopened.names(), vec!["first", "second"]);
    assert_eq!(
        reopened.get("first").unwrap().task_names(),
        vec!["T1", "T2"]
    );
    assert_eq!(reopened.task_sets(), registry.task_sets());
}

#[test]
fn reload_discards_unsaved_changes_and_notifies() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root.tasksets");
    let registry = TaskSetRegistry::open(FileStore::new(&path));
    registry.register(set("kept", &[]));
    registry.write().unwrap();
    registry.register(set("unsaved", &[]));

    let recorder = Arc::new(Recorder::default());
    registry.add_listener(recorder.clone());
    registry.reload().unwrap();
    assert_eq!(registry.names(), vec!["kept"]);
    assert_eq!(recorder.take(), vec!["reloaded"]);
}

#[test]
fn corrupt_file_fails_reload_but_keeps_the_registry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root.tasksets");
    let registry = TaskSetRegistry::open(FileStore::new(&path));
    registry.register(set("a", &[]));

    std::fs::write(&path, r#"[{"Name": "broken"}]"#).unwrap();
    let err = registry.reload().unwrap_err();
    assert!(err.is_codec());
    assert!(err.to_string().contains("no value for Tasks"));
    assert_eq!(registry.names(), vec!["a"]);
}

#[test]
fn undecodable_bytes_are_reported_as_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root.tasksets");
    let registry = TaskSetRegistry::open(FileStore::new(&path));
    registry.register(set("a", &[]));

    std::fs::write(&path, [0xFF, 0xFE, 0x00]).unwrap();
    let err = registry.reload().unwrap_err();
    assert!(err.is_codec());
    assert!(!err.is_access());
    assert_eq!(registry.names(), vec!["a"]);
}

#[test]
fn remote_payloads_round_trip_through_the_registry() {
    let registry = TaskSetRegistry::detached();
    let registered = registry
        .register_encoded(
            r##"{"Name": "remote", "Tasks": [
                {"Name": "T1", "Priority": 2, "Computation": 1, "Period": 5,
                 "Deadline": 5, "Color": "#FF0000"}
            ]}"##,
        )
        .unwrap();
    assert_eq!(registered.get("T1").unwrap().minimal_preemption_priority(), 3);

    let payload = registry.marshalled().unwrap();
    let other = TaskSetRegistry::detached();
    other.reload_from_str(&payload).unwrap();
    assert_eq!(other.task_sets(), registry.task_sets());

    assert!(registry.register_encoded("{}").is_err());
    assert_eq!(registry.len(), 1);
}

#[test]
fn collection_codec_round_trips_registry_contents() {
    let registry = TaskSetRegistry::detached();
    registry.register(set("x", &[("T1", 1)]));
    registry.register(set("y", &[("T2", 2), ("T3", 3)]));
    let codec = TaskSetCollectionCodec::default();
    let collection: TaskSetCollection = registry.manager().snapshot();
    let decoded = codec.unmarshal(&codec.marshal(&collection).unwrap()).unwrap();
    assert_eq!(decoded, collection);
}

#[test]
fn concurrent_registration_loses_nothing() {
    let registry = TaskSetRegistry::detached();
    thread::scope(|scope| {
        for worker in 0..8 {
            let registry = &registry;
            scope.spawn(move || {
                for i in 0..25 {
                    registry.register(set(&format!("w{worker}-{i}"), &[("T", i)]));
                    assert!(registry.len() >= 1);
                }
            });
        }
    });
    assert_eq!(registry.len(), 200);
    assert!(registry.contains("w7-24"));
}

#[test]
fn concurrent_task_mutation_inside_a_registered_set() {
    let registry = TaskSetRegistry::detached();
    let shared = registry.register(set("shared", &[("counter", 0)]));
    thread::scope(|scope| {
        for _ in 0..4 {
            let shared = &shared;
            scope.spawn(move || {
                for _ in 0..100 {
                    shared
                        .modify("counter", |task| {
                            let next = task.priority() + 1;
                            task.set_priority(next).unwrap();
                        })
                        .unwrap();
                }
            });
        }
    });
    assert_eq!(registry.get("shared").unwrap().get("counter").unwrap().priority(), 400);
}
