//! The persisted, insertion-ordered collection of task sets.

use crate::codec::{CodecError, TaskSetCollectionCodec, task_set_from_str};
use crate::manager::Manager;
use crate::persistence::{PersistenceResult, TextStore};
use crate::task_set::TaskSet;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Task sets keyed by their own name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSetCollection {
    entries: Vec<Arc<TaskSet>>,
}

impl TaskSetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TaskSet>> {
        self.entries.iter().find(|set| set.name() == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Arc<TaskSet>> {
        self.entries.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|set| set.name() == name)
    }

    /// Position of a stored set equal to `task_set`.
    pub fn index_of(&self, task_set: &TaskSet) -> Option<usize> {
        self.entries.iter().position(|set| set.as_ref() == task_set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|set| set.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TaskSet>> {
        self.entries.iter()
    }

    /// Appends `task_set`, first dropping any set with the same name. Returns the dropped set.
    pub fn insert(&mut self, task_set: Arc<TaskSet>) -> Option<Arc<TaskSet>> {
        let evicted = self.remove(task_set.name());
        self.entries.push(task_set);
        evicted
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<TaskSet>> {
        let index = self.position(name)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) -> Vec<Arc<TaskSet>> {
        std::mem::take(&mut self.entries)
    }
}

impl FromIterator<TaskSet> for TaskSetCollection {
    fn from_iter<I: IntoIterator<Item = TaskSet>>(iter: I) -> Self {
        let mut collection = Self::new();
        for set in iter {
            collection.insert(Arc::new(set));
        }
        collection
    }
}

/// Receives add/remove notifications from a [`TaskSetRegistry`].
///
/// Callbacks run on the thread that made the change, after the registry lock is released, so a
/// listener may call back into the registry.
pub trait TaskSetListener: Send + Sync {
    fn on_task_set_added(&self, task_set: &Arc<TaskSet>);
    fn on_task_set_removed(&self, task_set: &Arc<TaskSet>);
    /// The whole collection was replaced from the backing store.
    fn on_task_sets_reloaded(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

enum Change {
    Added(Arc<TaskSet>),
    Removed(Arc<TaskSet>),
    Reloaded,
}

/// Listener bookkeeping shared by the registries in this crate.
pub(crate) struct Listeners<L: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> Listeners<L> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Copies the current listeners so callbacks run without the list locked.
    pub(crate) fn current(&self) -> Vec<Arc<L>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// A [`Manager`] of a [`TaskSetCollection`] that notifies listeners when sets come and go.
///
/// Mutating a task inside a registered set does not notify anyone.
pub struct TaskSetRegistry {
    manager: Manager<TaskSetCollection, TaskSetCollectionCodec>,
    listeners: Listeners<dyn TaskSetListener>,
}

impl TaskSetRegistry {
    /// Loads the collection from `store`, starting empty (and writing an empty collection back)
    /// if that fails.
    pub fn open(store: impl TextStore + 'static) -> Self {
        Self {
            manager: Manager::open(
                store,
                TaskSetCollectionCodec::default(),
                TaskSetCollection::new(),
            ),
            listeners: Listeners::new(),
        }
    }

    /// An empty registry with no backing store.
    pub fn detached() -> Self {
        Self {
            manager: Manager::detached(TaskSetCollectionCodec::default(), TaskSetCollection::new()),
            listeners: Listeners::new(),
        }
    }

    pub fn manager(&self) -> &Manager<TaskSetCollection, TaskSetCollectionCodec> {
        &self.manager
    }

    pub fn add_listener(&self, listener: Arc<dyn TaskSetListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskSet>> {
        self.manager.read_op(|sets| sets.get(name).cloned())
    }

    pub fn get_index(&self, index: usize) -> Option<Arc<TaskSet>> {
        self.manager.read_op(|sets| sets.get_index(index).cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.manager.read_op(|sets| sets.position(name).is_some())
    }

    pub fn len(&self) -> usize {
        self.manager.read_op(TaskSetCollection::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all registered sets, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.manager.read_op(TaskSetCollection::names)
    }

    pub fn task_sets(&self) -> Vec<Arc<TaskSet>> {
        self.manager.read_op(|sets| sets.iter().cloned().collect())
    }

    /// Position of a registered set equal to `task_set`, in insertion order.
    pub fn index_of(&self, task_set: &TaskSet) -> Option<usize> {
        self.manager.read_op(|sets| sets.index_of(task_set))
    }

    /// Registers `task_set` under its name.
    ///
    /// If an equal set is already registered under that name nothing happens and the existing
    /// set is returned. A different set under the same name is removed first.
    pub fn register(&self, task_set: impl Into<Arc<TaskSet>>) -> Arc<TaskSet> {
        let task_set = task_set.into();
        let (registered, changes) = self.manager.write_op(|sets| {
            let mut changes = Vec::new();
            if let Some(existing) = sets.get(task_set.name()) {
                if existing.as_ref() == task_set.as_ref() {
                    return (Arc::clone(existing), changes);
                }
            }
            if let Some(evicted) = sets.remove(task_set.name()) {
                changes.push(Change::Removed(evicted));
            }
            sets.insert(Arc::clone(&task_set));
            changes.push(Change::Added(Arc::clone(&task_set)));
            (task_set, changes)
        });
        self.notify(changes);
        registered
    }

    /// Decodes one task set encoding and registers it.
    pub fn register_encoded(&self, text: &str) -> Result<Arc<TaskSet>, CodecError> {
        let task_set = task_set_from_str(text)?;
        Ok(self.register(task_set))
    }

    /// Removes the set registered under `task_set`'s name, but only if it is equal to
    /// `task_set`. Returns whether anything was removed.
    pub fn remove(&self, task_set: &TaskSet) -> bool {
        let removed = self.manager.write_op(|sets| {
            let stored_is_equal = sets
                .get(task_set.name())
                .is_some_and(|existing| existing.as_ref() == task_set);
            if stored_is_equal {
                sets.remove(task_set.name())
            } else {
                None
            }
        });
        match removed {
            Some(set) => {
                self.notify(vec![Change::Removed(set)]);
                true
            }
            None => false,
        }
    }

    pub fn remove_all(&self) {
        let removed = self.manager.write_op(TaskSetCollection::clear);
        self.notify(removed.into_iter().map(Change::Removed).collect());
    }

    pub fn reload(&self) -> PersistenceResult<()> {
        self.manager.reload()?;
        self.notify(vec![Change::Reloaded]);
        Ok(())
    }

    /// Replaces the collection with a decoded payload from another source.
    pub fn reload_from_str(&self, text: &str) -> Result<(), CodecError> {
        self.manager.reload_from_str(text)?;
        self.notify(vec![Change::Reloaded]);
        Ok(())
    }

    pub fn write(&self) -> PersistenceResult<()> {
        self.manager.write()
    }

    pub fn marshalled(&self) -> Result<String, CodecError> {
        self.manager.marshalled()
    }

    fn notify(&self, changes: Vec<Change>) {
        if changes.is_empty() {
            return;
        }
        let listeners = self.listeners.current();
        for change in &changes {
            match change {
                Change::Added(set) => debug!(task_set = %set.name(), "task set registered"),
                Change::Removed(set) => debug!(task_set = %set.name(), "task set removed"),
                Change::Reloaded => debug!("task sets reloaded"),
            }
            for listener in &listeners {
                match change {
                    Change::Added(set) => listener.on_task_set_added(set),
                    Change::Removed(set) => listener.on_task_set_removed(set),
                    Change::Reloaded => listener.on_task_sets_reloaded(),
                }
            }
        }
    }
}
