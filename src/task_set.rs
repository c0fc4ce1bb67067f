use crate::sync::RwSafe;
use crate::task::Task;
use std::collections::HashMap;
use std::ptr;

const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Default)]
struct Entries {
    order: Vec<String>,
    tasks: HashMap<String, Task>,
}

impl Entries {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            tasks: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts at the end of the order, replacing any task with the same name.
    fn insert(&mut self, task: Task) -> Option<Task> {
        self.order.retain(|name| name != task.name());
        self.order.push(task.name().to_string());
        self.tasks.insert(task.name().to_string(), task)
    }

    fn remove(&mut self, name: &str) -> Option<Task> {
        let removed = self.tasks.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }

    fn ordered(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }
}

/// A named collection of tasks, addressable by name and by insertion position.
///
/// All access goes through an internal reader-writer lock, so a `TaskSet` can be shared
/// between threads behind an `Arc`. Re-inserting a task under an existing name moves it to the
/// end of the order.
#[derive(Debug)]
pub struct TaskSet {
    name: String,
    entries: RwSafe<Entries>,
}

impl TaskSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    /// An empty set sized for `capacity` tasks.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            entries: RwSafe::new(Entries::with_capacity(capacity)),
        }
    }

    /// A set holding `tasks`, inserted in iteration order.
    pub fn from_tasks(name: impl Into<String>, tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks = tasks.into_iter();
        let mut set = Self::with_capacity(name, tasks.size_hint().0);
        // not shared yet, no locking needed
        let entries = set.entries.get_mut();
        for task in tasks {
            entries.insert(task);
        }
        set
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<Task> {
        self.entries.read_op(|e| e.tasks.get(name).cloned())
    }

    /// The task at position `index` of the insertion order.
    pub fn get_index(&self, index: usize) -> Option<Task> {
        self.entries.read_op(|e| {
            e.order
                .get(index)
                .and_then(|name| e.tasks.get(name))
                .cloned()
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read_op(|e| e.tasks.contains_key(name))
    }

    /// Whether a task equal to `task` (all attributes) is stored.
    pub fn contains_task(&self, task: &Task) -> bool {
        self.entries
            .read_op(|e| e.tasks.get(task.name()).is_some_and(|stored| stored == task))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.read_op(|e| e.order.iter().position(|n| n == name))
    }

    pub fn len(&self) -> usize {
        self.entries.read_op(|e| e.tasks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Task names in insertion order.
    pub fn task_names(&self) -> Vec<String> {
        self.entries.read_op(|e| e.order.clone())
    }

    /// Copies of all tasks in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        self.entries.read_op(|e| e.ordered().cloned().collect())
    }

    /// Inserts `task` at the end of the order and returns the task it replaced, if any.
    pub fn put(&self, task: Task) -> Option<Task> {
        self.entries.write_op(|e| e.insert(task))
    }

    pub fn remove(&self, name: &str) -> Option<Task> {
        self.entries.write_op(|e| e.remove(name))
    }

    /// Runs `op` on the stored task named `name` under the write lock.
    ///
    /// Returns `None` when no such task exists. The task keeps its position.
    pub fn modify<R>(&self, name: &str, op: impl FnOnce(&mut Task) -> R) -> Option<R> {
        self.entries.write_op(|e| e.tasks.get_mut(name).map(op))
    }

    pub fn clear(&self) {
        self.entries.write_op(|e| {
            e.order.clear();
            e.tasks.clear();
        });
    }
}

impl Clone for TaskSet {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: RwSafe::new(self.entries.snapshot()),
        }
    }
}

impl PartialEq for TaskSet {
    fn eq(&self, other: &Self) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        if self.name != other.name {
            return false;
        }
        // never hold both locks at once
        let mine = self.entries.snapshot();
        other.entries.read_op(|theirs| &mine == theirs)
    }
}
