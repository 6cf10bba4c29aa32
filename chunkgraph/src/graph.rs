//! Task graphs.
//!
//! A [`Graph`] maps each [`Key`] to the [`Task`] that computes it.
//! A key is an array [`Identifier`] followed by zero-based block coordinates, e.g. `('x_1', 0, 1)`.
//! Tasks depend on each other only through [`Argument::Key`] arguments.

mod identifier;
mod key;
mod task;
mod value;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use thiserror::Error;

pub use identifier::{CounterIdGenerator, GlobalIdGenerator, IdGenerator, Identifier};
pub use key::{Key, NestedKeys};
pub use task::{Argument, Task, TaskError, TaskFn};
pub use value::{Block, Value};

/// A graph error.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// A key is not in the graph.
    #[error("key {0} is not in the graph")]
    MissingKey(Key),
    /// The graph has a dependency cycle through a key.
    #[error("the graph has a dependency cycle through key {0}")]
    Cycle(Key),
}

/// A task graph.
///
/// Tasks are shared, so merging graphs never copies a task.
#[derive(Clone)]
pub struct Graph<T> {
    tasks: BTreeMap<Key, Arc<Task<T>>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.tasks.iter()).finish()
    }
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T> {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// Insert a task, returning the task previously at `key`.
    pub fn insert(&mut self, key: Key, task: Task<T>) -> Option<Arc<Task<T>>> {
        self.tasks.insert(key, Arc::new(task))
    }

    /// Return the task at `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Task<T>> {
        self.tasks.get(key).map(AsRef::as_ref)
    }

    /// Returns true if the graph has a task at `key`.
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.tasks.contains_key(key)
    }

    /// Return the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the graph has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Return an iterator over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.tasks.keys()
    }

    /// Return an iterator over the keys and tasks in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Task<T>)> {
        self.tasks.iter().map(|(key, task)| (key, task.as_ref()))
    }

    /// Merge the tasks of `other` into this graph.
    ///
    /// Keys present in both graphs keep the task of `other`.
    /// Graphs of distinct arrays are key-disjoint, so overlapping keys only occur when the same array contributes more than once.
    pub fn merge(&mut self, other: &Graph<T>) {
        self.tasks.extend(
            other
                .tasks
                .iter()
                .map(|(key, task)| (key.clone(), task.clone())),
        );
    }

    /// Return the subgraph of the tasks needed to compute `keys`.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingKey`] if a requested key or one of its dependencies is not in the graph.
    pub fn cull<'a>(&self, keys: impl IntoIterator<Item = &'a Key>) -> Result<Graph<T>, GraphError> {
        let mut culled = BTreeMap::new();
        let mut stack: Vec<&Key> = keys.into_iter().collect();
        while let Some(key) = stack.pop() {
            if culled.contains_key(key) {
                continue;
            }
            let task = self
                .tasks
                .get(key)
                .ok_or_else(|| GraphError::MissingKey(key.clone()))?;
            stack.extend(task.dependencies());
            culled.insert(key.clone(), task.clone());
        }
        Ok(Graph { tasks: culled })
    }

    /// Group the keys of the graph into topological levels.
    ///
    /// Every task in a level depends only on tasks in earlier levels, so the tasks of one level can be evaluated in any order.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingKey`] if a dependency is not in the graph, or [`GraphError::Cycle`] if the graph is not acyclic.
    pub fn topological_levels(&self) -> Result<Vec<Vec<Key>>, GraphError> {
        let mut pending: HashMap<&Key, usize> = HashMap::with_capacity(self.tasks.len());
        let mut dependents: HashMap<&Key, Vec<&Key>> = HashMap::new();
        for (key, task) in &self.tasks {
            let dependencies: HashSet<&Key> = task.dependencies().into_iter().collect();
            for dependency in &dependencies {
                if !self.tasks.contains_key(*dependency) {
                    return Err(GraphError::MissingKey((*dependency).clone()));
                }
                dependents.entry(*dependency).or_default().push(key);
            }
            pending.insert(key, dependencies.len());
        }

        let mut level: Vec<&Key> = pending
            .iter()
            .filter_map(|(key, &count)| (count == 0).then_some(*key))
            .collect();
        level.sort();
        let mut levels = Vec::new();
        while !level.is_empty() {
            let mut next = Vec::new();
            for key in &level {
                for dependent in dependents.get(key).into_iter().flatten() {
                    if let Some(count) = pending.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }
            next.sort();
            levels.push(level.into_iter().cloned().collect());
            level = next;
        }

        match pending.into_iter().find(|(_, count)| *count > 0) {
            Some((key, _)) => Err(GraphError::Cycle(key.clone())),
            None => Ok(levels),
        }
    }
}

impl<T> FromIterator<(Key, Task<T>)> for Graph<T> {
    fn from_iter<I: IntoIterator<Item = (Key, Task<T>)>>(iter: I) -> Self {
        Self {
            tasks: iter
                .into_iter()
                .map(|(key, task)| (key, Arc::new(task)))
                .collect(),
        }
    }
}
