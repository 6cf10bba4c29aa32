use std::collections::HashMap;

use super::{ExecuteError, Executor, Retention, evaluate};
use crate::{
    Element,
    graph::{Graph, GraphError, Key, Value},
};

/// An executor that evaluates tasks one at a time on the calling thread.
///
/// Only the tasks needed for the requested keys are evaluated, each exactly once.
/// Intermediate results are dropped as soon as their last dependent has been evaluated.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    /// Create a new sequential executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<T: Element> Executor<T> for SequentialExecutor {
    fn execute_many(&self, graph: &Graph<T>, keys: &[Key]) -> Result<Vec<Value<T>>, ExecuteError> {
        let culled = graph.cull(keys)?;
        let mut retention = Retention::new(&culled, keys);
        let mut results: HashMap<Key, Value<T>> = HashMap::with_capacity(culled.len());
        for key in culled.topological_levels()?.into_iter().flatten() {
            let task = culled
                .get(&key)
                .ok_or_else(|| GraphError::MissingKey(key.clone()))?;
            let value = evaluate(&key, task, |key| results.get(key).cloned())?;
            results.insert(key, value);
            for released in retention.release(task) {
                results.remove(released);
            }
        }
        keys.iter()
            .map(|key| {
                results
                    .get(key)
                    .cloned()
                    .ok_or_else(|| GraphError::MissingKey(key.clone()).into())
            })
            .collect()
    }
}
