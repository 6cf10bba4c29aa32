use std::collections::HashMap;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use super::{ExecuteError, Executor, Retention, evaluate};
use crate::{
    Element,
    config::global_config,
    graph::{Graph, GraphError, Key, Value},
};

/// An executor that evaluates independent tasks in parallel.
///
/// The tasks needed for the requested keys are grouped into topological levels.
/// The tasks of each level are evaluated in parallel on the [`rayon`] thread pool, with at most [`concurrent_limit`](ThreadedExecutor::concurrent_limit) tasks in flight.
/// Intermediate results are dropped after the level holding their last dependent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadedExecutor {
    concurrent_limit: Option<usize>,
}

impl ThreadedExecutor {
    /// Create a new threaded executor.
    ///
    /// The concurrent limit is the [executor concurrent limit](crate::config::Config#executor-concurrent-limit) of the global configuration at execution time.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            concurrent_limit: None,
        }
    }

    /// Create a new threaded executor with an explicit concurrent limit.
    #[must_use]
    pub const fn with_concurrent_limit(concurrent_limit: usize) -> Self {
        Self {
            concurrent_limit: Some(concurrent_limit),
        }
    }

    /// Return the maximum number of tasks evaluated concurrently.
    #[must_use]
    pub fn concurrent_limit(&self) -> usize {
        self.concurrent_limit
            .unwrap_or_else(|| global_config().executor_concurrent_limit())
            .max(1)
    }
}

impl<T: Element> Executor<T> for ThreadedExecutor {
    fn execute_many(&self, graph: &Graph<T>, keys: &[Key]) -> Result<Vec<Value<T>>, ExecuteError> {
        let culled = graph.cull(keys)?;
        let levels = culled.topological_levels()?;
        let concurrent_limit = self.concurrent_limit();

        let mut retention = Retention::new(&culled, keys);
        let mut results: HashMap<Key, Value<T>> = HashMap::with_capacity(culled.len());
        for level in levels {
            let evaluate_key = |key: Key| {
                let task = culled
                    .get(&key)
                    .ok_or_else(|| GraphError::MissingKey(key.clone()))?;
                let value = evaluate(&key, task, |key| results.get(key).cloned())?;
                Ok::<_, ExecuteError>((key, value))
            };
            let level_results = iter_concurrent_limit!(concurrent_limit, level, map, evaluate_key)
                .collect::<Result<Vec<_>, _>>()?;
            let released = level_results
                .iter()
                .filter_map(|(key, _)| culled.get(key))
                .flat_map(|task| retention.release(task))
                .collect::<Vec<_>>();
            results.extend(level_results);
            for key in released {
                results.remove(key);
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
