//! Graph executors.
//!
//! An [`Executor`] evaluates the tasks of a [`Graph`] needed to compute a set of keys.
//! Tasks are only ever evaluated after every task they depend on, otherwise executors are free to choose the order.
//! An intermediate result is dropped once every task depending on it has been evaluated.
//!
//! Two executors are provided:
//!  - [`SequentialExecutor`] evaluates tasks one at a time on the calling thread, and
//!  - [`ThreadedExecutor`] evaluates independent tasks in parallel with [`rayon`].

mod sequential;
mod threaded;

use std::collections::{HashMap, HashSet};

use chunkgraph_grid::ArrayShape;
use thiserror::Error;

pub use sequential::SequentialExecutor;
pub use threaded::ThreadedExecutor;

use crate::graph::{Graph, GraphError, Key, NestedKeys, Task, TaskError, Value};

/// An execution error.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    /// The graph is missing a key or has a dependency cycle.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A task failed.
    #[error("task {key} failed: {source}")]
    Task {
        /// The key of the failed task.
        key: Key,
        /// The task error.
        source: TaskError,
    },
    /// A task returned an invalid result.
    #[error(transparent)]
    InvalidResult(#[from] TaskError),
    /// The array is not a scalar.
    #[error("an array with shape {0:?} is not a scalar")]
    NotScalar(ArrayShape),
}

/// Graph executor traits.
pub trait Executor<T> {
    /// Evaluate `keys` and the tasks they depend on.
    ///
    /// Returns one value per key, in the order of `keys`.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if a key is missing from the graph, the graph has a cycle, or a task fails.
    fn execute_many(&self, graph: &Graph<T>, keys: &[Key]) -> Result<Vec<Value<T>>, ExecuteError>;

    /// Evaluate `key` and the tasks it depends on.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if a key is missing from the graph, the graph has a cycle, or a task fails.
    fn execute(&self, graph: &Graph<T>, key: &Key) -> Result<Value<T>, ExecuteError> {
        self.execute_many(graph, std::slice::from_ref(key))?
            .pop()
            .ok_or_else(|| GraphError::MissingKey(key.clone()).into())
    }

    /// Evaluate nested `keys` and the tasks they depend on.
    ///
    /// Returns a [`Value`] with the nesting of `keys`: a [`Value::List`] for every list, and the task result for every key.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if a key is missing from the graph, the graph has a cycle, or a task fails.
    fn execute_nested(&self, graph: &Graph<T>, keys: &NestedKeys) -> Result<Value<T>, ExecuteError> {
        let flat = keys.flatten();
        let mut values = self.execute_many(graph, &flat)?.into_iter();
        nest(keys, &mut values).ok_or_else(|| {
            let key = flat.last().cloned();
            match key {
                Some(key) => GraphError::MissingKey(key).into(),
                None => TaskError::UnexpectedValue {
                    expected: "list",
                    got: "empty",
                }
                .into(),
            }
        })
    }
}

fn nest<T>(keys: &NestedKeys, values: &mut impl Iterator<Item = Value<T>>) -> Option<Value<T>> {
    match keys {
        NestedKeys::Key(_) => values.next(),
        NestedKeys::List(list) => list
            .iter()
            .map(|keys| nest(keys, values))
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
    }
}

/// The number of unevaluated dependents of each task result.
///
/// Results of requested keys are always retained.
struct Retention<'a> {
    dependents: HashMap<&'a Key, usize>,
    requested: HashSet<&'a Key>,
}

impl<'a> Retention<'a> {
    fn new<T>(graph: &'a Graph<T>, keys: &'a [Key]) -> Self {
        let mut dependents: HashMap<&'a Key, usize> = HashMap::new();
        for (_, task) in graph.iter() {
            for dependency in task.dependencies() {
                *dependents.entry(dependency).or_default() += 1;
            }
        }
        Self {
            dependents,
            requested: keys.iter().collect(),
        }
    }

    /// Record that `task` has been evaluated and return the results that are no longer needed.
    fn release<T>(&mut self, task: &'a Task<T>) -> Vec<&'a Key> {
        let mut released = Vec::new();
        for dependency in task.dependencies() {
            if let Some(count) = self.dependents.get_mut(dependency) {
                *count = count.saturating_sub(1);
                if *count == 0 && !self.requested.contains(dependency) {
                    released.push(dependency);
                }
            }
        }
        released
    }
}

/// Evaluate `task` with the results of its dependencies returned by `lookup`.
fn evaluate<T: Clone>(
    key: &Key,
    task: &Task<T>,
    mut lookup: impl FnMut(&Key) -> Option<Value<T>>,
) -> Result<Value<T>, ExecuteError> {
    let values = task
        .args()
        .iter()
        .map(|argument| argument.resolve(&mut lookup))
        .collect::<Result<Vec<_>, _>>()
        .map_err(GraphError::MissingKey)?;
    log::trace!("evaluating task `{}` for {key}", task.name());
    task.call(values).map_err(|source| ExecuteError::Task {
        key: key.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ndarray::ArrayD;

    use super::*;
    use crate::graph::{Argument, Identifier, TaskFn};

    /// A graph computing `c[i] = a[i] + b`, and `d = sum(c)`.
    pub(super) fn test_graph() -> Graph<i64> {
        let a = Identifier::new("a");
        let b = Identifier::new("b");
        let c = Identifier::new("c");
        let d = Identifier::new("d");
        let constant = |value: i64| -> TaskFn<i64> {
            Arc::new(move |_| Ok(Value::Block(ArrayD::from_elem(vec![2], value).into_shared())))
        };
        let add: TaskFn<i64> = Arc::new(|values| {
            let blocks = Value::List(values).flatten_blocks()?;
            Ok(Value::Block(
                blocks
                    .iter()
                    .fold(ArrayD::zeros(vec![2]), |acc, block| acc + block)
                    .into_shared(),
            ))
        });

        let mut graph = Graph::new();
        for i in 0..3 {
            graph.insert(
                Key::new(a.clone(), vec![i]),
                Task::new("constant", constant(i64::try_from(i).unwrap()), vec![]),
            );
            graph.insert(
                Key::new(c.clone(), vec![i]),
                Task::new(
                    "add",
                    add.clone(),
                    vec![
                        Key::new(a.clone(), vec![i]).into(),
                        Key::new(b.clone(), vec![]).into(),
                    ],
                ),
            );
        }
        graph.insert(Key::new(b, vec![]), Task::new("constant", constant(10), vec![]));
        graph.insert(
            Key::new(d, vec![]),
            Task::new(
                "sum",
                add,
                vec![Argument::List(
                    (0..3).map(|i| Key::new(c.clone(), vec![i]).into()).collect(),
                )],
            ),
        );
        graph
    }

    pub(super) fn check_executor(executor: &impl Executor<i64>) {
        let graph = test_graph();
        let d = Key::new(Identifier::new("d"), vec![]);
        let value = executor.execute(&graph, &d).unwrap().into_block().unwrap();
        assert_eq!(value, ArrayD::from_elem(vec![2], 33).into_shared());

        let c = Identifier::new("c");
        let nested = NestedKeys::List(vec![
            Key::new(c.clone(), vec![2]).into(),
            NestedKeys::List(vec![Key::new(c.clone(), vec![0]).into()]),
        ]);
        let value = executor.execute_nested(&graph, &nested).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Block(ArrayD::from_elem(vec![2], 12).into_shared()),
                Value::List(vec![Value::Block(
                    ArrayD::from_elem(vec![2], 10).into_shared()
                )]),
            ])
        );

        assert!(matches!(
            executor.execute(&graph, &Key::new(Identifier::new("e"), vec![])),
            Err(ExecuteError::Graph(GraphError::MissingKey(_)))
        ));
    }

    #[test]
    fn retention_releases_unrequested_results() {
        let graph = test_graph();
        let key = |name: &str, indices: Vec<u64>| Key::new(Identifier::new(name), indices);
        let keys = [key("d", vec![]), key("c", vec![0])];
        let mut retention = Retention::new(&graph, &keys);
        let task = |key: &Key| graph.get(key).unwrap();

        let c0 = key("c", vec![0]);
        let c1 = key("c", vec![1]);
        let c2 = key("c", vec![2]);
        assert_eq!(retention.release(task(&c0)), vec![&key("a", vec![0])]);
        assert_eq!(retention.release(task(&c1)), vec![&key("a", vec![1])]);
        // `b` is released with its last dependent
        assert_eq!(
            retention.release(task(&c2)),
            vec![&key("a", vec![2]), &key("b", vec![])]
        );
        // `c[0]` is requested
        assert_eq!(retention.release(task(&keys[0])), vec![&c1, &c2]);
    }

    pub(super) fn check_executor_errors(executor: &impl Executor<i64>) {
        let mut graph = test_graph();
        let a0 = Key::new(Identifier::new("a"), vec![0]);
        let failing: TaskFn<i64> = Arc::new(|_| Err(TaskError::kernel("fail", "always fails")));
        graph.insert(a0.clone(), Task::new("fail", failing, vec![]));
        let d = Key::new(Identifier::new("d"), vec![]);
        match executor.execute(&graph, &d) {
            Err(ExecuteError::Task { key, .. }) => assert_eq!(key, a0),
            result => panic!("unexpected result {result:?}"),
        }

        let mut graph = test_graph();
        let identity: TaskFn<i64> = Arc::new(|mut values| Ok(values.pop().unwrap_or(Value::Empty)));
        graph.insert(a0.clone(), Task::new("loop", identity, vec![d.clone().into()]));
        assert!(matches!(
            executor.execute(&graph, &d),
            Err(ExecuteError::Graph(GraphError::Cycle(_)))
        ));
    }
}
