//! Writing chunked arrays into array storage.
//!
//! Every block is written by its own store task into the region of the sink covered by the block.
//! Blocks cover disjoint regions, so store tasks never write overlapping subsets and may run in any order, including in parallel.

use std::sync::Arc;

use chunkgraph_grid::{ArrayShape, ArraySubsetError, IncompatibleDimensionalityError};
use chunkgraph_storage::{
    Appendable, ArrayStorageTraits, StorageError, WritableArray, WritableArrayTraits,
};
use thiserror::Error;

use crate::{
    Element,
    array::ChunkedArray,
    execute::{ExecuteError, Executor},
    graph::{Graph, Identifier, Key, Task, TaskFn, Value},
};

/// A sink error.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An execution error.
    #[error(transparent)]
    ExecuteError(#[from] ExecuteError),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// The shape of the array does not match the shape of the sink.
    #[error("array shape {array:?} does not match sink shape {sink:?}")]
    IncompatibleShape {
        /// The array shape.
        array: ArrayShape,
        /// The sink shape.
        sink: ArrayShape,
    },
}

/// The store tasks of a chunked array.
///
/// See [`store_tasks`].
#[derive(Debug, Clone)]
pub struct StoreTasks<T> {
    graph: Graph<T>,
    keys: Vec<Key>,
}

impl<T> StoreTasks<T> {
    /// Return the graph, including the tasks of the stored array.
    #[must_use]
    pub fn graph(&self) -> &Graph<T> {
        &self.graph
    }

    /// Return the keys of the store tasks in block order.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Execute the store tasks.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if a block cannot be computed or written.
    pub fn execute(&self, executor: &impl Executor<T>) -> Result<(), ExecuteError> {
        executor.execute_many(&self.graph, &self.keys)?;
        Ok(())
    }
}

/// Create a store task for every block of `array`, writing the block into `sink` at `offset`.
///
/// The store tasks have the identifier `store-{identifier}` and the block coordinates of the stored block.
/// Each task returns [`Value::Empty`].
/// Nothing is written until the tasks are executed.
///
/// # Errors
/// Returns a [`SinkError`] if `offset` does not match the dimensionality of `array`.
pub fn store_tasks<T: Element>(
    array: &ChunkedArray<T>,
    sink: WritableArray<T>,
    offset: &[u64],
) -> Result<StoreTasks<T>, SinkError> {
    if offset.len() != array.ndim() {
        return Err(IncompatibleDimensionalityError::new(offset.len(), array.ndim()).into());
    }
    let identifier = Identifier::new(format!("store-{}", array.identifier()));
    let mut graph = array.graph().clone();
    let mut keys = Vec::new();
    for key in array.block_keys() {
        let Some(subset) = array.block_subset(key.coords())? else {
            continue;
        };
        let subset = subset.offset_by(offset)?;
        let sink = sink.clone();
        let func: TaskFn<T> = Arc::new(move |values| {
            for value in values {
                sink.write_subset(&subset, value.into_block()?.view())?;
            }
            Ok(Value::Empty)
        });
        let store_key = Key::new(identifier.clone(), key.coords().to_vec());
        graph.insert(store_key.clone(), Task::new("store", func, vec![key.into()]));
        keys.push(store_key);
    }
    Ok(StoreTasks { graph, keys })
}

/// Execute `array` and write it into `sink`.
///
/// # Errors
/// Returns a [`SinkError`] if the shape of `sink` does not match `array`, or a block cannot be computed or written.
pub fn store<T: Element>(
    array: &ChunkedArray<T>,
    sink: WritableArray<T>,
    executor: &impl Executor<T>,
) -> Result<(), SinkError> {
    let sink_shape = sink.shape();
    if sink_shape != array.shape() {
        return Err(SinkError::IncompatibleShape {
            array: array.shape().to_vec(),
            sink: sink_shape,
        });
    }
    let offset = vec![0; array.ndim()];
    store_tasks(array, sink, &offset)?.execute(executor)?;
    Ok(())
}

/// Execute `array` and append it to `sink` along axis 0.
///
/// The sink is first grown by [`Appendable::prepare_append`], then every block is written offset by the previous length of the sink.
/// The sink is grown before any block is computed, so if a block fails the sink keeps its new length and the unwritten region holds the fill value.
///
/// # Errors
/// Returns a [`SinkError`] if the trailing shape of `sink` does not match `array`, the sink cannot be resized, or a block cannot be computed or written.
pub fn append<T, S>(
    array: &ChunkedArray<T>,
    sink: &Arc<S>,
    executor: &impl Executor<T>,
) -> Result<(), SinkError>
where
    T: Element,
    S: Appendable + WritableArrayTraits<T> + 'static,
{
    let offset = sink.prepare_append(array.shape())?;
    let writable: WritableArray<T> = sink.clone();
    store_tasks(array, writable, &offset)?.execute(executor)?;
    Ok(())
}
