use std::sync::Arc;

use chunkgraph_grid::{ArrayShape, ArraySubset};
use chunkgraph_storage::{ArrayStorageTraits, ReadableArray, ReadableArrayTraits};
use ndarray::{ArrayD, ErrorKind, ShapeError};

use super::{ChunkedArray, ChunkedArrayCreateError};
use crate::{
    Element,
    execute::{ExecuteError, Executor},
    graph::{
        Argument, Block, GlobalIdGenerator, Graph, IdGenerator, Identifier, Key, Task,
        TaskError, TaskFn, Value,
    },
    kernels,
};

impl<T: Element> ChunkedArray<T> {
    /// Wrap an in-memory array as a chunked array with a generated identifier.
    ///
    /// See [`from_shared`](ChunkedArray::from_shared).
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayCreateError`] if `blockshape` is invalid for the shape of `data`.
    pub fn from_ndarray(
        data: ArrayD<T>,
        blockshape: &[u64],
    ) -> Result<Self, ChunkedArrayCreateError> {
        Self::from_shared(GlobalIdGenerator.next_id("x"), data.into_shared(), blockshape)
    }

    /// Wrap a shared in-memory array as a chunked array.
    ///
    /// Every block is a leaf task that slices its region out of `data` at execution time.
    /// The blocks share the memory of `data`.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayCreateError`] if `blockshape` is invalid for the shape of `data`.
    pub fn from_shared(
        identifier: Identifier,
        data: Block<T>,
        blockshape: &[u64],
    ) -> Result<Self, ChunkedArrayCreateError> {
        let shape: ArrayShape = data.shape().iter().map(|&s| s as u64).collect();
        let data = Value::Block(data);
        Self::from_leaf_tasks(identifier, shape, blockshape, |subset| {
            let func: TaskFn<T> = Arc::new(move |values| {
                let [data] = <[Value<T>; 1]>::try_from(values).map_err(|_| {
                    TaskError::kernel("getitem", "expected a single argument")
                })?;
                Ok(kernels::slice(&data.into_block()?, &subset)?.into())
            });
            Task::new("getitem", func, vec![Argument::Literal(data.clone())])
        })
    }

    /// Wrap a readable array as a chunked array.
    ///
    /// Every block is a leaf task that reads its region from `source` at execution time.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayCreateError`] if `blockshape` is invalid for the shape of `source`.
    pub fn from_source(
        identifier: Identifier,
        source: ReadableArray<T>,
        blockshape: &[u64],
    ) -> Result<Self, ChunkedArrayCreateError> {
        let shape = source.shape();
        Self::from_leaf_tasks(identifier, shape, blockshape, |subset| {
            let source = source.clone();
            let func: TaskFn<T> =
                Arc::new(move |_| Ok(source.read_subset(&subset)?.into_shared().into()));
            Task::new("read", func, vec![])
        })
    }

    /// Create an array with one task without arguments per block, built from the subset of the block.
    pub(crate) fn from_leaf_tasks(
        identifier: Identifier,
        shape: ArrayShape,
        blockshape: &[u64],
        leaf_task: impl Fn(ArraySubset) -> Task<T>,
    ) -> Result<Self, ChunkedArrayCreateError> {
        let grid = Self::regular_grid(shape, blockshape)?;
        let mut graph = Graph::new();
        for coords in grid.iter_block_indices() {
            if let Some(subset) = grid.subset(&coords)? {
                graph.insert(
                    Key::new(identifier.clone(), coords.to_vec()),
                    leaf_task(subset),
                );
            }
        }
        Ok(Self::from_parts(identifier, Arc::new(graph), grid))
    }

    /// Execute every block and assemble the result into an in-memory array.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if execution fails or the blocks do not assemble into an array with the shape of this array.
    pub fn to_ndarray(&self, executor: &impl Executor<T>) -> Result<ArrayD<T>, ExecuteError> {
        let shape = ArraySubset::new_with_shape(self.shape().to_vec()).shape_usize();
        if self.num_elements() == 0 {
            return Ok(ArrayD::from_shape_vec(shape, vec![]).map_err(TaskError::from)?);
        }
        let value = executor.execute_nested(&self.graph, &self.keys())?;
        let axes: Vec<usize> = (0..self.ndim()).collect();
        let block = kernels::concatenate_nested(value, &axes)?;
        if block.shape() == shape.as_slice() {
            Ok(block.into_owned())
        } else {
            Err(TaskError::from(ShapeError::from_kind(ErrorKind::IncompatibleShape)).into())
        }
    }

    /// Execute a single-element array and return its element.
    ///
    /// # Errors
    /// Returns [`ExecuteError::NotScalar`] if the array does not have exactly one element, or an [`ExecuteError`] if execution fails.
    pub fn to_scalar(&self, executor: &impl Executor<T>) -> Result<T, ExecuteError> {
        if self.num_elements() != 1 {
            return Err(ExecuteError::NotScalar(self.shape().to_vec()));
        }
        self.to_ndarray(executor)?
            .into_iter()
            .next()
            .ok_or_else(|| ExecuteError::NotScalar(self.shape().to_vec()))
    }
}
