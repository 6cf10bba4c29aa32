//! Chunked arrays.
//!
//! A [`ChunkedArray`] is a lazily computed array partitioned into a regular grid of blocks.
//! It is defined by
//!  - an [`Identifier`], shared by the keys of all of its blocks,
//!  - a task [`Graph`] with one task per block (and the tasks those depend on),
//!  - the array shape, and
//!  - the nominal block shape.
//!
//! The final block along a dimension is truncated if the shape is not a multiple of the block shape.
//!
//! Chunked arrays are immutable.
//! Operations such as [`atop`](crate::atop::atop) and the [`lowering`](crate::lowering) rules create new arrays whose graphs are the union of their input graphs and the new tasks.
//!
//! Existing data can be wrapped as a chunked array with [`ChunkedArray::from_ndarray`] or [`ChunkedArray::from_source`].

mod array_errors;
mod array_ndarray;

use std::{num::NonZeroU64, sync::Arc};

use chunkgraph_grid::{
    ArrayIndices, ArrayShape, ArraySubset, BlockShapeTraits, IncompatibleDimensionalityError,
    RegularBlockGrid, array_shape_to_block_shape,
};

pub use array_errors::ChunkedArrayCreateError;

use crate::{
    config::global_config,
    execute::{ExecuteError, Executor},
    graph::{Block, Graph, Identifier, Key, NestedKeys},
};

/// A chunked array.
///
/// Cloning a chunked array is cheap, the graph is shared.
#[derive(Clone)]
pub struct ChunkedArray<T> {
    identifier: Identifier,
    graph: Arc<Graph<T>>,
    grid: RegularBlockGrid,
}

impl<T> std::fmt::Debug for ChunkedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedArray")
            .field("identifier", &self.identifier)
            .field("shape", &self.shape())
            .field("blockshape", &self.blockshape())
            .field("tasks", &self.graph.len())
            .finish()
    }
}

impl<T> ChunkedArray<T> {
    /// Create a new chunked array.
    ///
    /// If [`validate_graphs`](crate::config::Config::validate_graphs) is enabled, the graph must have a task for every block of the array.
    ///
    /// # Errors
    /// Returns a [`ChunkedArrayCreateError`] if
    ///  - `blockshape` does not have the dimensionality of `shape`,
    ///  - `blockshape` contains zero, or
    ///  - the graph is validated and has no task for a block.
    pub fn new(
        identifier: Identifier,
        graph: Graph<T>,
        shape: ArrayShape,
        blockshape: &[u64],
    ) -> Result<Self, ChunkedArrayCreateError> {
        let grid = Self::regular_grid(shape, blockshape)?;
        let array = Self::from_parts(identifier, Arc::new(graph), grid);
        if global_config().validate_graphs() {
            array.validate()?;
        }
        Ok(array)
    }

    pub(crate) fn regular_grid(
        shape: ArrayShape,
        blockshape: &[u64],
    ) -> Result<RegularBlockGrid, ChunkedArrayCreateError> {
        if shape.len() != blockshape.len() {
            return Err(IncompatibleDimensionalityError::new(blockshape.len(), shape.len()).into());
        }
        let blockshape = array_shape_to_block_shape(blockshape)
            .ok_or_else(|| ChunkedArrayCreateError::InvalidBlockShape(blockshape.to_vec()))?;
        Ok(RegularBlockGrid::new(shape, blockshape).map_err(IncompatibleDimensionalityError::from)?)
    }

    pub(crate) fn from_parts(
        identifier: Identifier,
        graph: Arc<Graph<T>>,
        grid: RegularBlockGrid,
    ) -> Self {
        Self {
            identifier,
            graph,
            grid,
        }
    }

    fn validate(&self) -> Result<(), ChunkedArrayCreateError> {
        match self.block_keys().find(|key| !self.graph.contains_key(key)) {
            Some(key) => Err(ChunkedArrayCreateError::MissingBlock(key)),
            None => Ok(()),
        }
    }

    /// Return the identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Return the task graph.
    #[must_use]
    pub fn graph(&self) -> &Graph<T> {
        &self.graph
    }

    /// Return the block grid.
    #[must_use]
    pub fn block_grid(&self) -> &RegularBlockGrid {
        &self.grid
    }

    /// Return the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.grid.array_shape()
    }

    /// Return the nominal block shape.
    #[must_use]
    pub fn blockshape(&self) -> &[NonZeroU64] {
        self.grid.block_shape()
    }

    /// Return the number of blocks along each dimension, `ceil(shape / blockshape)`.
    #[must_use]
    pub fn numblocks(&self) -> &[u64] {
        self.grid.grid_shape()
    }

    /// Return the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.grid.dimensionality()
    }

    /// Return the number of elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape().iter().product()
    }

    /// Return the key of the block at `coords`.
    ///
    /// The coordinates are not checked against the block grid.
    #[must_use]
    pub fn key(&self, coords: ArrayIndices) -> Key {
        Key::new(self.identifier.clone(), coords)
    }

    /// Return an iterator over the keys of every block in row-major order.
    pub fn block_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.grid
            .iter_block_indices()
            .into_iter()
            .map(|coords| self.key(coords.to_vec()))
    }

    /// Return the keys of every block, nested to mirror the block grid.
    ///
    /// An n-dimensional array returns n levels of lists, outermost dimension first, whose innermost lists hold keys.
    /// A zero-dimensional array returns its single key.
    ///
    /// For example, an array with shape `[10, 10]` and block shape `[5, 5]` returns
    /// ```text
    /// [[('x', 0, 0), ('x', 0, 1)],
    ///  [('x', 1, 0), ('x', 1, 1)]]
    /// ```
    #[must_use]
    pub fn keys(&self) -> NestedKeys {
        if self.ndim() == 0 {
            NestedKeys::Key(self.key(vec![]))
        } else {
            self.keys_from(&mut Vec::with_capacity(self.ndim()))
        }
    }

    fn keys_from(&self, prefix: &mut ArrayIndices) -> NestedKeys {
        let dimension = prefix.len();
        let mut list = Vec::new();
        for i in 0..self.numblocks()[dimension] {
            prefix.push(i);
            if dimension + 1 == self.ndim() {
                list.push(NestedKeys::Key(self.key(prefix.clone())));
            } else {
                list.push(self.keys_from(prefix));
            }
            prefix.pop();
        }
        NestedKeys::List(list)
    }

    /// Return the subset of the array covered by the block at `coords`.
    ///
    /// Returns [`None`] if `coords` are outside the block grid.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `coords` do not match the dimensionality of the array.
    pub fn block_subset(
        &self,
        coords: &[u64],
    ) -> Result<Option<ArraySubset>, IncompatibleDimensionalityError> {
        self.grid.subset(coords)
    }

    /// Return the number of elements in a nominal block.
    #[must_use]
    pub fn block_num_elements(&self) -> u64 {
        self.blockshape().num_elements_u64()
    }
}

impl<T: Clone> ChunkedArray<T> {
    /// Evaluate the block at `coords` and the tasks it depends on.
    ///
    /// This is intended for probing a single block, not bulk computation.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] if the block cannot be computed or its task does not return a block.
    pub fn fetch_block(
        &self,
        executor: &impl Executor<T>,
        coords: &[u64],
    ) -> Result<Block<T>, ExecuteError> {
        let key = self.key(coords.to_vec());
        Ok(executor.execute(&self.graph, &key)?.into_block()?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serial_test::serial;

    use super::*;
    use crate::config::global_config_mut;
    use crate::graph::{Task, TaskFn, Value};

    fn leaf_graph(identifier: &Identifier, coords: &[Vec<u64>]) -> Graph<f32> {
        let func: TaskFn<f32> = Arc::new(|_| Ok(Value::Empty));
        coords
            .iter()
            .map(|c| {
                (
                    Key::new(identifier.clone(), c.clone()),
                    Task::new("leaf", func.clone(), vec![]),
                )
            })
            .collect()
    }

    #[test]
    fn chunked_array_numblocks_keys() {
        let x = Identifier::new("x");
        let graph = leaf_graph(&x, &[vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        let array = ChunkedArray::new(x.clone(), graph, vec![10, 10], &[5, 5]).unwrap();
        assert_eq!(array.numblocks(), &[2, 2]);
        assert_eq!(array.ndim(), 2);
        assert_eq!(
            array.keys(),
            NestedKeys::List(vec![
                NestedKeys::List(vec![
                    array.key(vec![0, 0]).into(),
                    array.key(vec![0, 1]).into()
                ]),
                NestedKeys::List(vec![
                    array.key(vec![1, 0]).into(),
                    array.key(vec![1, 1]).into()
                ]),
            ])
        );
        assert_eq!(
            array.keys().to_string(),
            "[[('x', 0, 0), ('x', 0, 1)], [('x', 1, 0), ('x', 1, 1)]]"
        );
    }

    #[test]
    fn chunked_array_numblocks_truncated() {
        let x = Identifier::new("x");
        let coords: Vec<Vec<u64>> = (0..3).map(|i| vec![i]).collect();
        let array = ChunkedArray::new(x.clone(), leaf_graph(&x, &coords), vec![11], &[5]).unwrap();
        assert_eq!(array.numblocks(), &[3]);
        assert_eq!(
            array.block_subset(&[2]).unwrap(),
            Some(ArraySubset::new_with_ranges(&[10..11]))
        );
    }

    #[test]
    fn chunked_array_zero_dimensional() {
        let x = Identifier::new("x");
        let array = ChunkedArray::new(x.clone(), leaf_graph(&x, &[vec![]]), vec![], &[]).unwrap();
        assert_eq!(array.numblocks(), &[] as &[u64]);
        assert_eq!(array.keys(), NestedKeys::Key(Key::new(x, vec![])));
    }

    #[test]
    #[serial]
    fn chunked_array_create_errors() {
        let x = Identifier::new("x");
        assert!(matches!(
            ChunkedArray::new(x.clone(), Graph::<f32>::new(), vec![10, 10], &[5]),
            Err(ChunkedArrayCreateError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            ChunkedArray::new(x.clone(), Graph::<f32>::new(), vec![10], &[0]),
            Err(ChunkedArrayCreateError::InvalidBlockShape(_))
        ));
        let graph = leaf_graph(&x, &[vec![0]]);
        assert!(matches!(
            ChunkedArray::new(x.clone(), graph.clone(), vec![10], &[5]),
            Err(ChunkedArrayCreateError::MissingBlock(_))
        ));

        global_config_mut().set_validate_graphs(false);
        let array = ChunkedArray::new(x, graph, vec![10], &[5]);
        global_config_mut().set_validate_graphs(true);
        assert!(array.is_ok());
    }
}
