//! The regular block grid.

use std::num::NonZeroU64;

use thiserror::Error;

use crate::iterators::Indices;
use crate::{ArrayShape, ArraySubset, BlockShape, BlockShapeTraits, IncompatibleDimensionalityError};

/// A regular block grid.
///
/// Every block has the nominal `block_shape`, except the final block along a dimension which is truncated if the array shape is not a multiple of the block shape.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegularBlockGrid {
    array_shape: ArrayShape,
    grid_shape: ArrayShape,
    block_shape: BlockShape,
}

/// A [`RegularBlockGrid`] creation error.
#[derive(Clone, Debug, Error)]
#[error("regular block shape: {_1:?} not compatible with array shape {_0:?}")]
pub struct BlockGridCreateError(ArrayShape, ArrayShape);

impl From<BlockGridCreateError> for IncompatibleDimensionalityError {
    fn from(value: BlockGridCreateError) -> Self {
        Self::new(value.1.len(), value.0.len())
    }
}

impl RegularBlockGrid {
    /// Create a new regular block grid with block shape `block_shape`.
    ///
    /// # Errors
    /// Returns a [`BlockGridCreateError`] if `block_shape` is not compatible with the `array_shape`.
    pub fn new(
        array_shape: ArrayShape,
        block_shape: BlockShape,
    ) -> Result<Self, BlockGridCreateError> {
        let Some(grid_shape) = block_shape.num_blocks(&array_shape) else {
            return Err(BlockGridCreateError(
                array_shape,
                block_shape.to_array_shape(),
            ));
        };
        Ok(Self {
            array_shape,
            grid_shape,
            block_shape,
        })
    }

    /// The dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.block_shape.len()
    }

    /// The array shape (i.e. number of elements).
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// The grid shape (i.e. number of blocks along each dimension).
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// The nominal block shape.
    #[must_use]
    pub fn block_shape(&self) -> &[NonZeroU64] {
        &self.block_shape
    }

    /// Return the [`ArraySubset`] of the block at `block_indices`.
    ///
    /// The subset of a trailing block is truncated to the array shape.
    /// Returns [`None`] if `block_indices` are out-of-bounds.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `block_indices` do not match the dimensionality of the grid.
    pub fn subset(
        &self,
        block_indices: &[u64],
    ) -> Result<Option<ArraySubset>, IncompatibleDimensionalityError> {
        if block_indices.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                block_indices.len(),
                self.dimensionality(),
            ));
        }
        if std::iter::zip(block_indices, &self.grid_shape).any(|(index, shape)| index >= shape) {
            return Ok(None);
        }
        let ranges = itertools::izip!(block_indices, &self.block_shape, &self.array_shape).map(
            |(&index, size, &bound)| {
                let origin = index * size.get();
                origin..std::cmp::min(origin + size.get(), bound)
            },
        );
        Ok(Some(ArraySubset::from(ranges)))
    }

    /// Return the number of blocks in the grid.
    #[must_use]
    pub fn num_blocks(&self) -> u64 {
        self.grid_shape.iter().product()
    }

    /// Return an iterator over the block indices of the grid in row-major order.
    #[must_use]
    pub fn iter_block_indices(&self) -> Indices {
        ArraySubset::new_with_shape(self.grid_shape.clone()).indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_shape_to_block_shape;

    #[test]
    fn block_grid_regular() {
        let grid =
            RegularBlockGrid::new(vec![10, 7], array_shape_to_block_shape(&[5, 5]).unwrap())
                .unwrap();
        assert_eq!(grid.dimensionality(), 2);
        assert_eq!(grid.grid_shape(), &[2, 2]);
        assert_eq!(grid.num_blocks(), 4);
        assert_eq!(
            grid.subset(&[1, 1]).unwrap(),
            Some(ArraySubset::new_with_ranges(&[5..10, 5..7]))
        );
        assert_eq!(grid.subset(&[2, 0]).unwrap(), None);
        assert!(grid.subset(&[0]).is_err());
        assert_eq!(
            grid.subset(&[0, 1]).unwrap(),
            Some(ArraySubset::new_with_ranges(&[0..5, 5..7]))
        );
        assert_eq!(grid.subset(&[1, 2]).unwrap(), None);
        assert_eq!(
            grid.iter_block_indices()
                .into_iter()
                .map(|i| i.to_vec())
                .collect::<Vec<_>>(),
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn block_grid_regular_invalid() {
        assert!(
            RegularBlockGrid::new(vec![10, 7], array_shape_to_block_shape(&[5]).unwrap()).is_err()
        );
    }

    #[test]
    fn block_grid_zero_dimensional() {
        let grid = RegularBlockGrid::new(vec![], vec![]).unwrap();
        assert_eq!(grid.num_blocks(), 1);
        assert_eq!(grid.subset(&[]).unwrap(), Some(ArraySubset::new_with_shape(vec![])));
    }
}
