//! Array subsets.
//!
//! An [`ArraySubset`] represents a rectangular region of an array or block.

use std::fmt::{Debug, Display};
use std::ops::Range;

use itertools::izip;
use thiserror::Error;

use crate::iterators::Indices;
use crate::{ArrayIndices, ArrayShape};

/// An array subset error.
#[derive(Clone, Debug, Error)]
#[allow(missing_docs)]
pub enum ArraySubsetError {
    /// Incompatible dimensionality.
    #[error("incompatible dimensionality {got}, expected {expected}")]
    IncompatibleDimensionality { got: usize, expected: usize },
    /// Incompatible start and shape.
    #[error("incompatible start {start:?} with shape {shape:?}")]
    IncompatibleStartShape {
        start: ArrayIndices,
        shape: ArrayShape,
    },
    /// Incompatible offset.
    #[error("incompatible offset {offset:?} for region with start {start:?}")]
    IncompatibleOffset { start: Vec<u64>, offset: Vec<u64> },
}

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ArraySubset {
    /// The start of the array subset.
    pub(crate) start: ArrayIndices,
    /// The shape of the array subset.
    pub(crate) shape: ArrayShape,
}

impl Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_ranges().fmt(f)
    }
}

impl<T: IntoIterator<Item = Range<u64>>> From<T> for ArraySubset {
    fn from(ranges: T) -> Self {
        let (start, shape) = ranges
            .into_iter()
            .map(|range| (range.start, range.end.saturating_sub(range.start)))
            .unzip();
        Self { start, shape }
    }
}

impl ArraySubset {
    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        Self::from(ranges.iter().cloned())
    }

    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the length of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, ArraySubsetError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(ArraySubsetError::IncompatibleStartShape { start, shape })
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the shape of the array subset.
    ///
    /// # Panics
    /// Panics if a dimension exceeds [`usize::MAX`].
    #[must_use]
    pub fn shape_usize(&self) -> Vec<usize> {
        self.shape
            .iter()
            .map(|d| usize::try_from(*d).unwrap())
            .collect()
    }

    /// Converts to ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Returns if the array subset is empty (i.e. has a zero element in its shape).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a usize.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if the region is within the bounds of an array with the given shape.
    #[must_use]
    pub fn inbounds_shape(&self, array_shape: &[u64]) -> bool {
        array_shape.len() == self.dimensionality()
            && izip!(&self.start, &self.shape, array_shape)
                .all(|(&start, &size, &bound)| start + size <= bound)
    }

    /// Return the region translated by `offset`.
    ///
    /// Creates an array subset starting at `self.start()` + `offset`.
    ///
    /// # Errors
    /// Returns [`ArraySubsetError`] if the length of `offset` does not match the dimensionality.
    pub fn offset_by(&self, offset: &[u64]) -> Result<ArraySubset, ArraySubsetError> {
        if offset.len() == self.dimensionality() {
            Ok(ArraySubset {
                start: std::iter::zip(&self.start, offset)
                    .map(|(&start, &offset)| start + offset)
                    .collect(),
                shape: self.shape.clone(),
            })
        } else {
            Err(ArraySubsetError::IncompatibleOffset {
                start: self.start.clone(),
                offset: offset.to_vec(),
            })
        }
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }
}
