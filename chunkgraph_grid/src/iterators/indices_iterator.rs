use std::iter::FusedIterator;

use crate::{unravel_index, ArrayIndicesTinyVec, ArraySubset};

/// An iterator over the indices in an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a grid of 2x2 blocks with block indices
/// ```text
/// (0, 0)  (0, 1)
/// (1, 0)  (1, 1)
/// ```
/// An iterator over the whole grid produces `[(0, 0), (0, 1), (1, 0), (1, 1)]`.
/// A zero-dimensional subset yields a single empty index.
#[derive(Clone)]
pub struct Indices {
    pub(crate) subset: ArraySubset,
    pub(crate) range: std::ops::Range<usize>,
}

impl Indices {
    /// Create a new indices struct.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements_usize();
        Self {
            subset,
            range: 0..length,
        }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndicesTinyVec;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator {
            subset: &self.subset,
            range: self.range.clone(),
        }
    }
}

impl IntoIterator for Indices {
    type Item = ArrayIndicesTinyVec;
    type IntoIter = IndicesIntoIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIntoIterator {
            subset: self.subset,
            range: self.range,
        }
    }
}

/// An iterator over [`Indices`].
///
/// See [`Indices`].
#[derive(Clone)]
pub struct IndicesIterator<'a> {
    pub(crate) subset: &'a ArraySubset,
    pub(crate) range: std::ops::Range<usize>,
}

/// An iterator over [`Indices`].
///
/// See [`Indices`].
#[derive(Clone)]
pub struct IndicesIntoIterator {
    pub(crate) subset: ArraySubset,
    pub(crate) range: std::ops::Range<usize>,
}

/// Unravel `index` within `subset` and add the subset start.
#[inline]
fn subset_indices(subset: &ArraySubset, index: usize) -> Option<ArrayIndicesTinyVec> {
    let mut indices = unravel_index(index as u64, subset.shape())?;
    std::iter::zip(indices.iter_mut(), subset.start()).for_each(|(idx, st)| *idx += st);
    Some(indices)
}

macro_rules! impl_indices_iterator {
    ($iterator_type:ty) => {
        impl Iterator for $iterator_type {
            type Item = ArrayIndicesTinyVec;

            fn next(&mut self) -> Option<Self::Item> {
                if self.range.start >= self.range.end {
                    return None;
                }
                let index = self.range.start;
                self.range.start += 1;
                subset_indices(&self.subset, index)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                let length = self.range.end.saturating_sub(self.range.start);
                (length, Some(length))
            }
        }

        impl DoubleEndedIterator for $iterator_type {
            fn next_back(&mut self) -> Option<Self::Item> {
                if self.range.end > self.range.start {
                    self.range.end -= 1;
                    subset_indices(&self.subset, self.range.end)
                } else {
                    None
                }
            }
        }

        impl ExactSizeIterator for $iterator_type {}

        impl FusedIterator for $iterator_type {}
    };
}

impl_indices_iterator!(IndicesIterator<'_>);
impl_indices_iterator!(IndicesIntoIterator);
