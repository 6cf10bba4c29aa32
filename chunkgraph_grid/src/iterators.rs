//! Block and element index iterators.
//!
//! [`Indices`] iterates over the multidimensional indices within an [`ArraySubset`](crate::ArraySubset) in row-major order (last dimension fastest).
//! Applied to the grid shape of a [`RegularBlockGrid`](crate::RegularBlockGrid), it enumerates every block coordinate of a chunked array.
//!
//! [`Indices`] supports [`iter()`](Indices::iter) and [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]).

mod indices_iterator;

pub use indices_iterator::{Indices, IndicesIntoIterator, IndicesIterator};
