//! The block grid API for the [`chunkgraph`](https://docs.rs/chunkgraph/latest/chunkgraph/index.html) crate.
//!
//! A chunked array is partitioned into a regular grid of rectangular blocks.
//! This crate describes that partitioning:
//!  - [`ArraySubset`]: a rectangular region of an array or block,
//!  - [`RegularBlockGrid`]: the block grid implied by an array shape and a nominal block shape,
//!  - [`iterators`]: row-major (C-contiguous) iteration over block or element indices.
//!
//! ## Licence
//! `chunkgraph_grid` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](https://docs.rs/crate/chunkgraph_grid/latest/source/LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](https://docs.rs/crate/chunkgraph_grid/latest/source/LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

mod array_subset;
pub use array_subset::{ArraySubset, ArraySubsetError};

mod block_shape_traits;
pub use block_shape_traits::BlockShapeTraits;

mod regular;
pub use regular::{BlockGridCreateError, RegularBlockGrid};

pub mod iterators;

use std::num::NonZeroU64;

/// The shape of an array (i.e. the number of elements along each dimension).
pub type ArrayShape = Vec<u64>;

/// The nominal shape of a block. Every dimension is non-zero.
pub type BlockShape = Vec<NonZeroU64>;

/// An ND index to an element or block.
pub type ArrayIndices = Vec<u64>;

/// An ND index to an element or block.
/// Uses [`TinyVec`](tinyvec::TinyVec) for stack allocation up to 4 dimensions.
pub type ArrayIndicesTinyVec = tinyvec::TinyVec<[u64; 4]>;

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, thiserror::Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// Convert an array shape to a block shape.
///
/// Returns [`None`] if any dimension is zero.
#[must_use]
pub fn array_shape_to_block_shape(shape: &[u64]) -> Option<BlockShape> {
    shape.iter().map(|&s| NonZeroU64::new(s)).collect()
}

/// Unravel a linearised index to ND indices.
///
/// Returns [`None`] if `index` is beyond the number of elements in `shape`.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> Option<ArrayIndicesTinyVec> {
    let total_size: u64 = shape
        .iter()
        .try_fold(1u64, |acc, &dim| acc.checked_mul(dim))?;
    if index >= total_size {
        return None;
    }

    let mut indices = ArrayIndicesTinyVec::with_capacity(shape.len());
    indices.resize(shape.len(), 0);
    for (i, &s) in shape.iter().enumerate().rev() {
        indices[i] = index % s;
        index /= s;
    }
    Some(indices)
}
