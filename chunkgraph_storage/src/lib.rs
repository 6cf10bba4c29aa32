//! The array storage API for the [`chunkgraph`](https://docs.rs/chunkgraph/latest/chunkgraph/index.html) crate.
//!
//! A chunked array graph reads its leaf blocks from, and writes its results to, external array storage.
//! This crate defines that storage as a set of capabilities:
//!  - [`ReadableArrayTraits`]: read an [`ArraySubset`] of elements,
//!  - [`WritableArrayTraits`]: write a block of elements into an [`ArraySubset`],
//!  - [`Resizable`]: change the array shape,
//!  - [`Appendable`]: grow the array along its first axis to receive more data.
//!
//! A backend adapter implements the capabilities it supports.
//! This crate includes an in-memory store implementing all of them, see [`store::MemoryArrayStore`].
//!
//! ### Disjoint writes
//! Writers of a [`WritableArrayTraits`] store never address overlapping index ranges.
//! Stores may therefore accept concurrent writes without any locking discipline imposed by the caller.
//!
//! ## Licence
//! `chunkgraph_storage` is licensed under either of
//! - the Apache License, Version 2.0 [LICENSE-APACHE](https://docs.rs/crate/chunkgraph_storage/latest/source/LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license [LICENSE-MIT](https://docs.rs/crate/chunkgraph_storage/latest/source/LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.

pub mod storage_adapter;
mod storage_sync;
pub mod store;

use std::sync::Arc;

use chunkgraph_grid::{ArrayShape, ArraySubset, ArraySubsetError, IncompatibleDimensionalityError};
use thiserror::Error;

pub use self::storage_sync::{
    Appendable, ArrayStorageTraits, ReadableArrayTraits, ReadableWritableArrayTraits, Resizable,
    WritableArrayTraits,
};

/// [`Arc`] wrapped readable array storage.
pub type ReadableArray<T> = Arc<dyn ReadableArrayTraits<T>>;

/// [`Arc`] wrapped writable array storage.
pub type WritableArray<T> = Arc<dyn WritableArrayTraits<T>>;

/// [`Arc`] wrapped readable and writable array storage.
pub type ReadableWritableArray<T> = Arc<dyn ReadableWritableArrayTraits<T>>;

/// A storage error.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// The subset is not within the bounds of the stored array.
    #[error("array subset {_0} is out of bounds of array shape {_1:?}")]
    OutOfBounds(ArraySubset, ArrayShape),
    /// The shape of the elements does not match the shape of the subset.
    #[error("got elements with shape {got:?}, expected {expected:?}")]
    IncompatibleShape {
        /// The shape of the subset.
        expected: ArrayShape,
        /// The shape of the elements.
        got: ArrayShape,
    },
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// The requested method is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
