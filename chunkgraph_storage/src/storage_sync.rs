use std::sync::Arc;

use auto_impl::auto_impl;
use chunkgraph_grid::{ArrayIndices, ArrayShape, ArraySubset, IncompatibleDimensionalityError};
use ndarray::{ArrayD, ArrayViewD};

use super::StorageError;

/// Array storage traits common to every capability.
#[auto_impl(&, Arc)]
pub trait ArrayStorageTraits: Send + Sync {
    /// Return the current shape of the stored array.
    fn shape(&self) -> ArrayShape;
}

/// Readable array storage traits.
#[auto_impl(&, Arc)]
pub trait ReadableArrayTraits<T>: ArrayStorageTraits {
    /// Read the elements in `subset`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `subset` is out of bounds or there is an underlying storage error.
    fn read_subset(&self, subset: &ArraySubset) -> Result<ArrayD<T>, StorageError>;
}

/// Writable array storage traits.
///
/// Callers guarantee that concurrent writes address disjoint subsets.
#[auto_impl(&, Arc)]
pub trait WritableArrayTraits<T>: ArrayStorageTraits {
    /// Write `elements` into `subset`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `subset` is out of bounds, the shape of `elements` does not match `subset`, or there is an underlying storage error.
    fn write_subset(
        &self,
        subset: &ArraySubset,
        elements: ArrayViewD<'_, T>,
    ) -> Result<(), StorageError>;
}

/// Resizable array storage traits.
#[auto_impl(&, Arc)]
pub trait Resizable: ArrayStorageTraits {
    /// Resize the stored array to `shape`.
    ///
    /// Elements within both the old and new shape are preserved.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the dimensionality changes or the store cannot be resized.
    fn resize(&self, shape: &[u64]) -> Result<(), StorageError>;
}

/// Appendable array storage traits.
///
/// The default implementation grows the array along axis 0 with [`Resizable::resize`].
pub trait Appendable: Resizable {
    /// Grow the stored array along axis 0 to receive elements of `shape`.
    ///
    /// Returns the offset at which the appended elements must be written.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `shape` does not match the trailing shape of the stored array, or the store cannot be resized.
    fn prepare_append(&self, shape: &[u64]) -> Result<ArrayIndices, StorageError> {
        let current = self.shape();
        if current.is_empty() || shape.len() != current.len() {
            return Err(IncompatibleDimensionalityError::new(shape.len(), current.len()).into());
        }
        if current[1..] != shape[1..] {
            return Err(StorageError::IncompatibleShape {
                expected: current[1..].to_vec(),
                got: shape[1..].to_vec(),
            });
        }
        let mut resized = current.clone();
        resized[0] += shape[0];
        self.resize(&resized)?;

        let mut offset = vec![0; current.len()];
        offset[0] = current[0];
        Ok(offset)
    }
}

impl<S: Appendable + ?Sized> Appendable for Arc<S> {
    fn prepare_append(&self, shape: &[u64]) -> Result<ArrayIndices, StorageError> {
        self.as_ref().prepare_append(shape)
    }
}

/// A supertrait of [`ReadableArrayTraits`] and [`WritableArrayTraits`].
pub trait ReadableWritableArrayTraits<T>: ReadableArrayTraits<T> + WritableArrayTraits<T> {
    /// Return a readable version of the store.
    fn readable(self: Arc<Self>) -> Arc<dyn ReadableArrayTraits<T>>;

    /// Return a writable version of the store.
    fn writable(self: Arc<Self>) -> Arc<dyn WritableArrayTraits<T>>;
}

impl<T, S> ReadableWritableArrayTraits<T> for S
where
    S: ReadableArrayTraits<T> + WritableArrayTraits<T> + 'static,
{
    fn readable(self: Arc<Self>) -> Arc<dyn ReadableArrayTraits<T>> {
        self
    }

    fn writable(self: Arc<Self>) -> Arc<dyn WritableArrayTraits<T>> {
        self
    }
}
