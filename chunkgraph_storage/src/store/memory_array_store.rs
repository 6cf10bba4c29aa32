//! A synchronous in-memory array store.

use chunkgraph_grid::{ArrayShape, ArraySubset, IncompatibleDimensionalityError};
use ndarray::{ArrayD, ArrayViewD, IxDyn, Slice};
use parking_lot::RwLock;

use crate::{
    Appendable, ArrayStorageTraits, ReadableArrayTraits, Resizable, StorageError,
    WritableArrayTraits,
};

/// A synchronous in-memory array store.
///
/// Elements outside of any written region hold the fill value.
#[derive(Debug)]
pub struct MemoryArrayStore<T> {
    data: RwLock<ArrayD<T>>,
    fill_value: T,
}

fn to_usize_shape(shape: &[u64]) -> Result<Vec<usize>, StorageError> {
    shape
        .iter()
        .map(|&s| {
            usize::try_from(s).map_err(|_| StorageError::Other(format!("shape {shape:?} exceeds usize")))
        })
        .collect()
}

fn shape_u64(shape: &[usize]) -> ArrayShape {
    shape.iter().map(|&s| s as u64).collect()
}

impl<T: Clone> MemoryArrayStore<T> {
    /// Create a new memory array store of `shape` with every element set to `fill_value`.
    ///
    /// # Errors
    /// Returns [`StorageError`] if `shape` cannot be allocated on this platform.
    pub fn new(shape: &[u64], fill_value: T) -> Result<Self, StorageError> {
        let shape = to_usize_shape(shape)?;
        Ok(Self {
            data: RwLock::new(ArrayD::from_elem(IxDyn(&shape), fill_value.clone())),
            fill_value,
        })
    }

    /// Create a new memory array store holding `data`.
    ///
    /// Elements revealed by a later resize are set to `fill_value`.
    #[must_use]
    pub fn from_ndarray(data: ArrayD<T>, fill_value: T) -> Self {
        Self {
            data: RwLock::new(data),
            fill_value,
        }
    }

    /// Return a copy of every stored element.
    #[must_use]
    pub fn to_ndarray(&self) -> ArrayD<T> {
        self.data.read().clone()
    }

    /// Return the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &T {
        &self.fill_value
    }

    fn check_subset(&self, subset: &ArraySubset, shape: &[usize]) -> Result<(), StorageError> {
        let shape = shape_u64(shape);
        if subset.dimensionality() != shape.len() {
            Err(IncompatibleDimensionalityError::new(subset.dimensionality(), shape.len()).into())
        } else if subset.inbounds_shape(&shape) {
            Ok(())
        } else {
            Err(StorageError::OutOfBounds(subset.clone(), shape))
        }
    }
}

fn subset_slices(subset: &ArraySubset) -> Vec<Slice> {
    subset
        .to_ranges()
        .into_iter()
        .map(|range| Slice::from(range.start as usize..range.end as usize))
        .collect()
}

impl<T: Clone + Send + Sync> ArrayStorageTraits for MemoryArrayStore<T> {
    fn shape(&self) -> ArrayShape {
        shape_u64(self.data.read().shape())
    }
}

impl<T: Clone + Send + Sync> ReadableArrayTraits<T> for MemoryArrayStore<T> {
    fn read_subset(&self, subset: &ArraySubset) -> Result<ArrayD<T>, StorageError> {
        let data = self.data.read();
        self.check_subset(subset, data.shape())?;
        let slices = subset_slices(subset);
        Ok(data
            .slice_each_axis(|axis| slices[axis.axis.index()])
            .to_owned())
    }
}

impl<T: Clone + Send + Sync> WritableArrayTraits<T> for MemoryArrayStore<T> {
    fn write_subset(
        &self,
        subset: &ArraySubset,
        elements: ArrayViewD<'_, T>,
    ) -> Result<(), StorageError> {
        if elements.shape() != subset.shape_usize().as_slice() {
            return Err(StorageError::IncompatibleShape {
                expected: subset.shape().to_vec(),
                got: shape_u64(elements.shape()),
            });
        }
        let mut data = self.data.write();
        self.check_subset(subset, data.shape())?;
        let slices = subset_slices(subset);
        data.slice_each_axis_mut(|axis| slices[axis.axis.index()])
            .assign(&elements);
        Ok(())
    }
}

impl<T: Clone + Send + Sync> Resizable for MemoryArrayStore<T> {
    fn resize(&self, shape: &[u64]) -> Result<(), StorageError> {
        let mut data = self.data.write();
        if shape.len() != data.ndim() {
            return Err(IncompatibleDimensionalityError::new(shape.len(), data.ndim()).into());
        }
        let shape = to_usize_shape(shape)?;
        let mut resized = ArrayD::from_elem(IxDyn(&shape), self.fill_value.clone());
        let retained: Vec<Slice> = std::iter::zip(&shape, data.shape())
            .map(|(&new, &old)| Slice::from(0..new.min(old)))
            .collect();
        resized
            .slice_each_axis_mut(|axis| retained[axis.axis.index()])
            .assign(&data.slice_each_axis(|axis| retained[axis.axis.index()]));
        *data = resized;
        Ok(())
    }
}

impl<T: Clone + Send + Sync> Appendable for MemoryArrayStore<T> {}
