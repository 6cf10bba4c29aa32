//! A storage adapter which records performance metrics.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chunkgraph_grid::{ArrayIndices, ArrayShape, ArraySubset};
use ndarray::{ArrayD, ArrayViewD};

use crate::{
    Appendable, ArrayStorageTraits, ReadableArrayTraits, Resizable, StorageError,
    WritableArrayTraits,
};

/// The performance metrics storage adapter. Accumulates metrics, such as elements read and written.
///
/// It is intended to aid in testing by allowing the application to validate that metrics (e.g., elements written, total read/write operations) match expected values for specific operations.
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// # use chunkgraph_storage::store::MemoryArrayStore;
/// # use chunkgraph_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
/// let store = Arc::new(MemoryArrayStore::new(&[4, 4], 0.0f64).unwrap());
/// let store = Arc::new(PerformanceMetricsStorageAdapter::new(store));
/// // do some store operations...
/// assert_eq!(store.elements_written(), 0);
/// assert_eq!(store.writes(), 0);
/// ```
#[derive(Debug)]
pub struct PerformanceMetricsStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    elements_read: AtomicUsize,
    elements_written: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    resizes: AtomicUsize,
}

impl<TStorage: ?Sized> PerformanceMetricsStorageAdapter<TStorage> {
    /// Create a new performance metrics storage adapter.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            elements_read: AtomicUsize::default(),
            elements_written: AtomicUsize::default(),
            reads: AtomicUsize::default(),
            writes: AtomicUsize::default(),
            resizes: AtomicUsize::default(),
        }
    }

    /// Reset the performance metrics.
    pub fn reset(&self) {
        self.elements_read.store(0, Ordering::Relaxed);
        self.elements_written.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.resizes.store(0, Ordering::Relaxed);
    }

    /// Returns the number of elements read.
    pub fn elements_read(&self) -> usize {
        self.elements_read.load(Ordering::Relaxed)
    }

    /// Returns the number of elements written.
    pub fn elements_written(&self) -> usize {
        self.elements_written.load(Ordering::Relaxed)
    }

    /// Returns the number of read requests.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of write requests.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of resize requests, including those made to prepare an append.
    pub fn resizes(&self) -> usize {
        self.resizes.load(Ordering::Relaxed)
    }
}

impl<TStorage: ?Sized + ArrayStorageTraits> ArrayStorageTraits
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn shape(&self) -> ArrayShape {
        self.storage.shape()
    }
}

impl<T, TStorage: ?Sized + ReadableArrayTraits<T>> ReadableArrayTraits<T>
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn read_subset(&self, subset: &ArraySubset) -> Result<ArrayD<T>, StorageError> {
        let elements = self.storage.read_subset(subset);
        let elements_read = elements.as_ref().map_or(0, ArrayD::len);
        self.elements_read.fetch_add(elements_read, Ordering::Relaxed);
        self.reads.fetch_add(1, Ordering::Relaxed);
        elements
    }
}

impl<T, TStorage: ?Sized + WritableArrayTraits<T>> WritableArrayTraits<T>
    for PerformanceMetricsStorageAdapter<TStorage>
{
    fn write_subset(
        &self,
        subset: &ArraySubset,
        elements: ArrayViewD<'_, T>,
    ) -> Result<(), StorageError> {
        self.elements_written
            .fetch_add(elements.len(), Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.storage.write_subset(subset, elements)
    }
}

impl<TStorage: ?Sized + Resizable> Resizable for PerformanceMetricsStorageAdapter<TStorage> {
    fn resize(&self, shape: &[u64]) -> Result<(), StorageError> {
        self.resizes.fetch_add(1, Ordering::Relaxed);
        self.storage.resize(shape)
    }
}

impl<TStorage: ?Sized + Appendable> Appendable for PerformanceMetricsStorageAdapter<TStorage> {
    fn prepare_append(&self, shape: &[u64]) -> Result<ArrayIndices, StorageError> {
        self.resizes.fetch_add(1, Ordering::Relaxed);
        self.storage.prepare_append(shape)
    }
}
