#![allow(missing_docs)]

use std::sync::Arc;

use chunkgraph_grid::ArraySubset;
use chunkgraph_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
use chunkgraph_storage::store::MemoryArrayStore;
use chunkgraph_storage::{
    Appendable, ReadableArrayTraits, ReadableWritableArray, WritableArrayTraits,
};
use ndarray::{array, ArrayD};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

#[test]
fn performance_metrics() {
    let store = Arc::new(MemoryArrayStore::new(&[4, 6], 0i64).unwrap());
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(store));

    store
        .write_subset(
            &ArraySubset::new_with_ranges(&[0..2, 0..3]),
            ArrayD::from_elem(vec![2, 3], 1).view(),
        )
        .unwrap();
    assert_eq!(store.writes(), 1);
    assert_eq!(store.elements_written(), 6);

    let elements = store
        .read_subset(&ArraySubset::new_with_ranges(&[0..4, 0..6]))
        .unwrap();
    assert_eq!(elements.sum(), 6);
    assert_eq!(store.reads(), 1);
    assert_eq!(store.elements_read(), 24);

    store.prepare_append(&[1, 6]).unwrap();
    assert_eq!(store.resizes(), 1);

    store.reset();
    assert_eq!(store.reads(), 0);
    assert_eq!(store.writes(), 0);
    assert_eq!(store.elements_written(), 0);
}

#[test]
fn disjoint_concurrent_writes() {
    let store: ReadableWritableArray<u32> = Arc::new(MemoryArrayStore::new(&[8, 8], 0).unwrap());
    (0..4u64).into_par_iter().for_each(|i| {
        let subset = ArraySubset::new_with_ranges(&[i * 2..i * 2 + 2, 0..8]);
        let value = u32::try_from(i).unwrap() + 1;
        store
            .write_subset(&subset, ArrayD::from_elem(vec![2, 8], value).view())
            .unwrap();
    });
    let elements = store
        .read_subset(&ArraySubset::new_with_ranges(&[0..8, 0..1]))
        .unwrap();
    assert_eq!(
        elements,
        array![[1], [1], [2], [2], [3], [3], [4], [4]].into_dyn()
    );
}

#[test]
fn appendable_offsets() {
    let store = MemoryArrayStore::new(&[0, 3], 0.0f32).unwrap();
    let first = store.prepare_append(&[2, 3]).unwrap();
    store
        .write_subset(
            &ArraySubset::new_with_start_shape(first.clone(), vec![2, 3]).unwrap(),
            ArrayD::from_elem(vec![2, 3], 1.0).view(),
        )
        .unwrap();
    let second = store.prepare_append(&[1, 3]).unwrap();
    assert_eq!(first, vec![0, 0]);
    assert_eq!(second, vec![2, 0]);
    store
        .write_subset(
            &ArraySubset::new_with_start_shape(second, vec![1, 3]).unwrap(),
            ArrayD::from_elem(vec![1, 3], 2.0).view(),
        )
        .unwrap();
    assert_eq!(
        store.to_ndarray(),
        array![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]].into_dyn()
    );
}
