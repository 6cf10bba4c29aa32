//! Tests for writing chunked arrays into array storage.

use std::sync::Arc;

use chunkgraph::array::ChunkedArray;
use chunkgraph::execute::{ExecuteError, SequentialExecutor, ThreadedExecutor};
use chunkgraph::graph::Identifier;
use chunkgraph::kernels;
use chunkgraph::lowering;
use chunkgraph::sink::{self, SinkError};
use chunkgraph::storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
use chunkgraph::storage::store::MemoryArrayStore;
use chunkgraph::storage::{ArrayStorageTraits, ReadableArray};
use ndarray::{ArrayD, Axis, concatenate};

fn data(rows: usize, cols: usize) -> ArrayD<f32> {
    ArrayD::from_shape_fn(vec![rows, cols], |i| (i[0] * cols + i[1]) as f32)
}

#[test]
fn sink_store_writes_each_block_once() {
    let source: ReadableArray<f32> = Arc::new(MemoryArrayStore::from_ndarray(data(9, 8), 0.0));
    let x = ChunkedArray::from_source(Identifier::new("source"), source, &[4, 3]).unwrap();
    let y = lowering::elemwise(
        &kernels::map("double", |v: &f32| v * 2.0),
        Identifier::new("double_1"),
        &[&x],
    )
    .unwrap();

    let store = Arc::new(MemoryArrayStore::new(&[9, 8], f32::NAN).unwrap());
    let sink = Arc::new(PerformanceMetricsStorageAdapter::new(store.clone()));
    sink::store(&y, sink.clone(), &ThreadedExecutor::new()).unwrap();

    assert_eq!(sink.writes(), 9);
    assert_eq!(sink.elements_written(), 72);
    assert_eq!(store.to_ndarray(), data(9, 8) * 2.0);
}

#[test]
fn sink_store_tasks_at_offset() {
    let x = ChunkedArray::from_ndarray(data(2, 3), &[1, 3]).unwrap();
    let store = Arc::new(MemoryArrayStore::new(&[4, 5], -1.0).unwrap());
    let tasks = sink::store_tasks(&x, store.clone(), &[1, 2]).unwrap();
    assert_eq!(tasks.keys().len(), 2);
    tasks.execute(&SequentialExecutor::new()).unwrap();

    let mut expected = ArrayD::from_elem(vec![4, 5], -1.0);
    expected
        .slice_mut(ndarray::s![1..3, 2..5])
        .assign(&data(2, 3));
    assert_eq!(store.to_ndarray(), expected);

    // the second block would write row 4 of a store with 4 rows
    let tasks = sink::store_tasks(&x, store.clone(), &[3, 0]).unwrap();
    match tasks.execute(&SequentialExecutor::new()) {
        Err(ExecuteError::Task { key, .. }) => assert_eq!(key, tasks.keys()[1]),
        result => panic!("unexpected result {result:?}"),
    }
    assert!(matches!(
        sink::store_tasks(&x, store, &[0]),
        Err(SinkError::IncompatibleDimensionality(_))
    ));
}

#[test]
fn sink_append_grows_along_first_axis() {
    let store = Arc::new(MemoryArrayStore::new(&[0, 4], 0.0).unwrap());
    let sink = Arc::new(PerformanceMetricsStorageAdapter::new(store.clone()));
    let executor = ThreadedExecutor::new();
    let parts = [data(3, 4), data(5, 4) + 100.0];
    for part in &parts {
        let x = ChunkedArray::from_ndarray(part.clone(), &[2, 2]).unwrap();
        sink::append(&x, &sink, &executor).unwrap();
    }
    assert_eq!(sink.resizes(), 2);
    assert_eq!(store.shape(), vec![8, 4]);
    assert_eq!(
        store.to_ndarray(),
        concatenate(Axis(0), &[parts[0].view(), parts[1].view()]).unwrap()
    );
}

#[test]
fn sink_append_failing_block_keeps_grown_sink() {
    let store = Arc::new(MemoryArrayStore::new(&[3, 4], 1.0).unwrap());
    let sink = Arc::new(PerformanceMetricsStorageAdapter::new(store.clone()));

    // the maximum over an empty axis fails when executed
    let x = ChunkedArray::from_ndarray(ArrayD::<f32>::zeros(vec![2, 0, 4]), &[1, 1, 4]).unwrap();
    let y = lowering::reduction(
        &kernels::max(),
        Identifier::new("max-chunk_1"),
        Identifier::new("max-aggregate_1"),
        &x,
        &[1],
    )
    .unwrap();
    assert_eq!(y.shape(), &[2, 4]);

    assert!(matches!(
        sink::append(&y, &sink, &SequentialExecutor::new()),
        Err(SinkError::ExecuteError(ExecuteError::Task { .. }))
    ));
    assert_eq!(sink.resizes(), 1);
    assert_eq!(sink.writes(), 0);
    assert_eq!(store.shape(), vec![5, 4]);
    assert_eq!(store.to_ndarray(), ArrayD::from_elem(vec![5, 4], 1.0));
}
