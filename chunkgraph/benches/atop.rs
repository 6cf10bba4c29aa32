//! Benchmark graph construction and execution over many blocks.
#![allow(missing_docs)]

use chunkgraph::array::ChunkedArray;
use chunkgraph::execute::{SequentialExecutor, ThreadedExecutor};
use chunkgraph::graph::Identifier;
use chunkgraph::{kernels, lowering};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ndarray::ArrayD;

fn input(size: u64) -> ChunkedArray<f64> {
    let size = usize::try_from(size).unwrap();
    ChunkedArray::from_ndarray(ArrayD::from_elem(vec![size, size], 1.0), &[8, 8]).unwrap()
}

fn elemwise_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("elemwise_build");
    for size in [64u64, 256u64, 1024u64].iter() {
        let x = input(*size);
        group.throughput(Throughput::Elements(x.graph().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &x, |b, x| {
            b.iter(|| {
                lowering::elemwise(&kernels::add(), Identifier::new("add"), &[x, x]).unwrap()
            });
        });
    }
    group.finish();
}

fn reduction_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduction_build");
    for size in [64u64, 256u64, 1024u64].iter() {
        let x = input(*size);
        group.throughput(Throughput::Elements(x.graph().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &x, |b, x| {
            b.iter(|| {
                lowering::reduction(
                    &kernels::sum(),
                    Identifier::new("sum-chunk"),
                    Identifier::new("sum-aggregate"),
                    x,
                    &[0],
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn reduction_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduction_execute");
    for size in [64u64, 256u64].iter() {
        let x = input(*size);
        let y = lowering::reduction(
            &kernels::sum(),
            Identifier::new("sum-chunk"),
            Identifier::new("sum-aggregate"),
            &x,
            &[0],
        )
        .unwrap();
        group.throughput(Throughput::Elements(size * size));
        group.bench_with_input(BenchmarkId::new("sequential", size), &y, |b, y| {
            b.iter(|| y.to_ndarray(&SequentialExecutor::new()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("threaded", size), &y, |b, y| {
            b.iter(|| y.to_ndarray(&ThreadedExecutor::new()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    elemwise_build,
    reduction_build,
    reduction_execute
);
criterion_main!(benches);
