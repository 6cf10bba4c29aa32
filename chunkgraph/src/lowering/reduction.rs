use std::sync::Arc;

use itertools::Itertools;

use super::{
    LowerError, empty_block, from_block_shapes, single_argument, single_block, validate_axes,
};
use crate::{
    Element,
    array::ChunkedArray,
    atop::{Atop, atop},
    config::global_config,
    graph::{Identifier, TaskFn},
    kernels::{ReductionKernels, concatenate_nested},
};

/// Reduce `input` over `axes` in two phases.
///
/// 1. The chunk phase applies the chunk kernel to every block, keeping the reduced axes with length 1.
///    The chunk phase array has the identifier `chunk_identifier` and one block per input block.
/// 2. The aggregate phase gathers every chunk phase block along the reduced axes for each output block, concatenates them in ascending block order, and applies the aggregate kernel.
///
/// The peak memory of an aggregate task is bounded by the size of a chunk phase block times the number of blocks along the reduced axes.
/// A warning is logged if that number exceeds the [reduction gather warning threshold](crate::config::Config#reduction-gather-warning-threshold).
///
/// Reducing over every axis produces a zero-dimensional array.
/// If a reduced axis has length zero, there is no chunk phase and each output block is the aggregate kernel applied to an empty block.
///
/// # Errors
/// Returns [`LowerError::InvalidAxes`] if `axes` are out of range or repeated.
pub fn reduction<T: Element>(
    kernels: &ReductionKernels<T>,
    chunk_identifier: Identifier,
    identifier: Identifier,
    input: &ChunkedArray<T>,
    axes: &[usize],
) -> Result<ChunkedArray<T>, LowerError> {
    validate_axes(axes, input.ndim(), false)?;
    let axes = axes.iter().copied().sorted_unstable().collect_vec();
    let labels = (0..input.ndim()).collect_vec();
    if axes.iter().any(|&axis| input.shape()[axis] == 0) {
        return reduction_empty(kernels, identifier, input, axes);
    }

    let chunk_kernel = kernels.chunk.clone();
    let chunk_axes = axes.clone();
    let chunk_func: TaskFn<T> = Arc::new(move |values| {
        let block = single_block(values, chunk_kernel.name())?;
        Ok(chunk_kernel.func()(&block, &chunk_axes)?.into())
    });
    let chunked = axes
        .iter()
        .fold(
            Atop::new(chunk_func, chunk_identifier, labels.clone()).input(input, labels.clone()),
            |atop, &axis| atop.adjust_extent(axis, input.numblocks()[axis], 1),
        )
        .build()?;

    let gathered: u64 = axes.iter().map(|&axis| input.numblocks()[axis]).product();
    let threshold = global_config().reduction_gather_warning_threshold();
    if gathered > u64::try_from(threshold).unwrap_or(u64::MAX) {
        log::warn!(
            "reduction {identifier} gathers {gathered} blocks per aggregate task, exceeding the threshold of {threshold}"
        );
    }

    let aggregate_kernel = kernels.aggregate.clone();
    let aggregate_axes = axes.clone();
    let aggregate_func: TaskFn<T> = Arc::new(move |values| {
        let gathered = single_argument(values, aggregate_kernel.name())?;
        let block = concatenate_nested(gathered, &aggregate_axes)?;
        Ok(aggregate_kernel.func()(&block, &aggregate_axes)?.into())
    });
    let output_labels = labels
        .iter()
        .copied()
        .filter(|label| !axes.contains(label))
        .collect_vec();
    Ok(atop(
        aggregate_func,
        identifier,
        &output_labels,
        &[(&chunked, labels.as_slice())],
    )?)
}

fn reduction_empty<T: Element>(
    kernels: &ReductionKernels<T>,
    identifier: Identifier,
    input: &ChunkedArray<T>,
    axes: Vec<usize>,
) -> Result<ChunkedArray<T>, LowerError> {
    let output_axes = (0..input.ndim())
        .filter(|axis| !axes.contains(axis))
        .collect_vec();
    let shape = output_axes
        .iter()
        .map(|&axis| input.shape()[axis])
        .collect_vec();
    let blockshape = output_axes
        .iter()
        .map(|&axis| input.blockshape()[axis].get())
        .collect_vec();
    let ndim = input.ndim();
    let aggregate_kernel = kernels.aggregate.clone();
    from_block_shapes(
        identifier,
        kernels.aggregate.name(),
        shape,
        &blockshape,
        move |block_shape| {
            let empty = empty_block(ndim, &axes, block_shape)?;
            aggregate_kernel.func()(&empty, &axes)
        },
    )
}
