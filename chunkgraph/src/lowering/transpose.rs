use std::sync::Arc;

use itertools::Itertools;

use super::{LowerError, single_block, validate_axes};
use crate::{
    Element,
    array::ChunkedArray,
    atop::atop,
    graph::{Identifier, TaskFn},
    kernels,
};

/// Permute the axes of `input`.
///
/// Axis `i` of the output is axis `axes[i]` of the input.
/// Block boundaries are unchanged, every block is permuted with [`kernels::transpose`].
///
/// # Errors
/// Returns [`LowerError::InvalidAxes`] if `axes` is not a permutation of the axes of `input`.
pub fn transpose<T: Element>(
    identifier: Identifier,
    input: &ChunkedArray<T>,
    axes: &[usize],
) -> Result<ChunkedArray<T>, LowerError> {
    validate_axes(axes, input.ndim(), true)?;
    let input_labels = (0..input.ndim()).collect_vec();
    let task_axes = axes.to_vec();
    let func: TaskFn<T> = Arc::new(move |values| {
        let block = single_block(values, "transpose")?;
        Ok(kernels::transpose(&block, &task_axes)?.into())
    });
    Ok(atop(func, identifier, axes, &[(input, input_labels.as_slice())])?)
}
