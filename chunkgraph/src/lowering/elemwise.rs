use std::sync::Arc;

use itertools::Itertools;

use super::LowerError;
use crate::{
    Element,
    array::ChunkedArray,
    atop::atop,
    graph::{Identifier, TaskFn, Value},
    kernels::ElemwiseKernel,
};

/// Apply `kernel` to the co-located blocks of every input.
///
/// Dimensions are labelled by their distance from the last dimension, so inputs with fewer dimensions align with the trailing dimensions of the others.
/// Inputs broadcast against each other as described in [`broadcast_dimensions`](crate::atop::broadcast_dimensions).
/// The output has as many dimensions as the input with the most dimensions.
///
/// Each output block is `kernel` applied to a single block from each input.
///
/// # Errors
/// Returns [`LowerError::NoInputs`] if `inputs` is empty, or [`LowerError::IncompatibleShapes`] if the inputs do not broadcast.
pub fn elemwise<T: Element>(
    kernel: &ElemwiseKernel<T>,
    identifier: Identifier,
    inputs: &[&ChunkedArray<T>],
) -> Result<ChunkedArray<T>, LowerError> {
    let ndim = inputs
        .iter()
        .map(|array| array.ndim())
        .max()
        .ok_or(LowerError::NoInputs)?;
    let labels = |ndim: usize| (0..ndim).rev().collect_vec();
    let input_labels = inputs.iter().map(|array| labels(array.ndim())).collect_vec();

    let task_kernel = kernel.clone();
    let func: TaskFn<T> = Arc::new(move |values| {
        let blocks = values
            .into_iter()
            .map(Value::into_block)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Block(task_kernel.func()(blocks.as_slice())?))
    });
    let inputs = std::iter::zip(inputs, &input_labels)
        .map(|(array, labels)| (*array, labels.as_slice()))
        .collect_vec();
    Ok(atop(func, identifier, &labels(ndim), &inputs)?)
}
