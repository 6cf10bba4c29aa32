use std::sync::Arc;

use itertools::Itertools;

use super::{LowerError, empty_block, from_block_shapes, validate_axes};
use crate::{
    Element,
    array::ChunkedArray,
    atop::{Dimension, atop, broadcast_dimensions},
    graph::{Identifier, TaskError, TaskFn, Value},
    kernels::ContractKernel,
};

const MAX_DIMENSIONS: usize = 26;

fn alphabet(first: char, ndim: usize) -> Vec<char> {
    (first..).take(ndim).collect()
}

/// Contract `left_axes` of `left` with `right_axes` of `right`.
///
/// The dimensions of `left` are labelled `a`, `b`, ... and the dimensions of `right` are labelled `A`, `B`, ....
/// Each contracted right axis takes the label of its paired left axis, and the contracted labels are removed from the output.
/// The output dimensions are the uncontracted dimensions of `left` followed by the uncontracted dimensions of `right`, each in their original order.
///
/// Each output block is `kernel` applied to the left and right blocks along the contracted dimensions, matched by block coordinate.
/// See [`kernels::tensordot_sum`](crate::kernels::tensordot_sum).
/// If a contracted dimension has length zero, each output block is `kernel` applied to a single pair of empty blocks.
///
/// # Errors
/// Returns a [`LowerError`] if
///  - `left_axes` and `right_axes` have different lengths,
///  - the axes are out of range or repeated,
///  - either input has more than 26 dimensions, or
///  - the contracted dimensions have different lengths or partitioning.
pub fn tensordot<T: Element>(
    kernel: &ContractKernel<T>,
    identifier: Identifier,
    left: &ChunkedArray<T>,
    right: &ChunkedArray<T>,
    left_axes: &[usize],
    right_axes: &[usize],
) -> Result<ChunkedArray<T>, LowerError> {
    if left_axes.len() != right_axes.len() {
        return Err(LowerError::TensorDotAxesMismatch {
            left: left_axes.to_vec(),
            right: right_axes.to_vec(),
        });
    }
    validate_axes(left_axes, left.ndim(), false)?;
    validate_axes(right_axes, right.ndim(), false)?;
    if let Some(ndim) = [left.ndim(), right.ndim()]
        .into_iter()
        .find(|&ndim| ndim > MAX_DIMENSIONS)
    {
        return Err(LowerError::TooManyDimensions(ndim));
    }

    let left_labels = alphabet('a', left.ndim());
    let mut right_labels = alphabet('A', right.ndim());
    for (&left_axis, &right_axis) in std::iter::zip(left_axes, right_axes) {
        right_labels[right_axis] = left_labels[left_axis];
    }
    let output_labels = left_labels
        .iter()
        .enumerate()
        .filter(|(axis, _)| !left_axes.contains(axis))
        .chain(
            right_labels
                .iter()
                .enumerate()
                .filter(|(axis, _)| !right_axes.contains(axis)),
        )
        .map(|(_, &label)| label)
        .collect_vec();

    let contracts_empty = left_axes.iter().any(|&axis| left.shape()[axis] == 0)
        || right_axes.iter().any(|&axis| right.shape()[axis] == 0);
    if contracts_empty {
        broadcast_dimensions(
            &[
                (left, left_labels.as_slice()),
                (right, right_labels.as_slice()),
            ],
            Dimension::Shape,
        )?;
        return tensordot_empty(kernel, identifier, left, right, left_axes, right_axes);
    }

    let task_kernel = kernel.clone();
    let task_left_axes = left_axes.to_vec();
    let task_right_axes = right_axes.to_vec();
    let func: TaskFn<T> = Arc::new(move |values| {
        let [left, right] = <[Value<T>; 2]>::try_from(values).map_err(|values| {
            TaskError::kernel(
                task_kernel.name(),
                format!("expected 2 arguments, got {}", values.len()),
            )
        })?;
        let left = left.flatten_blocks()?;
        let right = right.flatten_blocks()?;
        Ok(task_kernel.func()(&left, &right, &task_left_axes, &task_right_axes)?.into())
    });
    Ok(atop(
        func,
        identifier,
        &output_labels,
        &[
            (left, left_labels.as_slice()),
            (right, right_labels.as_slice()),
        ],
    )?)
}

fn tensordot_empty<T: Element>(
    kernel: &ContractKernel<T>,
    identifier: Identifier,
    left: &ChunkedArray<T>,
    right: &ChunkedArray<T>,
    left_axes: &[usize],
    right_axes: &[usize],
) -> Result<ChunkedArray<T>, LowerError> {
    let free_axes = |array: &ChunkedArray<T>, axes: &[usize]| {
        (0..array.ndim())
            .filter(|axis| !axes.contains(axis))
            .collect_vec()
    };
    let left_free = free_axes(left, left_axes);
    let right_free = free_axes(right, right_axes);
    let shape = left_free
        .iter()
        .map(|&axis| left.shape()[axis])
        .chain(right_free.iter().map(|&axis| right.shape()[axis]))
        .collect_vec();
    let blockshape = left_free
        .iter()
        .map(|&axis| left.blockshape()[axis].get())
        .chain(right_free.iter().map(|&axis| right.blockshape()[axis].get()))
        .collect_vec();

    let task_kernel = kernel.clone();
    let (left_ndim, right_ndim) = (left.ndim(), right.ndim());
    let task_left_axes = left_axes.to_vec();
    let task_right_axes = right_axes.to_vec();
    from_block_shapes(
        identifier,
        kernel.name(),
        shape,
        &blockshape,
        move |block_shape| {
            let (left_shape, right_shape) = block_shape.split_at(left_free.len());
            let left = empty_block(left_ndim, &task_left_axes, left_shape)?;
            let right = empty_block(right_ndim, &task_right_axes, right_shape)?;
            task_kernel.func()(&[left], &[right], &task_left_axes, &task_right_axes)
        },
    )
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, Ix2};

    use super::*;
    use crate::{
        atop::IncompatibleShapesError,
        execute::{SequentialExecutor, ThreadedExecutor},
        kernels,
    };

    fn arange(shape: &[usize], offset: f64) -> ArrayD<f64> {
        let n = shape.iter().product::<usize>();
        ArrayD::from_shape_vec(shape, (0..n).map(|i| i as f64 + offset).collect()).unwrap()
    }

    #[test]
    fn tensordot_matrix_product() {
        let a = arange(&[6, 8], 0.0);
        let b = arange(&[8, 4], 1.0);
        let x = ChunkedArray::from_ndarray(a.clone(), &[3, 3]).unwrap();
        let y = ChunkedArray::from_ndarray(b.clone(), &[3, 2]).unwrap();
        let z = tensordot(
            &kernels::tensordot_sum(),
            Identifier::new("tensordot_1"),
            &x,
            &y,
            &[1],
            &[0],
        )
        .unwrap();
        // output labels are [left axis 0, right axis 1]
        assert_eq!(z.shape(), &[6, 4]);
        assert_eq!(z.numblocks(), &[2, 2]);
        let expected = a
            .into_dimensionality::<Ix2>()
            .unwrap()
            .dot(&b.into_dimensionality::<Ix2>().unwrap())
            .into_dyn();
        assert_eq!(z.to_ndarray(&SequentialExecutor::new()).unwrap(), expected);

        let task = z.graph().get(&z.key(vec![1, 0])).unwrap();
        assert_eq!(task.dependencies().len(), 6);
    }

    #[test]
    fn tensordot_outer_axes() {
        // contract left axis 0 with right axis 1, leaving [left 1, left 2, right 0]
        let a = arange(&[4, 3, 2], 0.0);
        let b = arange(&[5, 4], 2.0);
        let x = ChunkedArray::from_ndarray(a.clone(), &[2, 3, 1]).unwrap();
        let y = ChunkedArray::from_ndarray(b.clone(), &[5, 2]).unwrap();
        let z = tensordot(
            &kernels::tensordot_sum(),
            Identifier::new("tensordot_2"),
            &x,
            &y,
            &[0],
            &[1],
        )
        .unwrap();
        assert_eq!(z.shape(), &[3, 2, 5]);
        let expected = kernels::tensordot(&a.into_shared(), &b.into_shared(), &[0], &[1])
            .unwrap()
            .into_owned();
        assert_eq!(z.to_ndarray(&ThreadedExecutor::new()).unwrap(), expected);
    }

    #[test]
    fn tensordot_single_block_column_major() {
        // single blocks, so the block product is the column-major output of `dot`
        let a = arange(&[4, 3, 2], 0.0);
        let b = arange(&[5, 4], 2.0);
        let x = ChunkedArray::from_ndarray(a.clone(), &[4, 3, 2]).unwrap();
        let y = ChunkedArray::from_ndarray(b.clone(), &[5, 4]).unwrap();
        let z = tensordot(
            &kernels::tensordot_sum(),
            Identifier::new("tensordot_3"),
            &x,
            &y,
            &[0],
            &[1],
        )
        .unwrap();
        let result = z.to_ndarray(&SequentialExecutor::new()).unwrap();
        assert_eq!(result.shape(), &[3, 2, 5]);
        for (i, j, l) in itertools::iproduct!(0..3, 0..2, 0..5) {
            let expected: f64 = (0..4).map(|k| a[[k, i, j]] * b[[l, k]]).sum();
            assert_eq!(result[[i, j, l]], expected);
        }
    }

    #[test]
    fn tensordot_zero_length_contraction() {
        let x = ChunkedArray::from_ndarray(arange(&[2, 0], 0.0), &[1, 2]).unwrap();
        let y = ChunkedArray::from_ndarray(arange(&[0, 3], 0.0), &[2, 2]).unwrap();
        let z = tensordot(
            &kernels::tensordot_sum(),
            Identifier::new("tensordot_4"),
            &x,
            &y,
            &[1],
            &[0],
        )
        .unwrap();
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z.numblocks(), &[2, 2]);
        assert_eq!(
            z.to_ndarray(&ThreadedExecutor::new()).unwrap(),
            ArrayD::<f64>::zeros(vec![2, 3])
        );

        let w = ChunkedArray::from_ndarray(arange(&[1, 3], 0.0), &[1, 3]).unwrap();
        assert!(matches!(
            tensordot(
                &kernels::tensordot_sum(),
                Identifier::new("tensordot_5"),
                &x,
                &w,
                &[1],
                &[1],
            ),
            Err(LowerError::IncompatibleShapes(
                IncompatibleShapesError::ShapeMismatch { .. }
            ))
        ));
    }

    #[test]
    fn tensordot_errors() {
        let x = ChunkedArray::from_ndarray(arange(&[6, 8], 0.0), &[3, 3]).unwrap();
        let y = ChunkedArray::from_ndarray(arange(&[8, 4], 0.0), &[4, 2]).unwrap();
        let kernel = kernels::tensordot_sum();
        assert!(matches!(
            tensordot(&kernel, Identifier::new("t_1"), &x, &y, &[1], &[]),
            Err(LowerError::TensorDotAxesMismatch { .. })
        ));
        assert!(matches!(
            tensordot(&kernel, Identifier::new("t_2"), &x, &y, &[2], &[0]),
            Err(LowerError::InvalidAxes { .. })
        ));
        // equal lengths, different partitioning
        assert!(matches!(
            tensordot(&kernel, Identifier::new("t_3"), &x, &y, &[1], &[0]),
            Err(LowerError::IncompatibleShapes(
                IncompatibleShapesError::BlockShapeMismatch { .. }
            ))
        ));
        // different lengths
        assert!(matches!(
            tensordot(&kernel, Identifier::new("t_4"), &x, &y, &[0], &[0]),
            Err(LowerError::IncompatibleShapes(
                IncompatibleShapesError::ShapeMismatch { .. }
            ))
        ));
    }
}
