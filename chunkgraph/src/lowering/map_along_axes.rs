use std::sync::Arc;

use itertools::Itertools;

use super::{LowerError, single_block, validate_axes};
use crate::{
    Element,
    array::ChunkedArray,
    atop::Atop,
    graph::{Identifier, TaskFn},
    kernels::AlongAxesKernel,
};

/// Apply `kernel` along the core `axes` of `input`.
///
/// Every core axis must be a single block, so each block holds complete lanes along the core axes.
/// `lengths` sets the output length of each core axis, defaulting to the input length.
/// The output is a single block along each core axis, other axes keep the partitioning of `input`.
///
/// The identifier of the output is derived from the kernel name, `axes`, `lengths` and the identifier of `input`.
/// Identical calls produce identical keys, and calls with different parameters produce disjoint keys.
///
/// # Errors
/// Returns a [`LowerError`] if
///  - `axes` are out of range or repeated,
///  - `lengths` does not have one length per core axis, or
///  - a core axis has more than one block.
pub fn map_along_axes<T: Element>(
    kernel: &AlongAxesKernel<T>,
    input: &ChunkedArray<T>,
    axes: &[usize],
    lengths: Option<&[u64]>,
) -> Result<ChunkedArray<T>, LowerError> {
    validate_axes(axes, input.ndim(), false)?;
    let lengths = match lengths {
        Some(lengths) if lengths.len() != axes.len() => {
            return Err(LowerError::LengthsMismatch {
                axes: axes.len(),
                lengths: lengths.len(),
            });
        }
        Some(lengths) => lengths.to_vec(),
        None => axes.iter().map(|&axis| input.shape()[axis]).collect(),
    };
    if let Some(&axis) = axes.iter().find(|&&axis| input.numblocks()[axis] > 1) {
        return Err(LowerError::ChunkedCoreAxis {
            axis,
            numblocks: input.numblocks()[axis],
        });
    }

    let identifier = Identifier::tokenize(
        kernel.name(),
        &(input.identifier().as_str(), axes, &lengths),
    );
    let labels = (0..input.ndim()).collect_vec();

    let task_kernel = kernel.clone();
    let task_axes = axes.to_vec();
    let task_lengths = lengths.clone();
    let func: TaskFn<T> = Arc::new(move |values| {
        let block = single_block(values, task_kernel.name())?;
        Ok(task_kernel.func()(&block, &task_axes, &task_lengths)?.into())
    });
    let atop = std::iter::zip(axes, &lengths).fold(
        Atop::new(func, identifier, labels.clone())
            .input(input, labels)
            .task_name(kernel.name()),
        |atop, (&axis, &length)| atop.adjust_extent(axis, length, length.max(1)),
    );
    Ok(atop.build()?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use ndarray::{ArrayD, s};

    use super::*;
    use crate::{execute::SequentialExecutor, graph::Key, kernels};

    fn data() -> ArrayD<f32> {
        ArrayD::from_shape_fn(vec![6, 5], |i| (i[0] * 5 + i[1]) as f32)
    }

    fn keys(array: &ChunkedArray<f32>) -> HashSet<Key> {
        array.block_keys().collect()
    }

    #[test]
    fn map_along_axes_resize() {
        let x = ChunkedArray::from_ndarray(data(), &[2, 5]).unwrap();
        let resize = kernels::resize_axes();

        let truncated = map_along_axes(&resize, &x, &[1], Some(&[3][..])).unwrap();
        assert_eq!(truncated.shape(), &[6, 3]);
        assert_eq!(truncated.numblocks(), &[3, 1]);
        assert!(truncated.identifier().as_str().starts_with("resize-"));
        assert_eq!(
            truncated.to_ndarray(&SequentialExecutor::new()).unwrap(),
            data().slice(s![.., 0..3]).to_owned().into_dyn()
        );

        let padded = map_along_axes(&resize, &x, &[1], Some(&[8][..])).unwrap();
        let result = padded.to_ndarray(&SequentialExecutor::new()).unwrap();
        assert_eq!(result.shape(), &[6, 8]);
        assert_eq!(result.slice(s![.., 0..5]).into_dyn(), data());
        assert!(result.slice(s![.., 5..]).iter().all(|&v| v == 0.0));

        let unchanged = map_along_axes(&resize, &x, &[1], None).unwrap();
        assert_eq!(unchanged.shape(), &[6, 5]);
    }

    #[test]
    fn map_along_axes_deterministic() {
        let x = ChunkedArray::from_ndarray(data(), &[2, 5]).unwrap();
        let resize = kernels::resize_axes();
        let a = map_along_axes(&resize, &x, &[1], Some(&[5][..])).unwrap();
        let b = map_along_axes(&resize, &x, &[1], Some(&[5][..])).unwrap();
        let c = map_along_axes(&resize, &x, &[1], Some(&[13][..])).unwrap();
        assert_eq!(a.identifier(), b.identifier());
        assert_eq!(keys(&a), keys(&b));
        assert!(keys(&a).is_disjoint(&keys(&c)));
    }

    #[test]
    fn map_along_axes_errors() {
        let x = ChunkedArray::from_ndarray(data(), &[2, 5]).unwrap();
        let resize = kernels::resize_axes();
        assert!(matches!(
            map_along_axes(&resize, &x, &[0], None),
            Err(LowerError::ChunkedCoreAxis {
                axis: 0,
                numblocks: 3
            })
        ));
        assert!(matches!(
            map_along_axes(&resize, &x, &[1, 1], None),
            Err(LowerError::InvalidAxes { .. })
        ));
        assert!(matches!(
            map_along_axes(&resize, &x, &[2], None),
            Err(LowerError::InvalidAxes { .. })
        ));
        assert!(matches!(
            map_along_axes(&resize, &x, &[1], Some(&[1, 2][..])),
            Err(LowerError::LengthsMismatch { .. })
        ));
    }
}
