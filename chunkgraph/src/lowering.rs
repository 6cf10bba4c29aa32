//! Lowering rules.
//!
//! Each rule expresses an array operation as one or two calls to [`atop`](crate::atop::atop):
//!  - [`elemwise`]: a kernel applied to co-located blocks of every input,
//!  - [`reduction`]: a chunk phase reducing every block, then an aggregate phase combining the chunk results along the reduced axes,
//!  - [`transpose`]: relabelled axes with every block permuted,
//!  - [`tensordot`]: pairwise block contractions combined over the contracted axes,
//!  - [`map_along_axes`]: a kernel applied along core axes that are a single block.
//!
//! The rules take the identifiers of the arrays they create explicitly, except [`map_along_axes`] which derives a deterministic identifier from its parameters.
//! [`Lowering`](crate::expr::Lowering) lowers a whole [`Expr`](crate::expr::Expr) tree and generates identifiers.

mod elemwise;
mod map_along_axes;
mod reduction;
mod tensordot;
mod transpose;

use std::sync::Arc;

use chunkgraph_grid::ArrayShape;
use itertools::Itertools;
use thiserror::Error;

pub use elemwise::elemwise;
pub use map_along_axes::map_along_axes;
pub use reduction::reduction;
pub use tensordot::tensordot;
pub use transpose::transpose;

use crate::{
    Element,
    array::{ChunkedArray, ChunkedArrayCreateError},
    atop::IncompatibleShapesError,
    graph::{Block, Identifier, Task, TaskError, TaskFn, Value},
};

/// A lowering error.
#[derive(Debug, Clone, Error)]
pub enum LowerError {
    /// The inputs have incompatible shapes.
    #[error(transparent)]
    IncompatibleShapes(#[from] IncompatibleShapesError),
    /// The axes are out of range, repeated, or not a permutation.
    #[error("invalid axes {axes:?} for an array with {ndim} dimensions")]
    InvalidAxes {
        /// The axes.
        axes: Vec<usize>,
        /// The number of dimensions.
        ndim: usize,
    },
    /// A core axis of [`map_along_axes`] has more than one block.
    #[error("core axis {axis} has {numblocks} blocks, it must be a single block")]
    ChunkedCoreAxis {
        /// The axis.
        axis: usize,
        /// The number of blocks along the axis.
        numblocks: u64,
    },
    /// The left and right axes of [`tensordot`] have different lengths.
    #[error("tensordot left axes {left:?} and right axes {right:?} have different lengths")]
    TensorDotAxesMismatch {
        /// The left axes.
        left: Vec<usize>,
        /// The right axes.
        right: Vec<usize>,
    },
    /// The output lengths of [`map_along_axes`] do not match the core axes.
    #[error("{lengths} output lengths do not match {axes} core axes")]
    LengthsMismatch {
        /// The number of core axes.
        axes: usize,
        /// The number of output lengths.
        lengths: usize,
    },
    /// The array has more dimensions than the rule supports.
    #[error("arrays with {0} dimensions are not supported")]
    TooManyDimensions(usize),
    /// An operation has no inputs.
    #[error("the operation has no inputs")]
    NoInputs,
    /// The output array is invalid.
    #[error(transparent)]
    InvalidArray(#[from] ChunkedArrayCreateError),
}

/// Check that `axes` are within `0..ndim` and unique.
///
/// If `permutation` is true, `axes` must also cover every axis.
fn validate_axes(axes: &[usize], ndim: usize, permutation: bool) -> Result<(), LowerError> {
    let valid = axes.iter().all(|&axis| axis < ndim)
        && axes.iter().all_unique()
        && (!permutation || axes.len() == ndim);
    if valid {
        Ok(())
    } else {
        Err(LowerError::InvalidAxes {
            axes: axes.to_vec(),
            ndim,
        })
    }
}

/// Create an array whose blocks are computed from their shape alone.
///
/// A reduction or contraction over a zero-length axis has no input blocks to gather, so each output block is computed from empty blocks instead.
fn from_block_shapes<T: Element>(
    identifier: Identifier,
    task_name: &str,
    shape: ArrayShape,
    blockshape: &[u64],
    block: impl Fn(&[usize]) -> Result<Block<T>, TaskError> + Send + Sync + 'static,
) -> Result<ChunkedArray<T>, LowerError> {
    let block = Arc::new(block);
    let task_name: Arc<str> = task_name.into();
    Ok(ChunkedArray::from_leaf_tasks(
        identifier,
        shape,
        blockshape,
        |subset| {
            let block = block.clone();
            let block_shape = subset.shape_usize();
            let func: TaskFn<T> = Arc::new(move |_| Ok((*block)(&block_shape)?.into()));
            Task::new(task_name.clone(), func, vec![])
        },
    )?)
}

/// An empty block with the `free` dimensions in order and zero-length `contracted` axes.
fn empty_block<T: Clone>(
    ndim: usize,
    contracted: &[usize],
    free: &[usize],
) -> Result<Block<T>, TaskError> {
    let mut free = free.iter().copied();
    let shape = (0..ndim)
        .map(|axis| {
            if contracted.contains(&axis) {
                0
            } else {
                free.next().unwrap_or(0)
            }
        })
        .collect_vec();
    Ok(ndarray::ArrayD::from_shape_vec(shape, vec![])?.into_shared())
}

/// Take the single argument of a task.
fn single_argument<T>(values: Vec<Value<T>>, name: &str) -> Result<Value<T>, TaskError> {
    let [value] = <[Value<T>; 1]>::try_from(values).map_err(|values| {
        TaskError::kernel(name, format!("expected 1 argument, got {}", values.len()))
    })?;
    Ok(value)
}

/// Take the single block argument of a task.
fn single_block<T>(values: Vec<Value<T>>, name: &str) -> Result<Block<T>, TaskError> {
    single_argument(values, name)?.into_block()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering_validate_axes() {
        assert!(validate_axes(&[0, 2], 3, false).is_ok());
        assert!(validate_axes(&[], 0, true).is_ok());
        assert!(validate_axes(&[0, 3], 3, false).is_err());
        assert!(validate_axes(&[1, 1], 3, false).is_err());
        assert!(validate_axes(&[2, 0, 1], 3, true).is_ok());
        assert!(validate_axes(&[2, 0], 3, true).is_err());
    }

    #[test]
    fn lowering_empty_block() {
        let block = empty_block::<f64>(3, &[1], &[2, 4]).unwrap();
        assert_eq!(block.shape(), &[2, 0, 4]);
        assert_eq!(empty_block::<f64>(1, &[0], &[]).unwrap().shape(), &[0]);
    }
}
