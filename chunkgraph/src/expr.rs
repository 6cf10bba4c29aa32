//! Array expressions.
//!
//! An [`Expr`] is a tree of array operations over [`ChunkedArray`] leaves.
//! A [`Lowering`] visits the tree bottom-up, lowering each node with the matching [`lowering`](crate::lowering) rule.

use std::sync::Arc;

use itertools::Itertools;
use ndarray::LinalgScalar;

use crate::{
    Element,
    array::ChunkedArray,
    graph::{GlobalIdGenerator, IdGenerator},
    kernels::{self, AlongAxesKernel, ContractKernel, ElemwiseKernel, ReductionKernels},
    lowering::{self, LowerError},
};

/// An array expression.
#[derive(Debug, Clone)]
pub enum Expr<T> {
    /// A chunked array.
    Array(ChunkedArray<T>),
    /// An elementwise operation over one or more inputs.
    ///
    /// See [`lowering::elemwise`].
    ElemWise {
        /// The elementwise kernel.
        kernel: ElemwiseKernel<T>,
        /// The inputs.
        inputs: Vec<Expr<T>>,
    },
    /// A reduction over a set of axes.
    ///
    /// See [`lowering::reduction`].
    Reduction {
        /// The input.
        input: Box<Expr<T>>,
        /// The reduced axes.
        axes: Vec<usize>,
        /// The chunk and aggregate kernels.
        kernels: ReductionKernels<T>,
    },
    /// An axis permutation.
    ///
    /// See [`lowering::transpose`].
    Transpose {
        /// The input.
        input: Box<Expr<T>>,
        /// The permutation.
        axes: Vec<usize>,
    },
    /// A tensor contraction.
    ///
    /// See [`lowering::tensordot`].
    TensorDot {
        /// The left input.
        left: Box<Expr<T>>,
        /// The right input.
        right: Box<Expr<T>>,
        /// The contracted axes of the left input.
        left_axes: Vec<usize>,
        /// The contracted axes of the right input.
        right_axes: Vec<usize>,
        /// The contract kernel.
        kernel: ContractKernel<T>,
    },
    /// A kernel applied along unchunked core axes.
    ///
    /// See [`lowering::map_along_axes`].
    MapAlongAxes {
        /// The input.
        input: Box<Expr<T>>,
        /// The kernel.
        kernel: AlongAxesKernel<T>,
        /// The core axes.
        axes: Vec<usize>,
        /// The output length of each core axis.
        lengths: Option<Vec<u64>>,
    },
}

impl<T> From<ChunkedArray<T>> for Expr<T> {
    fn from(array: ChunkedArray<T>) -> Self {
        Self::Array(array)
    }
}

impl<T> Expr<T> {
    /// Create an elementwise expression.
    #[must_use]
    pub fn elemwise(kernel: ElemwiseKernel<T>, inputs: Vec<Expr<T>>) -> Self {
        Self::ElemWise { kernel, inputs }
    }

    /// Create a reduction expression.
    #[must_use]
    pub fn reduction(input: Expr<T>, axes: Vec<usize>, kernels: ReductionKernels<T>) -> Self {
        Self::Reduction {
            input: Box::new(input),
            axes,
            kernels,
        }
    }

    /// Create a transpose expression.
    #[must_use]
    pub fn transpose(input: Expr<T>, axes: Vec<usize>) -> Self {
        Self::Transpose {
            input: Box::new(input),
            axes,
        }
    }

    /// Create a tensor contraction expression summing block products with [`kernels::tensordot_sum`].
    #[must_use]
    pub fn tensordot(
        left: Expr<T>,
        right: Expr<T>,
        left_axes: Vec<usize>,
        right_axes: Vec<usize>,
    ) -> Self
    where
        T: LinalgScalar + Send + Sync,
    {
        Self::TensorDot {
            left: Box::new(left),
            right: Box::new(right),
            left_axes,
            right_axes,
            kernel: kernels::tensordot_sum(),
        }
    }

    /// Create a map along axes expression.
    #[must_use]
    pub fn map_along_axes(
        input: Expr<T>,
        kernel: AlongAxesKernel<T>,
        axes: Vec<usize>,
        lengths: Option<Vec<u64>>,
    ) -> Self {
        Self::MapAlongAxes {
            input: Box::new(input),
            kernel,
            axes,
            lengths,
        }
    }
}

/// Lowers [`Expr`] trees to chunked arrays.
///
/// Identifiers of the arrays created by the lowering rules are drawn from an [`IdGenerator`], prefixed by the kernel or operation name.
/// The default generator is the process-wide [`GlobalIdGenerator`].
#[derive(Debug, Clone)]
pub struct Lowering {
    id_generator: Arc<dyn IdGenerator>,
}

impl Default for Lowering {
    fn default() -> Self {
        Self::new(Arc::new(GlobalIdGenerator))
    }
}

impl Lowering {
    /// Create a new lowering with an identifier generator.
    #[must_use]
    pub fn new(id_generator: Arc<dyn IdGenerator>) -> Self {
        Self { id_generator }
    }

    /// Lower `expr` to a chunked array.
    ///
    /// The children of each node are lowered first.
    /// Nothing is executed.
    ///
    /// # Errors
    /// Returns a [`LowerError`] if any node cannot be lowered.
    pub fn lower<T: Element>(&self, expr: &Expr<T>) -> Result<ChunkedArray<T>, LowerError> {
        match expr {
            Expr::Array(array) => Ok(array.clone()),
            Expr::ElemWise { kernel, inputs } => {
                let inputs = inputs
                    .iter()
                    .map(|input| self.lower(input))
                    .collect::<Result<Vec<_>, _>>()?;
                let inputs = inputs.iter().collect_vec();
                lowering::elemwise(kernel, self.id_generator.next_id(kernel.name()), &inputs)
            }
            Expr::Reduction {
                input,
                axes,
                kernels,
            } => {
                let input = self.lower(input)?;
                lowering::reduction(
                    kernels,
                    self.id_generator.next_id(kernels.chunk.name()),
                    self.id_generator.next_id(kernels.aggregate.name()),
                    &input,
                    axes,
                )
            }
            Expr::Transpose { input, axes } => {
                let input = self.lower(input)?;
                lowering::transpose(self.id_generator.next_id("transpose"), &input, axes)
            }
            Expr::TensorDot {
                left,
                right,
                left_axes,
                right_axes,
                kernel,
            } => {
                let left = self.lower(left)?;
                let right = self.lower(right)?;
                lowering::tensordot(
                    kernel,
                    self.id_generator.next_id(kernel.name()),
                    &left,
                    &right,
                    left_axes,
                    right_axes,
                )
            }
            Expr::MapAlongAxes {
                input,
                kernel,
                axes,
                lengths,
            } => lowering::map_along_axes(kernel, &self.lower(input)?, axes, lengths.as_deref()),
        }
    }
}
