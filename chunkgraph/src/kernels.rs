//! Block kernels.
//!
//! A kernel is a named block-local function.
//! The lowering rules call kernels through one of three signatures:
//!  - [`ElemwiseKernel`]: one block per input, used by [`elemwise`](crate::lowering::elemwise),
//!  - [`ReduceKernel`]: a block and the reduced axes, used in pairs ([`ReductionKernels`]) by [`reduction`](crate::lowering::reduction),
//!  - [`AlongAxesKernel`]: a block, its core axes and their output lengths, used by [`map_along_axes`](crate::lowering::map_along_axes),
//!  - [`ContractKernel`]: the matched left and right blocks along the contracted axes, used by [`tensordot`](crate::lowering::tensordot).
//!
//! Kernel names are part of the deterministic identifiers of [`map_along_axes`](crate::lowering::map_along_axes), so distinct kernels should have distinct names.
//!
//! This module also holds the standard kernels used by the lowering rules and for assembling results.

use std::{
    ops::{Add, Mul},
    sync::Arc,
};

use chunkgraph_grid::ArraySubset;
use itertools::Itertools;
use ndarray::{ArrayD, Axis, IxDyn, LinalgScalar, Slice, Zip};
use num::Zero;

use crate::graph::{Block, TaskError, Value};

/// A named block kernel.
pub struct Kernel<F: ?Sized> {
    name: Arc<str>,
    func: Arc<F>,
}

impl<F: ?Sized> Clone for Kernel<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func.clone(),
        }
    }
}

impl<F: ?Sized> std::fmt::Debug for Kernel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Kernel").field(&self.name).finish()
    }
}

impl<F: ?Sized> Kernel<F> {
    /// Return the kernel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the kernel function.
    #[must_use]
    pub fn func(&self) -> &F {
        &self.func
    }
}

/// The function of an [`ElemwiseKernel`].
pub type ElemwiseFn<T> = dyn Fn(&[Block<T>]) -> Result<Block<T>, TaskError> + Send + Sync;

/// The function of a [`ReduceKernel`].
pub type ReduceFn<T> = dyn Fn(&Block<T>, &[usize]) -> Result<Block<T>, TaskError> + Send + Sync;

/// The function of an [`AlongAxesKernel`].
pub type AlongAxesFn<T> =
    dyn Fn(&Block<T>, &[usize], &[u64]) -> Result<Block<T>, TaskError> + Send + Sync;

/// The function of a [`ContractKernel`].
pub type ContractFn<T> = dyn Fn(&[Block<T>], &[Block<T>], &[usize], &[usize]) -> Result<Block<T>, TaskError>
    + Send
    + Sync;

/// A kernel applied to co-located blocks, one from each input.
pub type ElemwiseKernel<T> = Kernel<ElemwiseFn<T>>;

/// A kernel reducing a block over a set of axes.
pub type ReduceKernel<T> = Kernel<ReduceFn<T>>;

/// A kernel applied along the core axes of a block, producing the requested length along each core axis.
pub type AlongAxesKernel<T> = Kernel<AlongAxesFn<T>>;

impl<T: 'static> ElemwiseKernel<T> {
    /// Create a new elementwise kernel.
    pub fn elemwise(
        name: &str,
        func: impl Fn(&[Block<T>]) -> Result<Block<T>, TaskError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<T: 'static> ReduceKernel<T> {
    /// Create a new reduce kernel.
    pub fn reduce(
        name: &str,
        func: impl Fn(&Block<T>, &[usize]) -> Result<Block<T>, TaskError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<T: 'static> AlongAxesKernel<T> {
    /// Create a new along axes kernel.
    pub fn along_axes(
        name: &str,
        func: impl Fn(&Block<T>, &[usize], &[u64]) -> Result<Block<T>, TaskError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

/// A kernel combining matched pairs of left and right blocks over the contracted axes.
pub type ContractKernel<T> = Kernel<ContractFn<T>>;

impl<T: 'static> ContractKernel<T> {
    /// Create a new contract kernel.
    pub fn contract(
        name: &str,
        func: impl Fn(&[Block<T>], &[Block<T>], &[usize], &[usize]) -> Result<Block<T>, TaskError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

/// The kernels of a two-phase reduction.
///
/// The `chunk` kernel reduces one block and keeps the reduced axes with length 1.
/// The `aggregate` kernel reduces the concatenation of chunk results along the reduced axes and removes them.
#[derive(Debug, Clone)]
pub struct ReductionKernels<T> {
    /// The chunk phase kernel.
    pub chunk: ReduceKernel<T>,
    /// The aggregate phase kernel.
    pub aggregate: ReduceKernel<T>,
}

fn check_axes(kernel: &str, ndim: usize, axes: &[usize]) -> Result<(), TaskError> {
    if let Some(axis) = axes.iter().find(|&&axis| axis >= ndim) {
        Err(TaskError::kernel(
            kernel,
            format!("axis {axis} is out of bounds for a block with {ndim} dimensions"),
        ))
    } else if !axes.iter().all_unique() {
        Err(TaskError::kernel(kernel, format!("repeated axis in {axes:?}")))
    } else {
        Ok(())
    }
}

/// Sum `block` over `axes`.
///
/// The reduced axes are kept with length 1 if `keep_dims` is true.
///
/// # Errors
/// Returns [`TaskError::KernelError`] if `axes` are out of bounds or repeated.
pub fn sum_axes<T>(block: &Block<T>, axes: &[usize], keep_dims: bool) -> Result<Block<T>, TaskError>
where
    T: Clone + Zero + Add<Output = T>,
{
    check_axes("sum", block.ndim(), axes)?;
    let mut output = block.to_owned();
    for &axis in axes.iter().sorted_unstable().rev() {
        output = output.sum_axis(Axis(axis));
        if keep_dims {
            output.insert_axis_inplace(Axis(axis));
        }
    }
    Ok(output.into_shared())
}

/// Return the maximum of `block` over `axes`.
///
/// The reduced axes are kept with length 1 if `keep_dims` is true.
///
/// # Errors
/// Returns [`TaskError::KernelError`] if `axes` are out of bounds or repeated, or a reduced axis is empty.
pub fn max_axes<T>(block: &Block<T>, axes: &[usize], keep_dims: bool) -> Result<Block<T>, TaskError>
where
    T: Clone + PartialOrd,
{
    check_axes("max", block.ndim(), axes)?;
    let mut output = block.to_owned();
    for &axis in axes.iter().sorted_unstable().rev() {
        let reduced = output.map_axis(Axis(axis), |lane| {
            lane.iter()
                .cloned()
                .reduce(|max, value| if value > max { value } else { max })
        });
        let values = reduced
            .iter()
            .cloned()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| TaskError::kernel("max", format!("axis {axis} is empty")))?;
        output = ArrayD::from_shape_vec(reduced.raw_dim(), values)?;
        if keep_dims {
            output.insert_axis_inplace(Axis(axis));
        }
    }
    Ok(output.into_shared())
}

/// The sum reduction kernels.
#[must_use]
pub fn sum<T>() -> ReductionKernels<T>
where
    T: Clone + Zero + Add<Output = T> + Send + Sync + 'static,
{
    ReductionKernels {
        chunk: ReduceKernel::reduce("sum-chunk", |block, axes| sum_axes(block, axes, true)),
        aggregate: ReduceKernel::reduce("sum-aggregate", |block, axes| {
            sum_axes(block, axes, false)
        }),
    }
}

/// The maximum reduction kernels.
#[must_use]
pub fn max<T>() -> ReductionKernels<T>
where
    T: Clone + PartialOrd + Send + Sync + 'static,
{
    ReductionKernels {
        chunk: ReduceKernel::reduce("max-chunk", |block, axes| max_axes(block, axes, true)),
        aggregate: ReduceKernel::reduce("max-aggregate", |block, axes| {
            max_axes(block, axes, false)
        }),
    }
}

/// Permute the axes of `block`.
///
/// Axis `i` of the output is axis `axes[i]` of the input.
///
/// # Errors
/// Returns [`TaskError::KernelError`] if `axes` is not a permutation of the block axes.
pub fn transpose<T>(block: &Block<T>, axes: &[usize]) -> Result<Block<T>, TaskError> {
    if axes.len() != block.ndim() {
        return Err(TaskError::kernel(
            "transpose",
            format!("axes {axes:?} do not match a block with {} dimensions", block.ndim()),
        ));
    }
    check_axes("transpose", block.ndim(), axes)?;
    Ok(block.clone().permuted_axes(IxDyn(axes)))
}

/// Contract `a` and `b` over the paired axes `a_axes` and `b_axes`.
///
/// The output axes are the uncontracted axes of `a` followed by the uncontracted axes of `b`, each in their original order.
///
/// # Errors
/// Returns [`TaskError::KernelError`] if the axes are invalid or the contracted axes have different lengths.
pub fn tensordot<T: LinalgScalar>(
    a: &Block<T>,
    b: &Block<T>,
    a_axes: &[usize],
    b_axes: &[usize],
) -> Result<Block<T>, TaskError> {
    if a_axes.len() != b_axes.len() {
        return Err(TaskError::kernel(
            "tensordot",
            format!("axes {a_axes:?} and {b_axes:?} have different lengths"),
        ));
    }
    check_axes("tensordot", a.ndim(), a_axes)?;
    check_axes("tensordot", b.ndim(), b_axes)?;
    if let Some((&i, &j)) = std::iter::zip(a_axes, b_axes).find(|(i, j)| a.shape()[**i] != b.shape()[**j]) {
        return Err(TaskError::kernel(
            "tensordot",
            format!(
                "contracted axis {i} with length {} does not match axis {j} with length {}",
                a.shape()[i],
                b.shape()[j]
            ),
        ));
    }

    let a_free = (0..a.ndim()).filter(|i| !a_axes.contains(i)).collect_vec();
    let b_free = (0..b.ndim()).filter(|i| !b_axes.contains(i)).collect_vec();
    let m: usize = a_free.iter().map(|&i| a.shape()[i]).product();
    let k: usize = a_axes.iter().map(|&i| a.shape()[i]).product();
    let n: usize = b_free.iter().map(|&i| b.shape()[i]).product();

    let output_shape = a_free
        .iter()
        .map(|&i| a.shape()[i])
        .chain(b_free.iter().map(|&i| b.shape()[i]))
        .collect_vec();
    if k == 0 {
        return Ok(ArrayD::zeros(output_shape.as_slice()).into_shared());
    }

    let a_perm = a_free.iter().chain(a_axes).copied().collect_vec();
    let b_perm = b_axes.iter().chain(&b_free).copied().collect_vec();
    let a2 = a.view().permuted_axes(IxDyn(&a_perm));
    let a2 = a2.to_shape((m, k))?;
    let b2 = b.view().permuted_axes(IxDyn(&b_perm));
    let b2 = b2.to_shape((k, n))?;

    // `dot` may return a column-major product
    let product = a2.dot(&b2);
    Ok(product
        .to_shape(output_shape.as_slice())?
        .into_owned()
        .into_shared())
}

/// The contract kernel summing the [`tensordot`] of every matched pair of blocks.
#[must_use]
pub fn tensordot_sum<T>() -> ContractKernel<T>
where
    T: LinalgScalar + Send + Sync,
{
    ContractKernel::contract("tensordot", |left, right, left_axes, right_axes| {
        if left.len() != right.len() {
            return Err(TaskError::kernel(
                "tensordot",
                format!("{} left blocks do not pair with {} right blocks", left.len(), right.len()),
            ));
        }
        let mut products = std::iter::zip(left, right)
            .map(|(left, right)| tensordot(left, right, left_axes, right_axes));
        let first = products
            .next()
            .ok_or_else(|| TaskError::kernel("tensordot", "no blocks to contract"))??;
        let mut total = first.into_owned();
        for product in products {
            total = total + &product?;
        }
        Ok(total.into_shared())
    })
}

/// Return the region of `block` within `subset`.
///
/// The returned block shares the data of `block`.
///
/// # Errors
/// Returns [`TaskError::KernelError`] if `subset` is not within the bounds of `block`.
pub fn slice<T>(block: &Block<T>, subset: &ArraySubset) -> Result<Block<T>, TaskError> {
    let shape = block.shape().iter().map(|&s| s as u64).collect_vec();
    if !subset.inbounds_shape(&shape) {
        return Err(TaskError::kernel(
            "slice",
            format!("subset {subset} is out of bounds of a block with shape {shape:?}"),
        ));
    }
    let ranges = subset.to_ranges();
    let mut sliced = block.clone();
    sliced.slice_each_axis_inplace(|axis| {
        let range = &ranges[axis.axis.index()];
        Slice::from(range.start as usize..range.end as usize)
    });
    Ok(sliced)
}

/// Concatenate a nested list of blocks.
///
/// The outermost list is concatenated along `axes[0]`, the next level along `axes[1]`, and so on.
/// With no axes, `value` must be a block.
///
/// # Errors
/// Returns a [`TaskError`] if the nesting depth does not match `axes` or the blocks cannot be concatenated.
pub fn concatenate_nested<T: Clone>(value: Value<T>, axes: &[usize]) -> Result<Block<T>, TaskError> {
    let Some((&axis, inner_axes)) = axes.split_first() else {
        return value.into_block();
    };
    let mut parts = value
        .into_list()?
        .into_iter()
        .map(|value| concatenate_nested(value, inner_axes))
        .collect::<Result<Vec<_>, _>>()?;
    if parts.len() == 1 {
        if let Some(part) = parts.pop() {
            return Ok(part);
        }
    }
    let views = parts.iter().map(|part| part.view()).collect_vec();
    Ok(ndarray::concatenate(Axis(axis), &views)?.into_shared())
}

fn co_broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        (i + shape.len())
            .checked_sub(ndim)
            .map_or(1, |i| shape[i])
    };
    (0..ndim)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        })
        .collect()
}

/// An elementwise kernel applying `func` to each element of one block.
pub fn map<T>(name: &str, func: impl Fn(&T) -> T + Send + Sync + 'static) -> ElemwiseKernel<T>
where
    T: Clone + Send + Sync + 'static,
{
    let kernel = name.to_string();
    ElemwiseKernel::elemwise(name, move |blocks| match blocks {
        [block] => Ok(block.map(&func).into_shared()),
        _ => Err(TaskError::kernel(
            kernel.as_str(),
            format!("expected 1 block, got {}", blocks.len()),
        )),
    })
}

/// An elementwise kernel applying `func` to pairs of elements of two blocks.
///
/// The blocks are broadcast against each other, aligning trailing axes.
pub fn zip_with<T>(name: &str, func: impl Fn(&T, &T) -> T + Send + Sync + 'static) -> ElemwiseKernel<T>
where
    T: Clone + Send + Sync + 'static,
{
    let kernel = name.to_string();
    ElemwiseKernel::elemwise(name, move |blocks| {
        let [a, b] = blocks else {
            return Err(TaskError::kernel(
                kernel.as_str(),
                format!("expected 2 blocks, got {}", blocks.len()),
            ));
        };
        let shape = co_broadcast_shape(a.shape(), b.shape()).ok_or_else(|| {
            TaskError::kernel(
                kernel.as_str(),
                format!("blocks with shapes {:?} and {:?} do not broadcast", a.shape(), b.shape()),
            )
        })?;
        let broadcast_error = || TaskError::kernel(kernel.as_str(), "broadcast failed");
        let a = a.broadcast(shape.as_slice()).ok_or_else(broadcast_error)?;
        let b = b.broadcast(shape.as_slice()).ok_or_else(broadcast_error)?;
        Ok(Zip::from(&a).and(&b).map_collect(|x, y| func(x, y)).into_shared())
    })
}

/// The elementwise addition kernel.
#[must_use]
pub fn add<T>() -> ElemwiseKernel<T>
where
    T: Clone + Add<Output = T> + Send + Sync + 'static,
{
    zip_with("add", |a: &T, b: &T| a.clone() + b.clone())
}

/// The elementwise multiplication kernel.
#[must_use]
pub fn mul<T>() -> ElemwiseKernel<T>
where
    T: Clone + Mul<Output = T> + Send + Sync + 'static,
{
    zip_with("mul", |a: &T, b: &T| a.clone() * b.clone())
}

/// An along axes kernel that truncates or zero pads each core axis to its output length.
#[must_use]
pub fn resize_axes<T>() -> AlongAxesKernel<T>
where
    T: Clone + Zero + Send + Sync + 'static,
{
    AlongAxesKernel::along_axes("resize", |block, axes, lengths| {
        check_axes("resize", block.ndim(), axes)?;
        let mut shape = block.shape().to_vec();
        for (&axis, &length) in std::iter::zip(axes, lengths) {
            shape[axis] = usize::try_from(length)
                .map_err(|_| TaskError::kernel("resize", format!("length {length} exceeds usize")))?;
        }
        let mut output = ArrayD::zeros(shape.as_slice());
        let retained = std::iter::zip(&shape, block.shape())
            .map(|(&new, &old)| Slice::from(0..new.min(old)))
            .collect_vec();
        output
            .slice_each_axis_mut(|axis| retained[axis.axis.index()])
            .assign(&block.slice_each_axis(|axis| retained[axis.axis.index()]));
        Ok(output.into_shared())
    })
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, array};

    use super::*;

    fn block(data: ArrayD<f64>) -> Block<f64> {
        data.into_shared()
    }

    fn arange(shape: &[usize]) -> Block<f64> {
        let n = shape.iter().product::<usize>();
        block(
            ArrayD::from_shape_vec(shape, (0..n).map(|i| i as f64).collect())
                .unwrap(),
        )
    }

    #[test]
    fn kernels_sum_max() {
        let x = arange(&[2, 3]);
        assert_eq!(
            sum_axes(&x, &[0], true).unwrap(),
            block(array![[3.0, 5.0, 7.0]].into_dyn())
        );
        assert_eq!(
            sum_axes(&x, &[0, 1], false).unwrap(),
            block(ndarray::arr0(15.0).into_dyn())
        );
        assert_eq!(
            max_axes(&x, &[1], false).unwrap(),
            block(array![2.0, 5.0].into_dyn())
        );
        assert!(sum_axes(&x, &[2], false).is_err());
        assert!(sum_axes(&x, &[0, 0], false).is_err());
        assert!(max_axes(&arange(&[0, 3]), &[0], false).is_err());
    }

    #[test]
    fn kernels_transpose() {
        let x = arange(&[2, 3, 4]);
        let t = transpose(&x, &[2, 0, 1]).unwrap();
        assert_eq!(t.shape(), &[4, 2, 3]);
        assert_eq!(t[[3, 1, 2]], x[[1, 2, 3]]);
        assert!(transpose(&x, &[0, 1]).is_err());
        assert!(transpose(&x, &[0, 1, 1]).is_err());
    }

    #[test]
    fn kernels_tensordot() {
        let a = arange(&[2, 3]);
        let b = arange(&[3, 4]);
        let expected = a
            .view()
            .into_dimensionality::<ndarray::Ix2>()
            .unwrap()
            .dot(&b.view().into_dimensionality::<ndarray::Ix2>().unwrap());
        assert_eq!(
            tensordot(&a, &b, &[1], &[0]).unwrap(),
            block(expected.into_dyn())
        );

        // contract over a leading axis of both
        let c = arange(&[3, 2]);
        let result = tensordot(&b, &c, &[0], &[0]).unwrap();
        assert_eq!(result.shape(), &[4, 2]);
        let expected_01: f64 = (0..3).map(|k| b[[k, 0]] * c[[k, 1]]).sum();
        assert_eq!(result[[0, 1]], expected_01);

        assert_eq!(
            tensordot(&a, &a, &[0, 1], &[0, 1]).unwrap(),
            block(ndarray::arr0(55.0).into_dyn())
        );
        assert!(tensordot(&a, &b, &[0], &[0]).is_err());
        assert!(tensordot(&a, &b, &[1], &[]).is_err());
    }

    #[test]
    fn kernels_tensordot_column_major_product() {
        // both operands are contracted over their leading axis, so the matrix product is column-major
        let a = arange(&[4, 3, 2]);
        let b = arange(&[5, 4]);
        let result = tensordot(&a, &b, &[0], &[1]).unwrap();
        assert_eq!(result.shape(), &[3, 2, 5]);
        for (i, j, l) in itertools::iproduct!(0..3, 0..2, 0..5) {
            let expected: f64 = (0..4).map(|k| a[[k, i, j]] * b[[l, k]]).sum();
            assert_eq!(result[[i, j, l]], expected);
        }
    }

    #[test]
    fn kernels_tensordot_empty_contraction() {
        let a = arange(&[2, 0]);
        let b = arange(&[0, 3]);
        assert_eq!(
            tensordot(&a, &b, &[1], &[0]).unwrap(),
            block(ArrayD::zeros(vec![2, 3]))
        );
        let kernel = tensordot_sum::<f64>();
        assert_eq!(
            kernel.func()(&[a], &[b], &[1], &[0]).unwrap(),
            block(ArrayD::zeros(vec![2, 3]))
        );
    }

    #[test]
    fn kernels_tensordot_sum() {
        // a (2, 4) x (4, 3) product split into two pairs along the contracted axis
        let a = arange(&[2, 4]);
        let b = arange(&[4, 3]);
        let left = [
            slice(&a, &ArraySubset::new_with_ranges(&[0..2, 0..2])).unwrap(),
            slice(&a, &ArraySubset::new_with_ranges(&[0..2, 2..4])).unwrap(),
        ];
        let right = [
            slice(&b, &ArraySubset::new_with_ranges(&[0..2, 0..3])).unwrap(),
            slice(&b, &ArraySubset::new_with_ranges(&[2..4, 0..3])).unwrap(),
        ];
        let kernel = tensordot_sum::<f64>();
        assert_eq!(
            kernel.func()(&left, &right, &[1], &[0]).unwrap(),
            tensordot(&a, &b, &[1], &[0]).unwrap()
        );
        assert!(kernel.func()(&left, &right[..1], &[1], &[0]).is_err());
        assert!(kernel.func()(&[], &[], &[1], &[0]).is_err());
    }

    #[test]
    fn kernels_slice_concatenate() {
        let x = arange(&[4, 4]);
        let top = slice(&x, &ArraySubset::new_with_ranges(&[0..2, 0..4])).unwrap();
        let bottom = slice(&x, &ArraySubset::new_with_ranges(&[2..4, 0..4])).unwrap();
        assert_eq!(top.shape(), &[2, 4]);
        assert!(slice(&x, &ArraySubset::new_with_ranges(&[0..5, 0..4])).is_err());

        let nested = Value::List(vec![Value::Block(top), Value::Block(bottom)]);
        assert_eq!(concatenate_nested(nested.clone(), &[0]).unwrap(), x);
        assert!(concatenate_nested(nested, &[]).is_err());

        let grid = Value::List(
            (0..2)
                .map(|i| {
                    Value::List(
                        (0..2)
                            .map(|j| {
                                Value::Block(
                                    slice(
                                        &x,
                                        &ArraySubset::new_with_ranges(&[
                                            i * 2..i * 2 + 2,
                                            j * 2..j * 2 + 2,
                                        ]),
                                    )
                                    .unwrap(),
                                )
                            })
                            .collect(),
                    )
                })
                .collect(),
        );
        assert_eq!(concatenate_nested(grid, &[0, 1]).unwrap(), x);
    }

    #[test]
    fn kernels_elemwise_broadcast() {
        let a = arange(&[2, 3]);
        let b = block(array![[10.0, 20.0, 30.0]].into_dyn());
        let add = add::<f64>();
        assert_eq!(add.name(), "add");
        assert_eq!(
            add.func()(&[a.clone(), b.clone()]).unwrap(),
            block(array![[10.0, 21.0, 32.0], [13.0, 24.0, 35.0]].into_dyn())
        );
        assert!(add.func()(&[a.clone()]).is_err());
        assert!(add.func()(&[a.clone(), arange(&[3, 2])]).is_err());

        let double = map("double", |x: &f64| x * 2.0);
        assert_eq!(double.func()(&[b]).unwrap()[[0, 2]], 60.0);
    }

    #[test]
    fn kernels_resize_axes() {
        let x = arange(&[2, 3]);
        let resize = resize_axes::<f64>();
        let truncated = resize.func()(&x, &[1], &[2]).unwrap();
        assert_eq!(truncated, block(array![[0.0, 1.0], [3.0, 4.0]].into_dyn()));
        let padded = resize.func()(&x, &[0], &[3]).unwrap();
        assert_eq!(
            padded,
            block(array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [0.0, 0.0, 0.0]].into_dyn())
        );
    }
}
