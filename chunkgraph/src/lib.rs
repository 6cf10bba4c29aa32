//! `chunkgraph` is a Rust library for lazily building task graphs over regularly chunked multidimensional arrays.
//!
//! A [`ChunkedArray`](crate::array::ChunkedArray) is a large array partitioned into a regular grid of blocks.
//! It holds no data itself, only a [`Graph`](crate::graph::Graph) mapping each block [`Key`](crate::graph::Key) to a [`Task`](crate::graph::Task) that produces that block.
//! Operations on chunked arrays build new graphs without executing anything.
//!
//! ## Building graphs
//! - [`atop`](crate::atop::atop) is the generic block-wise graph constructor.
//!   Each input dimension is tagged with an index label, and labels shared between inputs are reconciled with [`broadcast_dimensions`](crate::atop::broadcast_dimensions).
//!   Labels absent from the output are *contracted*: every block along them is gathered into the argument of one output task.
//! - The [`lowering`] rules express array operations as one or two calls to [`atop`](crate::atop::atop):
//!   - [`elemwise`](lowering::elemwise): one block from each input per output block,
//!   - [`reduction`](lowering::reduction): a chunk phase followed by an aggregate phase,
//!   - [`transpose`](lowering::transpose): relabelled axes with each block permuted,
//!   - [`tensordot`](lowering::tensordot): pairwise block contractions summed over the contracted axes,
//!   - [`map_along_axes`](lowering::map_along_axes): a kernel applied along unchunked core axes.
//! - An [`Expr`](crate::expr::Expr) tree is lowered with a [`Lowering`](crate::expr::Lowering) visitor.
//!
//! ## Executing graphs
//! Graphs are executed by an [`Executor`](crate::execute::Executor).
//! [`SequentialExecutor`](crate::execute::SequentialExecutor) evaluates tasks one at a time, and [`ThreadedExecutor`](crate::execute::ThreadedExecutor) evaluates independent tasks in parallel with [`rayon`].
//!
//! Results can be materialised with [`ChunkedArray::to_ndarray`](crate::array::ChunkedArray::to_ndarray), or written block by block into external storage with [`sink::store`] and [`sink::append`].
//!
//! ## Example
//! ```rust
//! # use chunkgraph::array::ChunkedArray;
//! # use chunkgraph::execute::SequentialExecutor;
//! # use chunkgraph::expr::{Expr, Lowering};
//! # use chunkgraph::kernels;
//! let data = ndarray::ArrayD::from_shape_fn(vec![10, 10], |i| (i[0] * 10 + i[1]) as f64);
//! let x = ChunkedArray::from_ndarray(data.clone(), &[5, 5])?;
//! assert_eq!(x.numblocks(), &[2, 2]);
//!
//! let expr = Expr::reduction(Expr::from(x), vec![0], kernels::sum());
//! let y = Lowering::default().lower(&expr)?;
//! let result = y.to_ndarray(&SequentialExecutor::new())?;
//! assert_eq!(result, data.sum_axis(ndarray::Axis(0)));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Licence
//! `chunkgraph` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](https://docs.rs/crate/chunkgraph/latest/source/LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](https://docs.rs/crate/chunkgraph/latest/source/LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::wildcard_enum_match_arm)]

pub mod array;
pub mod atop;
pub mod config;
pub mod execute;
pub mod expr;
pub mod graph;
pub mod kernels;
pub mod lowering;
pub mod sink;

pub use chunkgraph_grid as grid;
pub use chunkgraph_storage as storage;

/// A type that can be held in the blocks of a [`ChunkedArray`](crate::array::ChunkedArray).
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}
