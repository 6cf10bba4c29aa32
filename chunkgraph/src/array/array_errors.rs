use chunkgraph_grid::{ArrayShape, IncompatibleDimensionalityError};
use thiserror::Error;

use crate::graph::Key;

/// A chunked array creation error.
#[derive(Clone, Debug, Error)]
pub enum ChunkedArrayCreateError {
    /// The dimensionality of the block shape does not match the array shape.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// Invalid block shape (contains zero).
    #[error("invalid block shape {0:?}: all elements must be non-zero")]
    InvalidBlockShape(ArrayShape),
    /// The graph has no task for a block of the array.
    #[error("the graph has no task for block {0}")]
    MissingBlock(Key),
}
