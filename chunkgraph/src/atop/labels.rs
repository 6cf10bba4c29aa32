use std::collections::{BTreeMap, BTreeSet};

use chunkgraph_grid::IncompatibleDimensionalityError;
use thiserror::Error;

use crate::array::ChunkedArray;

/// An index label.
///
/// A label tags a dimension of an input to [`atop`](super::atop) or [`broadcast_dimensions`].
/// Dimensions of different inputs with equal labels correspond to each other.
/// Labels are only used while building a graph, they are not stored on the resulting array.
pub trait Label: Clone + Ord + std::fmt::Debug {}

impl<L: Clone + Ord + std::fmt::Debug> Label for L {}

/// The dimension reconciled by [`broadcast_dimensions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// The array shape.
    Shape,
    /// The nominal block shape.
    BlockShape,
}

/// Incompatible shapes error.
///
/// Every variant is detected while building a graph, before any task is created.
#[derive(Debug, Clone, Error)]
pub enum IncompatibleShapesError {
    /// Inputs disagree on the length of a labelled dimension.
    #[error("label {label} has incompatible lengths {values:?}")]
    ShapeMismatch {
        /// The label.
        label: String,
        /// The distinct lengths.
        values: Vec<u64>,
    },
    /// Inputs disagree on the block size of a labelled dimension.
    #[error("label {label} has incompatible block sizes {values:?}")]
    BlockShapeMismatch {
        /// The label.
        label: String,
        /// The distinct block sizes.
        values: Vec<u64>,
    },
    /// Inputs disagree on the number of blocks along a labelled dimension.
    #[error("label {label} has incompatible block counts {values:?}")]
    BlockCountMismatch {
        /// The label.
        label: String,
        /// The distinct block counts.
        values: Vec<u64>,
    },
    /// The number of labels of an input does not match its dimensionality.
    #[error("input {input} has {labels} labels but {ndim} dimensions")]
    LabelCountMismatch {
        /// The input index.
        input: usize,
        /// The number of labels.
        labels: usize,
        /// The number of dimensions.
        ndim: usize,
    },
    /// A label is repeated in the labels of an input or the output.
    #[error("label {0} is repeated")]
    RepeatedLabel(String),
    /// An output label does not label any input dimension.
    #[error("output label {0} does not label any input dimension")]
    UndefinedOutputLabel(String),
    /// An output label has a block size of zero.
    #[error("output label {0} has a block size of zero")]
    ZeroBlockSize(String),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
}

pub(super) fn label_string(label: &impl Label) -> String {
    format!("{label:?}")
}

pub(super) fn check_labels<T, L: Label>(
    input: usize,
    array: &ChunkedArray<T>,
    labels: &[L],
) -> Result<(), IncompatibleShapesError> {
    if labels.len() != array.ndim() {
        Err(IncompatibleShapesError::LabelCountMismatch {
            input,
            labels: labels.len(),
            ndim: array.ndim(),
        })
    } else {
        check_unique(labels)
    }
}

pub(super) fn check_unique<L: Label>(labels: &[L]) -> Result<(), IncompatibleShapesError> {
    let mut seen = BTreeSet::new();
    match labels.iter().find(|label| !seen.insert(*label)) {
        Some(label) => Err(IncompatibleShapesError::RepeatedLabel(label_string(label))),
        None => Ok(()),
    }
}

/// Reconcile a dimension of labelled arrays.
///
/// For each label, the values of `dimension` of every input dimension with that label are collected.
/// A value of 1 is a broadcastable placeholder, so
///  - if every value is equal, the label resolves to that value,
///  - if exactly one distinct value is greater than 1 and the rest are 1, the label resolves to the value greater than 1,
///  - otherwise the inputs are incompatible.
///
/// When reconciling [`Dimension::BlockShape`], inputs must also agree on the number of blocks along each label, ignoring dimensions with length 1.
///
/// # Errors
/// Returns an [`IncompatibleShapesError`] if
///  - the labels of an input do not match its dimensionality or are repeated,
///  - inputs disagree on the length or block size of a label, or
///  - inputs disagree on the number of blocks along a label.
pub fn broadcast_dimensions<T, L: Label>(
    inputs: &[(&ChunkedArray<T>, &[L])],
    dimension: Dimension,
) -> Result<BTreeMap<L, u64>, IncompatibleShapesError> {
    let mut values: BTreeMap<&L, BTreeSet<u64>> = BTreeMap::new();
    let mut counts: BTreeMap<&L, BTreeSet<u64>> = BTreeMap::new();
    for (input, (array, labels)) in inputs.iter().enumerate() {
        check_labels(input, array, labels)?;
        for (i, label) in labels.iter().enumerate() {
            let value = match dimension {
                Dimension::Shape => array.shape()[i],
                Dimension::BlockShape => array.blockshape()[i].get(),
            };
            values.entry(label).or_default().insert(value);
            if array.shape()[i] != 1 {
                counts
                    .entry(label)
                    .or_default()
                    .insert(array.numblocks()[i]);
            }
        }
    }

    let mut resolved = BTreeMap::new();
    for (label, mut values) in values {
        if values.len() > 1 {
            values.remove(&1);
        }
        if let (1, Some(&value)) = (values.len(), values.first()) {
            resolved.insert(label.clone(), value);
        } else {
            let label = label_string(label);
            let values = values.into_iter().collect();
            return Err(match dimension {
                Dimension::Shape => IncompatibleShapesError::ShapeMismatch { label, values },
                Dimension::BlockShape => {
                    IncompatibleShapesError::BlockShapeMismatch { label, values }
                }
            });
        }
    }

    if dimension == Dimension::BlockShape {
        if let Some((label, counts)) = counts.into_iter().find(|(_, counts)| counts.len() > 1) {
            return Err(IncompatibleShapesError::BlockCountMismatch {
                label: label_string(label),
                values: counts.into_iter().collect(),
            });
        }
    }

    Ok(resolved)
}
