//! The block-wise graph constructor.
//!
//! [`atop`] builds a new [`ChunkedArray`] from labelled inputs and a task function.
//! Every dimension of every input is tagged with an index [`Label`]:
//!  - labels in the output labels are *output* dimensions, the output array has one dimension per output label,
//!  - labels absent from the output labels are *contracted* dimensions.
//!
//! The output shape and block shape are resolved with [`broadcast_dimensions`].
//!
//! The output has one task per block.
//! The task receives one argument per input:
//!  - the key of the input block co-located with the output block if the input has no contracted dimensions, or
//!  - a nested list of the input blocks along its contracted dimensions, one level of nesting per contracted label of the input.
//!
//! Contracted labels are ordered by first appearance, scanning the inputs in order and the labels of each input in order.
//! Inputs that share a contracted label enumerate it in lock-step.
//! An input with a single block along a dimension always addresses block 0 along that dimension.
//!
//! The graph of the output is the union of the input graphs and the new tasks.

mod labels;

use std::{collections::BTreeMap, num::NonZeroU64, sync::Arc};

use chunkgraph_grid::{ArrayIndices, ArraySubset, IncompatibleDimensionalityError, RegularBlockGrid};
use itertools::Itertools;

pub use labels::{Dimension, IncompatibleShapesError, Label, broadcast_dimensions};

use crate::{
    array::ChunkedArray,
    graph::{Argument, Graph, Identifier, Key, Task, TaskFn},
};

/// Build a new chunked array with a task for every block.
///
/// `func` is called once per output block with one argument per input, see the [module documentation](self).
/// `inputs` pairs each input array with one label per dimension.
///
/// The resulting array has the identifier `identifier`, which must not be the identifier of any array in the input graphs.
///
/// # Errors
/// Returns an [`IncompatibleShapesError`] if
///  - the labels of an input do not match its dimensionality or are repeated,
///  - the output labels are repeated or include a label that does not label any input dimension, or
///  - the inputs are incompatible, see [`broadcast_dimensions`].
pub fn atop<T, L: Label>(
    func: TaskFn<T>,
    identifier: Identifier,
    output_labels: &[L],
    inputs: &[(&ChunkedArray<T>, &[L])],
) -> Result<ChunkedArray<T>, IncompatibleShapesError> {
    inputs
        .iter()
        .fold(
            Atop::new(func, identifier, output_labels.to_vec()),
            |atop, (array, labels)| atop.input(array, labels.to_vec()),
        )
        .build()
}

/// A builder for [`atop`].
///
/// In addition to [`atop`], the builder can
///  - set the task name, which defaults to the identifier prefix, and
///  - override the resolved extent of an output label with [`adjust_extent`](Atop::adjust_extent).
pub struct Atop<'a, T, L> {
    func: TaskFn<T>,
    task_name: Option<Arc<str>>,
    identifier: Identifier,
    output_labels: Vec<L>,
    inputs: Vec<(&'a ChunkedArray<T>, Vec<L>)>,
    adjusted_extents: BTreeMap<L, (u64, u64)>,
}

impl<T, L: Label> std::fmt::Debug for Atop<'_, T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atop")
            .field("task_name", &self.task_name)
            .field("identifier", &self.identifier)
            .field("output_labels", &self.output_labels)
            .field(
                "inputs",
                &self
                    .inputs
                    .iter()
                    .map(|(array, labels)| (array.identifier(), labels))
                    .collect_vec(),
            )
            .field("adjusted_extents", &self.adjusted_extents)
            .finish_non_exhaustive()
    }
}

impl<'a, T, L: Label> Atop<'a, T, L> {
    /// Create a new block-wise graph builder.
    #[must_use]
    pub fn new(func: TaskFn<T>, identifier: Identifier, output_labels: Vec<L>) -> Self {
        Self {
            func,
            task_name: None,
            identifier,
            output_labels,
            inputs: Vec::new(),
            adjusted_extents: BTreeMap::new(),
        }
    }

    /// Add an input with one label per dimension.
    #[must_use]
    pub fn input(mut self, array: &'a ChunkedArray<T>, labels: Vec<L>) -> Self {
        self.inputs.push((array, labels));
        self
    }

    /// Set the name of the new tasks.
    #[must_use]
    pub fn task_name(mut self, task_name: &str) -> Self {
        self.task_name = Some(task_name.into());
        self
    }

    /// Override the resolved length and block size of an output label.
    ///
    /// This is needed when `func` changes the length of a dimension that is a single block in every input.
    /// The label must still appear in some input, otherwise [`build`](Atop::build) fails with [`IncompatibleShapesError::UndefinedOutputLabel`].
    #[must_use]
    pub fn adjust_extent(mut self, label: L, shape: u64, blockshape: u64) -> Self {
        self.adjusted_extents.insert(label, (shape, blockshape));
        self
    }

    /// Build the chunked array.
    ///
    /// # Errors
    /// See [`atop`].
    pub fn build(self) -> Result<ChunkedArray<T>, IncompatibleShapesError> {
        let inputs = self
            .inputs
            .iter()
            .map(|(array, labels)| (*array, labels.as_slice()))
            .collect_vec();
        labels::check_unique(&self.output_labels)?;
        let mut shapes = broadcast_dimensions(&inputs, Dimension::Shape)?;
        let mut blockshapes = broadcast_dimensions(&inputs, Dimension::BlockShape)?;
        // an adjusted extent only overrides labels that some input defines
        if let Some(label) = self
            .output_labels
            .iter()
            .find(|label| !shapes.contains_key(*label))
        {
            return Err(IncompatibleShapesError::UndefinedOutputLabel(
                labels::label_string(label),
            ));
        }
        for (label, &(shape, blockshape)) in &self.adjusted_extents {
            shapes.insert(label.clone(), shape);
            blockshapes.insert(label.clone(), blockshape);
        }

        let mut output_shape = Vec::with_capacity(self.output_labels.len());
        let mut output_blockshape = Vec::with_capacity(self.output_labels.len());
        for label in &self.output_labels {
            let (Some(&shape), Some(&blockshape)) = (shapes.get(label), blockshapes.get(label))
            else {
                return Err(IncompatibleShapesError::UndefinedOutputLabel(
                    labels::label_string(label),
                ));
            };
            let blockshape = NonZeroU64::new(blockshape)
                .ok_or_else(|| IncompatibleShapesError::ZeroBlockSize(labels::label_string(label)))?;
            output_shape.push(shape);
            output_blockshape.push(blockshape);
        }
        let grid = RegularBlockGrid::new(output_shape, output_blockshape)
            .map_err(IncompatibleDimensionalityError::from)?;

        // the block count of every label, output labels from the output grid
        let mut numblocks: BTreeMap<&L, u64> = BTreeMap::new();
        for (array, labels) in &inputs {
            for (label, &count) in std::iter::zip(*labels, array.numblocks()) {
                let entry = numblocks.entry(label).or_default();
                *entry = (*entry).max(count);
            }
        }
        for (label, &count) in std::iter::zip(&self.output_labels, grid.grid_shape()) {
            numblocks.insert(label, count);
        }

        let mut contracted: Vec<&L> = Vec::new();
        for label in inputs.iter().flat_map(|(_, labels)| labels.iter()) {
            if !self.output_labels.contains(label) && !contracted.contains(&label) {
                contracted.push(label);
            }
        }

        let task_name = self
            .task_name
            .unwrap_or_else(|| task_name_from_identifier(&self.identifier));
        let mut graph = Graph::new();
        for (array, _) in &inputs {
            graph.merge(array.graph());
        }
        let num_inputs_graph = graph.len();

        let output_indices = ArraySubset::new_with_shape(grid.grid_shape().to_vec()).indices();
        for output_coords in &output_indices {
            let mut coords: BTreeMap<&L, u64> =
                std::iter::zip(&self.output_labels, output_coords.iter().copied()).collect();
            let args = inputs
                .iter()
                .map(|(array, labels)| {
                    let input_contracted = contracted
                        .iter()
                        .copied()
                        .filter(|label| labels.contains(label))
                        .collect_vec();
                    input_argument(array, labels, &input_contracted, &numblocks, &mut coords)
                })
                .collect();
            graph.insert(
                Key::new(self.identifier.clone(), output_coords.to_vec()),
                Task::new(task_name.clone(), self.func.clone(), args),
            );
        }

        log::debug!(
            "atop {}: shape {:?}, blockshape {:?}, {} new tasks",
            self.identifier,
            grid.array_shape(),
            grid.block_shape(),
            graph.len() - num_inputs_graph
        );
        Ok(ChunkedArray::from_parts(
            self.identifier,
            Arc::new(graph),
            grid,
        ))
    }
}

/// The task name of an identifier `prefix_N` or `prefix-token` is `prefix`.
fn task_name_from_identifier(identifier: &Identifier) -> Arc<str> {
    let identifier = identifier.as_str();
    identifier
        .rsplit_once(['_', '-'])
        .map_or(identifier, |(prefix, _)| prefix)
        .into()
}

/// The argument of an input, nested over the contracted labels of the input.
fn input_argument<'l, T, L: Label>(
    array: &ChunkedArray<T>,
    labels: &[L],
    contracted: &[&'l L],
    numblocks: &BTreeMap<&L, u64>,
    coords: &mut BTreeMap<&'l L, u64>,
) -> Argument<T> {
    match contracted.split_first() {
        None => {
            let input_coords: ArrayIndices = std::iter::zip(labels, array.numblocks())
                .map(|(label, &count)| {
                    if count == 1 {
                        0
                    } else {
                        coords.get(label).copied().unwrap_or_default()
                    }
                })
                .collect();
            Argument::Key(array.key(input_coords))
        }
        Some((&label, contracted)) => {
            let count = numblocks.get(label).copied().unwrap_or_default();
            let list = (0..count)
                .map(|i| {
                    coords.insert(label, i);
                    input_argument(array, labels, contracted, numblocks, coords)
                })
                .collect();
            coords.remove(label);
            Argument::List(list)
        }
    }
}
