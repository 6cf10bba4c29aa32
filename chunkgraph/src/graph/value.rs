use ndarray::{ArcArray, IxDyn};

use super::TaskError;

/// A block of elements.
///
/// Blocks are reference counted so that task results can be shared between dependents without copying.
pub type Block<T> = ArcArray<T, IxDyn>;

/// The result of a task, or a literal task argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    /// A block.
    Block(Block<T>),
    /// A list of values, such as blocks gathered along contracted dimensions.
    List(Vec<Value<T>>),
    /// No value, such as the result of a write into a sink.
    Empty,
}

impl<T> Value<T> {
    /// The name of the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Block(_) => "block",
            Self::List(_) => "list",
            Self::Empty => "empty",
        }
    }

    /// Return the block.
    ///
    /// # Errors
    /// Returns [`TaskError::UnexpectedValue`] if the value is not a block.
    pub fn into_block(self) -> Result<Block<T>, TaskError> {
        let got = self.kind();
        match self {
            Self::Block(block) => Ok(block),
            Self::List(_) | Self::Empty => Err(TaskError::UnexpectedValue {
                expected: "block",
                got,
            }),
        }
    }

    /// Return a reference to the block.
    ///
    /// # Errors
    /// Returns [`TaskError::UnexpectedValue`] if the value is not a block.
    pub fn as_block(&self) -> Result<&Block<T>, TaskError> {
        let got = self.kind();
        match self {
            Self::Block(block) => Ok(block),
            Self::List(_) | Self::Empty => Err(TaskError::UnexpectedValue {
                expected: "block",
                got,
            }),
        }
    }

    /// Return the list of values.
    ///
    /// # Errors
    /// Returns [`TaskError::UnexpectedValue`] if the value is not a list.
    pub fn into_list(self) -> Result<Vec<Value<T>>, TaskError> {
        let got = self.kind();
        match self {
            Self::List(list) => Ok(list),
            Self::Block(_) | Self::Empty => Err(TaskError::UnexpectedValue {
                expected: "list",
                got,
            }),
        }
    }

    /// Return every block of a block or a nested list of blocks in depth-first order.
    ///
    /// # Errors
    /// Returns [`TaskError::UnexpectedValue`] if an [`Empty`](Value::Empty) value is encountered.
    pub fn flatten_blocks(self) -> Result<Vec<Block<T>>, TaskError> {
        let mut blocks = Vec::new();
        self.flatten_blocks_into(&mut blocks)?;
        Ok(blocks)
    }

    fn flatten_blocks_into(self, blocks: &mut Vec<Block<T>>) -> Result<(), TaskError> {
        match self {
            Self::Block(block) => blocks.push(block),
            Self::List(list) => {
                for value in list {
                    value.flatten_blocks_into(blocks)?;
                }
            }
            Self::Empty => {
                return Err(TaskError::UnexpectedValue {
                    expected: "block",
                    got: "empty",
                });
            }
        }
        Ok(())
    }
}

impl<T> From<Block<T>> for Value<T> {
    fn from(block: Block<T>) -> Self {
        Self::Block(block)
    }
}
