use std::sync::Arc;

use chunkgraph_grid::{ArraySubsetError, IncompatibleDimensionalityError};
use chunkgraph_storage::StorageError;
use thiserror::Error;

use super::{Key, Value};

/// A task error.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// An ndarray shape error.
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
    /// A value of an unexpected kind was received.
    #[error("expected a {expected} value, got a {got} value")]
    UnexpectedValue {
        /// The expected value kind.
        expected: &'static str,
        /// The received value kind.
        got: &'static str,
    },
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An invalid array subset.
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A block kernel failed.
    #[error("kernel `{kernel}` failed: {message}")]
    KernelError {
        /// The kernel name.
        kernel: String,
        /// The failure message.
        message: String,
    },
}

impl TaskError {
    /// Create a new kernel error.
    #[must_use]
    pub fn kernel(kernel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KernelError {
            kernel: kernel.into(),
            message: message.into(),
        }
    }
}

/// The function of a [`Task`].
///
/// Receives one [`Value`] per task argument, with every key argument replaced by the result of its task.
pub type TaskFn<T> = Arc<dyn Fn(Vec<Value<T>>) -> Result<Value<T>, TaskError> + Send + Sync>;

/// A task argument.
#[derive(Debug, Clone)]
pub enum Argument<T> {
    /// The result of the task with this key.
    Key(Key),
    /// A literal value.
    Literal(Value<T>),
    /// A list of arguments, passed to the task function as a [`Value::List`].
    List(Vec<Argument<T>>),
}

impl<T> Argument<T> {
    fn visit_keys<'a>(&'a self, keys: &mut Vec<&'a Key>) {
        match self {
            Self::Key(key) => keys.push(key),
            Self::Literal(_) => {}
            Self::List(list) => list.iter().for_each(|argument| argument.visit_keys(keys)),
        }
    }

    /// Resolve the argument to a value, replacing keys with the value returned by `lookup`.
    ///
    /// # Errors
    /// Returns the key of the first argument that `lookup` cannot resolve.
    pub fn resolve<F>(&self, lookup: &mut F) -> Result<Value<T>, Key>
    where
        T: Clone,
        F: FnMut(&Key) -> Option<Value<T>>,
    {
        match self {
            Self::Key(key) => lookup(key).ok_or_else(|| key.clone()),
            Self::Literal(value) => Ok(value.clone()),
            Self::List(list) => Ok(Value::List(
                list.iter()
                    .map(|argument| argument.resolve(lookup))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

impl<T> From<Key> for Argument<T> {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

/// A task: a function applied to a list of arguments.
///
/// Key arguments are the only dependencies between tasks.
#[derive(Clone)]
pub struct Task<T> {
    name: Arc<str>,
    func: TaskFn<T>,
    args: Vec<Argument<T>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl<T> Task<T> {
    /// Create a new task.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, func: TaskFn<T>, args: Vec<Argument<T>>) -> Self {
        Self {
            name: name.into(),
            func,
            args,
        }
    }

    /// Return the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the task arguments.
    #[must_use]
    pub fn args(&self) -> &[Argument<T>] {
        &self.args
    }

    /// Return the keys of the tasks this task depends on, in argument order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&Key> {
        let mut keys = Vec::new();
        self.args
            .iter()
            .for_each(|argument| argument.visit_keys(&mut keys));
        keys
    }

    /// Call the task function on resolved argument values.
    ///
    /// # Errors
    /// Returns a [`TaskError`] if the task function fails.
    pub fn call(&self, values: Vec<Value<T>>) -> Result<Value<T>, TaskError> {
        (self.func)(values)
    }
}
