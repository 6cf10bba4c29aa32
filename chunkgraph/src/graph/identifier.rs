use std::{
    hash::{DefaultHasher, Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use derive_more::Display;

/// The identifier of a chunked array.
///
/// Every key of a chunked array starts with its identifier.
/// Arrays whose graphs may be merged must have distinct identifiers, unless they are intentionally the same array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Create a new identifier.
    #[must_use]
    pub fn new(identifier: impl Into<Arc<str>>) -> Self {
        Self(identifier.into())
    }

    /// Create a deterministic identifier from a `prefix` and a hashable `token`.
    ///
    /// The token should cover everything that determines the content of the array: the operation, its parameters, and the identifiers of its inputs.
    /// Equal tokens produce equal identifiers, so repeating an operation yields the same keys.
    #[must_use]
    pub fn tokenize(prefix: &str, token: &impl Hash) -> Self {
        let mut hasher = DefaultHasher::new();
        prefix.hash(&mut hasher);
        token.hash(&mut hasher);
        Self::new(format!("{prefix}-{:016x}", hasher.finish()))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

impl From<String> for Identifier {
    fn from(identifier: String) -> Self {
        Self::new(identifier)
    }
}

/// Identifier generator traits.
///
/// A generator must never return the same identifier twice.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    /// Return a new identifier starting with `prefix`.
    fn next_id(&self, prefix: &str) -> Identifier;
}

/// An identifier generator backed by a monotonically increasing atomic counter.
///
/// Identifiers have the form `{prefix}_{n}`, with `n` starting at 1.
#[derive(Debug)]
pub struct CounterIdGenerator {
    counter: AtomicU64,
}

impl Default for CounterIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterIdGenerator {
    /// Create a new counter identifier generator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for CounterIdGenerator {
    fn next_id(&self, prefix: &str) -> Identifier {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Identifier::new(format!("{prefix}_{n}"))
    }
}

static GLOBAL_ID_GENERATOR: CounterIdGenerator = CounterIdGenerator::new();

/// The process-wide identifier generator.
///
/// Shares one [`CounterIdGenerator`] across the process, so identifiers it returns are unique within the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalIdGenerator;

impl IdGenerator for GlobalIdGenerator {
    fn next_id(&self, prefix: &str) -> Identifier {
        GLOBAL_ID_GENERATOR.next_id(prefix)
    }
}
