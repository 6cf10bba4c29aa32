use std::fmt::Display;

use chunkgraph_grid::ArrayIndices;
use itertools::Itertools;

use super::Identifier;

/// The key of a task in a [`Graph`](super::Graph).
///
/// A key is an array [`Identifier`] followed by zero-based block coordinates, one per dimension.
/// The single block of a zero-dimensional array has no coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    identifier: Identifier,
    coords: ArrayIndices,
}

impl Key {
    /// Create a new key.
    #[must_use]
    pub fn new(identifier: Identifier, coords: ArrayIndices) -> Self {
        Self { identifier, coords }
    }

    /// Return the identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Return the block coordinates.
    #[must_use]
    pub fn coords(&self) -> &[u64] {
        &self.coords
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.coords.is_empty() {
            write!(f, "('{}',)", self.identifier)
        } else {
            write!(
                f,
                "('{}', {})",
                self.identifier,
                self.coords.iter().join(", ")
            )
        }
    }
}

/// Nested keys.
///
/// Mirrors the block grid of an array: one level of nesting per dimension except the last, outermost dimension first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedKeys {
    /// A single key.
    Key(Key),
    /// A list of nested keys.
    List(Vec<NestedKeys>),
}

impl NestedKeys {
    /// Return every key in depth-first order.
    #[must_use]
    pub fn flatten(&self) -> Vec<Key> {
        let mut keys = Vec::new();
        self.flatten_into(&mut keys);
        keys
    }

    fn flatten_into(&self, keys: &mut Vec<Key>) {
        match self {
            Self::Key(key) => keys.push(key.clone()),
            Self::List(list) => list.iter().for_each(|nested| nested.flatten_into(keys)),
        }
    }

    /// Return the depth of nesting.
    ///
    /// The depth of an empty list is 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Key(_) => 0,
            Self::List(list) => 1 + list.first().map_or(0, Self::depth),
        }
    }
}

impl Display for NestedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::List(list) => write!(f, "[{}]", list.iter().join(", ")),
        }
    }
}

impl From<Key> for NestedKeys {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        let key = Key::new(Identifier::new("x_1"), vec![0, 1]);
        assert_eq!(key.to_string(), "('x_1', 0, 1)");
        let key = Key::new(Identifier::new("x_1"), vec![]);
        assert_eq!(key.to_string(), "('x_1',)");
    }

    #[test]
    fn key_order() {
        let x = Identifier::new("x");
        let mut keys = vec![
            Key::new(x.clone(), vec![1, 0]),
            Key::new(x.clone(), vec![0, 1]),
            Key::new(x.clone(), vec![0, 0]),
        ];
        keys.sort();
        assert_eq!(keys[0].coords(), &[0, 0]);
        assert_eq!(keys[2].coords(), &[1, 0]);
    }

    #[test]
    fn nested_keys_flatten() {
        let x = Identifier::new("x");
        let nested = NestedKeys::List(vec![
            NestedKeys::List(vec![
                Key::new(x.clone(), vec![0, 0]).into(),
                Key::new(x.clone(), vec![0, 1]).into(),
            ]),
            NestedKeys::List(vec![Key::new(x.clone(), vec![1, 0]).into()]),
        ]);
        assert_eq!(nested.depth(), 2);
        assert_eq!(
            nested.flatten(),
            vec![
                Key::new(x.clone(), vec![0, 0]),
                Key::new(x.clone(), vec![0, 1]),
                Key::new(x, vec![1, 0])
            ]
        );
    }
}
