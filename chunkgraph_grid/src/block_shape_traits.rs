use std::num::NonZeroU64;

use crate::ArrayShape;

mod sealed {
    pub trait Sealed {}
}
impl<T> sealed::Sealed for T where T: AsRef<[NonZeroU64]> {}

/// A trait for block shapes.
pub trait BlockShapeTraits: AsRef<[NonZeroU64]> + sealed::Sealed {
    /// Convert a block shape to an array shape.
    #[must_use]
    fn to_array_shape(&self) -> ArrayShape {
        self.as_ref().iter().map(|i| i.get()).collect()
    }

    /// Return the number of elements in a full block.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    fn num_elements_u64(&self) -> u64 {
        self.as_ref()
            .iter()
            .copied()
            .map(NonZeroU64::get)
            .product::<u64>()
    }

    /// Return the number of elements in a full block as a usize.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements_u64()).unwrap()
    }

    /// Return the number of blocks along each dimension needed to cover `array_shape`.
    ///
    /// Equal to `ceil(array_shape[k] / block_shape[k])`.
    /// Returns [`None`] if the dimensionality differs.
    #[must_use]
    fn num_blocks(&self, array_shape: &[u64]) -> Option<ArrayShape> {
        let block_shape = self.as_ref();
        if block_shape.len() == array_shape.len() {
            Some(
                std::iter::zip(array_shape, block_shape)
                    .map(|(a, b)| a.div_ceil(b.get()))
                    .collect(),
            )
        } else {
            None
        }
    }
}

impl<T> BlockShapeTraits for T where T: AsRef<[NonZeroU64]> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_shape_to_block_shape;

    #[test]
    fn block_shape_num_blocks() {
        let block_shape = array_shape_to_block_shape(&[5, 3]).unwrap();
        assert_eq!(block_shape.num_elements_u64(), 15);
        assert_eq!(block_shape.num_blocks(&[10, 10]), Some(vec![2, 4]));
        assert_eq!(block_shape.num_blocks(&[0, 1]), Some(vec![0, 1]));
        assert_eq!(block_shape.num_blocks(&[10]), None);
    }
}
