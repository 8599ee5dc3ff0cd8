// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Alignment
//!
//! A power-of-two byte alignment for shared memory pool allocations.
//! Validated once at construction, infallible to use thereafter.

use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment(usize);

impl Alignment {
    /// The minimum alignment the pool will honor - a single machine word.
    pub const MIN: usize = 8;
    /// The widest alignment the pool supports, matching typical SIMD/page
    /// granularities.
    pub const MAX: usize = 4096;

    pub fn new(bytes: usize) -> Result<Self, InferenceError> {
        if !bytes.is_power_of_two() {
            return Err(InferenceError::invalid_input(format!(
                "alignment {bytes} is not a power of two"
            )));
        }
        if !(Self::MIN..=Self::MAX).contains(&bytes) {
            return Err(InferenceError::invalid_input(format!(
                "alignment {bytes} out of range [{}, {}]",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> usize {
        self.0
    }

    /// Rounds `size` up to the next multiple of this alignment.
    pub fn align_up(&self, size: usize) -> usize {
        let a = self.0;
        (size + a - 1) & !(a - 1)
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_non_power_of_two() {
        assert!(Alignment::new(96).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Alignment::new(4).is_err());
        assert!(Alignment::new(8192).is_err());
    }

    proptest! {
        #[test]
        fn align_up_is_never_smaller_and_is_aligned(size in 0usize..1_000_000) {
            let alignment = Alignment::default();
            let aligned = alignment.align_up(size);
            prop_assert!(aligned >= size);
            prop_assert_eq!(aligned % alignment.bytes(), 0);
        }
    }
}
