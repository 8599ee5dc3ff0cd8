// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Capability Bits
//!
//! Immutable descriptors of what a device can do, set once at probe time.
//! Rather than three unrelated bitmasks we give each device kind its own
//! newtype over `u32` with named associated constants - this keeps CPU SIMD
//! flags, GPU compute APIs, and NPU vendor tags from being accidentally
//! mixed, while still getting cheap `Copy` bitwise composition.

use serde::{Deserialize, Serialize};

macro_rules! capability_bits {
    ($name:ident { $($flag:ident = $bit:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            $(pub const $flag: Self = Self(1 << $bit);)+

            pub const NONE: Self = Self(0);

            pub fn contains(&self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub fn bits(&self) -> u32 {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }
    };
}

capability_bits!(CpuCapabilities {
    AVX = 0,
    AVX2 = 1,
    AVX512 = 2,
    FMA = 3,
    AES = 4,
});

capability_bits!(GpuCapabilities {
    CUDA = 0,
    OPENCL = 1,
    VULKAN = 2,
    DIRECTML = 3,
    METAL = 4,
});

capability_bits!(NpuCapabilities {
    APPLE_NE = 0,
    AMD = 1,
    INTEL_GNA = 2,
    ARM_ETHOS = 3,
    QUALCOMM = 4,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let caps = CpuCapabilities::AVX2 | CpuCapabilities::FMA;
        assert!(caps.contains(CpuCapabilities::AVX2));
        assert!(caps.contains(CpuCapabilities::FMA));
        assert!(!caps.contains(CpuCapabilities::AVX512));
    }

    #[test]
    fn default_is_none() {
        assert_eq!(CpuCapabilities::default(), CpuCapabilities::NONE);
    }
}
