// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Precision
//!
//! The numeric precision an inference task is willing to run at. Used by
//! the Scheduler to filter candidate devices (e.g. an NPU that only
//! supports `Int8` cannot serve an `Fp32`-only request) and by the
//! Graceful Degradation Manager when stepping a task down to a cheaper
//! precision as a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Fp32,
    Fp16,
    Int8,
}

impl Precision {
    /// Ordered from highest fidelity to most degraded, matching the order
    /// the Graceful Degradation Manager steps through.
    pub const DEGRADATION_ORDER: [Precision; 3] = [Precision::Fp32, Precision::Fp16, Precision::Int8];

    /// The next cheaper precision to fall back to, if any remain.
    pub fn step_down(&self) -> Option<Precision> {
        match self {
            Precision::Fp32 => Some(Precision::Fp16),
            Precision::Fp16 => Some(Precision::Int8),
            Precision::Int8 => None,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Precision::Fp32 => "fp32",
            Precision::Fp16 => "fp16",
            Precision::Int8 => "int8",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_down_terminates_at_int8() {
        assert_eq!(Precision::Fp32.step_down(), Some(Precision::Fp16));
        assert_eq!(Precision::Fp16.step_down(), Some(Precision::Int8));
        assert_eq!(Precision::Int8.step_down(), None);
    }
}
