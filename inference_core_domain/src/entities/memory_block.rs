// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Memory Block
//!
//! An allocated span within the Shared Memory Pool's backing buffer. The
//! pool hands these out by value behind an opaque handle rather than a
//! borrowed view, so a compacting GC can move the underlying bytes without
//! invalidating anything a caller is holding (see the handle-resolution
//! discipline documented alongside the memory pool infrastructure).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::value_objects::Alignment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    offset: usize,
    size: usize,
    alignment: Alignment,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    access_count: u64,
}

impl MemoryBlock {
    pub fn new(offset: usize, size: usize, alignment: Alignment) -> Result<Self, InferenceError> {
        if offset % alignment.bytes() != 0 {
            return Err(InferenceError::invalid_input(format!(
                "offset {offset} is not aligned to {}",
                alignment.bytes()
            )));
        }
        let now = Utc::now();
        Ok(Self {
            offset,
            size,
            alignment,
            created_at: now,
            last_access: now,
            access_count: 0,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn overlaps(&self, other: &MemoryBlock) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    pub fn touch(&mut self) {
        self.last_access = Utc::now();
        self.access_count += 1;
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_misaligned_offset() {
        assert!(MemoryBlock::new(3, 64, Alignment::new(8).unwrap()).is_err());
    }

    #[test]
    fn detects_overlap() {
        let a = MemoryBlock::new(0, 64, Alignment::new(8).unwrap()).unwrap();
        let b = MemoryBlock::new(32, 64, Alignment::new(8).unwrap()).unwrap();
        let c = MemoryBlock::new(64, 64, Alignment::new(8).unwrap()).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn touch_increments_access_count() {
        let mut block = MemoryBlock::new(0, 64, Alignment::new(8).unwrap()).unwrap();
        block.touch();
        block.touch();
        assert_eq!(block.access_count(), 2);
    }
}
