// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Key
//!
//! The composite key a `CacheEntry` is addressed by: a document identifier
//! plus the chunk's ordinal within that document. Cheap to hash and clone,
//! used as the key type for every cache tier's index map.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkKey {
    document_id: String,
    chunk_index: u32,
}

impl ChunkKey {
    pub fn new(document_id: impl Into<String>, chunk_index: u32) -> Self {
        Self {
            document_id: document_id.into(),
            chunk_index,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document_id, self.chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = ChunkKey::new("doc-1", 3);
        let b = ChunkKey::new("doc-1", 3);
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn display_format() {
        assert_eq!(ChunkKey::new("doc-1", 3).to_string(), "doc-1#3");
    }
}
