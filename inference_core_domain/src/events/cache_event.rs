// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Events
//!
//! Emitted by each cache tier on every operation; consumed by the
//! Promotion Manager (to score access patterns) and the Cache Statistics
//! Monitor (to update hit/miss/latency counters).

use serde::{Deserialize, Serialize};

use crate::value_objects::{CacheTierId, ChunkKey};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CacheEvent {
    Hit {
        key: ChunkKey,
        tier: CacheTierId,
        latency_ms: f64,
    },
    Miss {
        key: ChunkKey,
        tier: CacheTierId,
        latency_ms: f64,
    },
    Set {
        key: ChunkKey,
        tier: CacheTierId,
    },
    Error {
        key: ChunkKey,
        tier: CacheTierId,
        message: String,
    },
}

impl CacheEvent {
    pub fn tier(&self) -> CacheTierId {
        match self {
            CacheEvent::Hit { tier, .. }
            | CacheEvent::Miss { tier, .. }
            | CacheEvent::Set { tier, .. }
            | CacheEvent::Error { tier, .. } => *tier,
        }
    }
}
