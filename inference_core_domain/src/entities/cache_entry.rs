// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Entry
//!
//! An embedding vector plus metadata, tracked by the Promotion Manager. The
//! entry itself stores only the bookkeeping the scoring formulas need;
//! which tier currently owns it is state held by the cache layer, not
//! here, so an in-flight promotion never has to mutate two copies of this
//! struct in lockstep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::value_objects::CacheTierId;

/// Recent accesses retained per entry for predictive scoring.
pub const MAX_RECENT_ACCESSES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    vector: Vec<f32>,
    metadata: serde_json::Value,
    current_tier: CacheTierId,
    last_access: DateTime<Utc>,
    access_count: u64,
    created_at: DateTime<Utc>,
    recent_accesses: VecDeque<DateTime<Utc>>,
    hits: u64,
}

impl CacheEntry {
    pub fn new(vector: Vec<f32>, metadata: serde_json::Value, tier: CacheTierId) -> Self {
        let now = Utc::now();
        Self {
            vector,
            metadata,
            current_tier: tier,
            last_access: now,
            access_count: 0,
            created_at: now,
            recent_accesses: VecDeque::new(),
            hits: 0,
        }
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn current_tier(&self) -> CacheTierId {
        self.current_tier
    }

    pub fn set_tier(&mut self, tier: CacheTierId) {
        self.current_tier = tier;
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access
    }

    pub fn record_access(&mut self, hit: bool) {
        let now = Utc::now();
        self.last_access = now;
        self.access_count += 1;
        if hit {
            self.hits += 1;
        }
        if self.recent_accesses.len() >= MAX_RECENT_ACCESSES {
            self.recent_accesses.pop_front();
        }
        self.recent_accesses.push_back(now);
    }

    fn age_since_last_access_secs(&self) -> f64 {
        (Utc::now() - self.last_access).num_milliseconds() as f64 / 1000.0
    }

    fn lifetime_secs(&self) -> f64 {
        ((Utc::now() - self.created_at).num_milliseconds() as f64 / 1000.0).max(1.0)
    }

    fn hit_rate(&self) -> f64 {
        if self.access_count == 0 {
            0.0
        } else {
            self.hits as f64 / self.access_count as f64
        }
    }

    /// `0.4*recency + 0.6*frequency + 0.5*hit_rate_bonus`, optionally
    /// boosted by a predictive term the promotion manager supplies.
    pub fn promotion_score(&self, predictive: Option<f64>) -> f64 {
        let recency = (-self.age_since_last_access_secs() / 300.0).exp();
        let frequency = (self.access_count as f64 / self.lifetime_secs() * 100.0).min(1.0);
        let hit_rate_bonus = 0.5 * self.hit_rate();
        let base = 0.4 * recency + 0.6 * frequency + hit_rate_bonus;
        match predictive {
            Some(p) => base + 0.2 * p,
            None => base,
        }
    }

    pub fn demotion_score(&self) -> f64 {
        let hours_since_access = (Utc::now() - self.last_access).num_seconds() as f64 / 3600.0;
        let frequency = self.access_count as f64 / self.lifetime_secs() * 1000.0;
        hours_since_access + (1.0 - frequency.min(1.0))
    }

    /// Regularity of inter-access intervals: `1 / (1 + std/mean)`. `None`
    /// when fewer than two intervals are available.
    pub fn predictive_score(&self) -> Option<f64> {
        if self.recent_accesses.len() < 3 {
            return None;
        }
        let intervals: Vec<f64> = self
            .recent_accesses
            .iter()
            .zip(self.recent_accesses.iter().skip(1))
            .map(|(a, b)| (*b - *a).num_milliseconds() as f64)
            .collect();
        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        if mean == 0.0 {
            return Some(1.0);
        }
        let variance = intervals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
        let std = variance.sqrt();
        Some(1.0 / (1.0 + std / mean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_has_zero_access_count() {
        let entry = CacheEntry::new(vec![0.1, 0.2], serde_json::json!({}), CacheTierId::L3);
        assert_eq!(entry.access_count(), 0);
        assert!(entry.predictive_score().is_none());
    }

    #[test]
    fn recording_access_updates_counters() {
        let mut entry = CacheEntry::new(vec![0.1], serde_json::json!({}), CacheTierId::L3);
        entry.record_access(true);
        entry.record_access(false);
        assert_eq!(entry.access_count(), 2);
        assert!(entry.promotion_score(None) > 0.0);
    }

    #[test]
    fn recent_accesses_are_bounded() {
        let mut entry = CacheEntry::new(vec![0.1], serde_json::json!({}), CacheTierId::L3);
        for _ in 0..(MAX_RECENT_ACCESSES + 20) {
            entry.record_access(true);
        }
        assert_eq!(entry.recent_accesses.len(), MAX_RECENT_ACCESSES);
    }
}
