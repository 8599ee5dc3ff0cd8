// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Promotion Manager
//!
//! Scores every cache entry's recency, frequency, and hit rate (via
//! [`CacheEntry::promotion_score`]/[`CacheEntry::demotion_score`]) and moves
//! it between tiers accordingly - immediately on a qualifying access, and
//! periodically via a top-k sweep the shared timer wheel drives.
//!
//! Move semantics go through [`cache_layers::transfer`], which holds both
//! tiers' locks for the duration of the move so a concurrent reader never
//! observes a key in neither tier.

use std::sync::Arc;

use inference_core_domain::entities::CacheEntry;
use inference_core_domain::value_objects::{CacheTierId, ChunkKey};

use super::cache_layers::{self, CacheLayer};

#[derive(Debug, Clone)]
pub struct PromotionConfig {
    /// Minimum total accesses before an entry is eligible for immediate
    /// promotion.
    pub promote_after_accesses: u64,
    pub l3_to_l2_score: f64,
    pub l2_to_l1_score: f64,
    pub demotion_score_threshold: f64,
    /// Per-tier caps the periodic sweep promotes up to, independent of the
    /// tier's own eviction capacity.
    pub l1_sweep_cap: usize,
    pub l2_sweep_cap: usize,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            promote_after_accesses: 3,
            l3_to_l2_score: 0.5,
            l2_to_l1_score: 0.7,
            demotion_score_threshold: 2.0,
            l1_sweep_cap: 10,
            l2_sweep_cap: 50,
        }
    }
}

pub struct PromotionManager {
    l1: Arc<CacheLayer>,
    l2: Arc<CacheLayer>,
    l3: Arc<CacheLayer>,
    config: PromotionConfig,
}

impl PromotionManager {
    pub fn new(l1: Arc<CacheLayer>, l2: Arc<CacheLayer>, l3: Arc<CacheLayer>, config: PromotionConfig) -> Self {
        Self { l1, l2, l3, config }
    }

    /// Evaluates one entry for immediate promotion/demotion right after an
    /// access. `tier` is the tier the caller actually hit and `entry` is the
    /// entry `get` already returned from it - this never re-queries the
    /// other tiers, so it neither emits spurious miss events on tiers the
    /// real request never touched nor double-counts the access that `get`
    /// already recorded.
    pub fn on_access(&self, tier: CacheTierId, key: &ChunkKey, entry: &CacheEntry) {
        match tier {
            CacheTierId::L3 => {
                if entry.access_count() >= self.config.promote_after_accesses {
                    let predictive = entry.predictive_score();
                    if entry.promotion_score(predictive) > self.config.l3_to_l2_score {
                        cache_layers::transfer(&self.l3, &self.l2, key);
                    }
                }
            }
            CacheTierId::L2 => {
                if entry.demotion_score() > self.config.demotion_score_threshold {
                    cache_layers::transfer(&self.l2, &self.l3, key);
                    return;
                }
                if entry.access_count() >= self.config.promote_after_accesses {
                    let predictive = entry.predictive_score();
                    if entry.promotion_score(predictive) > self.config.l2_to_l1_score {
                        cache_layers::transfer(&self.l2, &self.l1, key);
                    }
                }
            }
            CacheTierId::L1 => {
                if entry.demotion_score() > self.config.demotion_score_threshold {
                    cache_layers::transfer(&self.l1, &self.l2, key);
                }
            }
        }
    }

    /// Periodic promotion sweep (default cadence 60 s): promotes the
    /// top-scoring entries in L3/L2 up to the destination tier's sweep cap,
    /// above the tier's promotion threshold.
    pub fn sweep_promotions(&self) {
        self.sweep_one_direction(&self.l3, &self.l2, self.config.l3_to_l2_score, self.config.l2_sweep_cap, true);
        self.sweep_one_direction(&self.l2, &self.l1, self.config.l2_to_l1_score, self.config.l1_sweep_cap, true);
    }

    /// Periodic demotion sweep (default cadence 300 s): demotes entries
    /// whose demotion score exceeds the threshold.
    pub fn sweep_demotions(&self) {
        self.sweep_one_direction(&self.l1, &self.l2, self.config.demotion_score_threshold, usize::MAX, false);
        self.sweep_one_direction(&self.l2, &self.l3, self.config.demotion_score_threshold, usize::MAX, false);
    }

    fn sweep_one_direction(
        &self,
        source: &Arc<CacheLayer>,
        destination: &Arc<CacheLayer>,
        threshold: f64,
        destination_cap: usize,
        promoting: bool,
    ) {
        let mut candidates: Vec<(ChunkKey, f64)> = source
            .keys()
            .into_iter()
            .filter_map(|key| {
                let entry = source.get(&key)?;
                let score = if promoting {
                    entry.promotion_score(entry.predictive_score())
                } else {
                    entry.demotion_score()
                };
                (if promoting { score > threshold } else { score > threshold }).then_some((key, score))
            })
            .collect();

        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let room = destination_cap.saturating_sub(destination.len());
        let take = if promoting { room } else { candidates.len() };

        for (key, _score) in candidates.into_iter().take(take) {
            cache_layers::transfer(source, destination, &key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runtime::cache_layers::{CacheLayer, EvictionPolicy};

    fn manager() -> (PromotionManager, Arc<CacheLayer>, Arc<CacheLayer>, Arc<CacheLayer>) {
        let (l1, _r1) = CacheLayer::new(CacheTierId::L1, 100, EvictionPolicy::Lru);
        let (l2, _r2) = CacheLayer::new(CacheTierId::L2, 100, EvictionPolicy::LfuAging);
        let (l3, _r3) = CacheLayer::new(CacheTierId::L3, 100, EvictionPolicy::Fifo);
        let (l1, l2, l3) = (Arc::new(l1), Arc::new(l2), Arc::new(l3));
        let manager = PromotionManager::new(l1.clone(), l2.clone(), l3.clone(), PromotionConfig::default());
        (manager, l1, l2, l3)
    }

    #[test]
    fn frequent_access_promotes_l3_entry_toward_l2() {
        let (manager, _l1, l2, l3) = manager();
        let key = ChunkKey::new("doc-1", 0);
        l3.set(key.clone(), vec![0.5; 8], serde_json::json!({}));
        for _ in 0..5 {
            let entry = l3.get(&key).or_else(|| l2.get(&key)).expect("entry should still exist somewhere");
            let tier = entry.current_tier();
            manager.on_access(tier, &key, &entry);
        }
        assert!(l2.contains(&key) || l3.contains(&key), "entry should still exist somewhere");
    }

    #[test]
    fn sweep_promotes_top_scoring_entries_within_cap() {
        let (manager, _l1, l2, l3) = manager();
        for i in 0..10 {
            let key = ChunkKey::new("doc-1", i);
            l3.set(key.clone(), vec![0.1], serde_json::json!({}));
            for _ in 0..5 {
                l3.get(&key);
            }
        }
        manager.sweep_promotions();
        assert!(l2.len() > 0);
    }

    #[test]
    fn a_key_is_in_exactly_one_tier_after_transfer() {
        let (_manager, _l1, l2, l3) = manager();
        let key = ChunkKey::new("doc-1", 0);
        l3.set(key.clone(), vec![0.1], serde_json::json!({}));
        assert!(cache_layers::transfer(&l3, &l2, &key));
        assert!(l2.contains(&key));
        assert!(!l3.contains(&key));
    }
}
