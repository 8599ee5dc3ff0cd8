// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Layers
//!
//! Three tiers sharing one contract (`get`/`set`/`remove`) but different
//! eviction/residency policy: L1 is a small LRU, L2 an approximate LFU with
//! periodic frequency aging, L3 an unbounded-residency FIFO. Every operation
//! emits a [`CacheEvent`] on a `crossbeam_channel` - consumed by the
//! Promotion Manager and Cache Statistics Monitor - rather than a global
//! event bus.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;

use inference_core_domain::entities::CacheEntry;
use inference_core_domain::events::CacheEvent;
use inference_core_domain::value_objects::{CacheTierId, ChunkKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    Lru,
    LfuAging,
    Fifo,
}

struct TierState {
    entries: HashMap<ChunkKey, CacheEntry>,
    /// LRU: recency order, most-recent at the back. FIFO: insertion order.
    order: VecDeque<ChunkKey>,
    /// LFU aging: approximate frequency, halved on each `age()` call.
    frequency: HashMap<ChunkKey, f64>,
}

/// One embedding cache tier. `entries` is `pub(crate)` so the Promotion
/// Manager can move entries between tiers under a fixed lock order without
/// going through `get`/`set`, which would double-count access events.
pub struct CacheLayer {
    tier: CacheTierId,
    capacity: usize,
    policy: EvictionPolicy,
    pub(crate) state: Mutex<TierState>,
    events: Sender<CacheEvent>,
}

impl CacheLayer {
    pub fn new(tier: CacheTierId, capacity: usize, policy: EvictionPolicy) -> (Self, Receiver<CacheEvent>) {
        let (tx, rx) = unbounded();
        (
            Self {
                tier,
                capacity,
                policy,
                state: Mutex::new(TierState {
                    entries: HashMap::new(),
                    order: VecDeque::new(),
                    frequency: HashMap::new(),
                }),
                events: tx,
            },
            rx,
        )
    }

    pub fn tier_id(&self) -> CacheTierId {
        self.tier
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn get(&self, key: &ChunkKey) -> Option<CacheEntry> {
        let started = Instant::now();
        let mut state = self.state.lock();
        let found = state.entries.get_mut(key).map(|entry| {
            entry.record_access(true);
            entry.clone()
        });
        match &found {
            Some(_) => {
                self.touch_locked(&mut state, key);
                drop(state);
                let _ = self.events.send(CacheEvent::Hit {
                    key: key.clone(),
                    tier: self.tier,
                    latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                });
            }
            None => {
                drop(state);
                let _ = self.events.send(CacheEvent::Miss {
                    key: key.clone(),
                    tier: self.tier,
                    latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                });
            }
        }
        found
    }

    pub fn set(&self, key: ChunkKey, vector: Vec<f32>, metadata: Value) {
        let mut state = self.state.lock();
        if !state.entries.contains_key(&key) {
            self.evict_if_full_locked(&mut state);
            state.order.push_back(key.clone());
            state.frequency.insert(key.clone(), 1.0);
        } else {
            self.touch_locked(&mut state, &key);
        }
        state.entries.insert(key.clone(), CacheEntry::new(vector, metadata, self.tier));
        drop(state);
        let _ = self.events.send(CacheEvent::Set { key, tier: self.tier });
    }

    pub fn remove(&self, key: &ChunkKey) -> Option<CacheEntry> {
        let mut state = self.state.lock();
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.order.retain(|k| k != key);
            state.frequency.remove(key);
        }
        removed
    }

    /// Inserts an entry that already exists (used by the Promotion Manager
    /// when moving an entry between tiers) without resetting its access
    /// bookkeeping.
    pub(crate) fn insert_entry(&self, key: ChunkKey, mut entry: CacheEntry) {
        entry.set_tier(self.tier);
        let mut state = self.state.lock();
        if !state.entries.contains_key(&key) {
            self.evict_if_full_locked(&mut state);
            state.order.push_back(key.clone());
            state.frequency.insert(key.clone(), 1.0);
        }
        state.entries.insert(key, entry);
    }

    fn touch_locked(&self, state: &mut TierState, key: &ChunkKey) {
        match self.policy {
            EvictionPolicy::Lru => {
                state.order.retain(|k| k != key);
                state.order.push_back(key.clone());
            }
            EvictionPolicy::LfuAging => {
                *state.frequency.entry(key.clone()).or_insert(0.0) += 1.0;
            }
            EvictionPolicy::Fifo => {}
        }
    }

    fn evict_if_full_locked(&self, state: &mut TierState) {
        if self.capacity == 0 || state.entries.len() < self.capacity {
            return;
        }
        let victim = match self.policy {
            EvictionPolicy::Lru | EvictionPolicy::Fifo => state.order.pop_front(),
            EvictionPolicy::LfuAging => state
                .frequency
                .iter()
                .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(k, _)| k.clone()),
        };
        if let Some(victim) = victim {
            state.entries.remove(&victim);
            state.order.retain(|k| k != &victim);
            state.frequency.remove(&victim);
        }
    }

    /// Halves every tracked frequency. Only meaningful for `LfuAging`
    /// tiers; a no-op otherwise. Intended to be driven by the shared timer
    /// wheel.
    pub fn age(&self) {
        if self.policy != EvictionPolicy::LfuAging {
            return;
        }
        let mut state = self.state.lock();
        for value in state.frequency.values_mut() {
            *value *= 0.5;
        }
    }

    pub fn keys(&self) -> Vec<ChunkKey> {
        self.state.lock().entries.keys().cloned().collect()
    }
}

/// Moves `key` from `source` to `destination`, holding both tiers' locks
/// for the whole operation so a concurrent reader observes the key in
/// exactly one tier - never both, never neither. Locks are acquired in
/// `CacheTierId::LOCK_ORDER` regardless of promotion/demotion direction,
/// which is what keeps this deadlock-free against a concurrent transfer in
/// the opposite direction.
pub(crate) fn transfer(source: &CacheLayer, destination: &CacheLayer, key: &ChunkKey) -> bool {
    let source_first = source.tier < destination.tier;
    let (mut first_guard, mut second_guard) = if source_first {
        (source.state.lock(), destination.state.lock())
    } else {
        (destination.state.lock(), source.state.lock())
    };
    let (src_state, dst_state): (&mut TierState, &mut TierState) = if source_first {
        (&mut first_guard, &mut second_guard)
    } else {
        (&mut second_guard, &mut first_guard)
    };

    let Some(mut entry) = src_state.entries.remove(key) else {
        return false;
    };
    src_state.order.retain(|k| k != key);
    src_state.frequency.remove(key);

    entry.set_tier(destination.tier);
    if !dst_state.entries.contains_key(key) {
        destination.evict_if_full_locked(dst_state);
        dst_state.order.push_back(key.clone());
        dst_state.frequency.insert(key.clone(), 1.0);
    }
    dst_state.entries.insert(key.clone(), entry);
    true
}

/// Default tier capacities the `EngineConfig`'s `cache_sizes` option
/// overrides: `(l1, l2, l3)`.
pub const DEFAULT_CACHE_SIZES: (usize, usize, usize) = (1_000, 10_000, 100_000);

pub fn build_tiers(
    sizes: (usize, usize, usize),
) -> (
    (CacheLayer, Receiver<CacheEvent>),
    (CacheLayer, Receiver<CacheEvent>),
    (CacheLayer, Receiver<CacheEvent>),
) {
    (
        CacheLayer::new(CacheTierId::L1, sizes.0, EvictionPolicy::Lru),
        CacheLayer::new(CacheTierId::L2, sizes.1, EvictionPolicy::LfuAging),
        CacheLayer::new(CacheTierId::L3, sizes.2, EvictionPolicy::Fifo),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: u32) -> ChunkKey {
        ChunkKey::new("doc-1", i)
    }

    #[test]
    fn set_then_get_round_trips() {
        let (l1, _rx) = CacheLayer::new(CacheTierId::L1, 10, EvictionPolicy::Lru);
        l1.set(key(0), vec![1.0, 2.0], serde_json::json!({"n": 1}));
        let entry = l1.get(&key(0)).unwrap();
        assert_eq!(entry.vector(), &[1.0, 2.0]);
    }

    #[test]
    fn get_miss_emits_miss_event() {
        let (l1, rx) = CacheLayer::new(CacheTierId::L1, 10, EvictionPolicy::Lru);
        assert!(l1.get(&key(0)).is_none());
        assert!(matches!(rx.try_recv().unwrap(), CacheEvent::Miss { .. }));
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let (l1, _rx) = CacheLayer::new(CacheTierId::L1, 2, EvictionPolicy::Lru);
        l1.set(key(0), vec![0.0], Value::Null);
        l1.set(key(1), vec![0.0], Value::Null);
        l1.get(&key(0));
        l1.set(key(2), vec![0.0], Value::Null);
        assert!(!l1.contains(&key(1)));
        assert!(l1.contains(&key(0)));
        assert!(l1.contains(&key(2)));
    }

    #[test]
    fn fifo_evicts_oldest_insertion_regardless_of_access() {
        let (l3, _rx) = CacheLayer::new(CacheTierId::L3, 2, EvictionPolicy::Fifo);
        l3.set(key(0), vec![0.0], Value::Null);
        l3.set(key(1), vec![0.0], Value::Null);
        l3.get(&key(0));
        l3.set(key(2), vec![0.0], Value::Null);
        assert!(!l3.contains(&key(0)));
        assert!(l3.contains(&key(1)));
    }

    #[test]
    fn lfu_evicts_least_frequently_used() {
        let (l2, _rx) = CacheLayer::new(CacheTierId::L2, 2, EvictionPolicy::LfuAging);
        l2.set(key(0), vec![0.0], Value::Null);
        l2.set(key(1), vec![0.0], Value::Null);
        l2.get(&key(0));
        l2.get(&key(0));
        l2.set(key(2), vec![0.0], Value::Null);
        assert!(!l2.contains(&key(1)));
    }

    #[test]
    fn aging_halves_frequency_of_lfu_tier() {
        let (l2, _rx) = CacheLayer::new(CacheTierId::L2, 10, EvictionPolicy::LfuAging);
        l2.set(key(0), vec![0.0], Value::Null);
        l2.get(&key(0));
        l2.age();
        let freq = l2.state.lock().frequency[&key(0)];
        assert!(freq < 2.0);
    }

    #[test]
    fn a_key_resides_in_at_most_one_tier_after_move() {
        let (l1, _rx1) = CacheLayer::new(CacheTierId::L1, 10, EvictionPolicy::Lru);
        let (l3, _rx3) = CacheLayer::new(CacheTierId::L3, 10, EvictionPolicy::Fifo);
        l3.set(key(0), vec![0.0], Value::Null);
        let entry = l3.remove(&key(0)).unwrap();
        l1.insert_entry(key(0), entry);
        assert!(!l3.contains(&key(0)));
        assert!(l1.contains(&key(0)));
    }
}
