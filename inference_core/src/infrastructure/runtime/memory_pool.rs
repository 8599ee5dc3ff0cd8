// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Memory Pool
//!
//! A single contiguous, anonymously-mapped buffer (`memmap2::MmapMut`)
//! shared across the process, with an aligned first-fit allocator and a
//! compacting GC.
//!
//! ## Handle discipline
//!
//! Allocations are returned as an opaque [`MemoryHandle`] rather than a
//! borrowed slice. A compacting GC can relocate live bytes at any time, so
//! holding a `&[u8]` across a compaction would be unsound; instead every
//! access re-resolves the handle against the pool's block table under its
//! lock (`resolve`/`resolve_mut`), which is always up to date even if the
//! handle's backing bytes just moved. This is the "index-based handle"
//! discipline the pool's design notes call out as the alternative to
//! quiescing every outstanding view during compaction - we don't have a
//! notification channel to every borrower, so relocation has to be
//! transparent to them instead.

use std::collections::BTreeMap;

use memmap2::MmapMut;
use parking_lot::Mutex;

use inference_core_domain::entities::MemoryBlock;
use inference_core_domain::error::InferenceError;
use inference_core_domain::value_objects::Alignment;

/// Per-kind default alignment, used when a caller does not request a
/// stricter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    Int8,
    Int16,
    Float32,
    Float64,
    Tensor,
    Embedding,
}

impl AllocationKind {
    pub fn optimal_alignment(&self) -> usize {
        match self {
            AllocationKind::Int8 => 1,
            AllocationKind::Int16 => 2,
            AllocationKind::Float32 => 4,
            AllocationKind::Float64 => 8,
            AllocationKind::Tensor => 16,
            AllocationKind::Embedding => 32,
        }
    }
}

/// Hardware-profile alignment floors layered on top of the kind-optimal
/// alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareProfile {
    Cpu,
    Gpu,
    Npu,
}

impl HardwareProfile {
    pub fn alignment_floor(&self) -> usize {
        match self {
            HardwareProfile::Cpu => 64,
            HardwareProfile::Gpu => 256,
            HardwareProfile::Npu => 128,
        }
    }
}

/// Opaque, stable reference to a live allocation. Never dereferenced
/// directly - always resolved through the owning pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle(u64);

struct PoolState {
    buffer: MmapMut,
    /// offset -> size, for free spans.
    free_list: BTreeMap<usize, usize>,
    /// handle -> block, for live allocations.
    blocks: BTreeMap<u64, MemoryBlock>,
    next_handle: u64,
    pool_size: usize,
}

impl PoolState {
    fn utilization(&self) -> f64 {
        let allocated: usize = self.blocks.values().map(|b| b.size()).sum();
        allocated as f64 / self.pool_size as f64
    }

    fn total_free(&self) -> usize {
        self.free_list.values().sum()
    }

    fn largest_free(&self) -> usize {
        self.free_list.values().copied().max().unwrap_or(0)
    }

    fn fragmentation(&self) -> f64 {
        let total_free = self.total_free();
        if total_free == 0 {
            return 0.0;
        }
        1.0 - (self.largest_free() as f64 / total_free as f64)
    }

    /// First-fit search over the free list for a span that can hold
    /// `size` once rounded up to `alignment`.
    fn find_fit(&self, size: usize, alignment: &Alignment) -> Option<(usize, usize)> {
        for (&offset, &span) in self.free_list.iter() {
            let aligned_offset = alignment.align_up(offset);
            let padding = aligned_offset - offset;
            if span >= padding + size {
                return Some((offset, span));
            }
        }
        None
    }

    fn take_free_span(&mut self, offset: usize, span: usize, aligned_offset: usize, size: usize) {
        self.free_list.remove(&offset);
        let padding = aligned_offset - offset;
        if padding > 0 {
            self.free_list.insert(offset, padding);
        }
        let tail_offset = aligned_offset + size;
        let tail_size = span - padding - size;
        if tail_size > 0 {
            self.free_list.insert(tail_offset, tail_size);
        }
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<(usize, usize)> = self.free_list.iter().map(|(&o, &s)| (o, s)).collect();
        merged.sort_by_key(|&(o, _)| o);
        let mut result: Vec<(usize, usize)> = Vec::new();
        for (offset, size) in merged.drain(..) {
            if let Some(last) = result.last_mut() {
                if last.0 + last.1 == offset {
                    last.1 += size;
                    continue;
                }
            }
            result.push((offset, size));
        }
        self.free_list = result.into_iter().collect();
    }

    /// Compacts by moving every allocated block down to the next aligned
    /// offset, in ascending offset order, rebuilding the free list as one
    /// trailing span.
    fn compact(&mut self) {
        let mut blocks: Vec<(u64, MemoryBlock)> =
            self.blocks.iter().map(|(&h, b)| (h, b.clone())).collect();
        blocks.sort_by_key(|(_, b)| b.offset());

        let mut cursor = 0usize;
        for (handle, block) in blocks.iter_mut() {
            let new_offset = block.alignment().align_up(cursor);
            if new_offset != block.offset() {
                let moved = self.buffer[block.offset()..block.offset() + block.size()].to_vec();
                self.buffer[new_offset..new_offset + block.size()].copy_from_slice(&moved);
                *block = MemoryBlock::new(new_offset, block.size(), block.alignment())
                    .expect("recomputed offset is aligned by construction");
            }
            cursor = new_offset + block.size();
            self.blocks.insert(*handle, block.clone());
        }

        self.free_list.clear();
        if cursor < self.pool_size {
            self.free_list.insert(cursor, self.pool_size - cursor);
        }
    }
}

/// GC trigger thresholds: utilization and fragmentation ratios above which
/// a GC pass runs before retrying a failed allocation.
#[derive(Debug, Clone, Copy)]
pub struct GcThresholds {
    pub utilization: f64,
    pub fragmentation: f64,
    /// Fragmentation above which GC escalates from coalesce-only to a full
    /// compaction pass.
    pub compaction_fragmentation: f64,
}

impl Default for GcThresholds {
    fn default() -> Self {
        Self {
            utilization: 0.8,
            fragmentation: 0.5,
            compaction_fragmentation: 0.7,
        }
    }
}

/// Aligned allocator over a single anonymous backing buffer, with a
/// compacting GC triggered on allocation pressure.
pub struct SharedMemoryPool {
    state: Mutex<PoolState>,
    thresholds: GcThresholds,
}

impl SharedMemoryPool {
    pub fn new(pool_size: usize, thresholds: GcThresholds) -> Result<Self, InferenceError> {
        let buffer = MmapMut::map_anon(pool_size)
            .map_err(|e| InferenceError::internal(format!("failed to map memory pool: {e}")))?;
        let mut free_list = BTreeMap::new();
        free_list.insert(0, pool_size);
        Ok(Self {
            state: Mutex::new(PoolState {
                buffer,
                free_list,
                blocks: BTreeMap::new(),
                next_handle: 1,
                pool_size,
            }),
            thresholds,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.state.lock().pool_size
    }

    pub fn utilization(&self) -> f64 {
        self.state.lock().utilization()
    }

    /// Allocates `size` bytes aligned to `max(requested_alignment,
    /// kind-optimal, hardware-profile floor)`. Runs GC and retries once if
    /// the first attempt fails to find a fit.
    pub fn allocate(
        &self,
        size: usize,
        kind: AllocationKind,
        profile: HardwareProfile,
        requested_alignment: Option<Alignment>,
    ) -> Result<MemoryHandle, InferenceError> {
        let alignment_bytes = requested_alignment
            .map(|a| a.bytes())
            .unwrap_or(1)
            .max(kind.optimal_alignment())
            .max(profile.alignment_floor())
            .next_power_of_two();
        let alignment = Alignment::new(alignment_bytes.clamp(Alignment::MIN, Alignment::MAX))?;

        let mut state = self.state.lock();
        if let Some(handle) = Self::try_allocate_locked(&mut state, size, alignment)? {
            return Ok(handle);
        }

        self.run_gc_locked(&mut state);

        if let Some(handle) = Self::try_allocate_locked(&mut state, size, alignment)? {
            return Ok(handle);
        }

        Err(InferenceError::out_of_memory(format!(
            "no placement satisfies size={size} alignment={}",
            alignment.bytes()
        )))
    }

    fn try_allocate_locked(
        state: &mut PoolState,
        size: usize,
        alignment: Alignment,
    ) -> Result<Option<MemoryHandle>, InferenceError> {
        let Some((offset, span)) = state.find_fit(size, &alignment) else {
            return Ok(None);
        };
        let aligned_offset = alignment.align_up(offset);
        state.take_free_span(offset, span, aligned_offset, size);

        let block = MemoryBlock::new(aligned_offset, size, alignment)?;
        let handle = state.next_handle;
        state.next_handle += 1;
        state.blocks.insert(handle, block);
        Ok(Some(MemoryHandle(handle)))
    }

    fn run_gc_locked(&self, state: &mut PoolState) {
        if state.utilization() > self.thresholds.utilization
            || state.fragmentation() > self.thresholds.fragmentation
        {
            state.coalesce();
            if state.fragmentation() > self.thresholds.compaction_fragmentation {
                state.compact();
            }
        }
    }

    pub fn free(&self, handle: MemoryHandle) -> Result<(), InferenceError> {
        let mut state = self.state.lock();
        let block = state
            .blocks
            .remove(&handle.0)
            .ok_or_else(|| InferenceError::invalid_input("unknown memory handle"))?;
        state.free_list.insert(block.offset(), block.size());
        state.coalesce();
        Ok(())
    }

    /// Runs `f` with a read-only view of the handle's current bytes,
    /// re-resolving the offset under the lock so a concurrent compaction
    /// never hands back stale bytes.
    pub fn with_bytes<R>(&self, handle: MemoryHandle, f: impl FnOnce(&[u8]) -> R) -> Result<R, InferenceError> {
        let mut state = self.state.lock();
        let block = state
            .blocks
            .get_mut(&handle.0)
            .ok_or_else(|| InferenceError::invalid_input("unknown memory handle"))?;
        block.touch();
        let (offset, size) = (block.offset(), block.size());
        Ok(f(&state.buffer[offset..offset + size]))
    }

    pub fn with_bytes_mut<R>(
        &self,
        handle: MemoryHandle,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R, InferenceError> {
        let mut state = self.state.lock();
        let block = state
            .blocks
            .get_mut(&handle.0)
            .ok_or_else(|| InferenceError::invalid_input("unknown memory handle"))?;
        block.touch();
        let (offset, size) = (block.offset(), block.size());
        Ok(f(&mut state.buffer[offset..offset + size]))
    }

    /// True once the union of allocated and free spans covers the whole
    /// pool with no overlap - the universal invariant exercised by tests.
    pub fn is_consistent(&self) -> bool {
        let state = self.state.lock();
        let mut spans: Vec<(usize, usize)> = state
            .blocks
            .values()
            .map(|b| (b.offset(), b.size()))
            .chain(state.free_list.iter().map(|(&o, &s)| (o, s)))
            .collect();
        spans.sort_by_key(|&(o, _)| o);
        let mut cursor = 0usize;
        for (offset, size) in spans {
            if offset != cursor {
                return false;
            }
            cursor += size;
        }
        cursor == state.pool_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(size: usize) -> SharedMemoryPool {
        SharedMemoryPool::new(size, GcThresholds::default()).unwrap()
    }

    #[test]
    fn allocation_is_aligned_and_in_bounds() {
        let pool = pool(1 << 20);
        let handle = pool
            .allocate(100, AllocationKind::Float32, HardwareProfile::Cpu, None)
            .unwrap();
        let state = pool.state.lock();
        let block = &state.blocks[&handle.0];
        assert_eq!(block.offset() % block.alignment().bytes(), 0);
        assert!(block.offset() + block.size() <= state.pool_size);
    }

    #[test]
    fn allocations_never_overlap() {
        let pool = pool(1 << 16);
        let a = pool
            .allocate(512, AllocationKind::Embedding, HardwareProfile::Cpu, None)
            .unwrap();
        let b = pool
            .allocate(512, AllocationKind::Embedding, HardwareProfile::Cpu, None)
            .unwrap();
        let state = pool.state.lock();
        let (ba, bb) = (&state.blocks[&a.0], &state.blocks[&b.0]);
        assert!(!ba.overlaps(bb));
    }

    #[test]
    fn pool_stays_consistent_after_alloc_and_free() {
        let pool = pool(1 << 16);
        let a = pool
            .allocate(1024, AllocationKind::Tensor, HardwareProfile::Gpu, None)
            .unwrap();
        assert!(pool.is_consistent());
        pool.free(a).unwrap();
        assert!(pool.is_consistent());
    }

    #[test]
    fn out_of_memory_when_too_large() {
        let pool = pool(1024);
        let result = pool.allocate(2048, AllocationKind::Int8, HardwareProfile::Cpu, None);
        assert!(matches!(result, Err(InferenceError::OutOfMemory(_))));
    }

    #[test]
    fn compaction_leaves_one_trailing_free_block() {
        let pool = pool(1 << 16);
        let mut handles = Vec::new();
        for _ in 0..8 {
            handles.push(
                pool.allocate(1024, AllocationKind::Embedding, HardwareProfile::Cpu, None)
                    .unwrap(),
            );
        }
        for (index, handle) in handles.into_iter().enumerate() {
            if index % 2 == 0 {
                pool.free(handle).unwrap();
            }
        }
        {
            let mut state = pool.state.lock();
            state.compact();
        }
        let state = pool.state.lock();
        assert!(state.free_list.len() <= 1);
        assert!(pool.is_consistent());
    }

    #[test]
    fn with_bytes_resolves_current_offset_after_compaction() {
        let pool = pool(1 << 16);
        let a = pool
            .allocate(64, AllocationKind::Embedding, HardwareProfile::Cpu, None)
            .unwrap();
        pool.with_bytes_mut(a, |bytes| bytes.fill(7)).unwrap();
        {
            let mut state = pool.state.lock();
            state.compact();
        }
        pool.with_bytes(a, |bytes| assert!(bytes.iter().all(|&b| b == 7))).unwrap();
    }
}
