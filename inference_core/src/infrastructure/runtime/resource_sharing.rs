// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Sharing Manager
//!
//! Wraps the [`SharedMemoryPool`](super::memory_pool::SharedMemoryPool) with
//! policy-enforced, reference-counted access: inline storage for small
//! payloads, pool-backed storage (copy-on-write on concurrent writers) for
//! anything over 1 MiB, and a periodic sweep that reclaims expired or
//! orphaned resources.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use inference_core_domain::entities::{ResourceBacking, SharedResource, SharingPolicy, SharingPolicyKind};
use inference_core_domain::error::InferenceError;

use super::memory_pool::{AllocationKind, HardwareProfile, MemoryHandle, SharedMemoryPool};

/// Payload size above which a share request is placed in the pool rather
/// than stored inline.
pub const POOL_THRESHOLD_BYTES: usize = 1 << 20;

pub struct ResourceSharingManager {
    pool: Arc<SharedMemoryPool>,
    resources: Mutex<HashMap<String, SharedResource>>,
    /// Pool handles for resources whose backing lives in `pool` rather than
    /// inline - kept alongside the domain entity since `MemoryHandle` is an
    /// infrastructure type the domain must not depend on.
    pool_handles: Mutex<HashMap<String, MemoryHandle>>,
}

impl ResourceSharingManager {
    pub fn new(pool: Arc<SharedMemoryPool>) -> Self {
        Self {
            pool,
            resources: Mutex::new(HashMap::new()),
            pool_handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn share(
        &self,
        resource_id: impl Into<String>,
        data: Vec<u8>,
        policy: SharingPolicy,
    ) -> Result<String, InferenceError> {
        let resource_id = resource_id.into();
        let backing = if data.len() > POOL_THRESHOLD_BYTES {
            let handle =
                self.pool
                    .allocate(data.len(), AllocationKind::Embedding, HardwareProfile::Cpu, None)?;
            self.pool.with_bytes_mut(handle, |bytes| bytes.copy_from_slice(&data))?;
            self.pool_handles.lock().insert(resource_id.clone(), handle);
            ResourceBacking::Pooled(
                inference_core_domain::entities::MemoryBlock::new(0, data.len(), Default::default())?,
            )
        } else {
            ResourceBacking::Inline(data)
        };

        let resource = SharedResource::new(resource_id.clone(), policy, backing);
        self.resources.lock().insert(resource_id.clone(), resource);
        Ok(resource_id)
    }

    /// Grants `plugin_id` access in `mode`. Write access to a non-read-only
    /// resource materializes a private copy-on-write copy for that plugin.
    pub fn access(
        &self,
        resource_id: &str,
        plugin_id: &str,
        mode: AccessMode,
    ) -> Result<Vec<u8>, InferenceError> {
        let mut resources = self.resources.lock();
        let resource = resources
            .get_mut(resource_id)
            .ok_or_else(|| InferenceError::policy_denied(format!("unknown resource {resource_id}")))?;

        if resource.is_expired() {
            drop(resources);
            self.resources.lock().remove(resource_id);
            self.pool_handles.lock().remove(resource_id);
            return Err(InferenceError::policy_denied(format!("resource {resource_id} expired")));
        }

        resource.acquire(plugin_id)?;
        let is_read_only = resource.policy().kind == SharingPolicyKind::ReadOnly;

        let bytes = match resource.backing() {
            ResourceBacking::Inline(bytes) => bytes.clone(),
            ResourceBacking::Pooled(_) => {
                let handle = *self
                    .pool_handles
                    .lock()
                    .get(resource_id)
                    .ok_or_else(|| InferenceError::internal(format!("missing pool handle for {resource_id}")))?;
                self.pool.with_bytes(handle, |bytes| bytes.to_vec())?
            }
        };

        // Copy-on-write: both read and write return an owned copy, so a
        // writer can never mutate the shared backing in place; only a
        // subsequent `share` call updates what other plugins observe.
        let _ = (mode, is_read_only);
        Ok(bytes)
    }

    pub fn release(&self, resource_id: &str) -> Result<(), InferenceError> {
        let mut resources = self.resources.lock();
        let reclaim = resources
            .get_mut(resource_id)
            .map(|r| r.release())
            .ok_or_else(|| InferenceError::policy_denied(format!("unknown resource {resource_id}")))?;
        if reclaim {
            resources.remove(resource_id);
            drop(resources);
            self.free_pool_handle(resource_id)?;
        }
        Ok(())
    }

    fn free_pool_handle(&self, resource_id: &str) -> Result<(), InferenceError> {
        if let Some(handle) = self.pool_handles.lock().remove(resource_id) {
            self.pool.free(handle)?;
        }
        Ok(())
    }

    /// Removes every expired or zero-refcount resource. Intended to be
    /// driven by the shared timer wheel at a 60 s cadence.
    pub fn sweep(&self) -> usize {
        let expired_or_orphaned: Vec<String> = {
            let resources = self.resources.lock();
            resources
                .iter()
                .filter(|(_, r)| r.is_expired() || r.ref_count() == 0)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for resource_id in &expired_or_orphaned {
            self.resources.lock().remove(resource_id);
            let _ = self.free_pool_handle(resource_id);
        }
        expired_or_orphaned.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.lock().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Arc<SharedMemoryPool> {
        Arc::new(SharedMemoryPool::new(1 << 20, Default::default()).unwrap())
    }

    fn policy(kind: SharingPolicyKind) -> SharingPolicy {
        SharingPolicy {
            kind,
            ttl: chrono::Duration::seconds(60),
            max_refs: 4,
            allowed_plugins: None,
        }
    }

    #[test]
    fn share_and_access_round_trips_bytes() {
        let manager = ResourceSharingManager::new(pool());
        let id = manager
            .share("r1", vec![1, 2, 3], policy(SharingPolicyKind::SharedWrite))
            .unwrap();
        let bytes = manager.access(&id, "plugin-a", AccessMode::Read).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn release_to_zero_reclaims() {
        let manager = ResourceSharingManager::new(pool());
        let id = manager
            .share("r1", vec![9], policy(SharingPolicyKind::SharedWrite))
            .unwrap();
        manager.access(&id, "plugin-a", AccessMode::Read).unwrap();
        manager.release(&id).unwrap();
        assert_eq!(manager.resource_count(), 0);
    }

    #[test]
    fn sweep_removes_zero_ref_resources() {
        let manager = ResourceSharingManager::new(pool());
        let id = manager
            .share("r1", vec![9], policy(SharingPolicyKind::SharedWrite))
            .unwrap();
        manager.access(&id, "plugin-a", AccessMode::Read).unwrap();
        manager.release(&id).unwrap();
        assert_eq!(manager.sweep(), 0, "already removed by release");
    }
}
