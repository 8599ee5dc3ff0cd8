// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Resource
//!
//! A reference-counted, policy-governed handle to either an inline value or
//! a pool-backed allocation. The Resource Sharing Manager is the only
//! writer of `ref_count`; this entity just enforces the invariant that it
//! never leaves `[0, policy.max_refs]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::memory_block::MemoryBlock;
use crate::error::InferenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SharingPolicyKind {
    ReadOnly,
    SharedWrite,
    Exclusive,
    EmbeddingCache,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingPolicy {
    pub kind: SharingPolicyKind,
    pub ttl: chrono::Duration,
    pub max_refs: u32,
    pub allowed_plugins: Option<Vec<String>>,
}

impl SharingPolicy {
    pub fn allows(&self, plugin_id: &str) -> bool {
        match &self.allowed_plugins {
            Some(allowed) => allowed.iter().any(|p| p == plugin_id),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResourceBacking {
    Inline(Vec<u8>),
    Pooled(MemoryBlock),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedResource {
    resource_id: String,
    policy: SharingPolicy,
    ref_count: u32,
    created_at: DateTime<Utc>,
    backing: ResourceBacking,
    access_log: Vec<DateTime<Utc>>,
}

impl SharedResource {
    pub fn new(resource_id: impl Into<String>, policy: SharingPolicy, backing: ResourceBacking) -> Self {
        Self {
            resource_id: resource_id.into(),
            policy,
            ref_count: 0,
            created_at: Utc::now(),
            backing,
            access_log: Vec::new(),
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn policy(&self) -> &SharingPolicy {
        &self.policy
    }

    pub fn backing(&self) -> &ResourceBacking {
        &self.backing
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() - self.created_at > self.policy.ttl
    }

    pub fn acquire(&mut self, plugin_id: &str) -> Result<(), InferenceError> {
        if !self.policy.allows(plugin_id) {
            return Err(InferenceError::policy_denied(format!(
                "plugin {plugin_id} is not permitted to access {}",
                self.resource_id
            )));
        }
        if self.is_expired() {
            return Err(InferenceError::policy_denied(format!(
                "resource {} has expired",
                self.resource_id
            )));
        }
        if self.ref_count >= self.policy.max_refs {
            return Err(InferenceError::policy_denied(format!(
                "resource {} is at its max ref count",
                self.resource_id
            )));
        }
        self.ref_count += 1;
        self.access_log.push(Utc::now());
        Ok(())
    }

    /// Releases one reference. Returns `true` when the resource is now
    /// eligible for reclaim.
    pub fn release(&mut self) -> bool {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_refs: u32) -> SharingPolicy {
        SharingPolicy {
            kind: SharingPolicyKind::SharedWrite,
            ttl: chrono::Duration::seconds(60),
            max_refs,
            allowed_plugins: None,
        }
    }

    #[test]
    fn ref_count_never_exceeds_max() {
        let mut resource = SharedResource::new("r1", policy(1), ResourceBacking::Inline(vec![]));
        resource.acquire("plugin-a").unwrap();
        assert!(resource.acquire("plugin-b").is_err());
    }

    #[test]
    fn release_to_zero_is_reclaimable() {
        let mut resource = SharedResource::new("r1", policy(2), ResourceBacking::Inline(vec![]));
        resource.acquire("plugin-a").unwrap();
        assert!(!resource.release());
        resource.acquire("plugin-a").unwrap();
        resource.acquire("plugin-a").is_err();
    }

    #[test]
    fn plugin_filter_rejects_unlisted() {
        let mut guarded = policy(5);
        guarded.allowed_plugins = Some(vec!["trusted".to_string()]);
        let mut resource = SharedResource::new("r1", guarded, ResourceBacking::Inline(vec![]));
        assert!(resource.acquire("untrusted").is_err());
        assert!(resource.acquire("trusted").is_ok());
    }
}
