// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Tier Identifier
//!
//! Identifies one of the three embedding cache tiers. `Ord` is derived in
//! lock-acquisition order (L3 < L2 < L1), not capacity order, so that a
//! `Vec<CacheTierId>` sorted ascending is always safe to lock in sequence -
//! the Promotion Manager and Cache Statistics Monitor both rely on this to
//! avoid the classic promote-while-holding-the-wrong-order deadlock.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheTierId {
    L3,
    L2,
    L1,
}

impl CacheTierId {
    /// Lock-acquisition order: always take locks in this sequence to avoid
    /// deadlocking against a concurrent promotion/demotion.
    pub const LOCK_ORDER: [CacheTierId; 3] = [CacheTierId::L3, CacheTierId::L2, CacheTierId::L1];

    /// The tier an entry is promoted into from this one, if any.
    pub fn promotes_to(&self) -> Option<CacheTierId> {
        match self {
            CacheTierId::L3 => Some(CacheTierId::L2),
            CacheTierId::L2 => Some(CacheTierId::L1),
            CacheTierId::L1 => None,
        }
    }

    /// The tier an entry is demoted into from this one, if any.
    pub fn demotes_to(&self) -> Option<CacheTierId> {
        match self {
            CacheTierId::L1 => Some(CacheTierId::L2),
            CacheTierId::L2 => Some(CacheTierId::L3),
            CacheTierId::L3 => None,
        }
    }
}

impl fmt::Display for CacheTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheTierId::L1 => "l1",
            CacheTierId::L2 => "l2",
            CacheTierId::L3 => "l3",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_is_l3_l2_l1() {
        let mut tiers = vec![CacheTierId::L1, CacheTierId::L3, CacheTierId::L2];
        tiers.sort();
        assert_eq!(tiers, CacheTierId::LOCK_ORDER.to_vec());
    }

    #[test]
    fn promotion_and_demotion_are_inverses() {
        assert_eq!(CacheTierId::L3.promotes_to(), Some(CacheTierId::L2));
        assert_eq!(CacheTierId::L2.demotes_to(), Some(CacheTierId::L3));
        assert_eq!(CacheTierId::L1.promotes_to(), None);
        assert_eq!(CacheTierId::L3.demotes_to(), None);
    }
}
