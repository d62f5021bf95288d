//! Session-scoped stake input cache.
//!
//! A stake search checks the same outputs against many candidate timestamps.
//! Resolving an output's confirming-block time and value walks the chain and
//! the UTXO set; the cache remembers the result for the rest of the session.
//! A confirmed output's origin time and value never change, so entries are
//! never overwritten or evicted. Drop the cache when the session ends.

use crate::stake::{resolve_stake_input, StakeContext};
use hybra_core::{Amount, BlockIndex, ChainView, CoinView, OutPoint};
use std::collections::HashMap;
use tracing::trace;

/// What the kernel needs to know about a staked output.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StakeCacheEntry {
    /// Time of the block that confirmed the output.
    pub block_from_time: u32,
    /// Output value.
    pub amount: Amount,
}

/// Memo capability consulted by [`crate::check_kernel`].
pub trait KernelCache {
    /// Cached entry for `prevout`.
    fn get(&self, prevout: &OutPoint) -> Option<StakeCacheEntry>;

    /// Record `entry` unless `prevout` is already present.
    fn insert(&mut self, prevout: OutPoint, entry: StakeCacheEntry);
}

/// Per-session memo of resolved stake inputs.
#[derive(Clone, Debug, Default)]
pub struct StakeCache {
    entries: HashMap<OutPoint, StakeCacheEntry>,
}

impl StakeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached outputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `prevout` against `prev` and cache it if absent.
    ///
    /// Outputs that do not resolve (missing, spent, immature) are skipped.
    /// Repeated calls for the same output are no-ops.
    pub fn cache_kernel<V, U>(
        &mut self,
        ctx: &StakeContext<'_, V, U>,
        prev: &BlockIndex,
        prevout: &OutPoint,
    ) where
        V: ChainView + ?Sized,
        U: CoinView + ?Sized,
    {
        if self.entries.contains_key(prevout) {
            return;
        }
        match resolve_stake_input(ctx, prev, prevout) {
            Ok(entry) => {
                self.entries.insert(*prevout, entry);
            }
            Err(err) => trace!(%prevout, %err, "stake input not cached"),
        }
    }
}

impl KernelCache for StakeCache {
    fn get(&self, prevout: &OutPoint) -> Option<StakeCacheEntry> {
        self.entries.get(prevout).copied()
    }

    fn insert(&mut self, prevout: OutPoint, entry: StakeCacheEntry) {
        self.entries.entry(prevout).or_insert(entry);
    }
}

/// Cache stand-in that remembers nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl KernelCache for NoCache {
    fn get(&self, _prevout: &OutPoint) -> Option<StakeCacheEntry> {
        None
    }

    fn insert(&mut self, _prevout: OutPoint, _entry: StakeCacheEntry) {}
}
