//! Read-only collaborator interfaces consumed by the consensus rules.
//!
//! Chain storage, the UTXO set and the network clock live outside the
//! consensus crate. These traits are the only way consensus reads them.

use crate::types::{BlockHash, BlockIndex, BlockPosition, OutPoint, ProofKind, TxOut};
use time::OffsetDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Height-indexed view of one chain branch.
///
/// `block_at(h)` returns the block at height `h` on the branch being
/// validated. The parent of a block at height `h` is the block at `h - 1`.
pub trait ChainView {
    /// Block at `height` on this branch.
    fn block_at(&self, height: u64) -> Option<&BlockIndex>;

    /// Parent of `block`, or `None` for genesis.
    fn parent(&self, block: &BlockIndex) -> Option<&BlockIndex> {
        let h = block.height.checked_sub(1)?;
        self.block_at(h)
    }

    /// Ancestor of `from` at `height`; `None` if `height` is above `from`.
    fn ancestor(&self, from: &BlockIndex, height: u64) -> Option<&BlockIndex> {
        if height > from.height {
            return None;
        }
        if height == from.height {
            return self.block_at(height).filter(|b| b.hash == from.hash);
        }
        self.block_at(height)
    }

    /// Walk back from `block` to the most recent block of `kind`.
    ///
    /// Stops at genesis, which is returned when no block of `kind` exists.
    /// Returns `None` if the branch has a gap below `block`.
    fn last_block_of_kind<'a>(
        &'a self,
        block: &'a BlockIndex,
        kind: ProofKind,
    ) -> Option<&'a BlockIndex> {
        let mut cur = block;
        while cur.proof != kind && cur.height > 0 {
            cur = self.parent(cur)?;
        }
        Some(cur)
    }
}

/// Unspent (or spent) output as known to the UTXO collaborator.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coin {
    /// The output itself.
    pub output: TxOut,
    /// Height of the block that confirmed the output.
    pub height: u64,
    /// Hash of the block that confirmed the output.
    pub block_hash: BlockHash,
    /// Created by a coinbase.
    pub is_coinbase: bool,
    /// Created by a coinstake.
    pub is_coinstake: bool,
    /// Already consumed by a later transaction.
    pub spent: bool,
}

impl Coin {
    /// Position of the confirming block.
    pub fn position(&self) -> BlockPosition {
        BlockPosition {
            height: self.height,
            hash: self.block_hash,
        }
    }
}

/// Point lookup into the UTXO set.
pub trait CoinView {
    /// Coin for `outpoint`, or `None` if it never existed on this branch.
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}

/// Source of network-adjusted time (Unix seconds).
pub trait AdjustedTime {
    /// Current network-adjusted time.
    fn adjusted_time(&self) -> i64;
}

/// Local wall clock with no peer offset applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl AdjustedTime for SystemClock {
    fn adjusted_time(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp().max(0)
    }
}

/// Constant clock, for replaying historical blocks and for tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub i64);

impl AdjustedTime for FixedClock {
    fn adjusted_time(&self) -> i64 {
        self.0
    }
}

impl<T: ChainView + ?Sized> ChainView for &T {
    fn block_at(&self, height: u64) -> Option<&BlockIndex> {
        (**self).block_at(height)
    }
}

impl<T: CoinView + ?Sized> CoinView for &T {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        (**self).coin(outpoint)
    }
}

impl ChainView for [BlockIndex] {
    fn block_at(&self, height: u64) -> Option<&BlockIndex> {
        let idx = usize::try_from(height).ok()?;
        self.get(idx).filter(|b| b.height == height)
    }
}

impl ChainView for Vec<BlockIndex> {
    fn block_at(&self, height: u64) -> Option<&BlockIndex> {
        self.as_slice().block_at(height)
    }
}
