// Consensus-critical. Changes require a protocol version bump + tests.
//! Proof-of-stake kernel.
//!
//! A staked output satisfies the kernel when
//!
//! `SHA256d(modifier || block_from_time || txid || vout || time) <= target(bits) * amount`
//!
//! The target grows linearly with the staked amount, so the chance of finding
//! a kernel at a given timestamp is proportional to the value held.

use crate::cache::KernelCache;
use crate::difficulty::{bits_to_target, hash_meets_target, max_target};
use crate::error::ConsensusError;
use crate::stake::{resolve_stake_input, StakeContext};
use borsh::{BorshDeserialize, BorshSerialize};
use hybra_core::{
    sha256d, Amount, BlockIndex, ChainView, CoinView, Hash32, OutPoint, KERNEL_INPUT_LEN,
};
use num_bigint::BigUint;
use tracing::{debug, trace};

/// Fields hashed into the kernel, in network order.
///
/// The Borsh encoding of this struct is the kernel preimage.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
pub struct KernelInput {
    /// Stake modifier of the block the new block builds on.
    pub stake_modifier: Hash32,
    /// Time of the block that confirmed the staked output.
    pub block_from_time: u32,
    /// The staked output.
    pub prevout: OutPoint,
    /// Candidate block/coinstake time.
    pub time: u32,
}

impl KernelInput {
    /// Fixed 76-byte preimage: little-endian integers, hashes in internal order.
    pub fn to_bytes(&self) -> [u8; KERNEL_INPUT_LEN] {
        let mut out = [0u8; KERNEL_INPUT_LEN];
        out[0..32].copy_from_slice(self.stake_modifier.as_bytes());
        out[32..36].copy_from_slice(&self.block_from_time.to_le_bytes());
        out[36..68].copy_from_slice(self.prevout.txid.as_bytes());
        out[68..72].copy_from_slice(&self.prevout.vout.to_le_bytes());
        out[72..76].copy_from_slice(&self.time.to_le_bytes());
        out
    }

    /// Kernel hash of this input.
    pub fn hash(&self) -> Hash32 {
        sha256d(&self.to_bytes())
    }
}

/// Accepted proof of stake.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StakeProof {
    /// Kernel hash that met the weighted target.
    pub kernel_hash: Hash32,
    /// Timestamp the kernel was satisfied at.
    pub timestamp: u32,
    /// Time of the block that confirmed the staked output.
    pub block_from_time: u32,
    /// Value of the staked output.
    pub amount: Amount,
}

/// Kernel hash for a staked output at candidate `time`.
pub fn kernel_hash(
    stake_modifier: &Hash32,
    block_from_time: u32,
    prevout: &OutPoint,
    time: u32,
) -> Hash32 {
    KernelInput {
        stake_modifier: *stake_modifier,
        block_from_time,
        prevout: *prevout,
        time,
    }
    .hash()
}

/// `target * amount`, saturating at the largest 256-bit value.
pub fn weighted_target(target: &BigUint, amount: Amount) -> BigUint {
    let weighted = target * amount.atoms();
    let max = max_target();
    if weighted > max {
        max
    } else {
        weighted
    }
}

/// Check the coin-weighted kernel for one candidate timestamp.
///
/// Returns the kernel hash on success. Reads the stake modifier stored on
/// `prev`; never touches chain state otherwise.
pub fn check_stake_kernel_hash(
    prev: &BlockIndex,
    bits: u32,
    block_from_time: u32,
    amount: Amount,
    prevout: &OutPoint,
    time: u32,
) -> Result<Hash32, ConsensusError> {
    let target = bits_to_target(bits)?;

    if time < block_from_time {
        return Err(ConsensusError::InvalidTimestamp("kernel time before output confirmation"));
    }

    let weighted = weighted_target(&target, amount);
    let hash = kernel_hash(&prev.stake_modifier, block_from_time, prevout, time);

    trace!(
        %prevout,
        time,
        block_from_time,
        modifier = %prev.stake_modifier,
        kernel = %hash,
        "kernel hash"
    );

    if !hash_meets_target(&hash, &weighted) {
        return Err(ConsensusError::InvalidKernelHash);
    }
    Ok(hash)
}

/// Check the kernel for `prevout` at `time`, resolving the input through `cache`.
///
/// A cache hit skips the chain and UTXO walk. On a miss the input is resolved
/// through the collaborators and inserted. Pass [`crate::NoCache`] for a fresh
/// lookup on every call.
pub fn check_kernel<K, V, U>(
    cache: &mut K,
    ctx: &StakeContext<'_, V, U>,
    prev: &BlockIndex,
    bits: u32,
    time: u32,
    prevout: &OutPoint,
) -> Result<StakeProof, ConsensusError>
where
    K: KernelCache + ?Sized,
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
{
    let entry = match cache.get(prevout) {
        Some(entry) => entry,
        None => {
            let entry = resolve_stake_input(ctx, prev, prevout)?;
            cache.insert(*prevout, entry);
            entry
        }
    };

    let kernel_hash = check_stake_kernel_hash(
        prev,
        bits,
        entry.block_from_time,
        entry.amount,
        prevout,
        time,
    )?;

    Ok(StakeProof {
        kernel_hash,
        timestamp: time,
        block_from_time: entry.block_from_time,
        amount: entry.amount,
    })
}

/// First mask-aligned timestamp in `[from_time, to_time]` whose kernel meets the target.
///
/// This is the inner loop of stake minting; the caller bounds the range.
/// Only kernel misses and early timestamps keep the search going; any other
/// rejection ends it.
pub fn search_kernel<K, V, U>(
    cache: &mut K,
    ctx: &StakeContext<'_, V, U>,
    prev: &BlockIndex,
    bits: u32,
    prevout: &OutPoint,
    from_time: u32,
    to_time: u32,
) -> Result<Option<StakeProof>, ConsensusError>
where
    K: KernelCache + ?Sized,
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
{
    let mask = ctx.params.stake_timestamp_mask;
    let Some(mut time) = from_time.checked_add(mask).map(|t| t & !mask) else {
        return Ok(None);
    };

    while time <= to_time {
        match check_kernel(cache, ctx, prev, bits, time, prevout) {
            Ok(proof) => {
                debug!(%prevout, time, kernel = %proof.kernel_hash, "kernel found");
                return Ok(Some(proof));
            }
            Err(ConsensusError::InvalidKernelHash | ConsensusError::InvalidTimestamp(_)) => {}
            Err(err) => return Err(err),
        }
        time = match mask.checked_add(1).and_then(|step| time.checked_add(step)) {
            Some(t) => t,
            None => break,
        };
    }
    Ok(None)
}
