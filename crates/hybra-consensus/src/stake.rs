// Consensus-critical. Changes require a protocol version bump + tests.
//! Proof-of-stake validation.
//!
//! A coinstake is accepted when its first input resolves to an unspent,
//! mature output on the branch being validated, its timestamps follow the
//! alignment and drift rules, and the coin-weighted kernel meets the target.
//! The first failing check decides the rejection.

use crate::cache::StakeCacheEntry;
use crate::confirm::is_confirmed_within_depth;
use crate::error::ConsensusError;
use crate::kernel::{check_stake_kernel_hash, StakeProof};
use hybra_core::{
    AdjustedTime, BlockIndex, ChainParams, ChainView, CoinView, OutPoint, Transaction,
};
use tracing::{debug, trace};

/// Read-only collaborators consulted by the stake rules.
pub struct StakeContext<'a, V: ?Sized, U: ?Sized> {
    /// Branch being validated.
    pub chain: &'a V,
    /// UTXO view for that branch.
    pub coins: &'a U,
    /// Network parameters.
    pub params: &'a ChainParams,
}

impl<'a, V: ?Sized, U: ?Sized> StakeContext<'a, V, U> {
    /// Bundle the collaborators.
    pub fn new(chain: &'a V, coins: &'a U, params: &'a ChainParams) -> Self {
        Self { chain, coins, params }
    }
}

impl<V: ?Sized, U: ?Sized> Clone for StakeContext<'_, V, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: ?Sized, U: ?Sized> Copy for StakeContext<'_, V, U> {}

/// Resolve a staked output to its confirming-block time and value.
///
/// The output must be unspent, confirmed on the branch ending at `prev`, and
/// buried deeper than the minimum stake confirmations.
pub fn resolve_stake_input<V, U>(
    ctx: &StakeContext<'_, V, U>,
    prev: &BlockIndex,
    prevout: &OutPoint,
) -> Result<StakeCacheEntry, ConsensusError>
where
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
{
    let coin = match ctx.coins.coin(prevout) {
        Some(coin) if !coin.spent => coin,
        _ => return Err(ConsensusError::MissingOrSpentInput),
    };

    let block_from = ctx
        .chain
        .ancestor(prev, coin.height)
        .filter(|b| b.hash == coin.block_hash)
        .ok_or(ConsensusError::MissingOrSpentInput)?;

    // Found within `min_confirmations - 1` blocks means too young. The window
    // below is inclusive, hence the extra one.
    if let Some(window) = ctx.params.stake_min_confirmations.checked_sub(2) {
        if let Some(depth) = is_confirmed_within_depth(ctx.chain, &coin.position(), prev, window) {
            return Err(ConsensusError::StakeNotMature { depth: depth + 1 });
        }
    }

    trace!(
        %prevout,
        height = coin.height,
        coinbase = coin.is_coinbase,
        coinstake = coin.is_coinstake,
        "stake input resolved"
    );
    Ok(StakeCacheEntry {
        block_from_time: block_from.time,
        amount: coin.output.value,
    })
}

fn is_aligned(time: u32, mask: u32) -> bool {
    time & mask == 0
}

/// Coinstake time must equal the block time, both mask-aligned.
pub fn check_coinstake_timestamp(
    block_time: u32,
    tx_time: u32,
    params: &ChainParams,
) -> Result<(), ConsensusError> {
    if block_time != tx_time {
        return Err(ConsensusError::InvalidTimestamp("coinstake time differs from block time"));
    }
    if !is_aligned(block_time, params.stake_timestamp_mask) {
        return Err(ConsensusError::InvalidTimestamp("timestamp not mask-aligned"));
    }
    Ok(())
}

/// Stake block time must be mask-aligned and not too far past `now`.
pub fn check_stake_block_timestamp(
    block_time: u32,
    now: i64,
    params: &ChainParams,
) -> Result<(), ConsensusError> {
    if !is_aligned(block_time, params.stake_timestamp_mask) {
        return Err(ConsensusError::InvalidTimestamp("timestamp not mask-aligned"));
    }
    if i64::from(block_time) > params.future_drift(now) {
        return Err(ConsensusError::InvalidTimestamp("block time too far in the future"));
    }
    Ok(())
}

/// Validate a coinstake against the block it would extend.
///
/// `prev` is the block the new block builds on, `bits` the new block's target
/// and `block_time` its timestamp. Inputs are resolved fresh; use
/// [`crate::check_kernel`] with a [`crate::StakeCache`] when probing repeatedly.
pub fn check_proof_of_stake<V, U, T>(
    ctx: &StakeContext<'_, V, U>,
    clock: &T,
    prev: &BlockIndex,
    tx: &Transaction,
    bits: u32,
    block_time: u32,
) -> Result<StakeProof, ConsensusError>
where
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
    T: AdjustedTime + ?Sized,
{
    let res = check_proof_of_stake_inner(ctx, clock, prev, tx, bits, block_time);
    if let Err(err) = &res {
        debug!(
            height = prev.height.saturating_add(1),
            reason = ?err.reason(),
            %err,
            "proof of stake rejected"
        );
    }
    res
}

fn check_proof_of_stake_inner<V, U, T>(
    ctx: &StakeContext<'_, V, U>,
    clock: &T,
    prev: &BlockIndex,
    tx: &Transaction,
    bits: u32,
    block_time: u32,
) -> Result<StakeProof, ConsensusError>
where
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
    T: AdjustedTime + ?Sized,
{
    if !tx.is_coinstake() {
        return Err(ConsensusError::MalformedStakeTransaction("not a coinstake"));
    }
    tx.validate_sanity()
        .map_err(|_| ConsensusError::MalformedStakeTransaction("coinstake failed sanity checks"))?;
    let prevout = tx
        .inputs
        .first()
        .map(|input| input.prevout)
        .ok_or(ConsensusError::MalformedStakeTransaction("coinstake has no inputs"))?;

    let entry = resolve_stake_input(ctx, prev, &prevout)?;

    check_coinstake_timestamp(block_time, tx.time, ctx.params)?;
    check_stake_block_timestamp(block_time, clock.adjusted_time(), ctx.params)?;

    let kernel_hash = check_stake_kernel_hash(
        prev,
        bits,
        entry.block_from_time,
        entry.amount,
        &prevout,
        block_time,
    )?;
    Ok(StakeProof {
        kernel_hash,
        timestamp: block_time,
        block_from_time: entry.block_from_time,
        amount: entry.amount,
    })
}
