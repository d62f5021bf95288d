// Consensus-critical. Changes require a protocol version bump + tests.
//! Block-level proof validation.
//!
//! Ties the difficulty, proof-of-work and proof-of-stake rules together for a
//! block connecting on top of `prev`. Script, merkle and value rules are the
//! caller's job.

use crate::error::ConsensusError;
use crate::kernel::StakeProof;
use crate::pow::validate_pow;
use crate::retarget::next_target_required;
use crate::stake::{check_proof_of_stake, StakeContext};
use hybra_core::{
    AdjustedTime, Block, BlockIndex, ChainView, CoinView, Hash32, ProofKind, MEDIAN_TIME_SPAN,
};
use tracing::debug;

/// Proof a block was accepted with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockProof {
    /// Header hash met the work target.
    Work {
        /// Proof-of-work hash of the header.
        hash: Hash32,
    },
    /// Coinstake kernel met the weighted stake target.
    Stake(StakeProof),
}

/// Check if a candidate timestamp is within an absolute drift window.
///
/// Pure helper (no system clock access).
pub fn is_timestamp_within_drift(candidate: i64, reference: i64, max_drift_secs: i64) -> bool {
    candidate.abs_diff(reference) <= max_drift_secs.unsigned_abs()
}

/// Median time of `block` and up to ten of its ancestors.
pub fn median_time_past<C: ChainView + ?Sized>(chain: &C, block: &BlockIndex) -> i64 {
    let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
    let mut cur = Some(block);
    while let Some(b) = cur {
        if times.len() == MEDIAN_TIME_SPAN {
            break;
        }
        times.push(b.block_time());
        cur = chain.parent(b);
    }
    times.sort_unstable();
    times[times.len() / 2]
}

/// Validate the proof carried by `block` as the successor of `prev`.
///
/// Checks, in order:
/// - header time above the median time past of `prev`
/// - `bits` equal to the target required for the block's proof kind
/// - proof-of-work for work blocks, the full stake rules for stake blocks
pub fn validate_block_proof<V, U, T>(
    ctx: &StakeContext<'_, V, U>,
    clock: &T,
    prev: Option<&BlockIndex>,
    block: &Block,
) -> Result<BlockProof, ConsensusError>
where
    V: ChainView + ?Sized,
    U: CoinView + ?Sized,
    T: AdjustedTime + ?Sized,
{
    let header = &block.header;
    let kind = block.proof_kind();

    if let Some(prev) = prev {
        if i64::from(header.time) <= median_time_past(ctx.chain, prev) {
            return Err(ConsensusError::InvalidTimestamp("block time not above median time past"));
        }
    }

    let required = next_target_required(ctx.chain, prev, kind, ctx.params)?;
    if header.bits != required {
        debug!(
            bits = format_args!("{:#010x}", header.bits),
            required = format_args!("{required:#010x}"),
            ?kind,
            "unexpected difficulty bits"
        );
        return Err(ConsensusError::TargetOutOfRange("bits differ from required target"));
    }

    match kind {
        ProofKind::Work => Ok(BlockProof::Work {
            hash: validate_pow(header, ctx.params)?,
        }),
        ProofKind::Stake => {
            let prev = prev.ok_or(ConsensusError::MalformedStakeTransaction(
                "genesis cannot be proof of stake",
            ))?;
            let tx = block
                .coinstake()
                .ok_or(ConsensusError::MalformedStakeTransaction("missing coinstake"))?;
            check_proof_of_stake(ctx, clock, prev, tx, header.bits, header.time).map(BlockProof::Stake)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(times: &[u32]) -> Vec<BlockIndex> {
        times
            .iter()
            .enumerate()
            .map(|(h, &time)| BlockIndex {
                hash: Hash32([h as u8; 32]),
                height: h as u64,
                time,
                bits: 0x207f_ffff,
                proof: ProofKind::Work,
                stake_modifier: Hash32::zero(),
            })
            .collect()
    }

    #[test]
    fn timestamp_drift_within_window() {
        let now = 1_000_000i64;
        let drift = 2 * 60 * 60;
        assert!(is_timestamp_within_drift(now + drift, now, drift));
        assert!(is_timestamp_within_drift(now - drift, now, drift));
    }

    #[test]
    fn timestamp_drift_outside_window() {
        let now = 1_000_000i64;
        let drift = 2 * 60 * 60;
        assert!(!is_timestamp_within_drift(now + drift + 1, now, drift));
        assert!(!is_timestamp_within_drift(now - drift - 1, now, drift));
    }

    #[test]
    fn median_time_past_windowed() {
        let times: Vec<u32> = (0..20).collect();
        let c = chain(&times);
        // Median of heights 9..=19.
        assert_eq!(median_time_past(&c, &c[19]), 14);
    }

    #[test]
    fn median_time_past_short_chain() {
        let c = chain(&[100, 300, 200]);
        assert_eq!(median_time_past(&c, &c[2]), 200);
        assert_eq!(median_time_past(&c, &c[0]), 100);
    }

    #[test]
    fn median_ignores_unsorted_order() {
        let c = chain(&[5, 1, 4, 2, 3]);
        assert_eq!(median_time_past(&c, &c[4]), 3);
    }
}
