// Consensus-critical. Changes require a protocol version bump + tests.
//! Next-target computation for the proof-of-work and proof-of-stake sequences.
//!
//! Each proof kind retargets against its own previous two blocks with an
//! exponential moving average toward the target spacing:
//!
//! `new = old * ((N - 1) * T + 2 * actual) / ((N + 1) * T)`
//!
//! where `N = timespan / T`. The observed spacing is counted twice; historical
//! difficulty depends on that, so the formula must stay as written.
//!
//! Products are computed exactly and never wrap at 256 bits. After protocol V3
//! the spacing clamp keeps every product in range, so results agree with
//! nodes using fixed-width arithmetic. Before V3 a very long gap on an easy
//! target can overflow 256 bits there, and the target recomputed here for that
//! history will differ from the one those nodes recorded.

use crate::difficulty::{bits_to_target, hash_to_target, target_to_bits};
use crate::error::ConsensusError;
use hybra_core::{BlockIndex, ChainParams, ChainView, ProofKind, MAX_SPACING_MULTIPLIER};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::trace;

/// Compact encoding of the proof-of-work limit, used before a retarget window exists.
pub fn genesis_bits(params: &ChainParams) -> Result<u32, ConsensusError> {
    target_to_bits(&hash_to_target(&params.pow_limit))
}

/// Compact target required for the block after `prev`.
///
/// `prev` is `None` when the next block is genesis. Until two earlier blocks of
/// the same kind exist the proof-of-work limit is returned.
pub fn next_target_required<C: ChainView + ?Sized>(
    chain: &C,
    prev: Option<&BlockIndex>,
    kind: ProofKind,
    params: &ChainParams,
) -> Result<u32, ConsensusError> {
    let Some(prev) = prev else {
        return genesis_bits(params);
    };

    let last = chain
        .last_block_of_kind(prev, kind)
        .ok_or(ConsensusError::InvalidChain("gap below previous block"))?;
    if last.height == 0 {
        return genesis_bits(params);
    }
    let last_parent = chain
        .parent(last)
        .ok_or(ConsensusError::InvalidChain("missing parent"))?;

    let prior = chain
        .last_block_of_kind(last_parent, kind)
        .ok_or(ConsensusError::InvalidChain("gap below retarget window"))?;
    if prior.height == 0 {
        return genesis_bits(params);
    }

    retarget(last, prior.block_time(), params)
}

/// Retarget from `last` given the time of the block of the same kind before it.
pub fn retarget(
    last: &BlockIndex,
    first_block_time: i64,
    params: &ChainParams,
) -> Result<u32, ConsensusError> {
    if params.pow_no_retargeting {
        return Ok(last.bits);
    }

    let last_time = last.block_time();
    let spacing = params.target_spacing_at(last_time);
    if spacing <= 0 || params.target_timespan < spacing {
        return Err(ConsensusError::InvalidParams("target spacing out of range"));
    }

    // Clamp the observed spacing against timestamp manipulation.
    let mut actual = last_time - first_block_time;
    if last_time > params.protocol_v1_retargeting_fixed_time && actual < 0 {
        actual = spacing;
    }
    let max_spacing = spacing.saturating_mul(MAX_SPACING_MULTIPLIER);
    if params.is_protocol_v3(last_time) && actual > max_spacing {
        actual = max_spacing;
    }

    let limit = hash_to_target(params.target_limit(last_time, last.proof));
    let old = bits_to_target(last.bits)?;

    let interval = i128::from(params.target_timespan / spacing);
    let spacing = i128::from(spacing);
    let numerator = (interval - 1) * spacing + 2 * i128::from(actual);
    let denominator = (interval + 1) * spacing;

    // Widened arithmetic: the product never wraps, so the limit clamp sees the true value.
    let new = match u128::try_from(numerator) {
        Ok(n) if n > 0 => (old * BigUint::from(n)) / BigUint::from(denominator.unsigned_abs()),
        _ => BigUint::zero(),
    };

    trace!(
        height = last.height,
        actual,
        numerator = %numerator,
        denominator = %denominator,
        "retarget"
    );

    if new.is_zero() || new > limit {
        return target_to_bits(&limit);
    }
    target_to_bits(&new)
}
