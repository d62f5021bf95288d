// Consensus-critical. Changes require a protocol version bump + tests.
//! Proof-of-work validation.
//!
//! The PoW hash is the double SHA-256 of the 80-byte block header.
//! The PoW condition is:
//!     header_hash_as_u256 <= target(bits) <= pow_limit

use crate::difficulty::{bits_to_target, hash_meets_target, hash_to_target};
use crate::error::ConsensusError;
use hybra_core::{block_header_hash, BlockHeader, ChainParams, Hash32};
use tracing::debug;

/// Compute the canonical PoW hash for a header.
pub fn pow_hash(header: &BlockHeader) -> Result<Hash32, ConsensusError> {
    block_header_hash(header).map_err(|_| ConsensusError::InvalidChain("header hashing failed"))
}

/// Range-check `bits` against `pow_limit`, then check `hash <= target(bits)`.
pub fn check_proof_of_work(
    hash: &Hash32,
    bits: u32,
    pow_limit: &Hash32,
) -> Result<(), ConsensusError> {
    let target = bits_to_target(bits)?;
    if target > hash_to_target(pow_limit) {
        return Err(ConsensusError::TargetOutOfRange("target above proof-of-work limit"));
    }

    if !hash_meets_target(hash, &target) {
        debug!(%hash, bits = format_args!("{bits:#010x}"), "proof of work above target");
        return Err(ConsensusError::InsufficientWork);
    }
    Ok(())
}

/// Validate proof-of-work for a header against the network's limit.
pub fn validate_pow(header: &BlockHeader, params: &ChainParams) -> Result<Hash32, ConsensusError> {
    let hash = pow_hash(header)?;
    check_proof_of_work(&hash, header.bits, &params.pow_limit)?;
    Ok(hash)
}
