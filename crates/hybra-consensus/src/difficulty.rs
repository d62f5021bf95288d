// Consensus-critical. Changes require a protocol version bump + tests.
//! Difficulty target utilities.
//!
//! Targets travel in block headers in the "compact" encoding:
//! `bits = (size << 24) | mantissa`, where bit 23 of the mantissa is a sign
//! flag and the target is `mantissa * 256^(size - 3)`.
//!
//! Decoding reports the sign and overflow flags instead of silently wrapping,
//! and every target used by validation fits in 256 bits. No floats.

use crate::error::ConsensusError;
use hybra_core::Hash32;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Raw result of decoding compact bits, flags included.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CompactTarget {
    /// Decoded magnitude, truncated to 256 bits.
    pub target: BigUint,
    /// Sign bit set on a non-zero mantissa.
    pub negative: bool,
    /// Magnitude does not fit in 256 bits.
    pub overflow: bool,
}

/// Largest 256-bit value.
pub fn max_target() -> BigUint {
    (BigUint::one() << 256u32) - BigUint::one()
}

/// Decode compact `bits` exactly as the network does, reporting flags.
pub fn decode_compact(bits: u32) -> CompactTarget {
    let size = bits >> 24;
    let mut word = bits & MANTISSA_MASK;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        BigUint::from(word)
    } else {
        BigUint::from(word) << (8 * (size - 3))
    };

    let negative = word != 0 && (bits & SIGN_BIT) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    CompactTarget {
        target: target & max_target(),
        negative,
        overflow,
    }
}

/// Decode compact `bits` to a usable target.
///
/// Rejects encodings that are negative, overflow 256 bits, or represent zero.
pub fn bits_to_target(bits: u32) -> Result<BigUint, ConsensusError> {
    let decoded = decode_compact(bits);
    if decoded.negative {
        return Err(ConsensusError::TargetOutOfRange("negative target"));
    }
    if decoded.overflow {
        return Err(ConsensusError::TargetOutOfRange("target overflows 256 bits"));
    }
    if decoded.target.is_zero() {
        return Err(ConsensusError::TargetOutOfRange("zero target"));
    }
    Ok(decoded.target)
}

/// Encode a target into normalized compact `bits`.
///
/// Precision below the top three significant bytes is dropped, so
/// `bits_to_target(target_to_bits(x)) <= x`, with equality for every value
/// the compact format can represent.
pub fn target_to_bits(target: &BigUint) -> Result<u32, ConsensusError> {
    if target.is_zero() {
        return Err(ConsensusError::TargetOutOfRange("zero target"));
    }
    if target.bits() > 256 {
        return Err(ConsensusError::TargetOutOfRange("target overflows 256 bits"));
    }

    // Number of significant bytes; at most 32 here.
    let mut size = ((target.bits() + 7) / 8) as u32;
    let shifted = if size <= 3 {
        target << (8 * (3 - size))
    } else {
        target >> (8 * (size - 3))
    };
    let mut compact = shifted
        .to_u32()
        .ok_or(ConsensusError::TargetOutOfRange("mantissa does not fit"))?;

    // Keep the sign bit clear by moving one byte into the exponent.
    if compact & SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    Ok(compact | (size << 24))
}

/// Numeric value of a hash (little-endian over internal bytes).
pub fn hash_to_target(hash: &Hash32) -> BigUint {
    BigUint::from_bytes_le(hash.as_bytes())
}

/// Hash-shaped encoding of a 256-bit value; `None` if it does not fit.
pub fn target_to_hash(target: &BigUint) -> Option<Hash32> {
    if target.bits() > 256 {
        return None;
    }
    let le = target.to_bytes_le();
    let mut arr = [0u8; 32];
    arr[..le.len()].copy_from_slice(&le);
    Some(Hash32(arr))
}

/// Compare a hash with a target.
/// Returns `true` if `hash <= target`.
pub fn hash_meets_target(hash: &Hash32, target: &BigUint) -> bool {
    hash_to_target(hash) <= *target
}
