//! Protocol-wide constants for Hybra.

/// Length in bytes of a 32-byte hash.
pub const HASH32_LEN: usize = 32;

/// Serialized length of a block header (version, prev, merkle root, time, bits, nonce).
pub const BLOCK_HEADER_LEN: usize = 80;

/// Serialized length of the stake kernel input.
///
/// `modifier (32) || block_from_time (4) || txid (32) || vout (4) || time (4)`.
pub const KERNEL_INPUT_LEN: usize = 76;

/// Number of atomic units per one coin.
///
/// 1 HYB = 10^8 atoms.
pub const ATOMS_PER_COIN: u64 = 100_000_000;

/// Output index marking a null outpoint (coinbase input).
pub const NULL_OUTPOINT_INDEX: u32 = u32::MAX;

/// Low bits of a proof-of-stake timestamp that must be zero.
///
/// Shrinks the kernel search space to one candidate every 16 seconds.
pub const STAKE_TIMESTAMP_MASK: u32 = 15;

/// Number of blocks considered by median-time-past.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Upper bound on the spacing used by retargeting, in multiples of the target spacing.
pub const MAX_SPACING_MULTIPLIER: i64 = 10;
