//! Property-based tests for the difficulty and kernel rules.

use hybra_consensus::{
    bits_to_target, check_stake_kernel_hash, decode_compact, hash_to_target, retarget,
    target_to_bits,
};
use hybra_core::{Amount, BlockIndex, ChainParams, Hash32, OutPoint, ProofKind};
use num_bigint::BigUint;
use num_traits::Zero;
use proptest::prelude::*;

const LAST_TIME: u32 = 1_600_000_000;

fn params() -> ChainParams {
    let mut p = ChainParams::mainnet();
    p.protocol_v1_retargeting_fixed_time = 0;
    p.protocol_v2_time = 0;
    p.protocol_v3_time = 0;
    p
}

fn last(bits: u32, proof: ProofKind) -> BlockIndex {
    BlockIndex {
        hash: Hash32([7u8; 32]),
        height: 1_000,
        time: LAST_TIME,
        bits,
        proof,
        stake_modifier: Hash32::zero(),
    }
}

fn valid_bits() -> impl Strategy<Value = u32> {
    (3u32..=32, 1u32..0x0080_0000).prop_map(|(size, mantissa)| (size << 24) | mantissa)
}

fn target(bits: u32) -> BigUint {
    bits_to_target(bits).expect("valid bits")
}

// Compact encoding
proptest! {
    #[test]
    fn compact_roundtrip_is_stable(bits in valid_bits()) {
        let t = target(bits);
        let normalized = target_to_bits(&t).expect("encode");
        prop_assert_eq!(target(normalized), t);
        prop_assert_eq!(target_to_bits(&target(normalized)).expect("encode"), normalized);
    }

    #[test]
    fn encoding_never_rounds_up(bytes in prop::array::uniform32(any::<u8>())) {
        let value = BigUint::from_bytes_le(&bytes);
        prop_assume!(!value.is_zero());
        let bits = target_to_bits(&value).expect("fits 256 bits");
        prop_assert!(target(bits) <= value);
        prop_assert_eq!(bits & 0x0080_0000, 0);
    }

    #[test]
    fn top_mantissa_bit_is_negative(size in 3u32..=32, low in 1u32..0x0080_0000) {
        let bits = (size << 24) | 0x0080_0000 | low;
        prop_assert!(decode_compact(bits).negative);
        prop_assert!(bits_to_target(bits).is_err());
    }
}

// Retargeting
proptest! {
    #[test]
    fn retarget_stays_within_limit(
        size in 3u32..=32,
        mantissa in 1u32..0x0080_0000,
        actual in -1_000_000i64..1_000_000,
        stake in any::<bool>(),
    ) {
        let p = params();
        let kind = if stake { ProofKind::Stake } else { ProofKind::Work };
        let prev = last((size << 24) | mantissa, kind);
        let bits = retarget(&prev, i64::from(LAST_TIME) - actual, &p).expect("retarget");
        let next = target(bits);
        let limit = hash_to_target(p.target_limit(i64::from(LAST_TIME), kind));
        prop_assert!(!next.is_zero());
        prop_assert!(next <= limit);
    }

    #[test]
    fn slower_blocks_never_harden(
        size in 5u32..=0x1b,
        mantissa in 1u32..0x0080_0000,
        a in 0i64..1_000,
        b in 0i64..1_000,
    ) {
        let p = params();
        let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
        let prev = last((size << 24) | mantissa, ProofKind::Work);
        let t_fast = target(retarget(&prev, i64::from(LAST_TIME) - fast, &p).expect("retarget"));
        let t_slow = target(retarget(&prev, i64::from(LAST_TIME) - slow, &p).expect("retarget"));
        prop_assert!(t_fast <= t_slow);
    }

    #[test]
    fn spacing_direction_matches_difficulty(
        size in 5u32..=0x1b,
        mantissa in 1u32..0x0080_0000,
        actual in 0i64..1_000,
    ) {
        let p = params();
        let prev = last((size << 24) | mantissa, ProofKind::Work);
        let old = target(prev.bits);
        let next = target(retarget(&prev, i64::from(LAST_TIME) - actual, &p).expect("retarget"));
        if actual < p.target_spacing {
            prop_assert!(next <= old);
        } else {
            prop_assert!(next >= old);
        }
    }
}

// Kernel
proptest! {
    #[test]
    fn kernel_acceptance_monotone_in_amount(
        modifier in prop::array::uniform32(any::<u8>()),
        txid in prop::array::uniform32(any::<u8>()),
        vout in any::<u32>(),
        offset in 0u32..1_000_000,
        amount in 1u64..1_000_000_000,
        extra in 0u64..1_000_000_000,
        bits in prop::sample::select(vec![0x1d00_ffffu32, 0x1e0f_ffff, 0x1f00_ffff, 0x207f_ffff]),
    ) {
        let mut prev = last(bits, ProofKind::Stake);
        prev.stake_modifier = Hash32(modifier);
        let prevout = OutPoint::new(Hash32(txid), vout);
        let time = LAST_TIME + offset;
        let small = check_stake_kernel_hash(&prev, bits, LAST_TIME, Amount::from_atoms(amount), &prevout, time);
        let large = check_stake_kernel_hash(
            &prev,
            bits,
            LAST_TIME,
            Amount::from_atoms(amount + extra),
            &prevout,
            time,
        );
        if small.is_ok() {
            prop_assert_eq!(small, large);
        }
    }

    #[test]
    fn kernel_check_is_deterministic(
        modifier in prop::array::uniform32(any::<u8>()),
        vout in any::<u32>(),
        amount in any::<u64>(),
    ) {
        let mut prev = last(0x1f00_ffff, ProofKind::Stake);
        prev.stake_modifier = Hash32(modifier);
        let prevout = OutPoint::new(Hash32([3u8; 32]), vout);
        let a = check_stake_kernel_hash(&prev, 0x1f00_ffff, 0, Amount::from_atoms(amount), &prevout, LAST_TIME);
        let b = check_stake_kernel_hash(&prev, 0x1f00_ffff, 0, Amount::from_atoms(amount), &prevout, LAST_TIME);
        prop_assert_eq!(a, b);
    }
}
