use hybra_consensus::{
    bits_to_target, check_proof_of_work, compute_stake_modifier, decode_compact, kernel_hash,
    pow_hash, target_to_bits, target_to_hash, KernelInput,
};
use hybra_core::{BlockHeader, BlockIndex, Hash32, OutPoint, ProofKind};
use num_bigint::BigUint;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

fn vectors_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("vectors")
        .join(file)
}

fn load<T: for<'de> Deserialize<'de>>(file: &str) -> Vec<T> {
    let data = fs::read_to_string(vectors_path(file)).expect("vector file");
    serde_json::from_str(&data).expect("parse json")
}

fn hash(display: &str) -> Hash32 {
    display.parse().expect("display hex")
}

fn parse_bits(s: &str) -> u32 {
    u32::from_str_radix(s.trim_start_matches("0x"), 16).expect("bits")
}

#[derive(Debug, Deserialize)]
struct KernelVector {
    name: String,
    stake_modifier: String,
    block_from_time: u32,
    txid: String,
    vout: u32,
    time: u32,
    preimage_hex: String,
    kernel_hash: String,
}

#[test]
fn kernel_hash_vectors() {
    for v in load::<KernelVector>("kernel_hash.json") {
        let input = KernelInput {
            stake_modifier: hash(&v.stake_modifier),
            block_from_time: v.block_from_time,
            prevout: OutPoint::new(hash(&v.txid), v.vout),
            time: v.time,
        };
        assert_eq!(
            hex::encode(input.to_bytes()),
            v.preimage_hex,
            "preimage mismatch for {}",
            v.name
        );
        assert_eq!(
            hex::encode(borsh::to_vec(&input).expect("borsh")),
            v.preimage_hex,
            "borsh preimage mismatch for {}",
            v.name
        );
        let got = kernel_hash(&input.stake_modifier, v.block_from_time, &input.prevout, v.time);
        assert_eq!(got.to_string(), v.kernel_hash, "kernel hash mismatch for {}", v.name);
    }
}

#[derive(Debug, Deserialize)]
struct ModifierVector {
    name: String,
    kernel: String,
    parent_modifier: String,
    stake_modifier: String,
}

#[test]
fn stake_modifier_vectors() {
    for v in load::<ModifierVector>("stake_modifier.json") {
        let parent = BlockIndex {
            hash: Hash32([0xcc; 32]),
            height: 1,
            time: 0,
            bits: 0x207f_ffff,
            proof: ProofKind::Work,
            stake_modifier: hash(&v.parent_modifier),
        };
        let got = compute_stake_modifier(Some(&parent), &hash(&v.kernel));
        assert_eq!(got.to_string(), v.stake_modifier, "modifier mismatch for {}", v.name);
    }
}

#[derive(Debug, Deserialize)]
struct CompactVector {
    bits: String,
    target: String,
    negative: bool,
    overflow: bool,
    normalized_bits: Option<String>,
}

#[test]
fn compact_vectors() {
    for v in load::<CompactVector>("compact.json") {
        let bits = parse_bits(&v.bits);
        let decoded = decode_compact(bits);
        let expected = BigUint::parse_bytes(v.target.as_bytes(), 16).expect("target hex");
        assert_eq!(decoded.target, expected, "target for {}", v.bits);
        assert_eq!(decoded.negative, v.negative, "negative flag for {}", v.bits);
        assert_eq!(decoded.overflow, v.overflow, "overflow flag for {}", v.bits);

        match v.normalized_bits {
            Some(norm) => {
                let target = bits_to_target(bits).expect("usable target");
                assert_eq!(target_to_bits(&target).expect("encode"), parse_bits(&norm));
            }
            None => assert!(bits_to_target(bits).is_err(), "{} must be rejected", v.bits),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PowVector {
    name: String,
    version: i32,
    prev: String,
    merkle_root: String,
    time: u32,
    bits: u32,
    nonce: u32,
    serialized_hex: String,
    header_hash: String,
}

#[test]
fn pow_header_vectors() {
    for v in load::<PowVector>("pow_header.json") {
        let header = BlockHeader {
            version: v.version,
            prev: hash(&v.prev),
            merkle_root: hash(&v.merkle_root),
            time: v.time,
            bits: v.bits,
            nonce: v.nonce,
        };
        let ser = borsh::to_vec(&header).expect("borsh");
        assert_eq!(hex::encode(&ser), v.serialized_hex, "serialized bytes mismatch for {}", v.name);

        let pow = pow_hash(&header).expect("pow hash");
        assert_eq!(pow.to_string(), v.header_hash, "pow hash mismatch for {}", v.name);
    }
}

#[test]
fn bitcoin_genesis_meets_its_target() {
    let v = load::<PowVector>("pow_header.json")
        .into_iter()
        .find(|v| v.name == "bitcoin_genesis")
        .expect("genesis vector");
    let limit = target_to_hash(&bits_to_target(0x1d00_ffff).expect("decode")).expect("fits");
    assert_eq!(check_proof_of_work(&hash(&v.header_hash), v.bits, &limit), Ok(()));
}
