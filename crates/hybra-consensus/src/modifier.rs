// Consensus-critical. Changes require a protocol version bump + tests.
//! Stake modifier.
//!
//! Every block carries a 256-bit modifier chained from its parent:
//! `modifier = SHA256d(kernel || parent.modifier)`, zero for genesis.
//! The kernel seed is the block hash for proof-of-work blocks and the staked
//! output's txid for proof-of-stake blocks, so the modifier a future kernel
//! will hash against cannot be known when the staked output is created.

use crate::error::ConsensusError;
use hybra_core::{block_hash, sha256d_concat, Block, BlockIndex, Hash32, Transaction};

/// Modifier for a block whose parent is `prev`, seeded by `kernel`.
pub fn compute_stake_modifier(prev: Option<&BlockIndex>, kernel: &Hash32) -> Hash32 {
    match prev {
        None => Hash32::zero(),
        Some(p) => sha256d_concat(&[kernel.as_bytes(), p.stake_modifier.as_bytes()]),
    }
}

/// Kernel seed for a block: the coinstake's staked txid, else the block hash.
pub fn stake_modifier_kernel(block_hash: &Hash32, coinstake: Option<&Transaction>) -> Hash32 {
    coinstake
        .and_then(|tx| tx.inputs.first())
        .map(|input| input.prevout.txid)
        .unwrap_or(*block_hash)
}

/// Build the index entry for `block` connected on top of `prev`.
pub fn next_block_index(prev: Option<&BlockIndex>, block: &Block) -> Result<BlockIndex, ConsensusError> {
    let hash = block_hash(block).map_err(|_| ConsensusError::InvalidChain("block hashing failed"))?;
    let height = match prev {
        None => 0,
        Some(p) => {
            if p.hash != block.header.prev {
                return Err(ConsensusError::InvalidChain("block does not extend previous"));
            }
            p.height
                .checked_add(1)
                .ok_or(ConsensusError::InvalidChain("height overflow"))?
        }
    };
    let kernel = stake_modifier_kernel(&hash, block.coinstake());

    Ok(BlockIndex {
        hash,
        height,
        time: block.header.time,
        bits: block.header.bits,
        proof: block.proof_kind(),
        stake_modifier: compute_stake_modifier(prev, &kernel),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybra_core::{sha256d, Amount, BlockHeader, OutPoint, ProofKind, TxIn, TxOut};

    fn index(modifier: Hash32) -> BlockIndex {
        BlockIndex {
            hash: Hash32([9u8; 32]),
            height: 4,
            time: 1_600_000_000,
            bits: 0x1d00_ffff,
            proof: ProofKind::Work,
            stake_modifier: modifier,
        }
    }

    #[test]
    fn genesis_modifier_is_zero() {
        assert_eq!(compute_stake_modifier(None, &Hash32([1u8; 32])), Hash32::zero());
    }

    #[test]
    fn modifier_hashes_kernel_then_parent() {
        let parent = index(Hash32([2u8; 32]));
        let kernel = Hash32([1u8; 32]);
        let mut buf = Vec::new();
        buf.extend_from_slice(&[1u8; 32]);
        buf.extend_from_slice(&[2u8; 32]);
        assert_eq!(compute_stake_modifier(Some(&parent), &kernel), sha256d(&buf));
    }

    #[test]
    fn modifier_depends_on_history() {
        let kernel = Hash32([1u8; 32]);
        let a = compute_stake_modifier(Some(&index(Hash32([2u8; 32]))), &kernel);
        let b = compute_stake_modifier(Some(&index(Hash32([3u8; 32]))), &kernel);
        assert_ne!(a, b);
    }

    #[test]
    fn kernel_seed_selection() {
        let block_hash = Hash32([5u8; 32]);
        let staked = OutPoint::new(Hash32([6u8; 32]), 0);
        let coinstake = Transaction {
            version: 1,
            time: 0,
            inputs: vec![TxIn {
                prevout: staked,
                script_sig: vec![],
                sequence: 0,
            }],
            outputs: vec![
                TxOut::empty(),
                TxOut {
                    value: Amount::from_atoms(1),
                    script_pubkey: vec![],
                },
            ],
            lock_time: 0,
        };
        assert_eq!(stake_modifier_kernel(&block_hash, None), block_hash);
        assert_eq!(stake_modifier_kernel(&block_hash, Some(&coinstake)), staked.txid);
    }

    #[test]
    fn next_index_requires_linkage() {
        let prev = index(Hash32([2u8; 32]));
        let block = Block {
            header: BlockHeader {
                version: 1,
                prev: Hash32([0xaa; 32]),
                merkle_root: Hash32::zero(),
                time: 1_600_000_064,
                bits: 0x1d00_ffff,
                nonce: 0,
            },
            txs: vec![],
        };
        assert!(matches!(
            next_block_index(Some(&prev), &block),
            Err(ConsensusError::InvalidChain(_))
        ));

        let mut linked = block;
        linked.header.prev = prev.hash;
        let idx = next_block_index(Some(&prev), &linked).expect("linked");
        assert_eq!(idx.height, 5);
        assert_eq!(idx.proof, ProofKind::Work);
        assert_eq!(idx.stake_modifier, compute_stake_modifier(Some(&prev), &idx.hash));
    }
}
