// Consensus-critical. Changes require a protocol version bump + tests.
//! Canonical serialization helpers.
//!
//! Rule: consensus-critical objects are encoded with Borsh. For the fixed-width
//! structures hashed here (headers, kernel inputs) the Borsh layout is the
//! little-endian network layout byte for byte.

use crate::crypto::sha256d;
use crate::types::{Block, BlockHeader, CoreError, Hash32, Transaction, TxId};
use borsh::to_vec;

/// Encode a value with canonical Borsh encoding.
pub fn to_bytes<T: borsh::BorshSerialize>(v: &T) -> Result<Vec<u8>, CoreError> {
    to_vec(v).map_err(|_| CoreError::InvalidValue("borsh serialization failed"))
}

/// Canonical block header hash = SHA256d(borsh(header)).
pub fn block_header_hash(h: &BlockHeader) -> Result<Hash32, CoreError> {
    let bytes = to_bytes(h)?;
    Ok(sha256d(&bytes))
}

/// Hash of a full block (its header hash).
pub fn block_hash(block: &Block) -> Result<Hash32, CoreError> {
    block_header_hash(&block.header)
}

/// Transaction id = SHA256d(borsh(tx)).
///
/// Identifies transactions inside Hybra's own state. It is not the network
/// txid, whose serialization is outside this crate.
pub fn txid(tx: &Transaction) -> Result<TxId, CoreError> {
    let bytes = to_bytes(tx)?;
    Ok(sha256d(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLOCK_HEADER_LEN;
    use crate::types::{Amount, OutPoint, TxIn, TxOut};

    fn header() -> BlockHeader {
        BlockHeader {
            version: 7,
            prev: Hash32([1u8; 32]),
            merkle_root: Hash32([2u8; 32]),
            time: 1_600_000_000,
            bits: 0x1d00_ffff,
            nonce: 42,
        }
    }

    #[test]
    fn header_encoding_is_fixed_width() {
        let bytes = to_bytes(&header()).expect("encode");
        assert_eq!(bytes.len(), BLOCK_HEADER_LEN);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[76..80], &42u32.to_le_bytes());
        assert_eq!(block_header_hash(&header()).expect("hash"), sha256d(&bytes));
    }

    #[test]
    fn txid_changes_with_contents() {
        let mut tx = Transaction {
            version: 1,
            time: 0,
            inputs: vec![TxIn {
                prevout: OutPoint::new(Hash32([3u8; 32]), 0),
                script_sig: vec![],
                sequence: u32::MAX,
            }],
            outputs: vec![TxOut {
                value: Amount::from_atoms(10),
                script_pubkey: vec![0x51],
            }],
            lock_time: 0,
        };
        let a = txid(&tx).expect("txid");
        tx.outputs[0].value = Amount::from_atoms(11);
        assert_ne!(a, txid(&tx).expect("txid"));
    }
}
