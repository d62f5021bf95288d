//! Hash primitives.
//!
//! The network hashes everything consensus-visible with double SHA-256.
//! This crate does not implement any cryptography itself.

use crate::constants::HASH32_LEN;
use crate::types::Hash32;
use sha2::{Digest, Sha256};

/// Double SHA-256 over `bytes`, returned in internal byte order.
pub fn sha256d(bytes: &[u8]) -> Hash32 {
    let first = Sha256::digest(bytes);
    let second = Sha256::digest(first);
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(&second);
    Hash32(arr)
}

/// Double SHA-256 over the concatenation of `parts`.
pub fn sha256d_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(&second);
    Hash32(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256d_empty_matches_known_digest() {
        // SHA256(SHA256("")) in internal order.
        assert_eq!(
            hex::encode(sha256d(b"").as_bytes()),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn concat_equals_contiguous() {
        let whole = sha256d(b"hybrid-consensus");
        let parts = sha256d_concat(&[b"hybrid", b"-", b"consensus"]);
        assert_eq!(whole, parts);
    }
}
