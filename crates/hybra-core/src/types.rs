// Consensus-critical. Changes require a protocol version bump + tests.
//! Canonical protocol types for Hybra.
//!
//! This module defines the consensus-visible data structures and primitive
//! value types shared by the consensus and chain layers. Field order of the
//! Borsh-derived types is part of the network serialization and must not change.

use crate::constants::*;
use borsh::{BorshDeserialize, BorshSerialize};
use core::fmt;
use core::str::FromStr;
use hashbrown::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors related to parsing, validation, or construction of core protocol types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string had an unexpected byte length.
    #[error("invalid hex length: expected {expected} bytes, got {got} bytes")]
    InvalidHexLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Arithmetic overflow or underflow occurred.
    #[error("amount overflow or underflow")]
    AmountOverflow,

    /// A value violated protocol constraints.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Fixed-size 32-byte hash, stored in internal (wire) byte order.
///
/// The numeric value of a hash is the little-endian reading of these bytes.
/// `Display` and `FromStr` use the reversed, human-facing order, so the
/// printed form reads as a big-endian number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize)]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns an all-zero hash.
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns the underlying byte array (internal order).
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }

    /// Returns true if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Bytes in big-endian numeric order (the display order).
    pub fn to_be_bytes(&self) -> [u8; HASH32_LEN] {
        let mut out = self.0;
        out.reverse();
        out
    }

    /// Build a hash from big-endian numeric bytes.
    pub fn from_be_bytes(mut be: [u8; HASH32_LEN]) -> Self {
        be.reverse();
        Self(be)
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.to_be_bytes()))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_be_bytes()))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    /// Parses display-order hex (optionally `0x`-prefixed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_be_bytes(arr))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Block hash type.
pub type BlockHash = Hash32;

/// Transaction identifier type.
pub type TxId = Hash32;

/// Amount expressed in the smallest unit ("atoms").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Amount(pub u64);

impl Amount {
    /// Returns a zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Constructs an amount from atoms.
    pub const fn from_atoms(atoms: u64) -> Self {
        Self(atoms)
    }

    /// Returns the underlying atom value.
    pub const fn atoms(self) -> u64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({} atoms)", self.0)
    }
}

impl fmt::Display for Amount {
    /// Whole coins with eight decimals, e.g. `12.50000000 HYB`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08} HYB",
            self.0 / ATOMS_PER_COIN,
            self.0 % ATOMS_PER_COIN
        )
    }
}

/// Reference to a transaction output: `txid` plus output index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutPoint {
    /// Transaction containing the output.
    pub txid: TxId,
    /// Index of the output within that transaction.
    pub vout: u32,
}

impl OutPoint {
    /// Construct an outpoint.
    pub const fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// The null outpoint used by coinbase inputs.
    pub const fn null() -> Self {
        Self {
            txid: Hash32::zero(),
            vout: NULL_OUTPOINT_INDEX,
        }
    }

    /// Returns true for the coinbase marker outpoint.
    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == NULL_OUTPOINT_INDEX
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Transaction input.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TxIn {
    /// Output being spent.
    pub prevout: OutPoint,
    /// Unlocking script (opaque to consensus).
    pub script_sig: Vec<u8>,
    /// Input sequence number.
    pub sequence: u32,
}

/// Transaction output.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TxOut {
    /// Output value.
    pub value: Amount,
    /// Locking script (opaque to consensus).
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    /// An empty output: zero value and empty script. Marks a coinstake.
    pub fn empty() -> Self {
        Self {
            value: Amount::zero(),
            script_pubkey: Vec::new(),
        }
    }

    /// Returns true for the coinstake marker output.
    pub fn is_empty(&self) -> bool {
        self.value == Amount::zero() && self.script_pubkey.is_empty()
    }
}

/// Transaction container.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transaction {
    /// Transaction format version.
    pub version: i32,
    /// Transaction timestamp (Unix seconds). Must equal the block time for a coinstake.
    pub time: u32,
    /// Inputs.
    pub inputs: Vec<TxIn>,
    /// Outputs.
    pub outputs: Vec<TxOut>,
    /// Lock time.
    pub lock_time: u32,
}

impl Transaction {
    /// Exactly one input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// First input spends a real output, at least two outputs, first output empty.
    pub fn is_coinstake(&self) -> bool {
        match (self.inputs.first(), self.outputs.first()) {
            (Some(input), Some(marker)) => {
                !input.prevout.is_null() && self.outputs.len() >= 2 && marker.is_empty()
            }
            _ => false,
        }
    }

    /// Sum of output values, failing on overflow.
    pub fn value_out(&self) -> Result<Amount, CoreError> {
        self.outputs
            .iter()
            .try_fold(Amount::zero(), |acc, out| acc.checked_add(out.value))
    }

    /// Performs basic structural validation.
    pub fn validate_sanity(&self) -> Result<(), CoreError> {
        if self.inputs.is_empty() {
            return Err(CoreError::InvalidValue("transaction has no inputs"));
        }
        if self.outputs.is_empty() {
            return Err(CoreError::InvalidValue("transaction has no outputs"));
        }
        self.value_out()?;

        if !self.is_coinbase() && self.inputs.iter().any(|i| i.prevout.is_null()) {
            return Err(CoreError::InvalidValue("null prevout outside coinbase"));
        }
        let mut seen = HashSet::with_capacity(self.inputs.len());
        if !self.inputs.iter().all(|input| seen.insert(input.prevout)) {
            return Err(CoreError::InvalidValue("duplicate input"));
        }
        Ok(())
    }
}

/// Block header. Borsh encoding of this struct is the 80-byte network header.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockHeader {
    /// Block version.
    pub version: i32,
    /// Hash of the previous block.
    pub prev: BlockHash,
    /// Merkle root of transaction identifiers.
    pub merkle_root: Hash32,
    /// Block timestamp (Unix seconds).
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

/// Full block (header + transactions).
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Transactions. For a proof-of-stake block `txs[1]` is the coinstake.
    pub txs: Vec<Transaction>,
}

impl Block {
    /// Proof-of-stake blocks carry a coinstake as their second transaction.
    pub fn is_proof_of_stake(&self) -> bool {
        self.txs.len() > 1 && self.txs[1].is_coinstake()
    }

    /// The coinstake transaction, if any.
    pub fn coinstake(&self) -> Option<&Transaction> {
        self.txs.get(1).filter(|tx| tx.is_coinstake())
    }

    /// Proof kind implied by the block's transactions.
    pub fn proof_kind(&self) -> ProofKind {
        if self.is_proof_of_stake() {
            ProofKind::Stake
        } else {
            ProofKind::Work
        }
    }
}

/// Which proof a block carries. Each kind has its own difficulty sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProofKind {
    /// Proof-of-work block.
    Work,
    /// Proof-of-stake block.
    Stake,
}

/// Chain position of an accepted block, as tracked by the chain collaborator.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockIndex {
    /// Block hash.
    pub hash: BlockHash,
    /// Height; genesis is 0.
    pub height: u64,
    /// Block timestamp (Unix seconds).
    pub time: u32,
    /// Compact target the block was produced under.
    pub bits: u32,
    /// Proof kind.
    pub proof: ProofKind,
    /// Stake modifier computed when the block was connected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stake_modifier: Hash32,
}

impl BlockIndex {
    /// Block time widened for signed arithmetic.
    pub fn block_time(&self) -> i64 {
        i64::from(self.time)
    }

    /// Returns true if this block carries a proof of stake.
    pub fn is_proof_of_stake(&self) -> bool {
        self.proof == ProofKind::Stake
    }

    /// Position of this block for confirmation lookups.
    pub fn position(&self) -> BlockPosition {
        BlockPosition {
            height: self.height,
            hash: self.hash,
        }
    }
}

/// Identity of the block that confirmed an output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockPosition {
    /// Height of the confirming block.
    pub height: u64,
    /// Hash of the confirming block.
    pub hash: BlockHash,
}
