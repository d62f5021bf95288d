//! State transition errors.

use hybra_consensus::ConsensusError;
use hybra_core::OutPoint;
use thiserror::Error;

/// Errors produced by state validation or transitions.
#[derive(Debug, Error)]
pub enum StateError {
    /// Transaction failed basic sanity checks.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(&'static str),

    /// Input spends an output that was already spent.
    #[error("double spend of {0}")]
    DoubleSpend(OutPoint),

    /// Input spends an output that does not exist.
    #[error("missing coin {0}")]
    MissingCoin(OutPoint),

    /// Output id already present in the coin set.
    #[error("duplicate output {0}")]
    DuplicateOutput(OutPoint),

    /// Index entry does not sit directly above the tip.
    #[error("non-contiguous height: expected {expected}, got {got}")]
    NonContiguousHeight {
        /// Height the next entry must have.
        expected: u64,
        /// Height it had.
        got: u64,
    },

    /// Operation needs at least a genesis block.
    #[error("chain has no blocks")]
    EmptyChain,

    /// Block rejected by the consensus rules.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}
