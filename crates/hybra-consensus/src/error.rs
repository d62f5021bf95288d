//! Consensus error types.

use thiserror::Error;

/// Fixed rejection taxonomy reported to callers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RejectReason {
    /// Stake transaction shape precondition violated.
    MalformedStakeTransaction,
    /// Referenced output absent or already spent.
    MissingOrSpentInput,
    /// Confirmation-depth check failed.
    StakeNotMature,
    /// Coinstake/block timestamp alignment or drift rule failed.
    InvalidTimestamp,
    /// Kernel hash exceeds the coin-weighted target.
    InvalidKernelHash,
    /// Decoded target negative, zero, overflowed, or above the network limit.
    TargetOutOfRange,
    /// Proof-of-work hash above the target.
    InsufficientWork,
    /// Chain collaborator returned an inconsistent branch.
    InvalidChain,
    /// Chain parameters cannot drive the rules.
    InvalidParams,
}

/// Errors returned by consensus validation and difficulty code.
///
/// Every variant is an ordinary rejection; none indicates a local fault.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ConsensusError {
    /// Stake transaction shape precondition violated.
    #[error("malformed stake transaction: {0}")]
    MalformedStakeTransaction(&'static str),

    /// Referenced output absent or already spent.
    #[error("stake input missing or spent")]
    MissingOrSpentInput,

    /// Output confirmed too recently to stake.
    #[error("tried to stake at depth {depth}")]
    StakeNotMature {
        /// Confirmations the output had.
        depth: u64,
    },

    /// Coinstake/block timestamp alignment or drift rule failed.
    #[error("invalid stake timestamp: {0}")]
    InvalidTimestamp(&'static str),

    /// Kernel hash did not meet the coin-weighted target.
    #[error("kernel hash above weighted target")]
    InvalidKernelHash,

    /// Compact target could not be used.
    #[error("target out of range: {0}")]
    TargetOutOfRange(&'static str),

    /// Proof-of-work hash did not meet the required target.
    #[error("insufficient proof of work")]
    InsufficientWork,

    /// Chain view was missing a block the rules needed.
    #[error("invalid chain: {0}")]
    InvalidChain(&'static str),

    /// Chain parameters were unusable (e.g. zero spacing).
    #[error("invalid chain parameters: {0}")]
    InvalidParams(&'static str),
}

impl ConsensusError {
    /// Classify into the fixed rejection taxonomy.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::MalformedStakeTransaction(_) => RejectReason::MalformedStakeTransaction,
            Self::MissingOrSpentInput => RejectReason::MissingOrSpentInput,
            Self::StakeNotMature { .. } => RejectReason::StakeNotMature,
            Self::InvalidTimestamp(_) => RejectReason::InvalidTimestamp,
            Self::InvalidKernelHash => RejectReason::InvalidKernelHash,
            Self::TargetOutOfRange(_) => RejectReason::TargetOutOfRange,
            Self::InsufficientWork => RejectReason::InsufficientWork,
            Self::InvalidChain(_) => RejectReason::InvalidChain,
            Self::InvalidParams(_) => RejectReason::InvalidParams,
        }
    }
}
