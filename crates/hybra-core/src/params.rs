//! Chain parameters and network presets.
//!
//! Everything the consensus rules read from configuration lives here:
//! activation times, target limits, spacing constants and maturity depth.

use crate::constants::STAKE_TIMESTAMP_MASK;
use crate::types::{CoreError, Hash32, ProofKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Consensus parameters for one network.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainParams {
    /// Network name, informational only.
    pub network: String,
    /// Easiest allowed proof-of-work target.
    pub pow_limit: Hash32,
    /// Easiest allowed proof-of-stake target before protocol V2.
    pub pos_limit: Hash32,
    /// Easiest allowed proof-of-stake target from protocol V2.
    pub pos_limit_v2: Hash32,
    /// Retarget averaging timespan, seconds.
    pub target_timespan: i64,
    /// Target block spacing before protocol V2, seconds.
    pub target_spacing_v1: i64,
    /// Target block spacing from protocol V2, seconds.
    pub target_spacing: i64,
    /// After this time negative observed spacing is clamped.
    pub protocol_v1_retargeting_fixed_time: i64,
    /// Protocol V2 activation time.
    pub protocol_v2_time: i64,
    /// Protocol V3 activation time; enables the upper spacing clamp.
    pub protocol_v3_time: i64,
    /// Disable retargeting entirely (regression networks).
    pub pow_no_retargeting: bool,
    /// Minimum confirmations before an output can stake.
    pub stake_min_confirmations: u64,
    /// Timestamp granularity mask for proof-of-stake blocks.
    pub stake_timestamp_mask: u32,
    /// Allowed future drift before protocol V2, seconds.
    pub max_future_drift_v1: i64,
    /// Allowed future drift from protocol V2, seconds.
    pub max_future_drift: i64,
}

fn limit_with_leading_zero_bytes(zero_bytes: usize, first: u8) -> Hash32 {
    let mut be = [0xffu8; 32];
    for b in be.iter_mut().take(zero_bytes) {
        *b = 0;
    }
    be[zero_bytes] = first;
    Hash32::from_be_bytes(be)
}

impl ChainParams {
    /// Main network.
    pub fn mainnet() -> Self {
        Self {
            network: "mainnet".into(),
            pow_limit: limit_with_leading_zero_bytes(2, 0x0f),
            pos_limit: limit_with_leading_zero_bytes(2, 0x0f),
            pos_limit_v2: limit_with_leading_zero_bytes(6, 0xff),
            target_timespan: 16 * 60,
            target_spacing_v1: 60,
            target_spacing: 64,
            protocol_v1_retargeting_fixed_time: 1_395_631_999,
            protocol_v2_time: 1_407_053_625,
            protocol_v3_time: 1_444_028_400,
            pow_no_retargeting: false,
            stake_min_confirmations: 500,
            stake_timestamp_mask: STAKE_TIMESTAMP_MASK,
            max_future_drift_v1: 10 * 60,
            max_future_drift: 15,
        }
    }

    /// Public test network.
    pub fn testnet() -> Self {
        Self {
            network: "testnet".into(),
            pow_limit: limit_with_leading_zero_bytes(2, 0xff),
            pos_limit: limit_with_leading_zero_bytes(2, 0xff),
            pos_limit_v2: limit_with_leading_zero_bytes(2, 0xff),
            target_timespan: 16 * 60,
            target_spacing_v1: 64,
            target_spacing: 64,
            protocol_v1_retargeting_fixed_time: 1_395_631_999,
            protocol_v2_time: 1_407_053_625,
            protocol_v3_time: 1_444_028_400,
            pow_no_retargeting: false,
            stake_min_confirmations: 10,
            stake_timestamp_mask: STAKE_TIMESTAMP_MASK,
            max_future_drift_v1: 10 * 60,
            max_future_drift: 15,
        }
    }

    /// Local regression network: fixed difficulty, protocol rules active from genesis.
    pub fn regtest() -> Self {
        Self {
            network: "regtest".into(),
            pow_limit: limit_with_leading_zero_bytes(0, 0x7f),
            pos_limit: limit_with_leading_zero_bytes(0, 0x7f),
            pos_limit_v2: limit_with_leading_zero_bytes(0, 0x7f),
            target_timespan: 16 * 60,
            target_spacing_v1: 64,
            target_spacing: 64,
            protocol_v1_retargeting_fixed_time: 0,
            protocol_v2_time: 0,
            protocol_v3_time: 0,
            pow_no_retargeting: true,
            stake_min_confirmations: 10,
            stake_timestamp_mask: STAKE_TIMESTAMP_MASK,
            max_future_drift_v1: 10 * 60,
            max_future_drift: 15,
        }
    }

    /// Look up a preset by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "mainnet" | "main" => Some(Self::mainnet()),
            "testnet" | "test" => Some(Self::testnet()),
            "regtest" => Some(Self::regtest()),
            _ => None,
        }
    }

    /// Rejects parameter sets the consensus arithmetic cannot work with.
    ///
    /// Presets always pass; this guards values loaded from user overrides.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.target_spacing_v1 <= 0 || self.target_spacing <= 0 {
            return Err(CoreError::InvalidValue("target spacing must be positive"));
        }
        if self.target_timespan < self.target_spacing.max(self.target_spacing_v1) {
            return Err(CoreError::InvalidValue("target timespan shorter than spacing"));
        }
        match self.stake_timestamp_mask.checked_add(1) {
            Some(step) if step.is_power_of_two() => Ok(()),
            _ => Err(CoreError::InvalidValue("stake timestamp mask must be 2^k - 1 below u32::MAX")),
        }
    }

    /// Protocol V2 rules apply strictly after the activation time.
    pub fn is_protocol_v2(&self, time: i64) -> bool {
        time > self.protocol_v2_time
    }

    /// Protocol V3 rules apply strictly after the activation time.
    pub fn is_protocol_v3(&self, time: i64) -> bool {
        time > self.protocol_v3_time
    }

    /// Target spacing in force at `time`.
    pub fn target_spacing_at(&self, time: i64) -> i64 {
        if self.is_protocol_v2(time) {
            self.target_spacing
        } else {
            self.target_spacing_v1
        }
    }

    /// Easiest target for a block of `kind` at `time`.
    pub fn target_limit(&self, time: i64, kind: ProofKind) -> &Hash32 {
        match kind {
            ProofKind::Work => &self.pow_limit,
            ProofKind::Stake if self.is_protocol_v2(time) => &self.pos_limit_v2,
            ProofKind::Stake => &self.pos_limit,
        }
    }

    /// Latest acceptable block time given network-adjusted `now`.
    pub fn future_drift(&self, now: i64) -> i64 {
        let drift = if self.is_protocol_v2(now) {
            self.max_future_drift
        } else {
            self.max_future_drift_v1
        };
        now.saturating_add(drift)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
