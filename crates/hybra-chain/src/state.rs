//! Chain state: block index plus coins, advanced one block at a time.

use hybra_consensus::{
    next_block_index, next_target_required, search_kernel, validate_block_proof, BlockProof,
    KernelCache, StakeContext, StakeProof,
};
use hybra_core::{AdjustedTime, Block, BlockIndex, ChainParams, OutPoint, ProofKind};
use tracing::{debug, info};

use crate::coins::CoinSet;
use crate::error::StateError;
use crate::index::ChainIndex;

/// Active branch of one network.
#[derive(Clone, Debug)]
pub struct ChainState {
    params: ChainParams,
    index: ChainIndex,
    coins: CoinSet,
}

impl ChainState {
    /// Empty chain for `params`; the first connected block is genesis.
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            index: ChainIndex::new(),
            coins: CoinSet::new(),
        }
    }

    /// Network parameters.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Block index of the branch.
    pub fn index(&self) -> &ChainIndex {
        &self.index
    }

    /// UTXO set of the branch.
    pub fn coins(&self) -> &CoinSet {
        &self.coins
    }

    /// Current tip, `None` before genesis.
    pub fn tip(&self) -> Option<&BlockIndex> {
        self.index.tip()
    }

    /// Collaborators for the stake rules over this branch.
    pub fn stake_context(&self) -> StakeContext<'_, ChainIndex, CoinSet> {
        StakeContext::new(&self.index, &self.coins, &self.params)
    }

    /// Compact target the next block of `kind` must carry.
    pub fn next_bits(&self, kind: ProofKind) -> Result<u32, StateError> {
        Ok(next_target_required(&self.index, self.tip(), kind, &self.params)?)
    }

    /// Validate `block` on top of the tip and connect it.
    pub fn connect_block<T>(&mut self, block: &Block, clock: &T) -> Result<BlockProof, StateError>
    where
        T: AdjustedTime + ?Sized,
    {
        let prev = self.index.tip();
        let proof = validate_block_proof(&self.stake_context(), clock, prev, block)?;
        let entry = next_block_index(prev, block)?;

        self.coins.apply_block(block, &entry)?;
        info!(
            height = entry.height,
            hash = %entry.hash,
            kind = ?entry.proof,
            bits = format_args!("{:#010x}", entry.bits),
            "block connected"
        );
        self.index.push(entry)?;
        Ok(proof)
    }

    /// Search `[from_time, to_time]` for a stake kernel on `prevout` above the tip.
    pub fn search_stake<K>(
        &self,
        cache: &mut K,
        prevout: &OutPoint,
        from_time: u32,
        to_time: u32,
    ) -> Result<Option<StakeProof>, StateError>
    where
        K: KernelCache + ?Sized,
    {
        let prev = self
            .tip()
            .ok_or(StateError::EmptyChain)?;
        let bits = self.next_bits(ProofKind::Stake)?;
        let found = search_kernel(
            cache,
            &self.stake_context(),
            prev,
            bits,
            prevout,
            from_time,
            to_time,
        )?;
        if found.is_none() {
            debug!(%prevout, from_time, to_time, "no kernel in range");
        }
        Ok(found)
    }
}
