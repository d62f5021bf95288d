//! UTXO set.
//!
//! Outputs are kept after they are spent; the spent set records which ones
//! are gone. Consensus only needs presence, value and the confirming block.

use hashbrown::{HashMap, HashSet};
use hybra_core::{txid, Block, BlockIndex, Coin, CoinView, OutPoint, Transaction};
use tracing::debug;

use crate::error::StateError;

/// Outputs created on the active branch plus the outpoints already spent.
#[derive(Clone, Debug, Default)]
pub struct CoinSet {
    coins: HashMap<OutPoint, Coin>,
    spent: HashSet<OutPoint>,
}

impl CoinSet {
    /// Create an empty coin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outputs not yet spent.
    pub fn unspent_len(&self) -> usize {
        self.coins.len() - self.spent.len()
    }

    /// Return whether an outpoint has been spent.
    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.spent.contains(outpoint)
    }

    /// Record the outputs of `tx` as confirmed in `block`.
    pub fn add_outputs(&mut self, tx: &Transaction, block: &BlockIndex) -> Result<(), StateError> {
        for (outpoint, coin) in new_coins(tx, block)? {
            if self.coins.contains_key(&outpoint) {
                return Err(StateError::DuplicateOutput(outpoint));
            }
            self.coins.insert(outpoint, coin);
        }
        Ok(())
    }

    /// Mark `outpoint` spent, returning the coin it referred to.
    pub fn spend(&mut self, outpoint: &OutPoint) -> Result<Coin, StateError> {
        let coin = self
            .coins
            .get(outpoint)
            .cloned()
            .ok_or(StateError::MissingCoin(*outpoint))?;
        if !self.spent.insert(*outpoint) {
            return Err(StateError::DoubleSpend(*outpoint));
        }
        Ok(coin)
    }

    /// Apply a block's transactions in order.
    ///
    /// Inputs are spent before a transaction's outputs are added, so a later
    /// transaction may spend an earlier one in the same block. Changes are
    /// staged per block and committed only if every transaction passes.
    pub fn apply_block(&mut self, block: &Block, index: &BlockIndex) -> Result<(), StateError> {
        let mut created: HashMap<OutPoint, Coin> = HashMap::new();
        let mut spent: HashSet<OutPoint> = HashSet::new();

        for tx in &block.txs {
            tx.validate_sanity()
                .map_err(|_| StateError::InvalidTransaction("tx sanity failed"))?;
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let prevout = input.prevout;
                    if !self.coins.contains_key(&prevout) && !created.contains_key(&prevout) {
                        return Err(StateError::MissingCoin(prevout));
                    }
                    if self.spent.contains(&prevout) || !spent.insert(prevout) {
                        return Err(StateError::DoubleSpend(prevout));
                    }
                }
            }
            for (outpoint, coin) in new_coins(tx, index)? {
                if self.coins.contains_key(&outpoint) || created.contains_key(&outpoint) {
                    return Err(StateError::DuplicateOutput(outpoint));
                }
                created.insert(outpoint, coin);
            }
        }

        debug!(
            height = index.height,
            created = created.len(),
            spent = spent.len(),
            "coins updated"
        );
        self.coins.extend(created);
        self.spent.extend(spent);
        Ok(())
    }
}

/// Spendable outputs of `tx` as coins confirmed in `block`.
///
/// Empty marker outputs are never spendable and are skipped.
fn new_coins(tx: &Transaction, block: &BlockIndex) -> Result<Vec<(OutPoint, Coin)>, StateError> {
    let id = txid(tx).map_err(|_| StateError::InvalidTransaction("txid failed"))?;
    let mut coins = Vec::with_capacity(tx.outputs.len());
    for (vout, output) in tx.outputs.iter().enumerate() {
        if output.is_empty() {
            continue;
        }
        let vout =
            u32::try_from(vout).map_err(|_| StateError::InvalidTransaction("too many outputs"))?;
        coins.push((
            OutPoint::new(id, vout),
            Coin {
                output: output.clone(),
                height: block.height,
                block_hash: block.hash,
                is_coinbase: tx.is_coinbase(),
                is_coinstake: tx.is_coinstake(),
                spent: false,
            },
        ));
    }
    Ok(coins)
}

impl CoinView for CoinSet {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        let mut coin = self.coins.get(outpoint)?.clone();
        coin.spent = self.spent.contains(outpoint);
        Some(coin)
    }
}
