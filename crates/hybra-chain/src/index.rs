//! Height-indexed block index for the active branch.

use hashbrown::HashMap;
use hybra_core::{BlockHash, BlockIndex, ChainView};

use crate::error::StateError;

/// Block index entries of one branch, stored by height.
#[derive(Clone, Debug, Default)]
pub struct ChainIndex {
    blocks: Vec<BlockIndex>,
    by_hash: HashMap<BlockHash, u64>,
}

impl ChainIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from entries ordered by height, starting at genesis.
    pub fn from_entries(entries: Vec<BlockIndex>) -> Result<Self, StateError> {
        let mut index = Self::new();
        for entry in entries {
            index.push(entry)?;
        }
        Ok(index)
    }

    /// Append `entry` above the current tip.
    pub fn push(&mut self, entry: BlockIndex) -> Result<(), StateError> {
        let expected = self.blocks.len() as u64;
        if entry.height != expected {
            return Err(StateError::NonContiguousHeight {
                expected,
                got: entry.height,
            });
        }
        self.by_hash.insert(entry.hash, entry.height);
        self.blocks.push(entry);
        Ok(())
    }

    /// Remove and return the tip.
    pub fn pop(&mut self) -> Option<BlockIndex> {
        let tip = self.blocks.pop()?;
        self.by_hash.remove(&tip.hash);
        Some(tip)
    }

    /// Highest entry.
    pub fn tip(&self) -> Option<&BlockIndex> {
        self.blocks.last()
    }

    /// Entry with `hash`, if it is on this branch.
    pub fn get(&self, hash: &BlockHash) -> Option<&BlockIndex> {
        let height = *self.by_hash.get(hash)?;
        self.block_at(height)
    }

    /// Number of entries (tip height + 1).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the index holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All entries, genesis first.
    pub fn entries(&self) -> &[BlockIndex] {
        &self.blocks
    }
}

impl ChainView for ChainIndex {
    fn block_at(&self, height: u64) -> Option<&BlockIndex> {
        self.blocks.as_slice().block_at(height)
    }
}
