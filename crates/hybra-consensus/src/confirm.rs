// Consensus-critical. Changes require a protocol version bump + tests.
//! Confirmation-depth lookups.

use hybra_core::{BlockIndex, BlockPosition, ChainView};

/// Depth at which `referencing` sits below `from`, if within `max_depth`.
///
/// Depth 0 is `from` itself. The search covers heights
/// `from.height - max_depth ..= from.height` (clamped at genesis) and matches
/// the referencing block by hash, so an output confirmed on another branch is
/// never found.
pub fn is_confirmed_within_depth<C: ChainView + ?Sized>(
    chain: &C,
    referencing: &BlockPosition,
    from: &BlockIndex,
    max_depth: u64,
) -> Option<u64> {
    let depth = from.height.checked_sub(referencing.height)?;
    if depth > max_depth {
        return None;
    }
    // Height-indexed branch: the ancestor at that height is a single lookup.
    let block = if depth == 0 {
        from
    } else {
        chain.block_at(referencing.height)?
    };
    (block.hash == referencing.hash).then_some(depth)
}
