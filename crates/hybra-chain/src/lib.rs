#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Hybra chain state.
//!
//! Responsibilities:
//! - Maintain the height-indexed block index of the active branch
//! - Maintain the UTXO set and the set of spent outpoints
//! - Connect blocks after the consensus rules accept their proof
//!
//! Everything is in memory. Persistence and fork choice belong to the node.

pub mod coins;
pub mod error;
pub mod index;
pub mod state;

pub use coins::*;
pub use error::*;
pub use index::*;
pub use state::*;
