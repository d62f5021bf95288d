#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Hybra consensus rules for hybrid PoW/PoS chains.
//!
//! This crate is responsible for:
//! - compact difficulty target encoding/decoding (Bitcoin-style `bits`)
//! - per-kind retargeting
//! - proof-of-work validation against the target
//! - the coin-weighted proof-of-stake kernel, its cache and search loop
//! - stake modifiers and coin maturity
//!
//! It does **not** include networking, script evaluation, or state updates.
//! Chain and UTXO state are read through the `hybra-core` view traits.

pub mod cache;
pub mod confirm;
pub mod difficulty;
pub mod error;
pub mod kernel;
pub mod modifier;
pub mod pow;
pub mod retarget;
pub mod stake;
pub mod validate;

pub use cache::*;
pub use confirm::*;
pub use difficulty::*;
pub use error::*;
pub use kernel::*;
pub use modifier::*;
pub use pow::*;
pub use retarget::*;
pub use stake::*;
pub use validate::*;
