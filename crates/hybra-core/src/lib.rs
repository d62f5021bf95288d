#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Hybra core: canonical types, chain parameters, hashing, and the
//! collaborator traits the consensus rules read chain state through.

pub mod constants;
pub mod crypto;
pub mod params;
pub mod serialization;
pub mod types;
pub mod view;

pub use constants::*;
pub use crypto::*;
pub use params::*;
pub use serialization::*;
pub use types::*;
pub use view::*;
