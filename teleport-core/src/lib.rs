//! This crate contains core primitives, traits, and types for teleport
//! implementations: the canonical transfer identity, attestation sets, fee
//! quotes, relay tasks, finalization outcomes, and the collaborator traits
//! every chain integration implements.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use ethers_core::types::{Address, Bytes, Signature, H160, H256, U256};

pub use error::*;
pub use traits::*;
pub use types::*;

/// Error types shared by every component
mod error;
/// Collaborator traits (chain facade, contracts, oracles, storage)
pub mod traits;
/// Value types
pub mod types;
/// Hashing and formatting helpers
pub mod utils;
