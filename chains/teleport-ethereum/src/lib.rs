//! Ethereum implementations of the teleport chain traits: a JSON-RPC backed
//! [`ChainProvider`](teleport_core::ChainProvider) and ABI adapters for the
//! gateway, oracle-auth and join contracts built on top of it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use config::*;
pub use contracts::*;
pub use provider::*;
pub use retrying::{RetryingProvider, RetryingProviderError};

/// Connection and signer settings
mod config;

/// ABI adapters
mod contracts;

/// JSON-RPC chain facade
mod provider;

/// Retrying Provider
mod retrying;

mod tx;
