//! Shared machinery for teleport agents and clients: settings, tracing,
//! metrics, polling primitives, and the protocol components that sit on top
//! of the collaborator traits in `teleport-core`.

// Forbid unsafe code outside of tests
#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

pub mod settings;

mod clock;
pub use clock::*;

mod metrics;
pub use metrics::*;

mod retry;
pub use retry::*;

/// Key-value stores for agent cursors
pub mod db;

/// Oracle signature collection
pub mod attestation;
/// Fee and mintable-amount computation
pub mod fee;
/// Rollup message finalization
pub mod finalizer;
/// HTTP client for the oracle signature API
pub mod oracle_api;
/// Gasless relay submission and tracking
pub mod relay;
