//! Typed client for the Gelato relay network: submit a call for a relayer to
//! execute, follow the resulting task, and ask what executing will cost.

pub use client::*;
pub use err::GelatoError;

pub mod client;
pub mod err;
pub mod oracles;
pub mod task;
pub mod task_status;

pub const RELAY_URL: &str = "https://relay.gelato.digital";
