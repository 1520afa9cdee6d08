pub use attestation::*;
pub use chain_data::*;
pub use domain::*;
pub use fee::*;
pub use finalization::*;
pub use guid::*;
pub use relay::*;

mod attestation;
mod chain_data;
mod domain;
mod fee;
mod finalization;
mod guid;
mod relay;
/// Serde helpers for amounts
pub mod serialize;
