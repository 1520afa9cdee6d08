pub use attestation::*;
pub use chain::*;
pub use contracts::*;
pub use messenger::*;
pub use relay::*;

mod attestation;
mod chain;
mod contracts;
mod messenger;
mod relay;
