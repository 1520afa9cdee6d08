//! The keeper flushes the debt that source-domain gateways batch towards a
//! target domain, then finalizes the rollup messages those flushes emit so
//! the target can settle them.
//!
//! Each configured `(source, target)` pair runs as its own task. A failed
//! tick is logged and the next one goes ahead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

mod agent;
mod keeper;
pub mod settings;

pub use agent::Keeper;
pub use keeper::{DomainPair, KeeperError, KeeperMetrics, PairKeeper, TickReport};
