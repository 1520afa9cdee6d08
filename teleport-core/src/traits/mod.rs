pub use attestation_source::*;
pub use db::*;
pub use finalizer::*;
pub use gateway::*;
pub use join::*;
pub use oracle_auth::*;
pub use price::*;
pub use provider::*;
pub use signing::*;

mod attestation_source;
mod db;
mod finalizer;
mod gateway;
mod join;
mod oracle_auth;
mod price;
mod provider;
mod signing;
