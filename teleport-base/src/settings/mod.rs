//! Settings and configuration for teleport agents
//!
//! ## Introduction
//!
//! Every agent shares the [`BaseSettings`] in this crate (tracing for now)
//! plus the reusable sections below, and defines its own settings struct in
//! its crate that flattens them in. Settings are loaded with
//! [`load_settings_object`].
//!
//! ### Configuration value precedence
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. Every `*.json` file in `./config`, in directory order.
//! 2. The comma separated files listed in `CONFIG_FILES`.
//! 3. Env vars prefixed `TELEPORT_BASE_`, shared by every agent in the same
//!    environment. E.g. `export TELEPORT_BASE_TRACING__LEVEL=debug`
//! 4. Env vars prefixed `TELEPORT_{agent name}_`, e.g.
//!    `export TELEPORT_KEEPER_INTERVAL_SECS=30`
//!
//! Env var names map onto the JSON hierarchy: `__` separates nesting levels
//! and each level is converted from snake case to the camelCase used in the
//! files, so `TELEPORT_KEEPER_RELAY__GAS_LIMIT` overrides `relay.gasLimit`.

use std::time::Duration;

use ethers_core::types::Address;
use gelato::{GelatoClient, GelatoError};
use serde::Deserialize;
use teleport_core::RelayKind;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use loader::load_settings_object;
pub use trace::*;

use crate::fee::RelayFeePolicy;
use crate::oracle_api::OracleApiClient;
use crate::PollOptions;

mod loader;
/// Tracing subscriber management
pub mod trace;

/// Settings every agent carries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSettings {
    /// Logging setup
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Pacing of a polling operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSettings {
    /// Pause between polls
    pub interval_ms: u64,
    /// Give up after this long; absent means wait forever
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PollSettings {
    /// Polling options cancelled by `cancel`
    pub fn to_options(&self, cancel: CancellationToken) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.interval_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
            cancel,
        }
    }
}

fn default_relay_attempts() -> u32 {
    5
}

fn default_relay_backoff_ms() -> u64 {
    2000
}

/// Where and how to reach the relay network for one target chain
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySettings {
    /// Relay network API base url; the public relay network when absent
    #[serde(default)]
    pub url: Option<Url>,
    /// Target chain id
    pub chain_id: u64,
    /// The relay contract on the target chain
    pub relay_address: Address,
    /// Which `relay()` the contract exposes
    #[serde(default)]
    pub kind: RelayKind,
    /// Overrides the per-kind gas estimate
    #[serde(default)]
    pub gas_limit: Option<u64>,
    /// How relay fees are obtained
    #[serde(default)]
    pub fee_policy: RelayFeePolicy,
    /// HTTP attempts per relay API call
    #[serde(default = "default_relay_attempts")]
    pub max_attempts: u32,
    /// Linear backoff step between HTTP attempts
    #[serde(default = "default_relay_backoff_ms")]
    pub backoff_ms: u64,
}

impl RelaySettings {
    /// Gas limit to request for one `relay()` call
    pub fn gas_limit(&self) -> u64 {
        self.gas_limit.unwrap_or_else(|| self.kind.default_gas_limit())
    }

    /// Build the relay network client
    pub fn build_api(&self, http: reqwest::Client) -> Result<GelatoClient, GelatoError> {
        let client = match &self.url {
            Some(url) => GelatoClient::new(http, url.clone()),
            None => GelatoClient::mainnet(http)?,
        };
        Ok(client.with_retry(self.max_attempts, Duration::from_millis(self.backoff_ms)))
    }
}

/// Where the oracles publish their signatures
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleApiSettings {
    /// Oracle API url
    pub url: Url,
}

impl OracleApiSettings {
    /// Build the oracle API client
    pub fn build(&self, http: reqwest::Client) -> OracleApiClient {
        OracleApiClient::new(http, self.url.clone())
    }
}
