//! Keeper configuration
//!
//! ```json
//! {
//!   "intervalSecs": 60,
//!   "signer": { "type": "hexKey", "key": "0x..." },
//!   "pairs": [{
//!     "source": "OPT-MAIN-A",
//!     "target": "ETH-MAIN-A",
//!     "gateway": "0x...",
//!     "ttlSecs": 691200,
//!     "connection": { "url": "https://...", "chainId": 10 }
//!   }]
//! }
//! ```

use std::time::Duration;

use eyre::Result;
use serde::Deserialize;

use teleport_base::settings::{load_settings_object, BaseSettings};
use teleport_core::Address;
use teleport_ethereum::{ConnectionConf, SignerConf};

use crate::keeper::DomainPair;

fn default_interval_secs() -> u64 {
    60
}

/// One gateway and the target it flushes to
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSettings {
    /// Source and target domain
    #[serde(flatten)]
    pub pair: DomainPair,
    /// The gateway on the source domain
    pub gateway: Address,
    /// Oldest flush still worth finalizing
    pub ttl_secs: u64,
    /// Overrides the keeper wide tick interval
    #[serde(default)]
    pub interval_secs: Option<u64>,
    /// Source chain RPC
    pub connection: ConnectionConf,
}

/// Settings for the keeper agent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeeperSettings {
    /// Tracing and other shared settings
    #[serde(flatten)]
    pub base: BaseSettings,
    /// Seconds between two ticks of a pair
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Key that sends flush transactions
    pub signer: SignerConf,
    /// Every gateway to keep
    pub pairs: Vec<PairSettings>,
}

impl KeeperSettings {
    /// Load from `./config`, `CONFIG_FILES` and `TELEPORT_KEEPER_*` variables
    pub fn load() -> Result<Self> {
        load_settings_object("keeper")
    }
}

impl PairSettings {
    /// Tick interval for this pair
    pub fn interval(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(default_secs))
    }

    /// The ttl window
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
