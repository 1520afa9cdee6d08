//! Relayer configuration
//!
//! ```json
//! {
//!   "connection": { "url": "https://...", "chainId": 1 },
//!   "oracleAuth": "0x...",
//!   "join": "0x...",
//!   "signer": { "type": "hexKey", "key": "0x..." },
//!   "relay": {
//!     "chainId": 1,
//!     "relayAddress": "0x...",
//!     "kind": "basic",
//!     "feePolicy": { "type": "estimate" }
//!   },
//!   "nativePrice": "0xa2a15d09519be00000",
//!   "oracleApi": { "url": "https://..." },
//!   "attestationPoll": { "intervalMs": 2000, "timeoutMs": 300000 },
//!   "relayPoll": { "intervalMs": 2000 }
//! }
//! ```

use eyre::Result;
use serde::Deserialize;

use teleport_base::settings::{
    load_settings_object, BaseSettings, OracleApiSettings, PollSettings, RelaySettings,
};
use teleport_core::{Address, U256};
use teleport_ethereum::{ConnectionConf, SignerConf};

fn default_attestation_poll() -> PollSettings {
    PollSettings {
        interval_ms: 2000,
        timeout_ms: Some(5 * 60 * 1000),
    }
}

fn default_relay_poll() -> PollSettings {
    PollSettings {
        interval_ms: 2000,
        timeout_ms: Some(10 * 60 * 1000),
    }
}

fn default_expiry_secs() -> u64 {
    3600
}

/// Settings for the relayer agent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerSettings {
    /// Tracing and other shared settings
    #[serde(flatten)]
    pub base: BaseSettings,
    /// Target domain RPC, read only
    pub connection: ConnectionConf,
    /// The oracle signature verifier on the target domain
    pub oracle_auth: Address,
    /// The join contract on the target domain
    pub join: Address,
    /// The receiver's key, which authorizes the relayer
    pub signer: SignerConf,
    /// Relay network and relay contract
    pub relay: RelaySettings,
    /// Price of one native token in the asset, WAD. Needed to estimate relay
    /// fees.
    #[serde(default)]
    pub native_price: Option<U256>,
    /// Where the oracles publish signatures
    pub oracle_api: OracleApiSettings,
    /// Pacing of the signature wait
    #[serde(default = "default_attestation_poll")]
    pub attestation_poll: PollSettings,
    /// Pacing of the relay task wait
    #[serde(default = "default_relay_poll")]
    pub relay_poll: PollSettings,
    /// Upper bound on the bridge fee as a WAD fraction. Derived from the fee
    /// quote when absent.
    #[serde(default)]
    pub max_fee_percentage: Option<U256>,
    /// How long the receiver's authorization stays valid
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

impl RelayerSettings {
    /// Load from `./config`, `CONFIG_FILES` and `TELEPORT_RELAYER_*`
    /// variables
    pub fn load() -> Result<Self> {
        load_settings_object("relayer")
    }
}
