use ethers_signers::{LocalWallet, Signer};
use serde::Deserialize;
use teleport_core::{ChainCommunicationError, ChainResult};
use url::Url;

fn default_max_requests() -> u32 {
    6
}

fn default_base_retry_ms() -> u64 {
    50
}

fn default_receipt_timeout_secs() -> u64 {
    300
}

/// Ethereum RPC connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConf {
    /// JSON-RPC endpoint
    pub url: Url,
    /// Chain id the endpoint serves
    pub chain_id: u64,
    /// Attempts per JSON-RPC request
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Backoff before the first retry, doubled on every further one
    #[serde(default = "default_base_retry_ms")]
    pub base_retry_ms: u64,
    /// How long to wait for a sent transaction to be mined
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

/// Transaction signer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SignerConf {
    /// A local hex private key
    HexKey {
        /// 0x-prefixed private key
        key: String,
    },
}

impl SignerConf {
    /// Build the wallet for `chain_id`
    pub fn build(&self, chain_id: u64) -> ChainResult<LocalWallet> {
        match self {
            SignerConf::HexKey { key } => key
                .parse::<LocalWallet>()
                .map(|wallet| wallet.with_chain_id(chain_id))
                .map_err(ChainCommunicationError::from_other),
        }
    }
}
