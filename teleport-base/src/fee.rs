use std::sync::Arc;

use async_trait::async_trait;
use gelato::{task::NATIVE_FEE_TOKEN_ADDRESS, GelatoError, RelayApi};
use serde::Deserialize;
use teleport_core::{
    ChainCommunicationError, ChainResult, Classify, DomainId, ErrorKind, FeeQuote, NativePriceOracle,
    RelayKind, TeleportJoin, TransferGuid, H256, U256,
};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::{Clock, ExponentialBackoff};

/// Errors computing a fee quote
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    /// A relay fee estimate could not be obtained
    #[error("Relay fee quote unavailable: {0}")]
    FeeQuoteUnavailable(String),
    /// The relay network has no fee oracle for the chain
    #[error("Relay network does not support chain {0}")]
    UnsupportedRelayChain(u64),
    /// Reading the target domain failed
    #[error(transparent)]
    Chain(#[from] ChainCommunicationError),
}

impl Classify for FeeError {
    fn kind(&self) -> ErrorKind {
        match self {
            FeeError::FeeQuoteUnavailable(_) => ErrorKind::TransientNetwork,
            FeeError::UnsupportedRelayChain(_) => ErrorKind::InvalidInput,
            FeeError::Chain(e) => e.kind(),
        }
    }
}

/// How relay fees are priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "amount")]
pub enum RelayFeePolicy {
    /// Ask the relay network and convert its native-token quote
    #[default]
    Estimate,
    /// A fixed fee in the asset's base unit, for networks where gas is
    /// negligible
    Nominal(#[serde(with = "teleport_core::types::serialize::dec_u128")] u128),
}

/// Prices relayed mints on one target chain
#[derive(Debug)]
pub struct RelayFeeEstimator {
    api: Arc<dyn RelayApi>,
    price: Arc<dyn NativePriceOracle>,
    chain_id: u64,
    policy: RelayFeePolicy,
    gas_limit: u64,
    supported: OnceCell<Vec<u64>>,
}

impl RelayFeeEstimator {
    /// Estimator for `chain_id` with the fixed gas estimate of `kind`
    pub fn new(
        api: Arc<dyn RelayApi>,
        price: Arc<dyn NativePriceOracle>,
        chain_id: u64,
        kind: RelayKind,
        policy: RelayFeePolicy,
    ) -> Self {
        Self {
            api,
            price,
            chain_id,
            policy,
            gas_limit: kind.default_gas_limit(),
            supported: OnceCell::new(),
        }
    }

    /// Use a configured gas estimate instead of the per-kind one
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    async fn supported_chains(&self) -> Result<&Vec<u64>, GelatoError> {
        self.supported
            .get_or_try_init(|| self.api.supported_chains())
            .await
    }

    /// One attempt at a relay fee in the asset's base unit
    async fn estimate_once(&self) -> Result<u128, EstimateError> {
        if !self.supported_chains().await?.contains(&self.chain_id) {
            return Err(EstimateError::Unsupported(self.chain_id));
        }
        let native_fee = self
            .api
            .estimate_fee(self.chain_id, NATIVE_FEE_TOKEN_ADDRESS, self.gas_limit.into())
            .await?;
        let price = self.price.native_price_in_asset(self.chain_id).await?;
        let fee = native_fee
            .checked_mul(price)
            .map(|v| v / U256::exp10(18))
            .filter(|v| *v <= U256::from(u128::MAX))
            .ok_or(EstimateError::Overflow)?;
        debug!(%native_fee, %price, %fee, gas_limit = self.gas_limit, "Estimated relay fee");
        Ok(fee.as_u128())
    }
}

#[derive(Debug, thiserror::Error)]
enum EstimateError {
    #[error(transparent)]
    Relay(#[from] GelatoError),
    #[error(transparent)]
    Price(#[from] ChainCommunicationError),
    #[error("Chain {0} not supported")]
    Unsupported(u64),
    #[error("Relay fee overflows the asset amount")]
    Overflow,
}

impl EstimateError {
    fn is_transient(&self) -> bool {
        match self {
            EstimateError::Relay(e) => e.is_transient(),
            EstimateError::Price(e) => e.is_retryable(),
            EstimateError::Unsupported(_) | EstimateError::Overflow => false,
        }
    }
}

/// A constant native token price, for chains whose gas token is pegged to
/// the asset (1e18 on xDai)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedNativePrice(pub U256);

#[async_trait]
impl NativePriceOracle for FixedNativePrice {
    async fn native_price_in_asset(&self, _chain_id: u64) -> ChainResult<U256> {
        Ok(self.0)
    }
}

/// Computes what a transfer yields on its target domain
#[derive(Debug)]
pub struct FeeOracle {
    join: Arc<dyn TeleportJoin>,
    relay: Option<RelayFeeEstimator>,
    clock: Arc<dyn Clock>,
    backoff: ExponentialBackoff,
}

impl FeeOracle {
    /// Oracle over the target domain's join contract
    pub fn new(join: Arc<dyn TeleportJoin>, clock: Arc<dyn Clock>) -> Self {
        Self {
            join,
            relay: None,
            clock,
            backoff: ExponentialBackoff::default(),
        }
    }

    /// Enable relay fee quotes
    pub fn with_relay(mut self, relay: RelayFeeEstimator) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Override the retry policy for relay fee estimates
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Quote an existing transfer. Mintable is computed against what the
    /// target still owes when an earlier mint was partial.
    #[instrument(skip(self, guid), fields(guid = ?guid.guid_hash()))]
    pub async fn quote(&self, guid: &TransferGuid, with_relay_fee: bool) -> Result<FeeQuote, FeeError> {
        let status = self.join.mint_status(guid.guid_hash()).await?;
        let (amount_to_take, pending) = if status.blessed {
            (status.pending, Some(status.pending))
        } else {
            (guid.amount(), None)
        };
        let mut quote = self.quote_amount(guid, amount_to_take, with_relay_fee).await?;
        quote.pending = pending;
        Ok(quote)
    }

    /// Quote a transfer that has not happened yet
    #[instrument(skip(self))]
    pub async fn quote_hypothetical(
        &self,
        source: DomainId,
        target: DomainId,
        amount: u128,
        with_relay_fee: bool,
    ) -> Result<FeeQuote, FeeError> {
        let guid = TransferGuid::new(
            source,
            target,
            H256::zero(),
            H256::zero(),
            amount,
            0,
            self.clock.unix_now(),
        )
        .map_err(|e| FeeError::FeeQuoteUnavailable(e.to_string()))?;
        self.quote_amount(&guid, amount, with_relay_fee).await
    }

    async fn quote_amount(
        &self,
        guid: &TransferGuid,
        amount_to_take: u128,
        with_relay_fee: bool,
    ) -> Result<FeeQuote, FeeError> {
        let bridge_fee = self.join.bridge_fee(guid, amount_to_take).await?;
        let mut quote = FeeQuote::new(amount_to_take, bridge_fee);
        if with_relay_fee {
            quote.relay_fee = Some(self.relay_fee().await?);
        }
        Ok(quote)
    }

    /// Fee a relayer charges for one mint, in the asset's base unit
    pub async fn relay_fee(&self) -> Result<u128, FeeError> {
        let relay = self
            .relay
            .as_ref()
            .ok_or_else(|| FeeError::FeeQuoteUnavailable("relay fees are not configured".into()))?;
        if let RelayFeePolicy::Nominal(fee) = relay.policy {
            return Ok(fee);
        }
        self.backoff
            .retry(
                self.clock.as_ref(),
                "relay fee estimate",
                EstimateError::is_transient,
                || relay.estimate_once(),
            )
            .await
            .map_err(|err| match err {
                EstimateError::Unsupported(chain) => FeeError::UnsupportedRelayChain(chain),
                other => FeeError::FeeQuoteUnavailable(other.to_string()),
            })
    }
}
