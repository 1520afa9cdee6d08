use std::sync::Arc;
use std::time::Duration;

use eyre::{bail, ensure, eyre, Result, WrapErr};
use gelato::RelayApi;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use teleport_base::attestation::{AttestationCollector, AttestationError};
use teleport_base::fee::{FeeError, FeeOracle, FixedNativePrice, RelayFeeEstimator, RelayFeePolicy};
use teleport_base::relay::{RelayClient, RelayError, RelayRequest};
use teleport_base::settings::PollSettings;
use teleport_base::{Clock, CoreMetrics, TokioClock};
use teleport_core::{AttestationKey, ChainProvider, FeeQuote, TeleportSigner, H256, U256};
use teleport_ethereum::{EthereumChainProvider, EthereumOracleAuth, EthereumTeleportJoin};

use crate::settings::RelayerSettings;

/// Why a relayed mint did not happen
#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    /// No oracle quorum
    #[error(transparent)]
    Attestation(#[from] AttestationError),
    /// The mint could not be priced
    #[error(transparent)]
    Fee(#[from] FeeError),
    /// The relay network refused or failed the mint
    #[error(transparent)]
    Relay(#[from] RelayError),
    /// Fees leave the receiver nothing
    #[error("Nothing left to mint for {0:?} once fees are paid")]
    NothingToMint(H256),
}

/// Bridge fee as a WAD fraction of the amount taken, rounded up
fn fee_percentage(quote: &FeeQuote) -> U256 {
    let taken = U256::from(quote.mintable) + U256::from(quote.bridge_fee);
    if taken.is_zero() {
        return U256::zero();
    }
    (U256::from(quote.bridge_fee) * U256::exp10(18) + taken - 1) / taken
}

/// Mints teleports on the target domain through the relay network, paying
/// the relayer out of the minted amount.
#[derive(Debug)]
pub struct Relayer {
    collector: AttestationCollector,
    fees: FeeOracle,
    relay: RelayClient,
    receiver: Arc<dyn TeleportSigner>,
    clock: Arc<dyn Clock>,
    attestation_poll: PollSettings,
    relay_poll: PollSettings,
    max_fee_percentage: Option<U256>,
    expiry: Duration,
}

impl Relayer {
    /// Name used for settings and metrics
    pub const AGENT_NAME: &'static str = "relayer";

    /// Relayer over already built components
    pub fn new(
        collector: AttestationCollector,
        fees: FeeOracle,
        relay: RelayClient,
        receiver: Arc<dyn TeleportSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collector,
            fees,
            relay,
            receiver,
            clock,
            attestation_poll: PollSettings {
                interval_ms: 2000,
                timeout_ms: None,
            },
            relay_poll: PollSettings {
                interval_ms: 2000,
                timeout_ms: None,
            },
            max_fee_percentage: None,
            expiry: Duration::from_secs(3600),
        }
    }

    /// Pacing of the signature and relay task waits
    pub fn with_polls(mut self, attestation: PollSettings, relay: PollSettings) -> Self {
        self.attestation_poll = attestation;
        self.relay_poll = relay;
        self
    }

    /// Fixed bridge fee bound instead of one derived from each quote
    pub fn with_max_fee_percentage(mut self, max: Option<U256>) -> Self {
        self.max_fee_percentage = max;
        self
    }

    /// Lifetime of the receiver's authorization
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Connect to the target domain, the oracle API and the relay network
    pub fn from_settings(settings: &RelayerSettings, metrics: &CoreMetrics) -> Result<Self> {
        ensure!(
            settings.relay.chain_id == settings.connection.chain_id,
            "relay chain {} does not match the connection's chain {}",
            settings.relay.chain_id,
            settings.connection.chain_id
        );
        let native_price = match (settings.native_price, settings.relay.fee_policy) {
            (Some(price), _) => price,
            (None, RelayFeePolicy::Nominal(_)) => U256::exp10(18),
            (None, RelayFeePolicy::Estimate) => {
                bail!("nativePrice is required to estimate relay fees")
            }
        };
        let receiver = settings
            .signer
            .build(settings.connection.chain_id)
            .wrap_err("receiver signer")?;

        let http = reqwest::Client::new();
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let provider: Arc<dyn ChainProvider> =
            Arc::new(EthereumChainProvider::connect(&settings.connection, None));
        let api: Arc<dyn RelayApi> = Arc::new(
            settings
                .relay
                .build_api(http.clone())
                .map_err(|e| eyre!("relay network client: {e}"))?,
        );

        let collector = AttestationCollector::new(
            Arc::new(settings.oracle_api.build(http)),
            Arc::new(EthereumOracleAuth::new(provider.clone(), settings.oracle_auth)),
            clock.clone(),
        )
        .with_poll_counter(metrics.attestation_polls());

        let estimator = RelayFeeEstimator::new(
            api.clone(),
            Arc::new(FixedNativePrice(native_price)),
            settings.relay.chain_id,
            settings.relay.kind,
            settings.relay.fee_policy,
        )
        .with_gas_limit(settings.relay.gas_limit());
        let fees = FeeOracle::new(
            Arc::new(EthereumTeleportJoin::new(provider, settings.join)),
            clock.clone(),
        )
        .with_relay(estimator);

        let relay = RelayClient::new(
            api,
            clock.clone(),
            settings.relay.chain_id,
            settings.relay.relay_address,
            settings.relay.kind,
        )
        .with_gas_limit(settings.relay.gas_limit())
        .with_outcome_counter(metrics.relay_tasks());

        Ok(Self::new(collector, fees, relay, Arc::new(receiver), clock)
            .with_polls(settings.attestation_poll, settings.relay_poll)
            .with_max_fee_percentage(settings.max_fee_percentage)
            .with_expiry(Duration::from_secs(settings.expiry_secs)))
    }

    /// Wait for the oracle quorum on the teleport `tx_hash` initiated, price
    /// it, and have the relay network mint it. Returns the mint tx hash.
    #[instrument(skip(self, cancel))]
    pub async fn relay_mint(
        &self,
        tx_hash: H256,
        cancel: &CancellationToken,
    ) -> Result<H256, RelayerError> {
        let opts = self.attestation_poll.to_options(cancel.clone());
        let satisfied = self
            .collector
            .collect_with_onchain_threshold(AttestationKey::TxHash(tx_hash), &opts, |count, threshold| {
                info!(count, threshold, "Oracle signatures")
            })
            .await?;
        let guid = satisfied.guid;

        let quote = self.fees.quote(&guid, true).await?;
        if quote.receivable() == 0 {
            return Err(RelayerError::NothingToMint(guid.guid_hash()));
        }
        let relay_fee = quote.relay_fee.unwrap_or_default();
        let request = RelayRequest {
            guid,
            signatures: satisfied.signatures(),
            relay_fee,
            max_fee_percentage: self
                .max_fee_percentage
                .unwrap_or_else(|| fee_percentage(&quote)),
            expiry: self.clock.unix_now() + self.expiry.as_secs(),
            extra_call: None,
        };
        info!(
            mintable = quote.mintable,
            bridge_fee = quote.bridge_fee,
            relay_fee,
            "Requesting relayed mint"
        );

        let mut task = self.relay.request_relay(&self.receiver, request).await?;
        let opts = self.relay_poll.to_options(cancel.clone());
        Ok(self.relay.wait_for_task(&mut task, &opts).await?)
    }

    /// Relay every transaction in turn. Fails if any of them failed.
    pub async fn run(&self, tx_hashes: Vec<H256>, cancel: CancellationToken) -> Result<()> {
        info!(count = tx_hashes.len(), "Starting relayer");
        let mut failed = 0;
        for tx_hash in tx_hashes {
            if cancel.is_cancelled() {
                break;
            }
            match self.relay_mint(tx_hash, &cancel).await {
                Ok(minted_in) => info!(?tx_hash, ?minted_in, "Teleport minted"),
                Err(err) => {
                    failed += 1;
                    warn!(?tx_hash, error = %err, "Relayed mint failed");
                }
            }
        }
        ensure!(failed == 0, "{failed} relayed mints failed");
        Ok(())
    }
}
