use std::collections::HashMap;
use std::sync::Arc;

use eyre::{eyre, Result, WrapErr};
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use teleport_base::finalizer::DomainFinalizer;
use teleport_base::CoreMetrics;
use teleport_core::{Address, DomainId};
use teleport_ethereum::{EthereumChainProvider, EthereumGateway};

use crate::keeper::{DomainPair, KeeperMetrics, PairKeeper};
use crate::settings::KeeperSettings;

/// Runs one [`PairKeeper`] per configured domain pair
#[derive(Debug)]
pub struct Keeper {
    pairs: Vec<PairKeeper>,
}

impl Keeper {
    /// Name used for settings and metrics
    pub const AGENT_NAME: &'static str = "keeper";

    /// Keeper over already built pairs
    pub fn new(pairs: Vec<PairKeeper>) -> Self {
        Self { pairs }
    }

    /// Connect every configured pair. Finalizers are rollup specific and
    /// come from the caller, keyed by pair.
    pub fn from_settings(
        settings: &KeeperSettings,
        mut finalizers: HashMap<DomainPair, Arc<DomainFinalizer>>,
        metrics: &CoreMetrics,
    ) -> Result<Self> {
        let keeper_metrics = KeeperMetrics::new(metrics)?;
        let mut flush_locks: HashMap<(DomainId, Address), Arc<Mutex<()>>> = HashMap::new();
        let mut pairs = Vec::with_capacity(settings.pairs.len());
        for conf in &settings.pairs {
            let finalizer = finalizers
                .remove(&conf.pair)
                .ok_or_else(|| eyre!("no finalizer configured for {}", conf.pair))?;
            let wallet = settings
                .signer
                .build(conf.connection.chain_id)
                .wrap_err_with(|| format!("signer for {}", conf.pair))?;
            let provider = Arc::new(EthereumChainProvider::connect(&conf.connection, Some(wallet)));
            let gateway = Arc::new(EthereumGateway::new(provider.clone(), conf.gateway));
            let lock = flush_locks
                .entry((conf.pair.source, conf.gateway))
                .or_default()
                .clone();
            pairs.push(
                PairKeeper::new(
                    conf.pair,
                    conf.ttl(),
                    gateway,
                    provider,
                    finalizer,
                    keeper_metrics.clone(),
                )
                .with_interval(conf.interval(settings.interval_secs))
                .with_flush_lock(lock),
            );
        }
        Ok(Self::new(pairs))
    }

    /// Run every pair until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!(pairs = self.pairs.len(), "Starting keeper");
        let tasks = self
            .pairs
            .into_iter()
            .map(|keeper| {
                let pair = keeper.pair();
                let handle = keeper.spawn(cancel.clone());
                async move { handle.await.wrap_err_with(|| format!("keeper task for {pair} failed")) }
            })
            .collect::<Vec<_>>();
        for result in join_all(tasks).await {
            result?;
        }
        Ok(())
    }
}
