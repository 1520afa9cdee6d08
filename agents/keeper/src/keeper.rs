use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prometheus::IntCounterVec;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, instrument, instrument::Instrumented, warn, Instrument};

use teleport_base::db::InMemoryStore;
use teleport_base::finalizer::{DomainFinalizer, FinalizationError};
use teleport_base::{Clock, CoreMetrics, PollOptions, TokioClock};
use teleport_core::{
    BlockInfo, BlockTag, ChainCommunicationError, ChainProvider, ChainResult, Classify, DomainId,
    ErrorKind, FinalizationOutcome, KeyValueStore, TeleportGateway, H256,
};

/// A source domain whose gateway batches debt towards a target domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct DomainPair {
    /// Where the gateway lives
    pub source: DomainId,
    /// Where its debt is settled
    pub target: DomainId,
}

impl fmt::Display for DomainPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.target)
    }
}

/// Errors that end one keeper tick early
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    /// Reading the source chain failed
    #[error(transparent)]
    Chain(#[from] ChainCommunicationError),
}

impl Classify for KeeperError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Chain(e) => e.kind(),
        }
    }
}

/// Counters a keeper keeps per domain pair
#[derive(Debug, Clone)]
pub struct KeeperMetrics {
    flushes: IntCounterVec,
    finalizations: IntCounterVec,
    errors: IntCounterVec,
}

impl KeeperMetrics {
    /// Register the keeper counters on `core`
    pub fn new(core: &CoreMetrics) -> prometheus::Result<Self> {
        Ok(Self {
            flushes: core.new_int_counter(
                "keeper_flushes_total",
                "Flush transactions sent by the keeper",
                &["pair"],
            )?,
            finalizations: core.new_int_counter(
                "keeper_finalizations_total",
                "Finalization attempts by outcome",
                &["pair", "outcome"],
            )?,
            errors: core.new_int_counter(
                "keeper_errors_total",
                "Keeper errors by the stage that failed",
                &["pair", "stage"],
            )?,
        })
    }

    /// Flushes sent for `pair`
    pub fn flushes(&self, pair: &str) -> u64 {
        self.flushes.with_label_values(&[pair]).get()
    }

    /// Finalization attempts for `pair` that ended with `outcome`
    pub fn finalizations(&self, pair: &str, outcome: &str) -> u64 {
        self.finalizations.with_label_values(&[pair, outcome]).get()
    }

    /// Failures in `stage` for `pair`
    pub fn errors(&self, pair: &str, stage: &str) -> u64 {
        self.errors.with_label_values(&[pair, stage]).get()
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The flush transaction, when one was sent
    pub flush_tx: Option<H256>,
    /// Source transactions whose messages were finalized now
    pub finalized: usize,
    /// Source transactions already finalized earlier
    pub already_finalized: usize,
    /// Source transactions left for a later tick
    pub not_ready: usize,
    /// Source transactions whose finalization failed
    pub failed: usize,
    /// Where the next scan starts
    pub next_block: u64,
}

/// Flushes one gateway's batched debt towards one target and finalizes the
/// messages those flushes emitted.
#[derive(Debug)]
pub struct PairKeeper {
    pair: DomainPair,
    label: String,
    ttl: Duration,
    interval: Duration,
    gateway: Arc<dyn TeleportGateway>,
    source: Arc<dyn ChainProvider>,
    finalizer: Arc<DomainFinalizer>,
    cursors: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    flush_lock: Arc<Mutex<()>>,
    metrics: KeeperMetrics,
}

impl PairKeeper {
    /// Keeper for `pair` that looks back `ttl` for messages to finalize
    pub fn new(
        pair: DomainPair,
        ttl: Duration,
        gateway: Arc<dyn TeleportGateway>,
        source: Arc<dyn ChainProvider>,
        finalizer: Arc<DomainFinalizer>,
        metrics: KeeperMetrics,
    ) -> Self {
        Self {
            pair,
            label: pair.to_string(),
            ttl,
            interval: Duration::from_secs(60),
            gateway,
            source,
            finalizer,
            cursors: Arc::new(InMemoryStore::new()),
            clock: Arc::new(TokioClock::new()),
            flush_lock: Arc::new(Mutex::new(())),
            metrics,
        }
    }

    /// Pause between ticks
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Where the scan cursor is kept
    pub fn with_cursors(mut self, cursors: Arc<dyn KeyValueStore>) -> Self {
        self.cursors = cursors;
        self
    }

    /// Time source for the ttl window and the tick interval
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share the flush lock with other keepers of the same gateway
    pub fn with_flush_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.flush_lock = lock;
        self
    }

    /// The pair this keeper serves
    pub fn pair(&self) -> DomainPair {
        self.pair
    }

    /// Flush when there is debt, unless another flush of this gateway is in
    /// flight.
    async fn flush_if_owed(&self) -> ChainResult<Option<H256>> {
        let Ok(_guard) = self.flush_lock.try_lock() else {
            debug!("Flush of this gateway already in flight, skipping");
            return Ok(None);
        };
        let debt = self.gateway.batched_debt_to_flush(self.pair.target).await?;
        if debt.is_zero() {
            debug!("No batched debt to flush");
            return Ok(None);
        }
        let tx = self.gateway.flush(self.pair.target).await?;
        self.metrics.flushes.with_label_values(&[&self.label]).inc();
        info!(%debt, ?tx, "Flushed batched debt");
        Ok(Some(tx))
    }

    /// First block in `[lower, latest]` mined at or after `not_before`, or
    /// `latest + 1` when there is none.
    async fn first_block_since(&self, lower: u64, latest: BlockInfo, not_before: u64) -> ChainResult<u64> {
        if latest.timestamp < not_before || lower > latest.number {
            return Ok(latest.number + 1);
        }
        let (mut lo, mut hi) = (lower, latest.number);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let block = self.source.get_block(BlockTag::Number(mid)).await?;
            if block.timestamp >= not_before {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    fn count_outcome(&self, outcome: &str) {
        self.metrics
            .finalizations
            .with_label_values(&[&self.label, outcome])
            .inc();
    }

    /// One pass: flush, then finalize every flush inside the ttl window
    #[instrument(skip(self), fields(pair = %self.pair))]
    pub async fn tick(&self) -> Result<TickReport, KeeperError> {
        let mut report = TickReport::default();
        match self.flush_if_owed().await {
            Ok(tx) => report.flush_tx = tx,
            Err(err) => {
                self.metrics.errors.with_label_values(&[&self.label, "flush"]).inc();
                warn!(error = %err, "Flush failed");
            }
        }

        let latest = self.source.get_block(BlockTag::Latest).await?;
        let cursor = self.cursors.get(&self.pair.source).await?.unwrap_or_default();
        let not_before = self.clock.unix_now().saturating_sub(self.ttl.as_secs());
        let from = self.first_block_since(cursor, latest, not_before).await?;
        report.next_block = latest.number + 1;
        if from > latest.number {
            debug!(from, latest = latest.number, "Nothing to scan");
            self.finalizer.retain_sources(&[]);
            self.cursors.set(&self.pair.source, report.next_block).await?;
            return Ok(report);
        }

        let mut events = self
            .gateway
            .flushed_events(self.pair.target, from, latest.number)
            .await?;
        events.sort_by_key(|e| e.block_number);
        let mut seen = Vec::with_capacity(events.len());
        events.retain(|e| {
            let fresh = !seen.contains(&e.transaction_hash);
            seen.push(e.transaction_hash);
            fresh
        });
        debug!(from, to = latest.number, count = events.len(), "Scanning flushes");

        let mut retry_from = None;
        for event in events {
            let tx = event.transaction_hash;
            match self.finalizer.try_finalize(tx).await {
                Ok(FinalizationOutcome::Finalized(finalized_in)) => {
                    report.finalized += 1;
                    self.count_outcome("finalized");
                    info!(?tx, ?finalized_in, "Finalized flush messages");
                }
                Ok(FinalizationOutcome::AlreadyFinalized) => {
                    report.already_finalized += 1;
                    self.count_outcome("already_finalized");
                    debug!(?tx, "Flush messages already finalized");
                }
                Ok(FinalizationOutcome::NotReady) => {
                    report.not_ready += 1;
                    self.count_outcome("not_ready");
                    retry_from.get_or_insert(event.block_number);
                    info!(?tx, block = event.block_number, "Flush messages not ready yet");
                }
                Err(err) => {
                    report.failed += 1;
                    self.metrics.errors.with_label_values(&[&self.label, "finalize"]).inc();
                    warn!(?tx, error = %err, kind = ?err.kind(), "Finalization failed");
                    // a tx without messages will never become finalizable
                    if !matches!(err, FinalizationError::NoMessages(_)) {
                        retry_from.get_or_insert(event.block_number);
                    }
                }
            }
        }

        let dropped = self.finalizer.retain_sources(&seen);
        if dropped > 0 {
            debug!(dropped, "Forgot finalization records outside the window");
        }
        if let Some(block) = retry_from {
            report.next_block = block;
        }
        self.cursors.set(&self.pair.source, report.next_block).await?;
        Ok(report)
    }

    /// Tick every interval until `cancel` fires. Failed ticks are logged and
    /// the next tick goes ahead.
    pub async fn run(self, cancel: CancellationToken) {
        let clock = self.clock.clone();
        let opts = PollOptions::every(self.interval).with_cancel(cancel);
        let timer = opts.start(clock.as_ref());
        loop {
            match timer.run(self.tick()).await {
                Ok(Ok(report)) => debug!(?report, "Keeper tick done"),
                Ok(Err(err)) => {
                    self.metrics.errors.with_label_values(&[&self.label, "tick"]).inc();
                    warn!(pair = %self.pair, error = %err, "Keeper tick failed");
                }
                Err(_) => {
                    info!(pair = %self.pair, "Keeper stopped mid tick");
                    return;
                }
            }
            if timer.tick().await.is_err() {
                info!(pair = %self.pair, "Keeper stopped");
                return;
            }
        }
    }

    /// Run on its own task
    pub fn spawn(self, cancel: CancellationToken) -> Instrumented<JoinHandle<()>> {
        let span = info_span!("PairKeeper", pair = %self.pair);
        tokio::spawn(self.run(cancel).instrument(span.clone())).instrument(span)
    }
}
