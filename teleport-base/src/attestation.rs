use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use prometheus::IntCounterVec;
use teleport_core::{
    AttestationKey, AttestationSet, AttestationSource, Bytes, ChainCommunicationError, Classify,
    ErrorKind, OracleAuth, TransferGuid, H256,
};
use tracing::{debug, info, instrument, warn};

use crate::{Clock, PollInterrupt, PollOptions, PollTimer};

/// Why a signature wait ended without a quorum
#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    /// The caller's timeout passed
    #[error("Timed out waiting for oracle signatures")]
    Timeout,
    /// The caller cancelled the wait
    #[error("Oracle signature wait was cancelled")]
    Cancelled,
    /// Reading the on-chain threshold failed
    #[error(transparent)]
    Chain(#[from] ChainCommunicationError),
}

impl From<PollInterrupt> for AttestationError {
    fn from(interrupt: PollInterrupt) -> Self {
        match interrupt {
            PollInterrupt::TimedOut => Self::Timeout,
            PollInterrupt::Cancelled => Self::Cancelled,
        }
    }
}

impl Classify for AttestationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout | Self::Cancelled => ErrorKind::Timeout,
            Self::Chain(e) => e.kind(),
        }
    }
}

/// A quorum the target's verifier accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Satisfied {
    /// The attested transfer
    pub guid: TransferGuid,
    /// The verified signatures, ordered by signer
    pub attestations: AttestationSet,
}

impl Satisfied {
    /// Signatures in the layout the verifier and the relay contract expect
    pub fn signatures(&self) -> Bytes {
        self.attestations.concat_signatures()
    }
}

/// Collects oracle signatures until the target domain would accept them
#[derive(Debug)]
pub struct AttestationCollector {
    source: Arc<dyn AttestationSource>,
    auth: Arc<dyn OracleAuth>,
    clock: Arc<dyn Clock>,
    /// tx hash to the GUID it emitted; entries are never replaced
    resolved: RwLock<HashMap<H256, TransferGuid>>,
    polls: Option<IntCounterVec>,
}

impl AttestationCollector {
    /// Collector reading `source` and checking quorums against `auth`
    pub fn new(
        source: Arc<dyn AttestationSource>,
        auth: Arc<dyn OracleAuth>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            auth,
            clock,
            resolved: RwLock::new(HashMap::new()),
            polls: None,
        }
    }

    /// Count polls on `counter`, labelled by result
    pub fn with_poll_counter(mut self, counter: IntCounterVec) -> Self {
        self.polls = Some(counter);
        self
    }

    /// The GUID a source tx resolved to, once seen
    pub fn resolved_guid(&self, tx_hash: H256) -> Option<TransferGuid> {
        self.resolved.read().get(&tx_hash).copied()
    }

    fn resolve(&self, tx_hash: H256, guid: TransferGuid) -> TransferGuid {
        *self.resolved.write().entry(tx_hash).or_insert(guid)
    }

    fn count_poll(&self, result: &str) {
        if let Some(polls) = &self.polls {
            polls.with_label_values(&[result]).inc();
        }
    }

    /// Read the quorum size from the verifier, then [`Self::collect`]. The
    /// timeout covers the threshold read too.
    pub async fn collect_with_onchain_threshold(
        &self,
        key: AttestationKey,
        opts: &PollOptions,
        on_progress: impl FnMut(usize, u32) + Send,
    ) -> Result<Satisfied, AttestationError> {
        let timer = opts.start(self.clock.as_ref());
        let threshold = timer.run(self.auth.threshold()).await??;
        self.poll(key, threshold, &timer, on_progress).await
    }

    /// Poll the source until `threshold` distinct valid signatures are held
    /// and the verifier accepts them. `on_progress(count, threshold)` runs
    /// after every poll.
    pub async fn collect(
        &self,
        key: AttestationKey,
        threshold: u32,
        opts: &PollOptions,
        on_progress: impl FnMut(usize, u32) + Send,
    ) -> Result<Satisfied, AttestationError> {
        let timer = opts.start(self.clock.as_ref());
        self.poll(key, threshold, &timer, on_progress).await
    }

    #[instrument(skip(self, timer, on_progress), fields(%key))]
    async fn poll(
        &self,
        key: AttestationKey,
        threshold: u32,
        timer: &PollTimer<'_>,
        mut on_progress: impl FnMut(usize, u32) + Send,
    ) -> Result<Satisfied, AttestationError> {
        let mut collected: Option<(TransferGuid, AttestationSet)> = match key {
            AttestationKey::TxHash(tx) => self
                .resolved_guid(tx)
                .map(|guid| (guid, AttestationSet::new(guid.guid_hash()))),
            AttestationKey::GuidHash(_) => None,
        };

        loop {
            match timer.run(self.source.fetch_attestations(key)).await? {
                Ok(entries) => {
                    self.count_poll("ok");
                    for entry in entries {
                        if let AttestationKey::GuidHash(wanted) = key {
                            if entry.guid.guid_hash() != wanted {
                                debug!(signer = ?entry.attestation.signer, "Skipping signature for another GUID");
                                continue;
                            }
                        }
                        let (guid, set) = collected.get_or_insert_with(|| {
                            let guid = match key {
                                AttestationKey::TxHash(tx) => self.resolve(tx, entry.guid),
                                AttestationKey::GuidHash(_) => entry.guid,
                            };
                            (guid, AttestationSet::new(guid.guid_hash()))
                        });
                        if entry.guid != *guid {
                            debug!(signer = ?entry.attestation.signer, "Skipping signature for another GUID");
                            continue;
                        }
                        if set.insert(entry.attestation) {
                            debug!(signer = ?entry.attestation.signer, "New oracle signature");
                        }
                    }
                }
                Err(err) => {
                    self.count_poll("error");
                    warn!(error = %err, "Failed to fetch oracle signatures");
                }
            }

            let count = collected.as_ref().map(|(_, set)| set.len()).unwrap_or(0);
            on_progress(count, threshold);

            if let Some((guid, set)) = &collected {
                if count >= threshold as usize {
                    let signatures = set.concat_signatures();
                    match timer
                        .run(self.auth.is_valid(guid.guid_hash(), &signatures, threshold))
                        .await?
                    {
                        Ok(true) => {
                            info!(count, threshold, guid = ?guid.guid_hash(), "Oracle quorum reached");
                            return Ok(Satisfied {
                                guid: *guid,
                                attestations: set.clone(),
                            });
                        }
                        Ok(false) => warn!(count, threshold, "Verifier rejected signature set"),
                        Err(err) => warn!(error = %err, "Failed to check signature set"),
                    }
                }
            }

            timer.tick().await?;
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use ethers_core::utils::hash_message;
    use parking_lot::Mutex;
    use teleport_core::{Address, ChainResult, OracleAttestation, Signature, TeleportSigner};
    use teleport_test::mocks::{MockAttestationSource, MockOracleAuth};
    use teleport_test::test_utils::{oracle_attestation, oracle_wallet, test_guid};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{ManualClock, TokioClock};

    fn guid() -> TransferGuid {
        test_guid(100, 0)
    }

    async fn signed(seed: u8, guid: &TransferGuid) -> OracleAttestation {
        oracle_attestation(seed, guid).await
    }

    /// A source that publishes one more signature per poll
    async fn growing_source(guid: TransferGuid, total: usize) -> (MockAttestationSource, Arc<AtomicUsize>) {
        let mut all = Vec::new();
        for key in 1..=total as u8 {
            all.push(signed(key, &guid).await);
        }
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let mut source = MockAttestationSource::new();
        source.expect__fetch_attestations().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(all[..n.min(all.len())].to_vec())
        });
        (source, polls)
    }

    fn accepting_auth() -> MockOracleAuth {
        let mut auth = MockOracleAuth::new();
        auth.expect__is_valid().returning(|_, _, _| Ok(true));
        auth
    }

    #[tokio::test]
    async fn satisfied_on_third_tick() {
        let guid = guid();
        let (source, polls) = growing_source(guid, 5).await;
        let clock = Arc::new(ManualClock::default());
        let collector = AttestationCollector::new(Arc::new(source), Arc::new(accepting_auth()), clock.clone());

        let progress = Mutex::new(Vec::new());
        let satisfied = collector
            .collect(
                AttestationKey::GuidHash(guid.guid_hash()),
                3,
                &PollOptions::every(Duration::from_secs(1)),
                |count, threshold| progress.lock().push((count, threshold)),
            )
            .await
            .unwrap();

        assert_eq!(*progress.lock(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(satisfied.guid, guid);
        assert_eq!(satisfied.attestations.len(), 3);
        assert_eq!(satisfied.signatures().len(), 3 * 65);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn forged_and_duplicate_signatures_do_not_count() {
        let guid = guid();
        let good = signed(1, &guid).await;
        let mut forged = signed(2, &guid).await;
        forged.attestation.signer = Address::repeat_byte(9);

        let mut source = MockAttestationSource::new();
        source
            .expect__fetch_attestations()
            .returning(move |_| Ok(vec![good, good, forged]));
        let mut auth = MockOracleAuth::new();
        auth.expect__is_valid().never();

        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(auth),
            Arc::new(ManualClock::default()),
        );
        let counts = Mutex::new(Vec::new());
        let err = collector
            .collect(
                AttestationKey::GuidHash(guid.guid_hash()),
                2,
                &PollOptions::every(Duration::from_secs(1)).with_timeout(Duration::from_secs(3)),
                |count, _| counts.lock().push(count),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Timeout));
        assert!(counts.lock().iter().all(|c| *c == 1));
    }

    #[tokio::test]
    async fn source_errors_count_as_empty_ticks() {
        let guid = guid();
        let first = signed(1, &guid).await;
        let polls = AtomicUsize::new(0);
        let mut source = MockAttestationSource::new();
        source.expect__fetch_attestations().returning(move |_| {
            if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ChainCommunicationError::from_other_str("oracle api down"))
            } else {
                Ok(vec![first])
            }
        });
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(accepting_auth()),
            Arc::new(ManualClock::default()),
        );
        let progress = Mutex::new(Vec::new());
        collector
            .collect(
                AttestationKey::GuidHash(guid.guid_hash()),
                1,
                &PollOptions::every(Duration::from_secs(1)),
                |count, threshold| progress.lock().push((count, threshold)),
            )
            .await
            .unwrap();
        assert_eq!(*progress.lock(), vec![(0, 1), (1, 1)]);
    }

    #[tokio::test]
    async fn keeps_polling_while_the_verifier_rejects() {
        let guid = guid();
        let (source, _) = growing_source(guid, 3).await;
        let mut auth = MockOracleAuth::new();
        // the verifier wants a signer we only see on the third poll
        auth.expect__is_valid()
            .returning(|_, sigs, _| Ok(sigs.len() == 3 * 65));
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(auth),
            Arc::new(ManualClock::default()),
        );
        let satisfied = collector
            .collect(
                AttestationKey::GuidHash(guid.guid_hash()),
                1,
                &PollOptions::every(Duration::from_secs(1)),
                |_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(satisfied.attestations.len(), 3);
    }

    #[tokio::test]
    async fn tx_hash_keys_resolve_the_guid_once() {
        let guid = guid();
        let tx = H256::repeat_byte(7);
        let (source, _) = growing_source(guid, 2).await;
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(accepting_auth()),
            Arc::new(ManualClock::default()),
        );
        assert_eq!(collector.resolved_guid(tx), None);
        let satisfied = collector
            .collect(
                AttestationKey::TxHash(tx),
                2,
                &PollOptions::every(Duration::from_secs(1)),
                |_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(satisfied.guid, guid);
        assert_eq!(collector.resolved_guid(tx), Some(guid));
    }

    #[tokio::test]
    async fn threshold_comes_from_the_verifier() {
        let guid = guid();
        let (source, polls) = growing_source(guid, 4).await;
        let mut auth = accepting_auth();
        auth.expect__threshold().times(1).returning(|| Ok(2));
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(auth),
            Arc::new(ManualClock::default()),
        );
        collector
            .collect_with_onchain_threshold(
                AttestationKey::GuidHash(guid.guid_hash()),
                &PollOptions::every(Duration::from_secs(1)),
                |_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_ends_the_wait() {
        let mut source = MockAttestationSource::new();
        source.expect__fetch_attestations().returning(|_| Ok(vec![]));
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(MockOracleAuth::new()),
            Arc::new(ManualClock::default()),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = collector
            .collect(
                AttestationKey::GuidHash(H256::zero()),
                1,
                &PollOptions::every(Duration::from_secs(1)).with_cancel(cancel),
                |_, _| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Cancelled));
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    /// Accepts a blob when at least `threshold` of its signatures recover to
    /// distinct known oracles over `guid_hash`, like the on-chain verifier.
    fn recovering_auth(oracles: Vec<Address>) -> MockOracleAuth {
        let mut auth = MockOracleAuth::new();
        auth.expect__is_valid().returning(move |guid_hash, sigs, threshold| {
            let digest = hash_message(guid_hash);
            let mut seen = Vec::new();
            for raw in sigs.chunks(65) {
                let Ok(sig) = Signature::try_from(raw) else {
                    return Ok(false);
                };
                match sig.recover(digest) {
                    Ok(signer) if oracles.contains(&signer) && !seen.contains(&signer) => {
                        seen.push(signer)
                    }
                    _ => return Ok(false),
                }
            }
            Ok(seen.len() >= threshold as usize)
        });
        auth
    }

    fn oracles(seeds: std::ops::RangeInclusive<u8>) -> Vec<Address> {
        seeds.map(|seed| oracle_wallet(seed).eth_address()).collect()
    }

    #[tokio::test]
    async fn signatures_for_another_guid_are_ignored() {
        let wanted = guid();
        let other = test_guid(999, 5);
        let mut published = Vec::new();
        for seed in 1..=3 {
            published.push(signed(seed, &other).await);
        }
        let mut source = MockAttestationSource::new();
        source
            .expect__fetch_attestations()
            .returning(move |_| Ok(published.clone()));
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(recovering_auth(oracles(1..=3))),
            Arc::new(ManualClock::default()),
        );
        let counts = Mutex::new(Vec::new());
        let err = collector
            .collect(
                AttestationKey::GuidHash(wanted.guid_hash()),
                2,
                &PollOptions::every(Duration::from_secs(1)).with_timeout(Duration::from_secs(2)),
                |count, _| counts.lock().push(count),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Timeout));
        assert!(counts.lock().iter().all(|c| *c == 0));
    }

    #[tokio::test]
    async fn mixed_replies_keep_only_the_requested_guid() {
        let wanted = guid();
        let other = test_guid(999, 5);
        let published = vec![
            signed(4, &other).await,
            signed(1, &wanted).await,
            signed(2, &wanted).await,
        ];
        let mut source = MockAttestationSource::new();
        source
            .expect__fetch_attestations()
            .returning(move |_| Ok(published.clone()));
        let collector = AttestationCollector::new(
            Arc::new(source),
            Arc::new(recovering_auth(oracles(1..=4))),
            Arc::new(ManualClock::default()),
        );
        let satisfied = collector
            .collect(
                AttestationKey::GuidHash(wanted.guid_hash()),
                2,
                &PollOptions::every(Duration::from_secs(1)),
                |_, _| {},
            )
            .await
            .unwrap();
        assert_eq!(satisfied.guid, wanted);
        assert_eq!(satisfied.attestations.guid_hash(), wanted.guid_hash());
    }

    #[tokio::test]
    async fn satisfied_quorums_stay_valid_when_extended() {
        let guid = guid();
        let (source, _) = growing_source(guid, 2).await;
        let auth = Arc::new(recovering_auth(oracles(1..=4)));
        let collector = AttestationCollector::new(
            Arc::new(source),
            auth.clone(),
            Arc::new(ManualClock::default()),
        );
        let satisfied = collector
            .collect(
                AttestationKey::GuidHash(guid.guid_hash()),
                2,
                &PollOptions::every(Duration::from_secs(1)),
                |_, _| {},
            )
            .await
            .unwrap();

        let hash = guid.guid_hash();
        assert!(auth.is_valid(hash, &satisfied.signatures(), 2).await.unwrap());
        let mut superset = satisfied.attestations.clone();
        superset.extend([
            signed(3, &guid).await.attestation,
            signed(4, &guid).await.attestation,
        ]);
        assert_eq!(superset.len(), 4);
        assert!(satisfied.attestations.signers().all(|s| superset.signers().any(|t| t == s)));
        assert!(auth.is_valid(hash, &superset.concat_signatures(), 2).await.unwrap());
    }

    #[derive(Debug)]
    struct StalledSource;

    #[async_trait]
    impl AttestationSource for StalledSource {
        async fn fetch_attestations(
            &self,
            _key: AttestationKey,
        ) -> ChainResult<Vec<OracleAttestation>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_a_stalled_fetch() {
        let clock = Arc::new(TokioClock::new());
        let collector = AttestationCollector::new(
            Arc::new(StalledSource),
            Arc::new(MockOracleAuth::new()),
            clock.clone(),
        );
        let err = collector
            .collect(
                AttestationKey::GuidHash(guid().guid_hash()),
                1,
                &PollOptions::every(Duration::from_secs(1)).with_timeout(Duration::from_secs(3)),
                |_, _| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Timeout));
        assert!(clock.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_a_stalled_fetch() {
        let collector = AttestationCollector::new(
            Arc::new(StalledSource),
            Arc::new(MockOracleAuth::new()),
            Arc::new(TokioClock::new()),
        );
        let cancel = CancellationToken::new();
        let opts = PollOptions::every(Duration::from_secs(1)).with_cancel(cancel.clone());
        let trigger = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            collector.collect(AttestationKey::GuidHash(H256::zero()), 1, &opts, |_, _| {}),
            trigger
        );
        assert!(matches!(result, Err(AttestationError::Cancelled)));
    }
}
