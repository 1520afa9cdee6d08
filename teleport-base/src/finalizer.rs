use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use teleport_core::{
    ChainCommunicationError, Classify, ErrorKind, FinalizationOutcome, FinalizationRecord,
    L2ToL1Message, MessageKey, MessageStatus, ProofBasedMessenger, ProofStatus,
    StatusBasedMessenger, H256,
};
use tracing::{debug, info, instrument};

/// Errors finalizing a source transaction's messages
#[derive(Debug, thiserror::Error)]
pub enum FinalizationError {
    /// The target reports the message as finalized already
    #[error("Message already finalized: {0}")]
    Conflict(String),
    /// Talking to either domain failed
    #[error(transparent)]
    Chain(ChainCommunicationError),
    /// The transaction emitted nothing to finalize
    #[error("Transaction {0:?} emitted no outbound messages")]
    NoMessages(H256),
}

impl From<ChainCommunicationError> for FinalizationError {
    fn from(err: ChainCommunicationError) -> Self {
        if err.kind() == ErrorKind::FinalizationConflict {
            Self::Conflict(err.to_string())
        } else {
            Self::Chain(err)
        }
    }
}

impl Classify for FinalizationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict(_) => ErrorKind::FinalizationConflict,
            Self::Chain(e) => e.kind(),
            Self::NoMessages(_) => ErrorKind::InvalidInput,
        }
    }
}

type FinalizationResult<T> = Result<T, FinalizationError>;

/// Per-message result, folded into a [`FinalizationOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOutcome {
    Done,
    Executed(H256),
    Waiting,
}

fn settle(result: FinalizationResult<MessageOutcome>) -> FinalizationResult<MessageOutcome> {
    match result {
        Err(FinalizationError::Conflict(reason)) => {
            debug!(%reason, "Target already finalized the message");
            Ok(MessageOutcome::Done)
        }
        other => other,
    }
}

fn fold(outcomes: &[MessageOutcome]) -> FinalizationOutcome {
    if outcomes.contains(&MessageOutcome::Waiting) {
        return FinalizationOutcome::NotReady;
    }
    outcomes
        .iter()
        .rev()
        .find_map(|o| match o {
            MessageOutcome::Executed(tx) => Some(FinalizationOutcome::Finalized(*tx)),
            _ => None,
        })
        .unwrap_or(FinalizationOutcome::AlreadyFinalized)
}

/// Local finalization records. A message with `executed_in` set is never
/// executed again. Records go once the target confirms the message or its
/// source tx leaves the caller's window.
#[derive(Debug, Default)]
struct Records(RwLock<HashMap<MessageKey, FinalizationRecord>>);

impl Records {
    fn executed_in(&self, key: &MessageKey) -> Option<H256> {
        self.0.read().get(key).and_then(|r| r.executed_in)
    }

    fn mark(&self, key: MessageKey, ready: bool) {
        self.0
            .write()
            .entry(key)
            .or_insert_with(|| FinalizationRecord::new(key))
            .ready = ready;
    }

    fn executed(&self, key: MessageKey, tx: H256) {
        let mut records = self.0.write();
        let record = records
            .entry(key)
            .or_insert_with(|| FinalizationRecord::new(key));
        record.ready = true;
        record.executed_in.get_or_insert(tx);
    }

    fn forget(&self, key: &MessageKey) {
        self.0.write().remove(key);
    }

    fn retain_sources(&self, sources: &[H256]) -> usize {
        let mut records = self.0.write();
        let before = records.len();
        records.retain(|key, _| sources.contains(&key.source_tx));
        before - records.len()
    }

    fn snapshot(&self) -> Vec<FinalizationRecord> {
        let mut all: Vec<_> = self.0.read().values().copied().collect();
        all.sort_by_key(|r| r.key);
        all
    }
}

/// Finalizes messages of a rollup that executes them against outbox proofs
#[derive(Debug)]
pub struct ProofBasedFinalizer {
    messenger: Arc<dyn ProofBasedMessenger>,
    records: Records,
}

impl ProofBasedFinalizer {
    /// Finalizer over `messenger`
    pub fn new(messenger: Arc<dyn ProofBasedMessenger>) -> Self {
        Self {
            messenger,
            records: Records::default(),
        }
    }

    async fn finalize_message(&self, message: &L2ToL1Message) -> FinalizationResult<MessageOutcome> {
        let key = message.key;
        if let Some(tx) = self.records.executed_in(&key) {
            debug!(?key, ?tx, "Message executed earlier by us");
            return Ok(MessageOutcome::Done);
        }
        let Some(proof) = self.messenger.try_get_proof(message).await? else {
            self.records.mark(key, false);
            return Ok(MessageOutcome::Waiting);
        };
        self.records.mark(key, true);
        match self.messenger.status(&proof).await? {
            ProofStatus::Executed => {
                self.records.forget(&key);
                Ok(MessageOutcome::Done)
            }
            ProofStatus::Unconfirmed => {
                let tx = self.messenger.execute(&proof).await?;
                self.records.executed(key, tx);
                info!(?key, ?tx, "Executed outbound message");
                Ok(MessageOutcome::Executed(tx))
            }
        }
    }

    /// Finalize every message `tx_hash` emitted
    #[instrument(skip(self))]
    pub async fn try_finalize(&self, tx_hash: H256) -> FinalizationResult<FinalizationOutcome> {
        let messages = self.messenger.l2_to_l1_messages(tx_hash).await?;
        if messages.is_empty() {
            return Err(FinalizationError::NoMessages(tx_hash));
        }
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in &messages {
            outcomes.push(settle(self.finalize_message(message).await)?);
        }
        Ok(fold(&outcomes))
    }
}

/// Finalizes messages of a rollup that reports message status directly
#[derive(Debug)]
pub struct StatusBasedFinalizer {
    messenger: Arc<dyn StatusBasedMessenger>,
    records: Records,
}

impl StatusBasedFinalizer {
    /// Finalizer over `messenger`
    pub fn new(messenger: Arc<dyn StatusBasedMessenger>) -> Self {
        Self {
            messenger,
            records: Records::default(),
        }
    }

    async fn finalize_message(
        &self,
        key: MessageKey,
        status: MessageStatus,
    ) -> FinalizationResult<MessageOutcome> {
        match status {
            MessageStatus::Relayed => {
                self.records.forget(&key);
                Ok(MessageOutcome::Done)
            }
            MessageStatus::InChallengePeriod | MessageStatus::StateRootNotPublished => {
                debug!(?key, ?status, "Message not ready");
                self.records.mark(key, false);
                Ok(MessageOutcome::Waiting)
            }
            MessageStatus::ReadyForRelay => {
                if self.records.executed_in(&key).is_some() {
                    return Ok(MessageOutcome::Done);
                }
                self.records.mark(key, true);
                let tx = self.messenger.finalize_message(&key).await?;
                self.records.executed(key, tx);
                info!(?key, ?tx, "Finalized outbound message");
                Ok(MessageOutcome::Executed(tx))
            }
        }
    }

    /// Finalize every message `tx_hash` emitted
    #[instrument(skip(self))]
    pub async fn try_finalize(&self, tx_hash: H256) -> FinalizationResult<FinalizationOutcome> {
        let statuses = self.messenger.message_status(tx_hash).await?;
        if statuses.is_empty() {
            return Err(FinalizationError::NoMessages(tx_hash));
        }
        let mut outcomes = Vec::with_capacity(statuses.len());
        for (key, status) in statuses {
            outcomes.push(settle(self.finalize_message(key, status).await)?);
        }
        Ok(fold(&outcomes))
    }
}

/// How a target domain finalizes messages from a source rollup
#[derive(Debug)]
pub enum DomainFinalizer {
    /// Outbox proof execution
    ProofBased(ProofBasedFinalizer),
    /// Status query and finalize call
    StatusBased(StatusBasedFinalizer),
}

impl DomainFinalizer {
    /// Finalize the outbound messages of a source transaction
    pub async fn try_finalize(&self, tx_hash: H256) -> FinalizationResult<FinalizationOutcome> {
        match self {
            Self::ProofBased(f) => f.try_finalize(tx_hash).await,
            Self::StatusBased(f) => f.try_finalize(tx_hash).await,
        }
    }

    /// Drop the records of messages emitted by any tx not in `sources`.
    /// Returns how many were dropped.
    pub fn retain_sources(&self, sources: &[H256]) -> usize {
        let records = match self {
            Self::ProofBased(f) => &f.records,
            Self::StatusBased(f) => &f.records,
        };
        records.retain_sources(sources)
    }

    /// Messages this finalizer still tracks, ordered by message
    pub fn records(&self) -> Vec<FinalizationRecord> {
        match self {
            Self::ProofBased(f) => f.records.snapshot(),
            Self::StatusBased(f) => f.records.snapshot(),
        }
    }
}

impl From<ProofBasedFinalizer> for DomainFinalizer {
    fn from(f: ProofBasedFinalizer) -> Self {
        Self::ProofBased(f)
    }
}

impl From<StatusBasedFinalizer> for DomainFinalizer {
    fn from(f: StatusBasedFinalizer) -> Self {
        Self::StatusBased(f)
    }
}

#[cfg(test)]
mod test {
    use teleport_core::{Bytes, OutboxProof};
    use teleport_test::mocks::{MockProofBasedMessenger, MockStatusBasedMessenger};

    use super::*;

    const TX: H256 = H256::repeat_byte(0x10);

    fn key(index: u32) -> MessageKey {
        MessageKey {
            source_tx: TX,
            index,
        }
    }

    fn message(index: u32) -> L2ToL1Message {
        L2ToL1Message {
            key: key(index),
            payload: Bytes::from(vec![index as u8]),
        }
    }

    fn proof(message: &L2ToL1Message) -> OutboxProof {
        OutboxProof {
            message: message.clone(),
            proof: Bytes::from(vec![0xff]),
        }
    }

    #[tokio::test]
    async fn proof_based_executes_once() {
        let mut messenger = MockProofBasedMessenger::new();
        messenger
            .expect__l2_to_l1_messages()
            .returning(|_| Ok(vec![message(0)]));
        messenger
            .expect__try_get_proof()
            .returning(|m| Ok(Some(proof(m))));
        // the target lags and keeps reporting the message as unexecuted
        messenger
            .expect__status()
            .returning(|_| Ok(ProofStatus::Unconfirmed));
        messenger
            .expect__execute()
            .times(1)
            .returning(|_| Ok(H256::repeat_byte(0xee)));

        let finalizer: DomainFinalizer = ProofBasedFinalizer::new(Arc::new(messenger)).into();
        assert_eq!(
            finalizer.try_finalize(TX).await.unwrap(),
            FinalizationOutcome::Finalized(H256::repeat_byte(0xee))
        );
        for _ in 0..2 {
            assert_eq!(
                finalizer.try_finalize(TX).await.unwrap(),
                FinalizationOutcome::AlreadyFinalized
            );
        }
        let records = finalizer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].executed_in, Some(H256::repeat_byte(0xee)));
    }

    #[tokio::test]
    async fn finalized_messages_stay_finalized() {
        let mut messenger = MockProofBasedMessenger::new();
        messenger
            .expect__l2_to_l1_messages()
            .returning(|_| Ok(vec![message(0)]));
        messenger
            .expect__try_get_proof()
            .returning(|m| Ok(Some(proof(m))));
        messenger
            .expect__status()
            .returning(|_| Ok(ProofStatus::Executed));
        messenger.expect__execute().never();

        let finalizer = ProofBasedFinalizer::new(Arc::new(messenger));
        for _ in 0..2 {
            assert_eq!(
                finalizer.try_finalize(TX).await.unwrap(),
                FinalizationOutcome::AlreadyFinalized
            );
        }
    }

    #[tokio::test]
    async fn missing_proof_is_not_ready() {
        let mut messenger = MockProofBasedMessenger::new();
        messenger
            .expect__l2_to_l1_messages()
            .returning(|_| Ok(vec![message(0), message(1)]));
        messenger
            .expect__try_get_proof()
            .returning(|m| Ok((m.key.index == 0).then(|| proof(m))));
        messenger
            .expect__status()
            .returning(|_| Ok(ProofStatus::Unconfirmed));
        messenger
            .expect__execute()
            .times(1)
            .returning(|_| Ok(H256::repeat_byte(1)));

        let finalizer: DomainFinalizer = ProofBasedFinalizer::new(Arc::new(messenger)).into();
        assert_eq!(
            finalizer.try_finalize(TX).await.unwrap(),
            FinalizationOutcome::NotReady
        );
        let records = finalizer.records();
        assert!(records[0].ready && records[0].executed_in.is_some());
        assert!(!records[1].ready);
    }

    #[tokio::test]
    async fn conflicts_count_as_finalized() {
        let mut messenger = MockProofBasedMessenger::new();
        messenger
            .expect__l2_to_l1_messages()
            .returning(|_| Ok(vec![message(0)]));
        messenger
            .expect__try_get_proof()
            .returning(|m| Ok(Some(proof(m))));
        messenger
            .expect__status()
            .returning(|_| Ok(ProofStatus::Unconfirmed));
        messenger.expect__execute().returning(|_| {
            Err(ChainCommunicationError::AlreadyFinalized(
                "ALREADY_SPENT".into(),
            ))
        });
        let finalizer = ProofBasedFinalizer::new(Arc::new(messenger));
        assert_eq!(
            finalizer.try_finalize(TX).await.unwrap(),
            FinalizationOutcome::AlreadyFinalized
        );
    }

    #[tokio::test]
    async fn empty_transactions_are_rejected() {
        let mut messenger = MockStatusBasedMessenger::new();
        messenger.expect__message_status().returning(|_| Ok(vec![]));
        let finalizer: DomainFinalizer = StatusBasedFinalizer::new(Arc::new(messenger)).into();
        let err = finalizer.try_finalize(TX).await.unwrap_err();
        assert!(matches!(err, FinalizationError::NoMessages(tx) if tx == TX));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn status_based_follows_the_reported_state() {
        let mut messenger = MockStatusBasedMessenger::new();
        let mut script = vec![
            vec![(key(0), MessageStatus::StateRootNotPublished)],
            vec![(key(0), MessageStatus::InChallengePeriod)],
            vec![(key(0), MessageStatus::ReadyForRelay)],
            vec![(key(0), MessageStatus::Relayed)],
        ]
        .into_iter();
        messenger
            .expect__message_status()
            .times(4)
            .returning(move |_| Ok(script.next().unwrap_or_default()));
        messenger
            .expect__finalize_message()
            .times(1)
            .returning(|_| Ok(H256::repeat_byte(5)));

        let finalizer = StatusBasedFinalizer::new(Arc::new(messenger));
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(finalizer.try_finalize(TX).await.unwrap());
        }
        assert_eq!(
            outcomes,
            vec![
                FinalizationOutcome::NotReady,
                FinalizationOutcome::NotReady,
                FinalizationOutcome::Finalized(H256::repeat_byte(5)),
                FinalizationOutcome::AlreadyFinalized,
            ]
        );
    }

    #[tokio::test]
    async fn confirmed_messages_are_forgotten() {
        let mut messenger = MockStatusBasedMessenger::new();
        let mut script = vec![
            vec![(key(0), MessageStatus::InChallengePeriod)],
            vec![(key(0), MessageStatus::Relayed)],
        ]
        .into_iter();
        messenger
            .expect__message_status()
            .returning(move |_| Ok(script.next().unwrap_or_default()));
        let finalizer: DomainFinalizer = StatusBasedFinalizer::new(Arc::new(messenger)).into();

        finalizer.try_finalize(TX).await.unwrap();
        assert_eq!(finalizer.records().len(), 1);
        assert_eq!(
            finalizer.try_finalize(TX).await.unwrap(),
            FinalizationOutcome::AlreadyFinalized
        );
        assert!(finalizer.records().is_empty());
    }

    #[tokio::test]
    async fn records_outside_the_window_are_dropped() {
        let other = H256::repeat_byte(0x20);
        let mut messenger = MockProofBasedMessenger::new();
        messenger.expect__l2_to_l1_messages().returning(|tx| {
            Ok(vec![L2ToL1Message {
                key: MessageKey {
                    source_tx: tx,
                    index: 0,
                },
                payload: Bytes::default(),
            }])
        });
        messenger.expect__try_get_proof().returning(|_| Ok(None));
        let finalizer: DomainFinalizer = ProofBasedFinalizer::new(Arc::new(messenger)).into();
        finalizer.try_finalize(TX).await.unwrap();
        finalizer.try_finalize(other).await.unwrap();
        assert_eq!(finalizer.records().len(), 2);

        assert_eq!(finalizer.retain_sources(&[other]), 1);
        let records = finalizer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.source_tx, other);
        assert_eq!(finalizer.retain_sources(&[]), 1);
        assert!(finalizer.records().is_empty());
    }

    #[test]
    fn last_execution_wins() {
        let outcomes = [
            MessageOutcome::Executed(H256::repeat_byte(1)),
            MessageOutcome::Done,
            MessageOutcome::Executed(H256::repeat_byte(2)),
        ];
        assert_eq!(
            fold(&outcomes),
            FinalizationOutcome::Finalized(H256::repeat_byte(2))
        );
        assert_eq!(fold(&[MessageOutcome::Done]), FinalizationOutcome::AlreadyFinalized);
    }
}
