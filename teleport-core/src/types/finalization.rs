use serde::{Deserialize, Serialize};

use crate::{Bytes, H256};

/// Result of one attempt to finalize the messages a source tx emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinalizationOutcome {
    /// Every message was finalized before this attempt
    AlreadyFinalized,
    /// Finalized now; the hash of the last finalizing transaction
    Finalized(H256),
    /// At least one message cannot be finalized yet
    NotReady,
}

/// Target-side state of a proven outbox message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStatus {
    /// Provable but not yet executed
    Unconfirmed,
    /// Already executed on the target
    Executed,
}

/// State of a message on a status-queried messenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// Already relayed on the target
    Relayed,
    /// Past the challenge window; can be finalized
    ReadyForRelay,
    /// State root published, challenge window still open
    InChallengePeriod,
    /// State root not posted to the target yet
    StateRootNotPublished,
}

/// Identifies one outbound message: the source tx and its position among the
/// messages that tx emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    /// Source-domain transaction hash
    pub source_tx: H256,
    /// Index of the message within the tx
    pub index: u32,
}

/// One L2 to L1 message emitted by a source transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2ToL1Message {
    /// Where the message came from
    pub key: MessageKey,
    /// Messenger-specific encoding of the message
    pub payload: Bytes,
}

/// Proof that an [`L2ToL1Message`] is included in a confirmed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxProof {
    /// The message this proves
    pub message: L2ToL1Message,
    /// Messenger-specific proof data
    pub proof: Bytes,
}

/// Local view of one message's finalization progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizationRecord {
    /// Which message
    pub key: MessageKey,
    /// Whether the proof/maturity condition held at the last check
    pub ready: bool,
    /// The finalizing tx, once executed by us
    pub executed_in: Option<H256>,
}

impl FinalizationRecord {
    /// A record for a message seen for the first time
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            ready: false,
            executed_in: None,
        }
    }
}
