use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{
    ChainResult, L2ToL1Message, MessageKey, MessageStatus, OutboxProof, ProofStatus, H256,
};

/// Finalization primitives of a rollup whose messages are executed against
/// an outbox proof once their batch is confirmed.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ProofBasedMessenger: Send + Sync + Debug {
    /// Outbound messages emitted by `tx_hash`
    async fn l2_to_l1_messages(&self, tx_hash: H256) -> ChainResult<Vec<L2ToL1Message>>;

    /// The outbox proof, or `None` while the batch is unconfirmed
    async fn try_get_proof(&self, message: &L2ToL1Message) -> ChainResult<Option<OutboxProof>>;

    /// Whether the proven message was already executed
    async fn status(&self, proof: &OutboxProof) -> ChainResult<ProofStatus>;

    /// Execute the message on the target. Returns the tx hash.
    async fn execute(&self, proof: &OutboxProof) -> ChainResult<H256>;
}

/// Finalization primitives of a rollup that reports message status directly
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait StatusBasedMessenger: Send + Sync + Debug {
    /// Status of every outbound message emitted by `tx_hash`
    async fn message_status(&self, tx_hash: H256) -> ChainResult<Vec<(MessageKey, MessageStatus)>>;

    /// Finalize one ready message. Returns the tx hash.
    async fn finalize_message(&self, key: &MessageKey) -> ChainResult<H256>;
}
