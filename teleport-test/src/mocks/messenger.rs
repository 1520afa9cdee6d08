#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use teleport_core::*;

mock! {
    pub ProofBasedMessenger {
        pub fn _l2_to_l1_messages(&self, tx_hash: H256) -> ChainResult<Vec<L2ToL1Message>> {}

        pub fn _try_get_proof(&self, message: &L2ToL1Message) -> ChainResult<Option<OutboxProof>> {}

        pub fn _status(&self, proof: &OutboxProof) -> ChainResult<ProofStatus> {}

        pub fn _execute(&self, proof: &OutboxProof) -> ChainResult<H256> {}
    }
}

impl std::fmt::Debug for MockProofBasedMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockProofBasedMessenger")
    }
}

#[async_trait]
impl ProofBasedMessenger for MockProofBasedMessenger {
    async fn l2_to_l1_messages(&self, tx_hash: H256) -> ChainResult<Vec<L2ToL1Message>> {
        self._l2_to_l1_messages(tx_hash)
    }

    async fn try_get_proof(&self, message: &L2ToL1Message) -> ChainResult<Option<OutboxProof>> {
        self._try_get_proof(message)
    }

    async fn status(&self, proof: &OutboxProof) -> ChainResult<ProofStatus> {
        self._status(proof)
    }

    async fn execute(&self, proof: &OutboxProof) -> ChainResult<H256> {
        self._execute(proof)
    }
}

mock! {
    pub StatusBasedMessenger {
        pub fn _message_status(
            &self,
            tx_hash: H256,
        ) -> ChainResult<Vec<(MessageKey, MessageStatus)>> {}

        pub fn _finalize_message(&self, key: &MessageKey) -> ChainResult<H256> {}
    }
}

impl std::fmt::Debug for MockStatusBasedMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockStatusBasedMessenger")
    }
}

#[async_trait]
impl StatusBasedMessenger for MockStatusBasedMessenger {
    async fn message_status(
        &self,
        tx_hash: H256,
    ) -> ChainResult<Vec<(MessageKey, MessageStatus)>> {
        self._message_status(tx_hash)
    }

    async fn finalize_message(&self, key: &MessageKey) -> ChainResult<H256> {
        self._finalize_message(key)
    }
}
