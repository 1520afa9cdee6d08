use std::time::Duration;

use ethers::providers::{JsonRpcClient, PendingTransaction};
use ethers::types::Address;
use tracing::{error, info};

use teleport_core::{ChainCommunicationError, ChainResult, H256};

/// Waits for a dispatched transaction, logs its progress, and returns its
/// hash once mined successfully
pub(crate) async fn report_tx<P>(
    pending: PendingTransaction<'_, P>,
    to: Address,
    timeout: Duration,
) -> ChainResult<H256>
where
    P: JsonRpcClient,
{
    let tx_hash: H256 = *pending;
    info!(?to, ?tx_hash, "Dispatched tx");

    match tokio::time::timeout(timeout, pending).await {
        Ok(Ok(Some(receipt))) if receipt.status == Some(0u64.into()) => {
            error!(?tx_hash, "transaction reverted");
            Err(ChainCommunicationError::Revert(format!(
                "transaction {tx_hash:?} reverted"
            )))
        }
        // all good
        Ok(Ok(Some(_))) => {
            info!(?tx_hash, "confirmed transaction");
            Ok(tx_hash)
        }
        // ethers-rs will return None if it can no longer poll for the tx in the mempool
        Ok(Ok(None)) => Err(ChainCommunicationError::TransactionDropped(tx_hash)),
        // Received error, pass it through
        Ok(Err(x)) => {
            error!(?tx_hash, error = ?x, "encountered error when waiting for receipt");
            Err(ChainCommunicationError::from_provider_error(x))
        }
        // Timed out
        Err(x) => {
            error!(?tx_hash, error = ?x, "waiting for receipt timed out");
            Err(ChainCommunicationError::TransactionTimeout())
        }
    }
}
