use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Block, BlockId, BlockNumber, Filter, Log, TransactionRequest, ValueOrArray};
use ethers_signers::{LocalWallet, Signer};
use tracing::{debug, instrument};

use teleport_core::{
    Address, BlockInfo, BlockTag, Bytes, ChainCommunicationError, ChainLog, ChainProvider,
    ChainResult, LogFilter, H256,
};

use crate::tx::report_tx;
use crate::{ConnectionConf, RetryingProvider};

type EthProvider = Provider<RetryingProvider<Http>>;
type EthSigner = SignerMiddleware<Arc<EthProvider>, LocalWallet>;

/// Map a middleware error, keeping reverts apart from transport failures
fn classify_error<E: MiddlewareError + 'static>(err: E) -> ChainCommunicationError {
    match err.as_error_response() {
        Some(rpc) if rpc.message.contains("revert") => {
            ChainCommunicationError::Revert(rpc.message.clone())
        }
        _ => ChainCommunicationError::from_provider_error(err),
    }
}

fn block_number(tag: BlockTag) -> BlockNumber {
    match tag {
        BlockTag::Latest => BlockNumber::Latest,
        BlockTag::Number(n) => BlockNumber::Number(n.into()),
    }
}

fn to_ethers_filter(filter: &LogFilter) -> Filter {
    let mut f = Filter::new()
        .address(filter.address)
        .from_block(filter.from_block)
        .to_block(block_number(filter.to_block));
    for (slot, topic) in f.topics.iter_mut().zip(&filter.topics) {
        *slot = topic.map(|t| ValueOrArray::Value(Some(t)));
    }
    f
}

fn from_ethers_log(log: Log) -> ChainLog {
    ChainLog {
        address: log.address,
        topics: log.topics,
        data: log.data,
        block_number: log.block_number.map(|n| n.as_u64()).unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
        log_index: log.log_index.map(|i| i.as_u64()).unwrap_or_default(),
    }
}

fn block_info(block: Block<H256>) -> ChainResult<BlockInfo> {
    let number = block
        .number
        .ok_or_else(|| ChainCommunicationError::decode("eth_getBlockByNumber", "pending block"))?;
    Ok(BlockInfo {
        number: number.as_u64(),
        hash: block.hash.unwrap_or_default(),
        timestamp: block.timestamp.as_u64(),
    })
}

/// JSON-RPC access to one EVM chain. Reads go through a retrying HTTP
/// provider; sends need a configured wallet.
#[derive(Debug, Clone)]
pub struct EthereumChainProvider {
    provider: Arc<EthProvider>,
    signer: Option<Arc<EthSigner>>,
    chain_id: u64,
    receipt_timeout: Duration,
}

impl EthereumChainProvider {
    /// Connect to the chain described by `conf`, sending with `wallet`
    pub fn connect(conf: &ConnectionConf, wallet: Option<LocalWallet>) -> Self {
        let http = Http::new(conf.url.clone());
        let retrying =
            RetryingProvider::new(http, Some(conf.max_requests), Some(conf.base_retry_ms));
        let provider = Arc::new(Provider::new(retrying));
        let signer = wallet.map(|wallet| {
            Arc::new(SignerMiddleware::new(
                provider.clone(),
                wallet.with_chain_id(conf.chain_id),
            ))
        });
        Self {
            provider,
            signer,
            chain_id: conf.chain_id,
            receipt_timeout: Duration::from_secs(conf.receipt_timeout_secs),
        }
    }

    /// The sending address, if a wallet is configured
    pub fn sender(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }
}

#[async_trait]
impl ChainProvider for EthereumChainProvider {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[instrument(level = "debug", skip(self, data))]
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider.call(&tx, None).await.map_err(classify_error)
    }

    #[instrument(skip(self, data), fields(chain_id = self.chain_id))]
    async fn send_transaction(&self, to: Address, data: Bytes) -> ChainResult<H256> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ChainCommunicationError::from_other_str("no wallet configured for sending")
        })?;
        let tx = TransactionRequest::new().to(to).data(data);
        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(classify_error)?;
        report_tx(pending, to, self.receipt_timeout).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<ChainLog>> {
        let logs = self
            .provider
            .get_logs(&to_ethers_filter(filter))
            .await
            .map_err(classify_error)?;
        debug!(count = logs.len(), "Fetched logs");
        Ok(logs.into_iter().map(from_ethers_log).collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_block(&self, tag: BlockTag) -> ChainResult<BlockInfo> {
        let block = self
            .provider
            .get_block(BlockId::Number(block_number(tag)))
            .await
            .map_err(classify_error)?
            .ok_or_else(|| ChainCommunicationError::from_other_str(format!("block {tag:?} not found")))?;
        block_info(block)
    }
}

#[cfg(test)]
mod test {
    use ethers::types::{U256, U64};

    use super::*;

    #[test]
    fn filters_keep_topic_positions() {
        let filter = LogFilter {
            address: Address::repeat_byte(1),
            topics: vec![Some(H256::repeat_byte(2)), None, Some(H256::repeat_byte(3))],
            from_block: 10,
            to_block: BlockTag::Latest,
        };
        let f = to_ethers_filter(&filter);
        assert_eq!(f.topics[0], Some(ValueOrArray::Value(Some(H256::repeat_byte(2)))));
        assert_eq!(f.topics[1], None);
        assert_eq!(f.topics[2], Some(ValueOrArray::Value(Some(H256::repeat_byte(3)))));
        assert_eq!(f.get_from_block(), Some(U64::from(10)));
    }

    #[test]
    fn logs_convert() {
        let log = Log {
            address: Address::repeat_byte(1),
            topics: vec![H256::repeat_byte(2)],
            data: vec![1, 2, 3].into(),
            block_number: Some(U64::from(77)),
            transaction_hash: Some(H256::repeat_byte(4)),
            log_index: Some(U256::from(5)),
            ..Default::default()
        };
        let converted = from_ethers_log(log);
        assert_eq!(converted.block_number, 77);
        assert_eq!(converted.transaction_hash, H256::repeat_byte(4));
        assert_eq!(converted.log_index, 5);
    }

    #[test]
    fn pending_blocks_are_rejected() {
        let block = Block::<H256> {
            timestamp: U256::from(1_700_000_000u64),
            ..Default::default()
        };
        assert!(block_info(block.clone()).is_err());
        let block = Block {
            number: Some(U64::from(9)),
            ..block
        };
        let info = block_info(block).unwrap();
        assert_eq!((info.number, info.timestamp), (9, 1_700_000_000));
    }

    #[test]
    fn connects_without_network() {
        let conf: ConnectionConf =
            serde_json::from_str(r#"{"url": "http://localhost:8545", "chainId": 10}"#).unwrap();
        let provider = EthereumChainProvider::connect(&conf, None);
        assert_eq!(provider.chain_id(), 10);
        assert_eq!(provider.sender(), None);
    }
}
