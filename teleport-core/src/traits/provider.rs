use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Address, BlockInfo, BlockTag, Bytes, ChainLog, ChainResult, LogFilter, H256};

/// Opaque read/call/send capability against one chain. Contract adapters are
/// built on top of it.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ChainProvider: Send + Sync + Debug {
    /// Chain id, used when asking the relay network to act on this chain
    fn chain_id(&self) -> u64;

    /// Read-only call of `to` with `data`; returns the raw return data
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;

    /// Send a transaction and wait for it to be included. Returns its hash.
    async fn send_transaction(&self, to: Address, data: Bytes) -> ChainResult<H256>;

    /// Query event logs
    async fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<ChainLog>>;

    /// Fetch a block header
    async fn get_block(&self, tag: BlockTag) -> ChainResult<BlockInfo>;
}
