use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, DomainId, FlushedEvent, H256, U256};

/// A source-domain gateway that batches debt per target domain
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait TeleportGateway: Send + Sync + Debug {
    /// The gateway's own domain
    async fn domain(&self) -> ChainResult<DomainId>;

    /// Debt accumulated towards `target` since the last flush
    async fn batched_debt_to_flush(&self, target: DomainId) -> ChainResult<U256>;

    /// Flush the debt towards `target`. Returns the flush tx hash.
    async fn flush(&self, target: DomainId) -> ChainResult<H256>;

    /// `Flushed` events for `target` between the two blocks, inclusive
    async fn flushed_events(
        &self,
        target: DomainId,
        from_block: u64,
        to_block: u64,
    ) -> ChainResult<Vec<FlushedEvent>>;
}
