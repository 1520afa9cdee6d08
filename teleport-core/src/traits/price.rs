use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, U256};

/// Converts native gas token amounts into the teleported asset
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait NativePriceOracle: Send + Sync + Debug {
    /// Price of one whole native token (1e18 base units) on `chain_id`, in
    /// base units of the teleported asset
    async fn native_price_in_asset(&self, chain_id: u64) -> ChainResult<U256>;
}
