use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, MintStatus, TransferGuid, H256};

/// The target domain's mint contract and its fee policy
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait TeleportJoin: Send + Sync + Debug {
    /// Fee the target's fee policy charges to mint `amount_to_take` of `guid`
    async fn bridge_fee(&self, guid: &TransferGuid, amount_to_take: u128) -> ChainResult<u128>;

    /// Mint progress for `guid_hash`
    async fn mint_status(&self, guid_hash: H256) -> ChainResult<MintStatus>;
}
