use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Bytes, ChainResult, H256};

/// The target domain's oracle-signature verifier
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait OracleAuth: Send + Sync + Debug {
    /// Number of distinct oracle signatures the verifier requires
    async fn threshold(&self) -> ChainResult<u32>;

    /// Whether `signatures` (65 byte signatures concatenated in ascending
    /// signer order) are a valid quorum over `guid_hash`.
    async fn is_valid(&self, guid_hash: H256, signatures: &Bytes, threshold: u32)
        -> ChainResult<bool>;
}
