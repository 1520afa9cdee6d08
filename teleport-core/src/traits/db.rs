use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{ChainResult, DomainId};

/// Persists the keeper's per-domain scan cursor: the first source block
/// that still needs looking at.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Stored cursor for `domain`, if any
    async fn get(&self, domain: &DomainId) -> ChainResult<Option<u64>>;

    /// Store the cursor for `domain`
    async fn set(&self, domain: &DomainId, block: u64) -> ChainResult<()>;
}
