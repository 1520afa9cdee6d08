use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use teleport_core::{ChainResult, DomainId, KeyValueStore};

/// Process-local cursor store. Cursors are lost on restart; the keeper
/// then rescans from its ttl cutoff.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    cursors: RwLock<HashMap<DomainId, u64>>,
}

impl InMemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, domain: &DomainId) -> ChainResult<Option<u64>> {
        Ok(self.cursors.read().get(domain).copied())
    }

    async fn set(&self, domain: &DomainId, block: u64) -> ChainResult<()> {
        self.cursors.write().insert(*domain, block);
        Ok(())
    }
}
