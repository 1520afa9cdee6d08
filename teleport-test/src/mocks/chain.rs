#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use teleport_core::*;

mock! {
    pub ChainProvider {
        pub fn _chain_id(&self) -> u64 {}

        pub fn _call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {}

        pub fn _send_transaction(&self, to: Address, data: Bytes) -> ChainResult<H256> {}

        pub fn _get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<ChainLog>> {}

        pub fn _get_block(&self, tag: BlockTag) -> ChainResult<BlockInfo> {}
    }
}

impl std::fmt::Debug for MockChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockChainProvider")
    }
}

#[async_trait]
impl ChainProvider for MockChainProvider {
    fn chain_id(&self) -> u64 {
        self._chain_id()
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        self._call(to, data)
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> ChainResult<H256> {
        self._send_transaction(to, data)
    }

    async fn get_logs(&self, filter: &LogFilter) -> ChainResult<Vec<ChainLog>> {
        self._get_logs(filter)
    }

    async fn get_block(&self, tag: BlockTag) -> ChainResult<BlockInfo> {
        self._get_block(tag)
    }
}

mock! {
    pub KeyValueStore {
        pub fn _get(&self, domain: &DomainId) -> ChainResult<Option<u64>> {}

        pub fn _set(&self, domain: &DomainId, block: u64) -> ChainResult<()> {}
    }
}

impl std::fmt::Debug for MockKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockKeyValueStore")
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, domain: &DomainId) -> ChainResult<Option<u64>> {
        self._get(domain)
    }

    async fn set(&self, domain: &DomainId, block: u64) -> ChainResult<()> {
        self._set(domain, block)
    }
}
