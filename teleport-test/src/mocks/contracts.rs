#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use teleport_core::*;

mock! {
    pub OracleAuth {
        pub fn _threshold(&self) -> ChainResult<u32> {}

        pub fn _is_valid(
            &self,
            guid_hash: H256,
            signatures: &Bytes,
            threshold: u32,
        ) -> ChainResult<bool> {}
    }
}

impl std::fmt::Debug for MockOracleAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockOracleAuth")
    }
}

#[async_trait]
impl OracleAuth for MockOracleAuth {
    async fn threshold(&self) -> ChainResult<u32> {
        self._threshold()
    }

    async fn is_valid(
        &self,
        guid_hash: H256,
        signatures: &Bytes,
        threshold: u32,
    ) -> ChainResult<bool> {
        self._is_valid(guid_hash, signatures, threshold)
    }
}

mock! {
    pub TeleportJoin {
        pub fn _bridge_fee(&self, guid: &TransferGuid, amount_to_take: u128) -> ChainResult<u128> {}

        pub fn _mint_status(&self, guid_hash: H256) -> ChainResult<MintStatus> {}
    }
}

impl std::fmt::Debug for MockTeleportJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockTeleportJoin")
    }
}

#[async_trait]
impl TeleportJoin for MockTeleportJoin {
    async fn bridge_fee(&self, guid: &TransferGuid, amount_to_take: u128) -> ChainResult<u128> {
        self._bridge_fee(guid, amount_to_take)
    }

    async fn mint_status(&self, guid_hash: H256) -> ChainResult<MintStatus> {
        self._mint_status(guid_hash)
    }
}

mock! {
    pub TeleportGateway {
        pub fn _domain(&self) -> ChainResult<DomainId> {}

        pub fn _batched_debt_to_flush(&self, target: DomainId) -> ChainResult<U256> {}

        pub fn _flush(&self, target: DomainId) -> ChainResult<H256> {}

        pub fn _flushed_events(
            &self,
            target: DomainId,
            from_block: u64,
            to_block: u64,
        ) -> ChainResult<Vec<FlushedEvent>> {}
    }
}

impl std::fmt::Debug for MockTeleportGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockTeleportGateway")
    }
}

#[async_trait]
impl TeleportGateway for MockTeleportGateway {
    async fn domain(&self) -> ChainResult<DomainId> {
        self._domain()
    }

    async fn batched_debt_to_flush(&self, target: DomainId) -> ChainResult<U256> {
        self._batched_debt_to_flush(target)
    }

    async fn flush(&self, target: DomainId) -> ChainResult<H256> {
        self._flush(target)
    }

    async fn flushed_events(
        &self,
        target: DomainId,
        from_block: u64,
        to_block: u64,
    ) -> ChainResult<Vec<FlushedEvent>> {
        self._flushed_events(target, from_block, to_block)
    }
}

mock! {
    pub NativePriceOracle {
        pub fn _native_price_in_asset(&self, chain_id: u64) -> ChainResult<U256> {}
    }
}

impl std::fmt::Debug for MockNativePriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockNativePriceOracle")
    }
}

#[async_trait]
impl NativePriceOracle for MockNativePriceOracle {
    async fn native_price_in_asset(&self, chain_id: u64) -> ChainResult<U256> {
        self._native_price_in_asset(chain_id)
    }
}
