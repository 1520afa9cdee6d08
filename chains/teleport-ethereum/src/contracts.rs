use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::utils::{hash_message, id};
use tracing::{debug, instrument};

use teleport_core::{
    utils::keccak256, Address, BlockTag, Bytes, ChainCommunicationError, ChainProvider,
    ChainResult, DomainId, FlushedEvent, LogFilter, MintStatus, OracleAuth, TeleportGateway,
    TeleportJoin, TransferGuid, H256, U256,
};

const FLUSHED_EVENT: &str = "Flushed(bytes32,uint256)";

fn calldata(signature: &str, tokens: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(encode(tokens));
    data.into()
}

fn bytes32(value: H256) -> Token {
    Token::FixedBytes(value.as_bytes().to_vec())
}

/// Decode the return data of `method`
fn returns(method: &'static str, types: &[ParamType], data: &[u8]) -> ChainResult<Vec<Token>> {
    decode(types, data).map_err(|e| ChainCommunicationError::decode(method, e))
}

fn uint(method: &'static str, data: &[u8]) -> ChainResult<U256> {
    returns(method, &[ParamType::Uint(256)], data)?
        .remove(0)
        .into_uint()
        .ok_or_else(|| ChainCommunicationError::decode(method, "expected uint256"))
}

async fn read(
    provider: &dyn ChainProvider,
    to: Address,
    signature: &'static str,
    tokens: &[Token],
) -> ChainResult<Bytes> {
    provider.call(to, calldata(signature, tokens)).await
}

/// A source-domain `TeleportGateway` contract
#[derive(Debug, Clone)]
pub struct EthereumGateway {
    provider: Arc<dyn ChainProvider>,
    address: Address,
}

impl EthereumGateway {
    /// Gateway at `address`
    pub fn new(provider: Arc<dyn ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl TeleportGateway for EthereumGateway {
    async fn domain(&self) -> ChainResult<DomainId> {
        let data = read(self.provider.as_ref(), self.address, "domain()", &[]).await?;
        let word = returns("domain()", &[ParamType::FixedBytes(32)], &data)?
            .remove(0)
            .into_fixed_bytes()
            .ok_or_else(|| ChainCommunicationError::decode("domain()", "expected bytes32"))?;
        Ok(H256::from_slice(&word).into())
    }

    async fn batched_debt_to_flush(&self, target: DomainId) -> ChainResult<U256> {
        const METHOD: &str = "batchedDaiToFlush(bytes32)";
        let data = read(self.provider.as_ref(), self.address, METHOD, &[bytes32(target.into())]).await?;
        uint(METHOD, &data)
    }

    #[instrument(skip(self), fields(gateway = ?self.address))]
    async fn flush(&self, target: DomainId) -> ChainResult<H256> {
        self.provider
            .send_transaction(self.address, calldata("flush(bytes32)", &[bytes32(target.into())]))
            .await
    }

    #[instrument(level = "debug", skip(self), fields(gateway = ?self.address))]
    async fn flushed_events(
        &self,
        target: DomainId,
        from_block: u64,
        to_block: u64,
    ) -> ChainResult<Vec<FlushedEvent>> {
        let filter = LogFilter {
            address: self.address,
            topics: vec![Some(keccak256(FLUSHED_EVENT)), Some(target.into())],
            from_block,
            to_block: BlockTag::Number(to_block),
        };
        let logs = self.provider.get_logs(&filter).await?;
        debug!(count = logs.len(), "Flushed events");
        logs.into_iter()
            .map(|log| {
                Ok(FlushedEvent {
                    target_domain: log.topics.get(1).copied().map(Into::into).unwrap_or(target),
                    amount: uint(FLUSHED_EVENT, &log.data)?,
                    block_number: log.block_number,
                    transaction_hash: log.transaction_hash,
                })
            })
            .collect()
    }
}

/// The target-domain `TeleportOracleAuth` contract
#[derive(Debug, Clone)]
pub struct EthereumOracleAuth {
    provider: Arc<dyn ChainProvider>,
    address: Address,
}

impl EthereumOracleAuth {
    /// Oracle auth at `address`
    pub fn new(provider: Arc<dyn ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl OracleAuth for EthereumOracleAuth {
    async fn threshold(&self) -> ChainResult<u32> {
        let data = read(self.provider.as_ref(), self.address, "threshold()", &[]).await?;
        let threshold = uint("threshold()", &data)?;
        if threshold > U256::from(u32::MAX) {
            return Err(ChainCommunicationError::decode("threshold()", "threshold out of range"));
        }
        Ok(threshold.as_u32())
    }

    async fn is_valid(&self, guid_hash: H256, signatures: &Bytes, threshold: u32) -> ChainResult<bool> {
        const METHOD: &str = "isValid(bytes32,bytes,uint256)";
        let data = read(
            self.provider.as_ref(),
            self.address,
            METHOD,
            &[
                bytes32(hash_message(guid_hash)),
                Token::Bytes(signatures.to_vec()),
                Token::Uint(threshold.into()),
            ],
        )
        .await?;
        returns(METHOD, &[ParamType::Bool], &data)?
            .remove(0)
            .into_bool()
            .ok_or_else(|| ChainCommunicationError::decode(METHOD, "expected bool"))
    }
}

/// The target-domain `TeleportJoin` contract and the fee policies it points
/// at
#[derive(Debug, Clone)]
pub struct EthereumTeleportJoin {
    provider: Arc<dyn ChainProvider>,
    address: Address,
}

impl EthereumTeleportJoin {
    /// Join at `address`
    pub fn new(provider: Arc<dyn ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    async fn per_domain(&self, signature: &'static str, domain: DomainId) -> ChainResult<Bytes> {
        read(self.provider.as_ref(), self.address, signature, &[bytes32(domain.into())]).await
    }
}

#[async_trait]
impl TeleportJoin for EthereumTeleportJoin {
    #[instrument(level = "debug", skip(self, guid), fields(guid = ?guid.guid_hash()))]
    async fn bridge_fee(&self, guid: &TransferGuid, amount_to_take: u128) -> ChainResult<u128> {
        const GET_FEE: &str =
            "getFee((bytes32,bytes32,bytes32,bytes32,uint128,uint80,uint48),uint256,int256,uint256,uint256)";
        let source = guid.source_domain();

        let fees = self.per_domain("fees(bytes32)", source).await?;
        let fee_contract = returns("fees(bytes32)", &[ParamType::Address], &fees)?
            .remove(0)
            .into_address()
            .ok_or_else(|| ChainCommunicationError::decode("fees(bytes32)", "expected address"))?;
        if fee_contract.is_zero() {
            return Err(ChainCommunicationError::Revert(format!(
                "no fee policy for domain {source}"
            )));
        }
        let line = uint("line(bytes32)", &self.per_domain("line(bytes32)", source).await?)?;
        let debt = returns(
            "debt(bytes32)",
            &[ParamType::Int(256)],
            &self.per_domain("debt(bytes32)", source).await?,
        )?
        .remove(0);

        let amount = Token::Uint(amount_to_take.into());
        let data = read(
            self.provider.as_ref(),
            fee_contract,
            GET_FEE,
            // the join charges against what is still pending, which is what
            // we are about to take
            &[guid.to_token(), Token::Uint(line), debt, amount.clone(), amount],
        )
        .await?;
        let fee = uint(GET_FEE, &data)?;
        if fee > U256::from(u128::MAX) {
            return Err(ChainCommunicationError::decode(GET_FEE, "fee out of range"));
        }
        Ok(fee.as_u128())
    }

    async fn mint_status(&self, guid_hash: H256) -> ChainResult<MintStatus> {
        const METHOD: &str = "teleports(bytes32)";
        let data = read(self.provider.as_ref(), self.address, METHOD, &[bytes32(guid_hash)]).await?;
        let mut tokens = returns(METHOD, &[ParamType::Bool, ParamType::Uint(248)], &data)?.into_iter();
        let blessed = tokens.next().and_then(Token::into_bool);
        let pending = tokens.next().and_then(Token::into_uint);
        match (blessed, pending) {
            (Some(blessed), Some(pending)) if pending <= U256::from(u128::MAX) => Ok(MintStatus {
                blessed,
                pending: pending.as_u128(),
            }),
            _ => Err(ChainCommunicationError::decode(METHOD, "unexpected return data")),
        }
    }
}
