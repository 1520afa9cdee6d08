use serde::{Deserialize, Serialize};

use crate::{Address, Bytes, DomainId, H256, U256};

/// A block reference understood by every chain facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The chain head
    Latest,
    /// A specific height
    Number(u64),
}

/// The subset of block data the keeper needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block height
    pub number: u64,
    /// Block hash
    pub hash: H256,
    /// Unix seconds
    pub timestamp: u64,
}

/// Event log query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract
    pub address: Address,
    /// Positional topic filters; `None` matches anything
    pub topics: Vec<Option<H256>>,
    /// First block, inclusive
    pub from_block: u64,
    /// Last block, inclusive
    pub to_block: BlockTag,
}

/// A raw event log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainLog {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, topic0 first
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Bytes,
    /// Height of the including block
    pub block_number: u64,
    /// Hash of the emitting transaction
    pub transaction_hash: H256,
    /// Position of the log in its block
    pub log_index: u64,
}

/// `Flushed(bytes32 indexed targetDomain, uint256 dai)` from a source gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushedEvent {
    /// Domain whose debt was flushed
    pub target_domain: DomainId,
    /// Flushed amount
    pub amount: U256,
    /// Height of the including block
    pub block_number: u64,
    /// The flushing transaction; its outbound messages get finalized
    pub transaction_hash: H256,
}
