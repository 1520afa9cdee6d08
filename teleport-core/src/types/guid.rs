use ethers_core::abi::Token;
use serde::{Deserialize, Serialize};

use crate::types::serialize::{dec_u128, dec_u64};
use crate::utils::keccak256;
use crate::{Address, Classify, DomainId, ErrorKind, Signable, H256, U256};

/// Number of bits in a GUID nonce
pub const NONCE_BITS: u32 = 80;
/// Number of bits in a GUID timestamp
pub const TIMESTAMP_BITS: u32 = 48;
/// Length of the canonical encoding: seven 32 byte words
pub const GUID_ENCODED_LEN: usize = 7 * 32;

/// Errors building a [`TransferGuid`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuidError {
    /// The nonce does not fit in 80 bits
    #[error("Nonce {0} does not fit in {NONCE_BITS} bits")]
    NonceOverflow(u128),
    /// The timestamp does not fit in 48 bits
    #[error("Timestamp {0} does not fit in {TIMESTAMP_BITS} bits")]
    TimestampOverflow(u64),
    /// A domain name longer than 32 bytes
    #[error("Domain `{0}` is longer than 32 bytes")]
    DomainTooLong(String),
    /// Encoded input has the wrong length
    #[error("Expected {GUID_ENCODED_LEN} encoded bytes, got {0}")]
    InvalidLength(usize),
    /// An encoded word has bits set above its field's width
    #[error("Encoded field `{0}` exceeds its width")]
    FieldOverflow(&'static str),
}

impl Classify for GuidError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Uniquely identifies one teleport.
///
/// Immutable once built; the constructor rejects values that do not fit
/// their on-chain widths, so encoding is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTransferGuid", into = "RawTransferGuid")]
pub struct TransferGuid {
    source_domain: DomainId,
    target_domain: DomainId,
    receiver: H256,
    operator: H256,
    amount: u128,
    nonce: u128,
    timestamp: u64,
}

impl TransferGuid {
    /// Build a GUID, checking the nonce and timestamp widths.
    pub fn new(
        source_domain: DomainId,
        target_domain: DomainId,
        receiver: H256,
        operator: H256,
        amount: u128,
        nonce: u128,
        timestamp: u64,
    ) -> Result<Self, GuidError> {
        if nonce >> NONCE_BITS != 0 {
            return Err(GuidError::NonceOverflow(nonce));
        }
        if timestamp >> TIMESTAMP_BITS != 0 {
            return Err(GuidError::TimestampOverflow(timestamp));
        }
        Ok(Self {
            source_domain,
            target_domain,
            receiver,
            operator,
            amount,
            nonce,
            timestamp,
        })
    }

    /// Source domain
    pub fn source_domain(&self) -> DomainId {
        self.source_domain
    }

    /// Target domain
    pub fn target_domain(&self) -> DomainId {
        self.target_domain
    }

    /// Receiver, as a 32 byte word
    pub fn receiver(&self) -> H256 {
        self.receiver
    }

    /// Receiver, as a 20 byte address
    pub fn receiver_address(&self) -> Address {
        Address::from_slice(&self.receiver.as_bytes()[12..])
    }

    /// Operator, as a 32 byte word
    pub fn operator(&self) -> H256 {
        self.operator
    }

    /// Transferred amount in the asset's base unit
    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Nonce, at most 80 bits
    pub fn nonce(&self) -> u128 {
        self.nonce
    }

    /// Creation time in seconds, at most 48 bits
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The fixed-order, fixed-width concatenation of all seven fields, each
    /// left-padded to a 32 byte word.
    pub fn encode(&self) -> [u8; GUID_ENCODED_LEN] {
        let mut out = [0u8; GUID_ENCODED_LEN];
        out[0..32].copy_from_slice(self.source_domain.as_bytes());
        out[32..64].copy_from_slice(self.target_domain.as_bytes());
        out[64..96].copy_from_slice(self.receiver.as_bytes());
        out[96..128].copy_from_slice(self.operator.as_bytes());
        out[144..160].copy_from_slice(&self.amount.to_be_bytes());
        out[176..192].copy_from_slice(&self.nonce.to_be_bytes());
        out[216..224].copy_from_slice(&self.timestamp.to_be_bytes());
        out
    }

    /// keccak256 of [`Self::encode`]; the primary key used everywhere.
    pub fn guid_hash(&self) -> H256 {
        keccak256(self.encode())
    }

    /// Parse the canonical encoding, e.g. the data of a `TeleportInitialized`
    /// event.
    pub fn decode(bytes: &[u8]) -> Result<Self, GuidError> {
        if bytes.len() != GUID_ENCODED_LEN {
            return Err(GuidError::InvalidLength(bytes.len()));
        }
        let word = |i: usize| &bytes[i * 32..(i + 1) * 32];
        let tail = |i: usize, name: &'static str, width: usize| {
            let w = word(i);
            if w[..32 - width].iter().any(|b| *b != 0) {
                return Err(GuidError::FieldOverflow(name));
            }
            Ok(&w[32 - width..])
        };

        let mut amount = [0u8; 16];
        amount.copy_from_slice(tail(4, "amount", 16)?);
        let mut nonce = [0u8; 16];
        nonce[6..].copy_from_slice(tail(5, "nonce", 10)?);
        let mut timestamp = [0u8; 8];
        timestamp[2..].copy_from_slice(tail(6, "timestamp", 6)?);

        Self::new(
            DomainId::from(H256::from_slice(word(0))),
            DomainId::from(H256::from_slice(word(1))),
            H256::from_slice(word(2)),
            H256::from_slice(word(3)),
            u128::from_be_bytes(amount),
            u128::from_be_bytes(nonce),
            u64::from_be_bytes(timestamp),
        )
    }

    /// The GUID as an ABI tuple, for building contract calldata.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.source_domain.as_bytes().to_vec()),
            Token::FixedBytes(self.target_domain.as_bytes().to_vec()),
            Token::FixedBytes(self.receiver.as_bytes().to_vec()),
            Token::FixedBytes(self.operator.as_bytes().to_vec()),
            Token::Uint(U256::from(self.amount)),
            Token::Uint(U256::from(self.nonce)),
            Token::Uint(U256::from(self.timestamp)),
        ])
    }
}

impl Signable for TransferGuid {
    /// Oracles sign the EIP-191 version of the GUID hash.
    fn signing_hash(&self) -> H256 {
        self.guid_hash()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransferGuid {
    source_domain: DomainId,
    target_domain: DomainId,
    receiver: H256,
    operator: H256,
    #[serde(with = "dec_u128")]
    amount: u128,
    #[serde(with = "dec_u128")]
    nonce: u128,
    #[serde(with = "dec_u64")]
    timestamp: u64,
}

impl TryFrom<RawTransferGuid> for TransferGuid {
    type Error = GuidError;

    fn try_from(raw: RawTransferGuid) -> Result<Self, Self::Error> {
        Self::new(
            raw.source_domain,
            raw.target_domain,
            raw.receiver,
            raw.operator,
            raw.amount,
            raw.nonce,
            raw.timestamp,
        )
    }
}

impl From<TransferGuid> for RawTransferGuid {
    fn from(guid: TransferGuid) -> Self {
        Self {
            source_domain: guid.source_domain,
            target_domain: guid.target_domain,
            receiver: guid.receiver,
            operator: guid.operator,
            amount: guid.amount,
            nonce: guid.nonce,
            timestamp: guid.timestamp,
        }
    }
}
