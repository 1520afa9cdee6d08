use std::fmt::{self, Debug};

use async_trait::async_trait;
use auto_impl::auto_impl;

use crate::{Attestation, ChainResult, TransferGuid, H256};

/// What an attestation lookup is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttestationKey {
    /// A known GUID hash
    GuidHash(H256),
    /// The source-domain tx that initiated the teleport
    TxHash(H256),
}

impl AttestationKey {
    /// The raw hash used as the lookup index
    pub fn index(&self) -> H256 {
        match self {
            Self::GuidHash(h) | Self::TxHash(h) => *h,
        }
    }
}

impl fmt::Display for AttestationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuidHash(h) => write!(f, "guid:{h:?}"),
            Self::TxHash(h) => write!(f, "tx:{h:?}"),
        }
    }
}

/// An oracle's signature together with the GUID it claims to attest to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleAttestation {
    /// The GUID the oracle observed
    pub guid: TransferGuid,
    /// The oracle's signature over the GUID hash
    pub attestation: Attestation,
}

/// Where oracle signatures are published
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait AttestationSource: Send + Sync + Debug {
    /// Every signature currently published for `key`. Signatures are not
    /// verified by the source.
    async fn fetch_attestations(&self, key: AttestationKey)
        -> ChainResult<Vec<OracleAttestation>>;
}
