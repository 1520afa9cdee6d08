use serde::{Deserialize, Serialize};

use crate::types::serialize::dec_u128;

/// What a transfer yields on the target domain.
///
/// `mintable + bridge_fee` equals the amount still to take: the full amount
/// when nothing was minted yet, else `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    /// Amount the receiver gets, before any relay fee
    #[serde(with = "dec_u128")]
    pub mintable: u128,
    /// Fee charged by the target domain's fee policy
    #[serde(with = "dec_u128")]
    pub bridge_fee: u128,
    /// Fee charged by the relayer, when a relay was requested
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_dec_u128")]
    pub relay_fee: Option<u128>,
    /// Amount not yet minted, as reported by the target domain
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_dec_u128")]
    pub pending: Option<u128>,
}

impl FeeQuote {
    /// Quote from the amount to take and the bridge fee on it. Never
    /// underflows.
    pub fn new(amount_to_take: u128, bridge_fee: u128) -> Self {
        Self {
            mintable: amount_to_take.saturating_sub(bridge_fee),
            bridge_fee,
            relay_fee: None,
            pending: None,
        }
    }

    /// What the receiver ends up with once the relayer is paid
    pub fn receivable(&self) -> u128 {
        self.mintable.saturating_sub(self.relay_fee.unwrap_or(0))
    }
}

/// Target-domain mint state for one GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MintStatus {
    /// Whether the oracle path has blessed the GUID
    pub blessed: bool,
    /// Amount not yet minted. Zero for an unknown GUID.
    pub pending: u128,
}

mod opt_dec_u128 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Wrap(#[serde(with = "super::dec_u128")] u128);

    pub fn serialize<S: Serializer>(value: &Option<u128>, s: S) -> Result<S::Ok, S::Error> {
        value.map(Wrap).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u128>, D::Error> {
        Ok(Option::<Wrap>::deserialize(d)?.map(|w| w.0))
    }
}
