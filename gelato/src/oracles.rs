use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Reply of `GET /oracles`
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct OraclesResult {
    /// Chain ids, as decimal strings
    pub oracles: Vec<String>,
}

impl OraclesResult {
    /// Chain ids the relay network can quote fees for. Entries that are not
    /// numbers are skipped.
    pub fn chain_ids(&self) -> Vec<u64> {
        self.oracles.iter().filter_map(|c| c.parse().ok()).collect()
    }
}

/// Reply of `GET /oracles/{chainId}/estimate`
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    /// Fee in the payment token's base unit, as a decimal string
    pub estimated_fee: String,
}

impl EstimateResult {
    pub fn fee(&self) -> Result<U256, String> {
        U256::from_dec_str(&self.estimated_fee).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_replies_parse() {
        let parsed: OraclesResult =
            serde_json::from_str(r#"{"oracles": ["1", "10", "42161", "bogus"]}"#).unwrap();
        assert_eq!(parsed.chain_ids(), vec![1, 10, 42161]);

        let parsed: EstimateResult =
            serde_json::from_str(r#"{"estimatedFee": "1234567890123456789012"}"#).unwrap();
        assert_eq!(
            parsed.fee().unwrap(),
            U256::from_dec_str("1234567890123456789012").unwrap()
        );
    }
}
