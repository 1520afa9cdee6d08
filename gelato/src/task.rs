use ethers_core::types::{Address, Bytes, U256};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Fee token placeholder the relay network uses for the chain's native coin
pub const NATIVE_FEE_TOKEN_ADDRESS: Address = Address::repeat_byte(0xEE);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskArgs {
    pub chain_id: u64,
    pub target: Address,
    pub data: Bytes,
    pub fee_token: Address,
    pub gas_limit: U256,
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResult {
    pub task_id: String,
}

// The relay network wants camelCase keys, 0x-prefixed hex for addresses and
// calldata, and the gas limit as a decimal string since it is read as a
// bignum server-side.
impl Serialize for CreateTaskArgs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("CreateTaskArgs", 5)?;
        state.serialize_field("chainId", &self.chain_id)?;
        state.serialize_field("target", &self.target)?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("feeToken", &self.fee_token)?;
        state.serialize_field("gasLimit", &self.gas_limit.to_string())?;
        state.end()
    }
}
