#![allow(non_snake_case)]

use async_trait::async_trait;
use ethers_core::types::{Address, U256};
use gelato::task::{CreateTaskArgs, CreateTaskResult};
use gelato::task_status::TaskStatusResult;
use gelato::{GelatoError, RelayApi};
use mockall::*;

mock! {
    pub RelayApi {
        pub fn _create_task(&self, args: &CreateTaskArgs) -> Result<CreateTaskResult, GelatoError> {}

        pub fn _task_status(&self, task_id: &str) -> Result<TaskStatusResult, GelatoError> {}

        pub fn _supported_chains(&self) -> Result<Vec<u64>, GelatoError> {}

        pub fn _estimate_fee(
            &self,
            chain_id: u64,
            payment_token: Address,
            gas_limit: U256,
        ) -> Result<U256, GelatoError> {}
    }
}

impl std::fmt::Debug for MockRelayApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockRelayApi")
    }
}

#[async_trait]
impl RelayApi for MockRelayApi {
    async fn create_task(&self, args: &CreateTaskArgs) -> Result<CreateTaskResult, GelatoError> {
        self._create_task(args)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResult, GelatoError> {
        self._task_status(task_id)
    }

    async fn supported_chains(&self) -> Result<Vec<u64>, GelatoError> {
        self._supported_chains()
    }

    async fn estimate_fee(
        &self,
        chain_id: u64,
        payment_token: Address,
        gas_limit: U256,
    ) -> Result<U256, GelatoError> {
        self._estimate_fee(chain_id, payment_token, gas_limit)
    }
}
