#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use teleport_core::*;

mock! {
    pub AttestationSource {
        pub fn _fetch_attestations(
            &self,
            key: AttestationKey,
        ) -> ChainResult<Vec<OracleAttestation>> {}
    }
}

impl std::fmt::Debug for MockAttestationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockAttestationSource")
    }
}

#[async_trait]
impl AttestationSource for MockAttestationSource {
    async fn fetch_attestations(
        &self,
        key: AttestationKey,
    ) -> ChainResult<Vec<OracleAttestation>> {
        self._fetch_attestations(key)
    }
}
