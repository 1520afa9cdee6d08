use ethers_signers::LocalWallet;
use futures_util::Future;
use std::time::Duration;

use teleport_core::{
    Attestation, DomainId, FlushedEvent, OracleAttestation, TeleportSigner, TransferGuid, H256, U256,
};

/// The Optimism mainnet domain
pub fn source_domain() -> DomainId {
    DomainId::from_name("OPT-MAIN-A").expect("valid domain name")
}

/// The Ethereum mainnet domain
pub fn target_domain() -> DomainId {
    DomainId::from_name("ETH-MAIN-A").expect("valid domain name")
}

/// A transfer between the two test domains
pub fn test_guid(amount: u128, nonce: u128) -> TransferGuid {
    TransferGuid::new(
        source_domain(),
        target_domain(),
        H256::repeat_byte(1),
        H256::zero(),
        amount,
        nonce,
        1_700_000_000,
    )
    .expect("fields fit")
}

/// The oracle key derived from `seed`
pub fn oracle_wallet(seed: u8) -> LocalWallet {
    LocalWallet::from_bytes(&[seed; 32]).expect("non-zero seed")
}

/// A valid signature by the `seed` oracle over `guid`
pub async fn oracle_attestation(seed: u8, guid: &TransferGuid) -> OracleAttestation {
    let wallet = oracle_wallet(seed);
    OracleAttestation {
        guid: *guid,
        attestation: Attestation {
            signer: wallet.eth_address(),
            signature: TeleportSigner::sign_hash(&wallet, &guid.guid_hash())
                .await
                .expect("local signing"),
        },
    }
}

/// A `Flushed` event towards the test target domain
pub fn flushed_at(block_number: u64, tx: u8) -> FlushedEvent {
    FlushedEvent {
        target_domain: target_domain(),
        amount: U256::from(100),
        block_number,
        transaction_hash: H256::repeat_byte(tx),
    }
}

/// Run `test`, failing if it has not finished within `limit` of real time
pub async fn within<T, Fut>(limit: Duration, test: T)
where
    T: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::time::timeout(limit, test())
        .await
        .expect("test timed out");
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn fixtures_verify() {
        within(Duration::from_secs(5), || async {
            let guid = test_guid(100, 0);
            let signed = oracle_attestation(1, &guid).await;
            signed.attestation.verify(guid.guid_hash()).unwrap();
            assert_ne!(oracle_wallet(1).eth_address(), oracle_wallet(2).eth_address());
            assert_eq!(flushed_at(5, 9).target_domain, guid.target_domain());
        })
        .await;
    }
}
