use std::collections::BTreeMap;

use ethers_core::types::SignatureError;
use ethers_core::utils::hash_message;
use serde::{Deserialize, Serialize};

use crate::{Address, Bytes, Signature, H256};

/// One oracle's signature over the EIP-191 prefixed GUID hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// The oracle key that claims to have signed
    pub signer: Address,
    /// The signature
    pub signature: Signature,
}

impl Attestation {
    /// Check that `signature` recovers to `signer` over `guid_hash`.
    pub fn verify(&self, guid_hash: H256) -> Result<(), SignatureError> {
        self.signature.verify(hash_message(guid_hash), self.signer)
    }
}

/// Distinct, verified signatures over one GUID hash, ordered by ascending
/// signer address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttestationSet {
    guid_hash: H256,
    signatures: BTreeMap<Address, Signature>,
}

impl AttestationSet {
    /// An empty set for `guid_hash`
    pub fn new(guid_hash: H256) -> Self {
        Self {
            guid_hash,
            signatures: BTreeMap::new(),
        }
    }

    /// The GUID hash every member signed
    pub fn guid_hash(&self) -> H256 {
        self.guid_hash
    }

    /// Insert an attestation if its signature checks out and its signer is
    /// not already present. Returns whether the set grew.
    pub fn insert(&mut self, attestation: Attestation) -> bool {
        if self.signatures.contains_key(&attestation.signer) {
            return false;
        }
        if attestation.verify(self.guid_hash).is_err() {
            return false;
        }
        self.signatures
            .insert(attestation.signer, attestation.signature);
        true
    }

    /// Number of distinct signers
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signers in ascending order
    pub fn signers(&self) -> impl Iterator<Item = &Address> {
        self.signatures.keys()
    }

    /// The members, ascending by signer
    pub fn iter(&self) -> impl Iterator<Item = Attestation> + '_ {
        self.signatures
            .iter()
            .map(|(signer, signature)| Attestation {
                signer: *signer,
                signature: *signature,
            })
    }

    /// The 65 byte signatures concatenated in signer order, the blob the
    /// on-chain verifier expects.
    pub fn concat_signatures(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.signatures.len() * 65);
        for signature in self.signatures.values() {
            let raw: [u8; 65] = (*signature).into();
            out.extend_from_slice(&raw);
        }
        out.into()
    }
}

impl Extend<Attestation> for AttestationSet {
    fn extend<I: IntoIterator<Item = Attestation>>(&mut self, iter: I) {
        for attestation in iter {
            self.insert(attestation);
        }
    }
}

#[cfg(test)]
mod test {
    use ethers_signers::{LocalWallet, Signer};

    use super::*;

    async fn attest(key: u8, guid_hash: H256) -> Attestation {
        let wallet = LocalWallet::from_bytes(&[key; 32]).unwrap();
        Attestation {
            signer: wallet.address(),
            signature: wallet.sign_message(guid_hash).await.unwrap(),
        }
    }

    #[tokio::test]
    async fn dedups_and_orders_by_signer() {
        let hash = H256::repeat_byte(7);
        let mut set = AttestationSet::new(hash);
        let atts = vec![attest(3, hash).await, attest(1, hash).await, attest(2, hash).await];
        set.extend(atts.clone());
        assert!(!set.insert(atts[0]));
        assert_eq!(set.len(), 3);

        let signers: Vec<_> = set.signers().copied().collect();
        let mut sorted = signers.clone();
        sorted.sort();
        assert_eq!(signers, sorted);

        let blob = set.concat_signatures();
        assert_eq!(blob.len(), 3 * 65);
        let first: [u8; 65] = set.iter().next().unwrap().signature.into();
        assert_eq!(&blob[..65], &first[..]);
    }

    #[tokio::test]
    async fn drops_bad_signatures() {
        let hash = H256::repeat_byte(7);
        let mut set = AttestationSet::new(hash);
        let mut forged = attest(1, hash).await;
        forged.signer = Address::repeat_byte(9);
        assert!(!set.insert(forged));
        // signed over a different hash
        assert!(!set.insert(attest(2, H256::repeat_byte(8)).await));
        assert!(set.is_empty());
    }
}
