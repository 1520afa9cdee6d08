use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers_core::{
    abi::{encode, Token},
    types::{Address, Signature, SignatureError},
    utils::hash_message,
};
use ethers_signers::{LocalWallet, Signer};
use serde::{
    ser::{SerializeStruct, Serializer},
    Deserialize, Serialize,
};

use crate::utils::{fmt_bytes, keccak256};
use crate::{H160, H256, U256};

/// An error incurred by a signer
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct TeleportSignerError(#[from] Box<dyn std::error::Error + Send + Sync>);

/// Signs relay authorizations on behalf of a transfer's receiver. Signers
/// are always ethereum keys.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait TeleportSigner: Send + Sync + Debug {
    /// The signer's address
    fn eth_address(&self) -> H160;

    /// Sign an EIP-191 prefixed hash. This must be a signature without
    /// EIP-155.
    async fn sign_hash(&self, hash: &H256) -> Result<Signature, TeleportSignerError>;
}

#[async_trait]
impl TeleportSigner for LocalWallet {
    fn eth_address(&self) -> H160 {
        Signer::address(self)
    }

    async fn sign_hash(&self, hash: &H256) -> Result<Signature, TeleportSignerError> {
        let mut signature = Signer::sign_message(self, hash)
            .await
            .map_err(|err| TeleportSignerError(Box::new(err)))?;
        signature.v = 28 - (signature.v % 2);
        Ok(signature)
    }
}

/// Auto-implemented extension trait for TeleportSigner.
#[async_trait]
pub trait TeleportSignerExt {
    /// Sign a `Signable` value
    async fn sign<T: Signable + Send>(
        &self,
        value: T,
    ) -> Result<SignedType<T>, TeleportSignerError>;
}

#[async_trait]
impl<S: TeleportSigner> TeleportSignerExt for S {
    async fn sign<T: Signable + Send>(
        &self,
        value: T,
    ) -> Result<SignedType<T>, TeleportSignerError> {
        let signing_hash = value.signing_hash();
        let signature = self.sign_hash(&signing_hash).await?;
        Ok(SignedType { value, signature })
    }
}

/// A type that can be signed. The signature will be of a hash of select
/// contents defined by `signing_hash`.
pub trait Signable: Sized {
    /// A hash of the contents.
    /// The EIP-191 compliant version of this hash is what gets signed.
    fn signing_hash(&self) -> H256;

    /// EIP-191 compliant hash of the signing hash.
    fn eth_signed_message_hash(&self) -> H256 {
        hash_message(self.signing_hash())
    }
}

/// A signed type. Contains the original value and the signature.
#[derive(Clone, Eq, PartialEq, Deserialize)]
pub struct SignedType<T: Signable> {
    /// The value which was signed
    pub value: T,
    /// The signature for the value
    pub signature: Signature,
}

impl<T: Signable + Serialize> Serialize for SignedType<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SignedType", 3)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("signature", &self.signature)?;
        let sig: [u8; 65] = self.signature.into();
        state.serialize_field("serialized_signature", &fmt_bytes(&sig))?;
        state.end()
    }
}

impl<T: Signable> SignedType<T> {
    /// Recover the Ethereum address of the signer
    pub fn recover(&self) -> Result<Address, SignatureError> {
        self.signature.recover(self.value.eth_signed_message_hash())
    }

    /// Check whether a message was signed by a specific address
    pub fn verify(&self, signer: Address) -> Result<(), SignatureError> {
        self.signature
            .verify(self.value.eth_signed_message_hash(), signer)
    }
}

impl<T: Signable + Debug> Debug for SignedType<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SignedType {{ value: {:?}, signature: 0x{} }}",
            self.value, self.signature
        )
    }
}

/// The receiver's off-chain consent to a relayed mint: the relayer may keep
/// at most `gas_fee` and never more than `max_fee_percentage` of the amount,
/// until `expiry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAuthorization {
    /// The GUID being relayed
    pub guid_hash: H256,
    /// Upper bound on the bridge fee, as a WAD fraction
    pub max_fee_percentage: U256,
    /// Fee paid to the relayer, in the asset's base unit
    pub gas_fee: U256,
    /// Unix seconds after which the authorization is void
    pub expiry: U256,
}

impl Signable for RelayAuthorization {
    fn signing_hash(&self) -> H256 {
        keccak256(encode(&[
            Token::FixedBytes(self.guid_hash.as_bytes().to_vec()),
            Token::Uint(self.max_fee_percentage),
            Token::Uint(self.gas_fee),
            Token::Uint(self.expiry),
        ]))
    }
}
