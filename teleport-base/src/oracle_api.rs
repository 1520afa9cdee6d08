use async_trait::async_trait;
use serde::Deserialize;
use teleport_core::{
    utils::decode_hex, Address, Attestation, AttestationKey, AttestationSource,
    ChainCommunicationError, ChainResult, OracleAttestation, Signature, TransferGuid, H256,
};
use tracing::{instrument, warn};
use url::Url;

const ATTESTATION_TYPE: &str = "teleport_evm";

#[derive(Debug, Deserialize)]
struct OracleEntry {
    data: OracleData,
    signatures: OracleSignatures,
}

#[derive(Debug, Deserialize)]
struct OracleData {
    /// ABI-encoded GUID, hex
    event: String,
    hash: H256,
}

#[derive(Debug, Deserialize)]
struct OracleSignatures {
    ethereum: EthereumSignature,
}

#[derive(Debug, Deserialize)]
struct EthereumSignature {
    signature: String,
    signer: String,
}

impl OracleEntry {
    fn parse(&self) -> Result<OracleAttestation, String> {
        let event = decode_hex(&self.data.event).map_err(|e| format!("event: {e}"))?;
        let guid = TransferGuid::decode(&event).map_err(|e| format!("event: {e}"))?;
        if guid.guid_hash() != self.data.hash {
            return Err(format!(
                "event hashes to {:?}, entry claims {:?}",
                guid.guid_hash(),
                self.data.hash
            ));
        }
        let raw = decode_hex(&self.signatures.ethereum.signature)
            .map_err(|e| format!("signature: {e}"))?;
        let signature = Signature::try_from(raw.as_slice()).map_err(|e| format!("signature: {e}"))?;
        let signer: Address = self
            .signatures
            .ethereum
            .signer
            .parse()
            .map_err(|e| format!("signer: {e}"))?;
        Ok(OracleAttestation {
            guid,
            attestation: Attestation { signer, signature },
        })
    }
}

/// Parses an oracle API reply, dropping malformed entries and, for a GUID
/// key, entries about other GUIDs.
fn parse_reply(key: AttestationKey, body: &str) -> ChainResult<Vec<OracleAttestation>> {
    let entries: Vec<OracleEntry> =
        serde_json::from_str(body).map_err(|e| ChainCommunicationError::decode("oracle api", e))?;
    Ok(entries
        .iter()
        .filter_map(|entry| match entry.parse() {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                warn!(%key, %reason, "Dropping malformed oracle entry");
                None
            }
        })
        .filter(|parsed| match key {
            AttestationKey::GuidHash(hash) => parsed.guid.guid_hash() == hash,
            AttestationKey::TxHash(_) => true,
        })
        .collect())
}

/// Reads oracle signatures from the oracle HTTP API
#[derive(Debug, Clone)]
pub struct OracleApiClient {
    http: reqwest::Client,
    url: Url,
}

impl OracleApiClient {
    /// Client for the API at `url`
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    fn request_url(&self, key: AttestationKey) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("type", ATTESTATION_TYPE)
            .append_pair("index", &format!("{:?}", key.index()));
        url
    }
}

#[async_trait]
impl AttestationSource for OracleApiClient {
    #[instrument(skip(self), fields(%key))]
    async fn fetch_attestations(
        &self,
        key: AttestationKey,
    ) -> ChainResult<Vec<OracleAttestation>> {
        let res = self
            .http
            .get(self.request_url(key))
            .send()
            .await
            .map_err(ChainCommunicationError::from_provider_error)?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(ChainCommunicationError::from_provider_error)?;
        if !status.is_success() {
            return Err(ChainCommunicationError::from_other_str(format!(
                "oracle api returned {status}: {body}"
            )));
        }
        parse_reply(key, &body)
    }
}
