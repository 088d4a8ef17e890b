//! HTTP JSON clients for production chain endpoints.
//!
//! [`HttpChainClient`] speaks a minimal JSON contract against an
//! indexer/broadcast gateway: `GET {base}/tx/{txid}` for status and
//! `POST {base}/tx` for broadcast. Both chain models are served by the same
//! shapes; the gateway translates to whatever the underlying node speaks.
//! [`HttpContentEncoder`] talks to the inscription-construction service on
//! `POST {base}/commit/inspect` and `POST {base}/reveal/build`.

use crate::{ChainClient, ChainError, ContentEncoder, RevealRequest, RevealTemplate};
use async_trait::async_trait;
use mintline_types::{Amount, CommitOutput, ContentId, TxId, TxStatusReport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire shape of a status response.
#[derive(Debug, Deserialize)]
struct TxStatusResponse {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    finalized: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    block_height: Option<u64>,
    #[serde(default)]
    confirmations: u64,
}

impl From<TxStatusResponse> for TxStatusReport {
    fn from(r: TxStatusResponse) -> Self {
        TxStatusReport {
            found: r.found,
            confirmed: r.confirmed,
            finalized: r.finalized,
            error: r.error,
            block_height: r.block_height,
            confirmations: r.confirmations,
        }
    }
}

/// Wire shape of a broadcast request.
#[derive(Debug, Serialize)]
struct BroadcastRequest {
    transaction_hex: String,
}

/// Wire shape of a broadcast response.
#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    accepted: bool,
    #[serde(default)]
    txid: String,
    #[serde(default)]
    error: Option<String>,
}

/// [`ChainClient`] over an HTTP JSON gateway.
pub struct HttpChainClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChainClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn map_transport(e: reqwest::Error) -> ChainError {
        if e.is_timeout() {
            ChainError::Timeout
        } else {
            ChainError::Rpc(e.to_string())
        }
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn transaction_status(&self, txid: &TxId) -> Result<TxStatusReport, ChainError> {
        let url = format!("{}/tx/{}", self.base_url, txid);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_transport)?;

        match response.status().as_u16() {
            429 => return Err(ChainError::RateLimited),
            404 => return Ok(TxStatusReport::not_found()),
            code if code >= 400 => {
                return Err(ChainError::Rpc(format!("status {code} from {url}")))
            }
            _ => {}
        }

        let body: TxStatusResponse = response.json().await.map_err(Self::map_transport)?;
        Ok(body.into())
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxId, ChainError> {
        let url = format!("{}/tx", self.base_url);
        let request = BroadcastRequest {
            transaction_hex: hex::encode(raw_tx),
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport)?;

        if response.status().as_u16() == 429 {
            return Err(ChainError::RateLimited);
        }

        let body: BroadcastResponse = response.json().await.map_err(Self::map_transport)?;
        if !body.accepted {
            return Err(ChainError::Rejected(
                body.error.unwrap_or_else(|| "broadcast not accepted".into()),
            ));
        }
        Ok(TxId::new(body.txid))
    }
}

#[derive(Debug, Serialize)]
struct InspectCommitRequest {
    transaction_hex: String,
}

#[derive(Debug, Deserialize)]
struct InspectCommitResponse {
    output_index: u32,
    output_value: u64,
}

#[derive(Debug, Serialize)]
struct BuildRevealRequest {
    commit_txid: String,
    output_index: u32,
    output_value: u64,
    content_uri: String,
    mime_type: String,
    reveal_pubkey: String,
}

#[derive(Debug, Deserialize)]
struct BuildRevealResponse {
    transaction_hex: String,
    content_id: String,
}

/// [`ContentEncoder`] over the HTTP inscription-construction service.
pub struct HttpContentEncoder {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentEncoder {
    /// Create an encoder client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post_json<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, ChainError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(HttpChainClient::map_transport)?;
        let code = response.status().as_u16();
        if code == 429 {
            return Err(ChainError::RateLimited);
        }
        if code >= 400 {
            return Err(ChainError::Encoding(format!("status {code} from {url}")));
        }
        response
            .json()
            .await
            .map_err(HttpChainClient::map_transport)
    }
}

#[async_trait]
impl ContentEncoder for HttpContentEncoder {
    async fn inspect_commit(&self, raw_tx: &[u8]) -> Result<CommitOutput, ChainError> {
        let request = InspectCommitRequest {
            transaction_hex: hex::encode(raw_tx),
        };
        let body: InspectCommitResponse = self.post_json("/commit/inspect", &request).await?;
        Ok(CommitOutput {
            index: body.output_index,
            value: Amount(body.output_value),
        })
    }

    async fn build_reveal(&self, request: &RevealRequest) -> Result<RevealTemplate, ChainError> {
        let wire = BuildRevealRequest {
            commit_txid: request.commit_txid.as_str().to_string(),
            output_index: request.output.index,
            output_value: request.output.value.base_units(),
            content_uri: request.content.uri.clone(),
            mime_type: request.content.mime_type.clone(),
            reveal_pubkey: request.reveal_pubkey.clone(),
        };
        let body: BuildRevealResponse = self.post_json("/reveal/build", &wire).await?;
        let raw_tx = hex::decode(&body.transaction_hex)
            .map_err(|e| ChainError::Encoding(format!("bad reveal hex: {e}")))?;
        Ok(RevealTemplate {
            raw_tx,
            content_id: ContentId::new(body.content_id),
        })
    }
}
