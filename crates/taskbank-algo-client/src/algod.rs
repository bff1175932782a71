//! Typed client for the algod REST v2 API.
//!
//! Covers the node calls the escrow needs: suggested parameters, group
//! submission, pending-transaction polling, and application box reads.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use taskbank_core::{MicroAlgos, PoolId, Round};

use crate::error::AlgoApiError;
use crate::http::{read_json, write_json};
use crate::txn::{SuggestedParams, DEFAULT_VALIDITY_WINDOW};

/// Rounds to wait for a submitted group before giving up.
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 10;

// -- Wire shapes --------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawParams {
    min_fee: u64,
    genesis_hash: String,
    genesis_id: String,
    last_round: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawStatus {
    last_round: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmit {
    tx_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPending {
    #[serde(default)]
    confirmed_round: Option<u64>,
    #[serde(default)]
    pool_error: String,
    #[serde(default)]
    application_index: Option<u64>,
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBoxList {
    #[serde(default)]
    boxes: Vec<RawBoxName>,
}

#[derive(Debug, Deserialize)]
struct RawBoxName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    name: String,
    value: String,
}

// -- Types --------------------------------------------------------------------

/// State of a submitted transaction as seen by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Round the transaction was confirmed in, once confirmed.
    pub confirmed_round: Option<Round>,
    /// Non-empty when the pool evicted the transaction.
    pub pool_error: String,
    /// Application created by this transaction, if any.
    pub application_index: Option<u64>,
    pub logs: Vec<Vec<u8>>,
}

/// A single box of an application's box store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxValue {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

// -- Client -------------------------------------------------------------------

/// Client for the algod REST v2 API.
#[derive(Debug, Clone)]
pub struct AlgodClient {
    http: reqwest::Client,
    base_url: String,
}

impl AlgodClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Suggested parameters for a new transaction, valid for
    /// [`DEFAULT_VALIDITY_WINDOW`] rounds from the node's last round.
    ///
    /// Calls `GET /v2/transactions/params`.
    pub async fn suggested_params(&self) -> Result<SuggestedParams, AlgoApiError> {
        let endpoint = "GET /v2/transactions/params";
        let url = self.url("/v2/transactions/params");
        let raw: RawParams = read_json(endpoint, || self.http.get(&url)).await?;

        let hash = BASE64
            .decode(&raw.genesis_hash)
            .map_err(|e| schema(endpoint, format!("genesis-hash: {e}")))?;
        let genesis_hash: [u8; 32] = hash
            .as_slice()
            .try_into()
            .map_err(|_| schema(endpoint, format!("genesis-hash: {} bytes", hash.len())))?;

        let first_valid = Round(raw.last_round);
        Ok(SuggestedParams {
            min_fee: MicroAlgos(raw.min_fee),
            first_valid,
            last_valid: first_valid.plus(DEFAULT_VALIDITY_WINDOW),
            genesis_id: raw.genesis_id,
            genesis_hash,
        })
    }

    /// Last round the node has seen. Calls `GET /v2/status`.
    pub async fn status(&self) -> Result<Round, AlgoApiError> {
        let url = self.url("/v2/status");
        let raw: RawStatus = read_json("GET /v2/status", || self.http.get(&url)).await?;
        Ok(Round(raw.last_round))
    }

    /// Block until the node has seen a round after `round`.
    ///
    /// Calls `GET /v2/status/wait-for-block-after/{round}`.
    pub async fn wait_for_block_after(&self, round: Round) -> Result<Round, AlgoApiError> {
        let endpoint = format!("GET /v2/status/wait-for-block-after/{round}");
        let url = self.url(&format!("/v2/status/wait-for-block-after/{round}"));
        let raw: RawStatus = read_json(&endpoint, || self.http.get(&url)).await?;
        Ok(Round(raw.last_round))
    }

    /// Submit a signed group as concatenated signed transactions.
    ///
    /// Calls `POST /v2/transactions`. Never retried. Returns the id the
    /// node reports for the first transaction.
    pub async fn submit_group(&self, signed: &[Vec<u8>]) -> Result<String, AlgoApiError> {
        let body: Vec<u8> = signed.concat();
        tracing::debug!(txns = signed.len(), bytes = body.len(), "submitting group");
        let request = self
            .http
            .post(self.url("/v2/transactions"))
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(body);
        let raw: RawSubmit = write_json("POST /v2/transactions", request).await?;
        Ok(raw.tx_id)
    }

    /// Current pool/confirmation state of a transaction.
    ///
    /// Calls `GET /v2/transactions/pending/{txid}`.
    pub async fn pending_transaction(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransaction, AlgoApiError> {
        let endpoint = format!("GET /v2/transactions/pending/{tx_id}");
        let url = self.url(&format!("/v2/transactions/pending/{tx_id}"));
        let raw: RawPending = read_json(&endpoint, || self.http.get(&url)).await?;

        let logs = raw
            .logs
            .iter()
            .map(|l| BASE64.decode(l))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| schema(&endpoint, format!("logs: {e}")))?;

        Ok(PendingTransaction {
            confirmed_round: raw.confirmed_round.filter(|r| *r > 0).map(Round),
            pool_error: raw.pool_error,
            application_index: raw.application_index.filter(|id| *id > 0),
            logs,
        })
    }

    /// Poll until `tx_id` is confirmed, for at most `max_rounds` rounds.
    ///
    /// A non-empty pool error or running out of rounds yields
    /// [`AlgoApiError::Rejected`].
    pub async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        max_rounds: u64,
    ) -> Result<PendingTransaction, AlgoApiError> {
        let start = self.status().await?;
        let deadline = start.plus(max_rounds);
        let mut current = start;

        loop {
            let pending = self.pending_transaction(tx_id).await?;
            if let Some(round) = pending.confirmed_round {
                tracing::debug!(tx_id, %round, "transaction confirmed");
                return Ok(pending);
            }
            if !pending.pool_error.is_empty() {
                return Err(AlgoApiError::Rejected {
                    tx_id: tx_id.to_string(),
                    reason: pending.pool_error,
                });
            }
            if current >= deadline {
                return Err(AlgoApiError::Rejected {
                    tx_id: tx_id.to_string(),
                    reason: format!("not confirmed after {max_rounds} rounds"),
                });
            }
            current = self.wait_for_block_after(current).await?;
        }
    }

    /// Names of every box held by an application.
    ///
    /// Calls `GET /v2/applications/{id}/boxes`.
    pub async fn application_boxes(&self, app: PoolId) -> Result<Vec<Vec<u8>>, AlgoApiError> {
        let endpoint = format!("GET /v2/applications/{app}/boxes");
        let url = self.url(&format!("/v2/applications/{app}/boxes"));
        let raw: RawBoxList = read_json(&endpoint, || self.http.get(&url)).await?;

        raw.boxes
            .iter()
            .map(|b| {
                BASE64
                    .decode(&b.name)
                    .map_err(|e| schema(&endpoint, format!("box name: {e}")))
            })
            .collect()
    }

    /// Read one box. Returns `None` when the node reports it missing.
    ///
    /// Calls `GET /v2/applications/{id}/box?name=b64:{name}`.
    pub async fn application_box(
        &self,
        app: PoolId,
        name: &[u8],
    ) -> Result<Option<BoxValue>, AlgoApiError> {
        let endpoint = format!("GET /v2/applications/{app}/box");
        let url = self.url(&format!("/v2/applications/{app}/box"));
        let query = [("name", format!("b64:{}", BASE64.encode(name)))];

        let result: Result<RawBox, _> =
            read_json(&endpoint, || self.http.get(&url).query(&query)).await;
        let raw = match result {
            Ok(raw) => raw,
            Err(AlgoApiError::ApiError { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let name = BASE64
            .decode(&raw.name)
            .map_err(|e| schema(&endpoint, format!("name: {e}")))?;
        let value = BASE64
            .decode(&raw.value)
            .map_err(|e| schema(&endpoint, format!("value: {e}")))?;
        Ok(Some(BoxValue { name, value }))
    }
}

fn schema(endpoint: &str, reason: String) -> AlgoApiError {
    AlgoApiError::Schema {
        endpoint: endpoint.to_string(),
        reason,
    }
}
