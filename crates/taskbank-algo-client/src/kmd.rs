//! Typed client for the key management daemon (KMD) REST v1 API.
//!
//! KMD holds the keys; this client only asks it to sign. A signing session
//! opens a wallet handle, signs each transaction, and releases the handle
//! whether or not signing succeeded.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use taskbank_core::Address;
use zeroize::Zeroizing;

use crate::error::AlgoApiError;
use crate::http::{read_json, write_json};
use crate::txn::Transaction;

// -- Wire shapes --------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawWallets {
    #[serde(default)]
    wallets: Vec<RawWallet>,
}

#[derive(Debug, Deserialize)]
struct RawWallet {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct InitRequest<'a> {
    wallet_id: &'a str,
    wallet_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitResponse {
    wallet_handle_token: String,
}

#[derive(Serialize)]
struct HandleRequest<'a> {
    wallet_handle_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct KeyListResponse {
    #[serde(default)]
    addresses: Vec<String>,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    wallet_handle_token: &'a str,
    wallet_password: &'a str,
    transaction: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed_transaction: String,
}

#[derive(Debug, Deserialize)]
struct Empty {}

// -- Client -------------------------------------------------------------------

/// Client for a KMD wallet.
#[derive(Clone)]
pub struct KmdClient {
    http: reqwest::Client,
    base_url: String,
    wallet_name: String,
    wallet_password: Zeroizing<String>,
}

impl fmt::Debug for KmdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmdClient")
            .field("base_url", &self.base_url)
            .field("wallet_name", &self.wallet_name)
            .field("wallet_password", &"[REDACTED]")
            .finish()
    }
}

impl KmdClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: url::Url,
        wallet_name: String,
        wallet_password: Zeroizing<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            wallet_name,
            wallet_password,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Name of the wallet this client signs with.
    pub fn wallet_name(&self) -> &str {
        &self.wallet_name
    }

    /// Resolve the configured wallet name to its id. Calls `GET /v1/wallets`.
    async fn wallet_id(&self) -> Result<String, AlgoApiError> {
        let url = self.url("/v1/wallets");
        let raw: RawWallets = read_json("GET /v1/wallets", || self.http.get(&url)).await?;
        raw.wallets
            .into_iter()
            .find(|w| w.name == self.wallet_name)
            .map(|w| w.id)
            .ok_or_else(|| AlgoApiError::WalletNotFound(self.wallet_name.clone()))
    }

    async fn open(&self) -> Result<Zeroizing<String>, AlgoApiError> {
        let wallet_id = self.wallet_id().await?;
        let request = self.http.post(self.url("/v1/wallet/init")).json(&InitRequest {
            wallet_id: &wallet_id,
            wallet_password: &self.wallet_password,
        });
        let raw: InitResponse = write_json("POST /v1/wallet/init", request).await?;
        Ok(Zeroizing::new(raw.wallet_handle_token))
    }

    async fn release(&self, handle: &str) {
        let request = self
            .http
            .post(self.url("/v1/wallet/release"))
            .json(&HandleRequest {
                wallet_handle_token: handle,
            });
        if let Err(e) = write_json::<Empty>("POST /v1/wallet/release", request).await {
            tracing::warn!(wallet = %self.wallet_name, "failed to release wallet handle: {e}");
        }
    }

    /// Addresses of every key in the wallet. Calls `POST /v1/key/list`.
    pub async fn list_addresses(&self) -> Result<Vec<Address>, AlgoApiError> {
        let handle = self.open().await?;
        let request = self.http.post(self.url("/v1/key/list")).json(&HandleRequest {
            wallet_handle_token: &handle,
        });
        let result: Result<KeyListResponse, _> = write_json("POST /v1/key/list", request).await;
        self.release(&handle).await;

        result?
            .addresses
            .iter()
            .map(|a| {
                Address::parse(a).map_err(|e| AlgoApiError::Schema {
                    endpoint: "POST /v1/key/list".into(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Sign every transaction with the wallet key matching its sender.
    ///
    /// Calls `POST /v1/transaction/sign` once per transaction and returns
    /// the signed encodings in input order.
    pub async fn sign_transactions(
        &self,
        txns: &[Transaction],
    ) -> Result<Vec<Vec<u8>>, AlgoApiError> {
        let encoded = txns
            .iter()
            .map(Transaction::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let handle = self.open().await?;
        let result = self.sign_with_handle(&handle, &encoded).await;
        self.release(&handle).await;
        if result.is_ok() {
            tracing::debug!(wallet = %self.wallet_name, txns = txns.len(), "signed");
        }
        result
    }

    async fn sign_with_handle(
        &self,
        handle: &str,
        encoded: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, AlgoApiError> {
        let endpoint = "POST /v1/transaction/sign";
        let mut signed = Vec::with_capacity(encoded.len());
        for bytes in encoded {
            let request = self
                .http
                .post(self.url("/v1/transaction/sign"))
                .json(&SignRequest {
                    wallet_handle_token: handle,
                    wallet_password: &self.wallet_password,
                    transaction: BASE64.encode(bytes),
                });
            let raw: SignResponse = write_json(endpoint, request).await?;
            let stx = BASE64
                .decode(&raw.signed_transaction)
                .map_err(|e| AlgoApiError::Schema {
                    endpoint: endpoint.to_string(),
                    reason: format!("signed_transaction: {e}"),
                })?;
            signed.push(stx);
        }
        Ok(signed)
    }
}
