//! Typed client for the indexer REST v2 transaction search.
//!
//! [`IndexerClient::search_transactions`] follows `next-token` until the
//! indexer stops returning one, and validates every record against the
//! strict schema in [`crate::records`].

use taskbank_core::{Address, PoolId};

use crate::error::AlgoApiError;
use crate::http::read_json;
use crate::records::{IndexedTransaction, RawSearchPage, TxType};

/// Upper bound on pages followed for a single search.
const MAX_PAGES: usize = 100;

/// Role the searched address plays in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    Sender,
    Receiver,
}

impl AddressRole {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Receiver => "receiver",
        }
    }
}

/// Filters for `GET /v2/transactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub address: Option<(Address, AddressRole)>,
    pub tx_type: Option<TxType>,
    pub application_id: Option<PoolId>,
    /// Page size hint sent as `limit`.
    pub limit: Option<u32>,
}

impl TransactionQuery {
    /// Application calls sent by `sender` to `app`.
    pub fn app_calls(sender: Address, app: PoolId) -> Self {
        Self {
            address: Some((sender, AddressRole::Sender)),
            tx_type: Some(TxType::Appl),
            application_id: Some(app),
            limit: None,
        }
    }

    /// Payments where `address` plays `role`.
    pub fn payments(address: Address, role: AddressRole) -> Self {
        Self {
            address: Some((address, role)),
            tx_type: Some(TxType::Pay),
            application_id: None,
            limit: None,
        }
    }

    fn params(&self, next: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some((address, role)) = self.address {
            params.push(("address", address.encode()));
            params.push(("address-role", role.as_str().to_string()));
        }
        if let Some(tx_type) = self.tx_type {
            params.push(("tx-type", tx_type.as_str().to_string()));
        }
        if let Some(app) = self.application_id {
            params.push(("application-id", app.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(next) = next {
            params.push(("next", next.to_string()));
        }
        params
    }
}

/// Client for the indexer REST v2 API.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Search transactions, following pagination until exhausted.
    ///
    /// Calls `GET /v2/transactions`. Root records must carry an `id`;
    /// a record that violates the schema fails the whole search.
    pub async fn search_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<IndexedTransaction>, AlgoApiError> {
        let endpoint = "GET /v2/transactions";
        let url = format!("{}/v2/transactions", self.base_url);
        let mut out = Vec::new();
        let mut next: Option<String> = None;

        for page in 0..MAX_PAGES {
            let params = query.params(next.as_deref());
            let raw: RawSearchPage =
                read_json(endpoint, || self.http.get(&url).query(&params)).await?;
            let count = raw.transactions.len();

            for (i, record) in raw.transactions.into_iter().enumerate() {
                let txn = IndexedTransaction::try_from(record).map_err(|e| {
                    AlgoApiError::Schema {
                        endpoint: endpoint.to_string(),
                        reason: format!("transactions[{i}].{e}"),
                    }
                })?;
                if txn.id.is_none() {
                    return Err(AlgoApiError::Schema {
                        endpoint: endpoint.to_string(),
                        reason: format!("transactions[{i}].id: missing on root record"),
                    });
                }
                out.push(txn);
            }

            tracing::debug!(page, count, "indexer page");
            match raw.next_token {
                Some(token) if !token.is_empty() && count > 0 => next = Some(token),
                _ => return Ok(out),
            }
        }

        tracing::warn!(pages = MAX_PAGES, "indexer search truncated");
        Ok(out)
    }
}
