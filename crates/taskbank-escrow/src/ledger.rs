//! # Ledger Reconciler
//!
//! Merges two indexer views of a pool into one newest-first statement list:
//!
//! 1. application calls the viewing account sent to the pool, classified
//!    as deposits or withdrawals;
//! 2. payments the pool's account sent, which are always withdrawals.
//!
//! Deposits carry no inner payment, so their amount is the payment to the
//! pool address that rode in the same group. Those funding payments come
//! from a third query (payments received by the pool), keyed by group id.
//!
//! A withdrawal shows up in both views under the application call's id.
//! Statements are deduplicated by id and the application-call record wins.
//!
//! Every query is best-effort: a failure is logged and the reconciler
//! returns what the other queries produced.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskbank_algo_client::indexer::{AddressRole, IndexerClient, TransactionQuery};
use taskbank_algo_client::records::IndexedTransaction;
use taskbank_algo_client::AlgoApiError;
use taskbank_core::{Address, MicroAlgos, PoolId, Round};

/// Transaction search used by the reconciler.
pub trait TransactionSearch: Send + Sync {
    /// All root transactions matching `query`, across every page.
    fn search(
        &self,
        query: &TransactionQuery,
    ) -> impl Future<Output = Result<Vec<IndexedTransaction>, AlgoApiError>> + Send;
}

impl TransactionSearch for IndexerClient {
    fn search(
        &self,
        query: &TransactionQuery,
    ) -> impl Future<Output = Result<Vec<IndexedTransaction>, AlgoApiError>> + Send {
        self.search_transactions(query)
    }
}

impl<T: TransactionSearch> TransactionSearch for std::sync::Arc<T> {
    fn search(
        &self,
        query: &TransactionQuery,
    ) -> impl Future<Output = Result<Vec<IndexedTransaction>, AlgoApiError>> + Send {
        (**self).search(query)
    }
}

/// Direction of funds relative to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Deposit,
    Withdrawal,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        })
    }
}

/// One line of a pool's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub id: String,
    pub round: Round,
    pub amount: MicroAlgos,
    pub kind: StatementKind,
    pub sender: Address,
    pub receiver: Address,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Builds statements for a pool as seen by one account.
#[derive(Debug, Clone)]
pub struct LedgerReconciler<S> {
    search: S,
}

impl<S: TransactionSearch> LedgerReconciler<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    /// Reconciled statements for `pool`, newest first.
    ///
    /// Never fails; query failures are logged and skipped.
    pub async fn statements(&self, pool: PoolId, viewer: Address) -> Vec<Statement> {
        let pool_address = pool.address();

        let app_calls: Vec<IndexedTransaction> = self
            .query("application calls", TransactionQuery::app_calls(viewer, pool))
            .await
            .into_iter()
            .filter(|t| {
                t.application()
                    .is_some_and(|a| a.application_id == pool.get())
            })
            .collect();

        let needs_funding = app_calls
            .iter()
            .any(|t| t.group.is_some() && t.first_inner_payment().is_none());
        let funding = if needs_funding {
            let received = self
                .query(
                    "pool funding payments",
                    TransactionQuery::payments(pool_address, AddressRole::Receiver),
                )
                .await;
            funding_by_group(&received, pool_address)
        } else {
            HashMap::new()
        };

        let mut statements: Vec<Statement> = app_calls
            .iter()
            .filter_map(|t| classify_app_call(t, pool_address, &funding))
            .collect();

        let outgoing = self
            .query(
                "pool payments",
                TransactionQuery::payments(pool_address, AddressRole::Sender),
            )
            .await;
        statements.extend(outgoing.iter().filter_map(|t| pool_payment(t, pool_address)));

        merge(statements)
    }

    async fn query(&self, label: &'static str, query: TransactionQuery) -> Vec<IndexedTransaction> {
        match self.search.search(&query).await {
            Ok(txns) => {
                tracing::debug!(query = label, count = txns.len(), "indexer search");
                txns
            }
            Err(e) => {
                tracing::warn!(query = label, "indexer search failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Classify an application call sent by the viewer.
///
/// Defaults to a deposit. A log mentioning "withdraw" makes it a
/// withdrawal; an inner payment from the pool is authoritative and also
/// supplies the amount. Without an inner payment the amount is the grouped
/// funding payment, or zero if there is none.
pub fn classify_app_call(
    txn: &IndexedTransaction,
    pool_address: Address,
    funding: &HashMap<[u8; 32], MicroAlgos>,
) -> Option<Statement> {
    let id = txn.id.clone()?;
    let round = txn.confirmed_round?;

    let mut kind = StatementKind::Deposit;
    if txn
        .log_texts()
        .any(|l| l.to_ascii_lowercase().contains("withdraw"))
    {
        kind = StatementKind::Withdrawal;
    }

    let amount = match txn.first_inner_payment() {
        Some((inner, payment)) => {
            if inner.sender == pool_address {
                kind = StatementKind::Withdrawal;
            }
            payment.amount
        }
        None => txn
            .group
            .and_then(|g| funding.get(&g).copied())
            .unwrap_or(MicroAlgos::ZERO),
    };

    Some(Statement {
        id,
        round,
        amount,
        kind,
        sender: txn.sender,
        receiver: pool_address,
        timestamp: txn.round_time,
    })
}

/// A record from the pool-as-sender payment search, as a withdrawal.
///
/// Top-level payments from the pool use their face amount. Root records
/// that only match through an inner payment from the pool use that inner
/// payment under the root's id.
pub fn pool_payment(txn: &IndexedTransaction, pool_address: Address) -> Option<Statement> {
    let id = txn.id.clone()?;
    let round = txn.confirmed_round?;

    let (sender, payment) = match txn.payment() {
        Some(p) if txn.sender == pool_address => (txn.sender, p),
        _ => {
            let (inner, p) = txn
                .inner_txns
                .iter()
                .find_map(|t| t.payment().filter(|_| t.sender == pool_address).map(|p| (t, p)))?;
            (inner.sender, p)
        }
    };

    Some(Statement {
        id,
        round,
        amount: payment.amount,
        kind: StatementKind::Withdrawal,
        sender,
        receiver: payment.receiver,
        timestamp: txn.round_time,
    })
}

/// Sum of payments into the pool per group id.
pub fn funding_by_group(
    received: &[IndexedTransaction],
    pool_address: Address,
) -> HashMap<[u8; 32], MicroAlgos> {
    let mut out: HashMap<[u8; 32], MicroAlgos> = HashMap::new();
    for txn in received {
        let (Some(group), Some(payment)) = (txn.group, txn.payment()) else {
            continue;
        };
        if payment.receiver != pool_address {
            continue;
        }
        let entry = out.entry(group).or_default();
        *entry = entry.checked_add(payment.amount).unwrap_or_else(|| {
            tracing::warn!(
                id = txn.id.as_deref().unwrap_or("-"),
                "grouped funding overflows; saturating"
            );
            MicroAlgos(u64::MAX)
        });
    }
    out
}

/// Deduplicate by id, first occurrence wins, then sort newest first.
///
/// The sort is stable, so statements in the same round keep query order.
pub fn merge(statements: Vec<Statement>) -> Vec<Statement> {
    let mut seen = HashSet::new();
    let mut out: Vec<Statement> = statements
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect();
    out.sort_by(|a, b| b.round.cmp(&a.round));
    out
}
