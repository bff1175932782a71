//! In-memory chain double: an escrow contract and an indexer over one
//! shared ledger.
//!
//! Deposits credit the depositor's box and record a grouped payment plus
//! application call. Withdrawals debit the caller's own box, reject
//! overdraws, and record an application call with an inner payment from
//! the pool. Searches apply indexer filter semantics, including matches on
//! inner transactions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::DateTime;
use parking_lot::Mutex;
use taskbank_algo_client::indexer::{AddressRole, TransactionQuery};
use taskbank_algo_client::records::{
    ApplicationFields, IndexedTransaction, PaymentFields, TransactionBody, TxType,
};
use taskbank_algo_client::AlgoApiError;
use taskbank_core::{Address, MicroAlgos, PoolId, Round};
use taskbank_escrow::{ContractError, EscrowContract, TransactionSearch, TxReceipt};
use tokio::sync::{Notify, Semaphore};

/// Holds every chain call until released.
#[derive(Debug)]
pub struct Gate {
    pub entered: Notify,
    pub release: Semaphore,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        let _permit = self.release.acquire().await;
    }
}

#[derive(Debug, Default)]
struct Ledger {
    pools: BTreeMap<u64, BTreeMap<Vec<u8>, Vec<u8>>>,
    records: Vec<IndexedTransaction>,
    round: u64,
    next_app: u64,
    next_id: u64,
}

impl Ledger {
    fn next_round(&mut self) -> Round {
        self.round += 1;
        Round(self.round)
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryChain {
    ledger: Arc<Mutex<Ledger>>,
    gate: Arc<Mutex<Option<Arc<Gate>>>>,
    contract_calls: Arc<AtomicUsize>,
    box_scans: Arc<AtomicUsize>,
    search_failures: Arc<Mutex<Vec<SearchFailure>>>,
    box_failure: Arc<Mutex<Option<String>>>,
}

/// Searches matching both filters fail; `None` matches anything.
#[derive(Debug, Clone)]
struct SearchFailure {
    tx_type: Option<TxType>,
    role: Option<AddressRole>,
    message: String,
}

impl SearchFailure {
    fn applies(&self, q: &TransactionQuery) -> bool {
        self.tx_type.map_or(true, |kind| q.tx_type == Some(kind))
            && self
                .role
                .map_or(true, |role| q.address.map(|(_, r)| r) == Some(role))
    }
}

fn record(
    id: Option<String>,
    round: Round,
    sender: Address,
    body: TransactionBody,
) -> IndexedTransaction {
    IndexedTransaction {
        confirmed_round: id.as_ref().map(|_| round),
        round_time: DateTime::from_timestamp(1_700_000_000 + round.get() as i64, 0),
        id,
        sender,
        group: None,
        logs: Vec::new(),
        inner_txns: Vec::new(),
        created_application: None,
        body,
    }
}

fn tx_type(t: &IndexedTransaction) -> TxType {
    match &t.body {
        TransactionBody::Payment(_) => TxType::Pay,
        TransactionBody::ApplicationCall(_) => TxType::Appl,
        TransactionBody::Other(kind) => *kind,
    }
}

fn single_matches(t: &IndexedTransaction, q: &TransactionQuery) -> bool {
    if q.tx_type.is_some_and(|kind| kind != tx_type(t)) {
        return false;
    }
    if let Some(app) = q.application_id {
        if t.application().map(|a| a.application_id) != Some(app.get()) {
            return false;
        }
    }
    match q.address {
        None => true,
        Some((address, AddressRole::Sender)) => t.sender == address,
        Some((address, AddressRole::Receiver)) => {
            t.payment().is_some_and(|p| p.receiver == address)
        }
    }
}

fn matches(t: &IndexedTransaction, q: &TransactionQuery) -> bool {
    single_matches(t, q) || t.inner_txns.iter().any(|inner| single_matches(inner, q))
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every subsequent chain call until the gate is released.
    pub fn install_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Semaphore::new(0),
        });
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Make every search fail with `message`.
    pub fn fail_searches(&self, message: &str) {
        self.fail_searches_matching(None, None, message);
    }

    /// Make searches for `tx_type` with the address in `role` fail.
    pub fn fail_searches_matching(
        &self,
        tx_type: Option<TxType>,
        role: Option<AddressRole>,
        message: &str,
    ) {
        self.search_failures.lock().push(SearchFailure {
            tx_type,
            role,
            message: message.to_string(),
        });
    }

    /// Make every box listing fail with `message`.
    pub fn fail_box_reads(&self, message: &str) {
        *self.box_failure.lock() = Some(message.to_string());
    }

    /// Number of box listings requested so far.
    pub fn box_scans(&self) -> usize {
        self.box_scans.load(Ordering::SeqCst)
    }

    /// Number of contract calls made so far.
    pub fn contract_calls(&self) -> usize {
        self.contract_calls.load(Ordering::SeqCst)
    }

    /// Write a raw box into a pool.
    pub fn insert_box(&self, pool: PoolId, name: Vec<u8>, value: Vec<u8>) {
        self.ledger
            .lock()
            .pools
            .entry(pool.get())
            .or_default()
            .insert(name, value);
    }

    /// Record an arbitrary root transaction.
    pub fn push_record(&self, txn: IndexedTransaction) {
        self.ledger.lock().records.push(txn);
    }

    /// Sum of every depositor box in a pool.
    pub fn total_locked(&self, pool: PoolId) -> u64 {
        self.ledger
            .lock()
            .pools
            .get(&pool.get())
            .map(|boxes| {
                boxes
                    .values()
                    .filter(|v| v.len() >= 8)
                    .map(|v| {
                        let mut be = [0u8; 8];
                        be.copy_from_slice(&v[..8]);
                        u64::from_be_bytes(be)
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    async fn checkpoint(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

impl EscrowContract for InMemoryChain {
    async fn create(&self, creator: Address) -> Result<(PoolId, TxReceipt), ContractError> {
        self.contract_calls.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await;
        let mut ledger = self.ledger.lock();
        ledger.next_app += 1;
        let app_id = 1000 + ledger.next_app;
        ledger.pools.insert(app_id, BTreeMap::new());
        let round = ledger.next_round();
        let tx_id = ledger.next_id("CREATE");
        let mut txn = record(
            Some(tx_id.clone()),
            round,
            creator,
            TransactionBody::ApplicationCall(ApplicationFields {
                application_id: 0,
                args: Vec::new(),
            }),
        );
        txn.created_application = Some(app_id);
        ledger.records.push(txn);

        let pool = PoolId::new(app_id).map_err(|e| ContractError::Rejected(e.to_string()))?;
        Ok((
            pool,
            TxReceipt {
                tx_id,
                confirmed_round: round,
                logs: Vec::new(),
            },
        ))
    }

    async fn deposit(
        &self,
        pool: PoolId,
        depositor: Address,
        amount: MicroAlgos,
        memo: &str,
    ) -> Result<TxReceipt, ContractError> {
        self.contract_calls.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await;
        let args = taskbank_escrow::abi::deposit_args(memo)?;
        let mut ledger = self.ledger.lock();
        let boxes = ledger.pools.get_mut(&pool.get()).ok_or_else(|| {
            ContractError::Rejected(format!("application {pool} does not exist"))
        })?;
        let key = depositor.as_bytes().to_vec();
        let current = boxes
            .get(&key)
            .map(|v| {
                let mut be = [0u8; 8];
                be.copy_from_slice(&v[..8]);
                u64::from_be_bytes(be)
            })
            .unwrap_or(0);
        boxes.insert(key, (current + amount.get()).to_be_bytes().to_vec());

        let round = ledger.next_round();
        let group = {
            let mut g = [0u8; 32];
            g[..8].copy_from_slice(&round.get().to_be_bytes());
            g
        };
        let pay_id = ledger.next_id("PAY");
        let call_id = ledger.next_id("APP");

        let mut pay = record(
            Some(pay_id),
            round,
            depositor,
            TransactionBody::Payment(PaymentFields {
                receiver: pool.address(),
                amount,
            }),
        );
        pay.group = Some(group);

        let mut call = record(
            Some(call_id.clone()),
            round,
            depositor,
            TransactionBody::ApplicationCall(ApplicationFields {
                application_id: pool.get(),
                args,
            }),
        );
        call.group = Some(group);
        call.logs = vec![b"deposit_ok".to_vec()];

        ledger.records.push(pay);
        ledger.records.push(call);

        Ok(TxReceipt {
            tx_id: call_id,
            confirmed_round: round,
            logs: vec![b"deposit_ok".to_vec()],
        })
    }

    async fn withdraw(
        &self,
        pool: PoolId,
        caller: Address,
        amount: MicroAlgos,
        receiver: Address,
    ) -> Result<TxReceipt, ContractError> {
        self.contract_calls.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await;
        let mut ledger = self.ledger.lock();
        let boxes = ledger.pools.get_mut(&pool.get()).ok_or_else(|| {
            ContractError::Rejected(format!("application {pool} does not exist"))
        })?;
        let key = caller.as_bytes().to_vec();
        let current = boxes
            .get(&key)
            .map(|v| {
                let mut be = [0u8; 8];
                be.copy_from_slice(&v[..8]);
                u64::from_be_bytes(be)
            })
            .unwrap_or(0);
        if current < amount.get() {
            return Err(ContractError::Rejected(
                "logic eval error: assert failed: insufficient balance".into(),
            ));
        }
        boxes.insert(key, (current - amount.get()).to_be_bytes().to_vec());

        let round = ledger.next_round();
        let call_id = ledger.next_id("APP");
        let inner = record(
            None,
            round,
            pool.address(),
            TransactionBody::Payment(PaymentFields { receiver, amount }),
        );
        let mut call = record(
            Some(call_id.clone()),
            round,
            caller,
            TransactionBody::ApplicationCall(ApplicationFields {
                application_id: pool.get(),
                args: taskbank_escrow::abi::withdraw_args(amount, &receiver),
            }),
        );
        call.logs = vec![b"withdraw_ok".to_vec()];
        call.inner_txns = vec![inner];
        ledger.records.push(call);

        Ok(TxReceipt {
            tx_id: call_id,
            confirmed_round: round,
            logs: vec![b"withdraw_ok".to_vec()],
        })
    }

    async fn box_names(&self, pool: PoolId) -> Result<Vec<Vec<u8>>, ContractError> {
        self.box_scans.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await;
        if let Some(message) = self.box_failure.lock().clone() {
            return Err(ContractError::Api(AlgoApiError::ApiError {
                endpoint: format!("GET /v2/applications/{pool}/boxes"),
                status: 503,
                body: message,
            }));
        }
        let ledger = self.ledger.lock();
        Ok(ledger
            .pools
            .get(&pool.get())
            .map(|boxes| boxes.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn box_value(&self, pool: PoolId, name: &[u8]) -> Result<Option<Vec<u8>>, ContractError> {
        let ledger = self.ledger.lock();
        Ok(ledger
            .pools
            .get(&pool.get())
            .and_then(|boxes| boxes.get(name).cloned()))
    }
}

impl TransactionSearch for InMemoryChain {
    async fn search(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<IndexedTransaction>, AlgoApiError> {
        self.checkpoint().await;
        let failure = self
            .search_failures
            .lock()
            .iter()
            .find(|f| f.applies(query))
            .map(|f| f.message.clone());
        if let Some(message) = failure {
            return Err(AlgoApiError::ApiError {
                endpoint: "GET /v2/transactions".into(),
                status: 500,
                body: message,
            });
        }
        let ledger = self.ledger.lock();
        Ok(ledger
            .records
            .iter()
            .filter(|t| matches(t, query))
            .cloned()
            .collect())
    }
}
