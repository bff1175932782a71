//! # Indexer Transaction Records
//!
//! Strict schema for transactions returned by the indexer's
//! `/v2/transactions` search. The wire shape is decoded into a raw serde
//! struct and then validated into a typed record:
//!
//! - `tx-type` must be one of the known transaction types;
//! - `pay` records must carry `payment-transaction`, `appl` records must
//!   carry `application-transaction`;
//! - addresses must checksum, and `logs`/`group`/`application-args` must be
//!   valid base64.
//!
//! Anything else fails with [`RecordError`] instead of being defaulted.
//! Fields not modeled here are ignored, so new indexer fields do not break
//! decoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskbank_core::{Address, MicroAlgos, Round};

/// A record that does not match the expected schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct RecordError {
    pub field: String,
    pub reason: String,
}

impl RecordError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            reason: self.reason,
        }
    }
}

/// Transaction type discriminator as reported in `tx-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Pay,
    Appl,
    Axfer,
    Acfg,
    Afrz,
    Keyreg,
    Stpf,
    Hb,
}

impl TxType {
    /// Wire name, as used in the `tx-type` search filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pay => "pay",
            Self::Appl => "appl",
            Self::Axfer => "axfer",
            Self::Acfg => "acfg",
            Self::Afrz => "afrz",
            Self::Keyreg => "keyreg",
            Self::Stpf => "stpf",
            Self::Hb => "hb",
        }
    }
}

/// Payment fields of a `pay` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFields {
    pub receiver: Address,
    pub amount: MicroAlgos,
}

/// Application fields of an `appl` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFields {
    /// Called application; 0 for a create.
    pub application_id: u64,
    pub args: Vec<Vec<u8>>,
}

/// Type-specific body of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionBody {
    Payment(PaymentFields),
    ApplicationCall(ApplicationFields),
    /// A known type the escrow does not inspect further.
    Other(TxType),
}

/// A validated indexer transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTransaction {
    /// Transaction id; absent on inner transactions.
    pub id: Option<String>,
    pub confirmed_round: Option<Round>,
    pub round_time: Option<DateTime<Utc>>,
    pub sender: Address,
    pub group: Option<[u8; 32]>,
    pub logs: Vec<Vec<u8>>,
    pub inner_txns: Vec<IndexedTransaction>,
    /// Application created by this transaction, if any.
    pub created_application: Option<u64>,
    pub body: TransactionBody,
}

impl IndexedTransaction {
    /// Payment fields, if this is a payment.
    pub fn payment(&self) -> Option<&PaymentFields> {
        match &self.body {
            TransactionBody::Payment(p) => Some(p),
            _ => None,
        }
    }

    /// Application fields, if this is an application call.
    pub fn application(&self) -> Option<&ApplicationFields> {
        match &self.body {
            TransactionBody::ApplicationCall(a) => Some(a),
            _ => None,
        }
    }

    /// Logs decoded as text (lossy UTF-8), one entry per log.
    pub fn log_texts(&self) -> impl Iterator<Item = String> + '_ {
        self.logs
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
    }

    /// First inner payment, in execution order.
    pub fn first_inner_payment(&self) -> Option<(&IndexedTransaction, &PaymentFields)> {
        self.inner_txns
            .iter()
            .find_map(|t| t.payment().map(|p| (t, p)))
    }
}

// -- Wire shapes --------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct RawTransaction {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    confirmed_round: Option<u64>,
    #[serde(default)]
    round_time: Option<i64>,
    sender: String,
    tx_type: TxType,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    inner_txns: Vec<RawTransaction>,
    #[serde(default)]
    created_application_index: Option<u64>,
    #[serde(default)]
    payment_transaction: Option<RawPayment>,
    #[serde(default)]
    application_transaction: Option<RawApplication>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPayment {
    receiver: String,
    amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawApplication {
    application_id: u64,
    #[serde(default)]
    application_args: Vec<String>,
}

/// Search page envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct RawSearchPage {
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    #[serde(default)]
    pub next_token: Option<String>,
}

fn decode_b64(field: &str, raw: &str) -> Result<Vec<u8>, RecordError> {
    BASE64
        .decode(raw)
        .map_err(|e| RecordError::new(field, format!("invalid base64: {e}")))
}

fn decode_address(field: &str, raw: &str) -> Result<Address, RecordError> {
    Address::parse(raw).map_err(|e| RecordError::new(field, e.to_string()))
}

impl TryFrom<RawTransaction> for IndexedTransaction {
    type Error = RecordError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let sender = decode_address("sender", &raw.sender)?;

        let group = match raw.group.as_deref() {
            None | Some("") => None,
            Some(g) => {
                let bytes = decode_b64("group", g)?;
                let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    RecordError::new("group", format!("expected 32 bytes, got {}", bytes.len()))
                })?;
                Some(arr)
            }
        };

        let logs = raw
            .logs
            .iter()
            .map(|l| decode_b64("logs", l))
            .collect::<Result<Vec<_>, _>>()?;

        let inner_txns = raw
            .inner_txns
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                IndexedTransaction::try_from(t).map_err(|e| e.nested(&format!("inner-txns[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let body = match raw.tx_type {
            TxType::Pay => {
                let p = raw.payment_transaction.ok_or_else(|| {
                    RecordError::new("payment-transaction", "missing on pay record")
                })?;
                TransactionBody::Payment(PaymentFields {
                    receiver: decode_address("payment-transaction.receiver", &p.receiver)?,
                    amount: MicroAlgos(p.amount),
                })
            }
            TxType::Appl => {
                let a = raw.application_transaction.ok_or_else(|| {
                    RecordError::new("application-transaction", "missing on appl record")
                })?;
                let args = a
                    .application_args
                    .iter()
                    .map(|arg| decode_b64("application-transaction.application-args", arg))
                    .collect::<Result<Vec<_>, _>>()?;
                TransactionBody::ApplicationCall(ApplicationFields {
                    application_id: a.application_id,
                    args,
                })
            }
            other => TransactionBody::Other(other),
        };

        let round_time = match raw.round_time {
            None => None,
            Some(secs) => Some(DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
                RecordError::new("round-time", format!("out of range: {secs}"))
            })?),
        };

        Ok(Self {
            id: raw.id,
            confirmed_round: raw.confirmed_round.map(Round),
            round_time,
            sender,
            group,
            logs,
            inner_txns,
            created_application: raw.created_application_index,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ZERO: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";

    fn decode(v: serde_json::Value) -> Result<IndexedTransaction, RecordError> {
        let raw: RawTransaction = serde_json::from_value(v).expect("wire shape");
        IndexedTransaction::try_from(raw)
    }

    #[test]
    fn payment_record_decodes() {
        let txn = decode(json!({
            "id": "PAY1",
            "confirmed-round": 10,
            "round-time": 1_700_000_000,
            "sender": ZERO,
            "tx-type": "pay",
            "payment-transaction": { "receiver": ZERO, "amount": 50_000_000 }
        }))
        .unwrap();
        assert_eq!(txn.id.as_deref(), Some("PAY1"));
        assert_eq!(txn.confirmed_round, Some(Round(10)));
        assert_eq!(txn.payment().unwrap().amount, MicroAlgos(50_000_000));
        assert!(txn.round_time.is_some());
    }

    #[test]
    fn app_call_with_logs_and_inner_payment() {
        let txn = decode(json!({
            "id": "APP1",
            "confirmed-round": 11,
            "sender": ZERO,
            "tx-type": "appl",
            "logs": [BASE64.encode("withdraw_ok")],
            "application-transaction": {
                "application-id": 42,
                "application-args": [BASE64.encode([1u8, 2, 3, 4])]
            },
            "inner-txns": [{
                "sender": ZERO,
                "tx-type": "pay",
                "payment-transaction": { "receiver": ZERO, "amount": 7 }
            }]
        }))
        .unwrap();
        assert_eq!(txn.application().unwrap().application_id, 42);
        assert_eq!(txn.application().unwrap().args, vec![vec![1u8, 2, 3, 4]]);
        assert_eq!(txn.log_texts().collect::<Vec<_>>(), vec!["withdraw_ok"]);
        let (inner, pay) = txn.first_inner_payment().unwrap();
        assert!(inner.id.is_none());
        assert_eq!(pay.amount, MicroAlgos(7));
    }

    #[test]
    fn pay_without_payment_body_fails_fast() {
        let err = decode(json!({
            "id": "PAY2",
            "sender": ZERO,
            "tx-type": "pay"
        }))
        .unwrap_err();
        assert_eq!(err.field, "payment-transaction");
    }

    #[test]
    fn appl_without_application_body_fails_fast() {
        let err = decode(json!({
            "id": "APP2",
            "sender": ZERO,
            "tx-type": "appl"
        }))
        .unwrap_err();
        assert_eq!(err.field, "application-transaction");
    }

    #[test]
    fn unknown_tx_type_is_a_wire_error() {
        let raw: Result<RawTransaction, _> = serde_json::from_value(json!({
            "sender": ZERO,
            "tx-type": "teleport"
        }));
        assert!(raw.is_err());
    }

    #[test]
    fn known_other_types_are_kept() {
        let txn = decode(json!({
            "id": "AX1",
            "sender": ZERO,
            "tx-type": "axfer"
        }))
        .unwrap();
        assert_eq!(txn.body, TransactionBody::Other(TxType::Axfer));
    }

    #[test]
    fn bad_inner_record_reports_path() {
        let err = decode(json!({
            "id": "APP3",
            "sender": ZERO,
            "tx-type": "appl",
            "application-transaction": { "application-id": 1 },
            "inner-txns": [{ "sender": ZERO, "tx-type": "pay" }]
        }))
        .unwrap_err();
        assert_eq!(err.field, "inner-txns[0].payment-transaction");
    }

    #[test]
    fn malformed_log_base64_is_rejected() {
        let err = decode(json!({
            "id": "APP4",
            "sender": ZERO,
            "tx-type": "appl",
            "logs": ["***"],
            "application-transaction": { "application-id": 1 }
        }))
        .unwrap_err();
        assert_eq!(err.field, "logs");
    }

    #[test]
    fn bad_sender_checksum_is_rejected() {
        let bad = format!("B{}", &ZERO[1..]);
        let err = decode(json!({
            "id": "P",
            "sender": bad,
            "tx-type": "pay",
            "payment-transaction": { "receiver": ZERO, "amount": 1 }
        }))
        .unwrap_err();
        assert_eq!(err.field, "sender");
    }

    #[test]
    fn group_must_be_32_bytes() {
        let err = decode(json!({
            "id": "P",
            "sender": ZERO,
            "tx-type": "pay",
            "group": BASE64.encode([1u8; 5]),
            "payment-transaction": { "receiver": ZERO, "amount": 1 }
        }))
        .unwrap_err();
        assert_eq!(err.field, "group");
    }
}
