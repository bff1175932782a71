//! # Unsigned Transactions and Canonical Encoding
//!
//! Models the two transaction kinds the escrow needs (payment and
//! application call) and encodes them the way the network hashes and signs
//! them: msgpack maps with keys in byte order and every zero/empty field
//! omitted.
//!
//! ## Identifiers
//!
//! - transaction id: `SHA-512/256("TX" || encoding)`, shown as unpadded base32
//! - group id: `SHA-512/256("TG" || msgpack({"txlist": [raw ids]}))`
//!
//! Signing is not done here. An encoded transaction is handed to a wallet
//! provider, which returns the signed bytes that algod accepts.

use std::fmt;

use data_encoding::BASE32_NOPAD;
use taskbank_core::{sha512_256_prefixed, Address, MicroAlgos, Round};

/// Largest atomic group the network accepts.
pub const MAX_GROUP_SIZE: usize = 16;

/// Rounds a transaction stays valid after `first_valid`.
pub const DEFAULT_VALIDITY_WINDOW: u64 = 1000;

/// Errors from canonical encoding and grouping.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("msgpack write failed: {0}")]
    Msgpack(String),
    #[error("group of {0} transactions exceeds the limit of {max}", max = MAX_GROUP_SIZE)]
    GroupTooLarge(usize),
    #[error("cannot group an empty transaction list")]
    EmptyGroup,
}

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// Unpadded base32 form (52 characters), as used by algod and the indexer.
    pub fn encode(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.encode())
    }
}

/// Network parameters every transaction header needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Minimum flat fee per transaction.
    pub min_fee: MicroAlgos,
    /// First round the transaction is valid in.
    pub first_valid: Round,
    /// Last round the transaction is valid in.
    pub last_valid: Round,
    /// Genesis id, e.g. `testnet-v1.0`.
    pub genesis_id: String,
    /// Genesis block hash.
    pub genesis_hash: [u8; 32],
}

/// Application call completion action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnComplete {
    #[default]
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

/// Global or local state allocation for an application create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

/// Reference to a box the call will read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxReference {
    /// Index into the foreign-apps array; 0 is the called application.
    pub app_index: u64,
    pub name: Vec<u8>,
}

/// Application call fields. `app_id == 0` creates a new application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationCall {
    pub app_id: u64,
    pub on_complete: OnComplete,
    pub args: Vec<Vec<u8>>,
    pub accounts: Vec<Address>,
    pub boxes: Vec<BoxReference>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    pub extra_pages: u64,
}

/// Type-specific transaction fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment { receiver: Address, amount: MicroAlgos },
    ApplicationCall(ApplicationCall),
}

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub fee: MicroAlgos,
    pub first_valid: Round,
    pub last_valid: Round,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub group: Option<[u8; 32]>,
    pub note: Vec<u8>,
    pub kind: TransactionKind,
}

impl Transaction {
    fn with_params(params: &SuggestedParams, sender: Address, kind: TransactionKind) -> Self {
        Self {
            sender,
            fee: params.min_fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            group: None,
            note: Vec::new(),
            kind,
        }
    }

    /// Payment of `amount` from `sender` to `receiver` at the minimum fee.
    pub fn payment(
        params: &SuggestedParams,
        sender: Address,
        receiver: Address,
        amount: MicroAlgos,
    ) -> Self {
        Self::with_params(params, sender, TransactionKind::Payment { receiver, amount })
    }

    /// Application call at the minimum fee.
    pub fn application_call(
        params: &SuggestedParams,
        sender: Address,
        call: ApplicationCall,
    ) -> Self {
        Self::with_params(params, sender, TransactionKind::ApplicationCall(call))
    }

    /// Raise the flat fee by `extra`, e.g. to pay for inner transactions.
    pub fn with_extra_fee(mut self, extra: MicroAlgos) -> Self {
        self.fee = MicroAlgos(self.fee.get().saturating_add(extra.get()));
        self
    }

    /// Canonical msgpack encoding.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(256);
        write_value(&mut buf, &self.to_value())?;
        Ok(buf)
    }

    /// The transaction id.
    pub fn id(&self) -> Result<TxId, EncodeError> {
        Ok(TxId(sha512_256_prefixed(b"TX", &self.encode()?)))
    }

    fn to_value(&self) -> Value {
        let mut fields: Vec<(&'static str, Value)> = vec![
            ("fee", Value::Uint(self.fee.get())),
            ("fv", Value::Uint(self.first_valid.get())),
            ("gen", Value::Str(self.genesis_id.clone())),
            ("gh", Value::Bin(self.genesis_hash.to_vec())),
            ("lv", Value::Uint(self.last_valid.get())),
            ("note", Value::Bin(self.note.clone())),
            ("snd", Value::Bin(self.sender.as_bytes().to_vec())),
        ];
        if let Some(group) = self.group {
            fields.push(("grp", Value::Bin(group.to_vec())));
        }
        match &self.kind {
            TransactionKind::Payment { receiver, amount } => {
                fields.push(("type", Value::Str("pay".into())));
                fields.push(("amt", Value::Uint(amount.get())));
                fields.push(("rcv", Value::Bin(receiver.as_bytes().to_vec())));
            }
            TransactionKind::ApplicationCall(call) => {
                fields.push(("type", Value::Str("appl".into())));
                fields.push(("apid", Value::Uint(call.app_id)));
                fields.push(("apan", Value::Uint(call.on_complete as u64)));
                fields.push((
                    "apaa",
                    Value::Array(call.args.iter().cloned().map(Value::Bin).collect()),
                ));
                fields.push((
                    "apat",
                    Value::Array(
                        call.accounts
                            .iter()
                            .map(|a| Value::Bin(a.as_bytes().to_vec()))
                            .collect(),
                    ),
                ));
                fields.push((
                    "apbx",
                    Value::Array(
                        call.boxes
                            .iter()
                            .map(|b| {
                                Value::Map(vec![
                                    ("i", Value::Uint(b.app_index)),
                                    ("n", Value::Bin(b.name.clone())),
                                ])
                            })
                            .collect(),
                    ),
                ));
                fields.push(("apap", Value::Bin(call.approval_program.clone())));
                fields.push(("apsu", Value::Bin(call.clear_program.clone())));
                fields.push(("apgs", schema_value(call.global_schema)));
                fields.push(("apls", schema_value(call.local_schema)));
                fields.push(("apep", Value::Uint(call.extra_pages)));
            }
        }
        Value::Map(fields)
    }
}

fn schema_value(schema: StateSchema) -> Value {
    Value::Map(vec![
        ("nbs", Value::Uint(schema.num_byte_slices)),
        ("nui", Value::Uint(schema.num_uints)),
    ])
}

/// Compute the group id for `txns` and stamp it on each of them.
///
/// Any existing group field is cleared first, so regrouping is idempotent.
pub fn assign_group_id(txns: &mut [Transaction]) -> Result<[u8; 32], EncodeError> {
    if txns.is_empty() {
        return Err(EncodeError::EmptyGroup);
    }
    if txns.len() > MAX_GROUP_SIZE {
        return Err(EncodeError::GroupTooLarge(txns.len()));
    }
    let mut ids = Vec::with_capacity(txns.len());
    for txn in txns.iter_mut() {
        txn.group = None;
        ids.push(Value::Bin(txn.id()?.0.to_vec()));
    }
    let mut buf = Vec::new();
    write_value(&mut buf, &Value::Map(vec![("txlist", Value::Array(ids))]))?;
    let group = sha512_256_prefixed(b"TG", &buf);
    for txn in txns.iter_mut() {
        txn.group = Some(group);
    }
    Ok(group)
}

// -- Canonical msgpack --------------------------------------------------------

enum Value {
    Uint(u64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(&'static str, Value)>),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Self::Uint(v) => *v == 0,
            Self::Str(s) => s.is_empty(),
            Self::Bin(b) => b.is_empty(),
            Self::Array(items) => items.is_empty(),
            Self::Map(entries) => entries.iter().all(|(_, v)| v.is_empty()),
        }
    }
}

fn msgpack_err<E: fmt::Display>(e: E) -> EncodeError {
    EncodeError::Msgpack(e.to_string())
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Uint(v) => {
            rmp::encode::write_uint(buf, *v).map_err(msgpack_err)?;
        }
        Value::Str(s) => rmp::encode::write_str(buf, s).map_err(msgpack_err)?,
        Value::Bin(b) => rmp::encode::write_bin(buf, b).map_err(msgpack_err)?,
        Value::Array(items) => {
            rmp::encode::write_array_len(buf, items.len() as u32).map_err(msgpack_err)?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Map(entries) => {
            // Canonical form: zero values dropped, keys in byte order.
            let mut present: Vec<&(&'static str, Value)> =
                entries.iter().filter(|(_, v)| !v.is_empty()).collect();
            present.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            rmp::encode::write_map_len(buf, present.len() as u32).map_err(msgpack_err)?;
            for (key, v) in present {
                rmp::encode::write_str(buf, key).map_err(msgpack_err)?;
                write_value(buf, v)?;
            }
        }
    }
    Ok(())
}
