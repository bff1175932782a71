//! Escrow error types.
//!
//! [`EscrowError`] is what callers of the Escrow Client see. Input problems
//! are caught before anything is sent; remote failures carry the node's or
//! wallet's message verbatim.

use taskbank_algo_client::AlgoApiError;
use taskbank_core::Address;

use crate::abi::StringTooLong;
use crate::signer::SignerError;

/// Errors surfaced by [`crate::EscrowClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum EscrowError {
    /// Pool creation was rejected by the network or the signer.
    #[error("pool deployment failed: {0}")]
    Deployment(String),

    /// Amount is zero, malformed, or out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Pool id is missing or zero.
    #[error("invalid pool id: {0}")]
    InvalidPool(String),

    /// Memo does not fit a contract string argument.
    #[error("invalid memo: {0}")]
    InvalidMemo(#[source] StringTooLong),

    /// Receiver is not a well-formed address.
    #[error("invalid receiver: {0}")]
    InvalidReceiver(String),

    /// An operation needs an acting account and none is selected.
    #[error("no account selected")]
    NoAccount,

    /// The contract, node, or wallet refused a write.
    #[error("{message}")]
    RemoteRejection { message: String },

    /// A read against the pool failed.
    #[error("failed to read pool state: {0}")]
    Read(#[source] ContractError),

    /// A box held a value that is not a balance.
    #[error(transparent)]
    BoxDecode(#[from] BoxDecodeError),
}

/// Errors from the contract seam.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Node or indexer call failed.
    #[error(transparent)]
    Api(#[from] AlgoApiError),

    /// The wallet provider refused or failed to sign.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// An argument cannot be encoded for the contract call.
    #[error(transparent)]
    Argument(#[from] StringTooLong),

    /// The contract rejected the call.
    #[error("{0}")]
    Rejected(String),

    /// Confirmed create did not report an application id.
    #[error("create transaction {tx_id} confirmed without an application id")]
    MissingApplicationId { tx_id: String },

    /// No approval/clear programs were supplied, so pools cannot be created.
    #[error("no contract programs loaded")]
    NoArtifact,
}

impl ContractError {
    /// Remote message for display, taken verbatim from the source.
    pub fn remote_message(&self) -> String {
        match self {
            Self::Api(e) => e.remote_message(),
            Self::Signer(SignerError::Wallet(e)) => e.remote_message(),
            Self::Rejected(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

/// A box store entry that cannot be read as a depositor balance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoxDecodeError {
    /// Balance values are at least eight big-endian bytes.
    #[error("balance box for {depositor} holds {len} bytes, expected at least 8")]
    ValueTooShort { depositor: Address, len: usize },
}
