//! # Validation Errors
//!
//! Structured errors for domain-primitive construction, built with
//! `thiserror`. Each variant carries the rejected input so operators can
//! see what was typed without reproducing the failure.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address string is not 58 characters of RFC 4648 base32.
    #[error("invalid address \"{value}\": {reason}")]
    InvalidAddress {
        /// The string that failed to decode.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Address decoded but its trailing 4-byte checksum does not match.
    #[error("address checksum mismatch: \"{0}\"")]
    AddressChecksum(String),

    /// Public key slice is not exactly 32 bytes.
    #[error("invalid public key length: {0} bytes (expected 32)")]
    InvalidPublicKeyLength(usize),

    /// Pool identifier is zero or not a number.
    #[error("invalid pool id: \"{0}\" (expected a non-zero application id)")]
    InvalidPoolId(String),

    /// Amount string is not a non-negative decimal number.
    #[error("invalid amount \"{value}\": {reason}")]
    InvalidAmount {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Amount does not fit in 64 bits of microAlgos.
    #[error("amount overflows u64 microAlgos: \"{0}\"")]
    AmountOverflow(String),
}
