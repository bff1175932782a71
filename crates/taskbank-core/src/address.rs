//! # Account Addresses
//!
//! An [`Address`] wraps a 32-byte ed25519 public key. Its textual form is
//! the 58-character RFC 4648 base32 encoding (no padding) of the public key
//! followed by a 4-byte checksum: the last four bytes of
//! `SHA-512/256(public key)`.
//!
//! Parsing validates length, alphabet, and checksum, so an `Address` value
//! in hand is always syntactically valid.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::hash::sha512_256;

/// Length of an account public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the textual address form in characters.
pub const ADDRESS_LEN: usize = 58;

const CHECKSUM_LEN: usize = 4;

/// An Algorand account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; PUBLIC_KEY_LEN]);

    /// Wrap a raw public key.
    pub const fn from_public_key(key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(key)
    }

    /// Wrap a public key slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let key: [u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| ValidationError::InvalidPublicKeyLength(bytes.len()))?;
        Ok(Self(key))
    }

    /// Parse and checksum-verify a textual address.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.len() != ADDRESS_LEN {
            return Err(ValidationError::InvalidAddress {
                value: s.to_string(),
                reason: format!("expected {ADDRESS_LEN} characters, got {}", s.len()),
            });
        }
        let decoded =
            BASE32_NOPAD
                .decode(s.as_bytes())
                .map_err(|e| ValidationError::InvalidAddress {
                    value: s.to_string(),
                    reason: e.to_string(),
                })?;
        if decoded.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(ValidationError::InvalidAddress {
                value: s.to_string(),
                reason: format!("decoded to {} bytes", decoded.len()),
            });
        }
        let (key, checksum) = decoded.split_at(PUBLIC_KEY_LEN);
        if checksum != checksum_of(key) {
            return Err(ValidationError::AddressChecksum(s.to_string()));
        }
        Self::from_slice(key)
    }

    /// The raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Encode to the 58-character textual form.
    pub fn encode(&self) -> String {
        let mut buf = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&checksum_of(&self.0));
        BASE32_NOPAD.encode(&buf)
    }

    /// Abbreviated form used in notifications: the first eight characters.
    pub fn short(&self) -> String {
        let mut s = self.encode();
        s.truncate(8);
        s
    }
}

fn checksum_of(key: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha512_256(key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
