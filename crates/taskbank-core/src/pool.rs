//! # Escrow Pool Identifiers
//!
//! A pool is one deployed instance of the escrow application. Its
//! identifier is the non-zero application id assigned at creation, and its
//! funds are held by the application account whose address is derived
//! deterministically from that id.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::ValidationError;
use crate::hash::sha512_256_prefixed;

const APP_ID_PREFIX: &[u8] = b"appID";

/// Identifier of a deployed escrow pool (the application id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(NonZeroU64);

impl PoolId {
    /// Wrap an application id, rejecting zero.
    pub fn new(id: u64) -> Result<Self, ValidationError> {
        NonZeroU64::new(id)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidPoolId(id.to_string()))
    }

    /// The numeric application id.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// The pool's derived account address: `SHA-512/256("appID" || be64(id))`.
    pub fn address(self) -> Address {
        Address::from_public_key(sha512_256_prefixed(
            APP_ID_PREFIX,
            &self.get().to_be_bytes(),
        ))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PoolId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u64 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidPoolId(s.to_string()))?;
        Self::new(id)
    }
}

impl Serialize for PoolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.get())
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u64::deserialize(deserializer)?;
        PoolId::new(id).map_err(serde::de::Error::custom)
    }
}
