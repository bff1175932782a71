//! # SHA-512/256 Domain Hashing
//!
//! Every identifier derived on the Algorand network is a SHA-512/256 digest
//! of a short ASCII prefix followed by the payload:
//!
//! | Prefix  | Payload | Result |
//! |---------|---------|--------|
//! | `appID` | big-endian u64 application id | application account public key |
//! | `TX`    | canonical msgpack transaction | transaction id |
//! | `TG`    | canonical msgpack `{txlist}` | group id |
//! | (none)  | public key | address checksum (last 4 bytes) |
//! | (none)  | ABI method signature | method selector (first 4 bytes) |

use sha2::{Digest, Sha512_256};

/// Compute SHA-512/256 over `data`.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-512/256 over `prefix || data` without concatenating first.
pub fn sha512_256_prefixed(prefix: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(prefix);
    hasher.update(data);
    hasher.finalize().into()
}
