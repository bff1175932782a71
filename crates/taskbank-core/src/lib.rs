#![deny(missing_docs)]

//! # taskbank-core -- Foundational Types for the Task Escrow Stack
//!
//! This crate defines the domain primitives every other crate in the
//! workspace depends on. It has no internal crate dependencies. Only
//! `serde`, `thiserror`, `sha2`, and `data-encoding` from the ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`Address`] is not a
//!    string and a [`PoolId`] is not a bare integer. Both validate at
//!    construction time.
//!
//! 2. **Integer amounts end-to-end.** [`MicroAlgos`] is the only amount type.
//!    Display units are produced by exact decimal formatting, never by
//!    floating-point division.
//!
//! 3. **One hash.** All derived identifiers (addresses, transaction ids,
//!    group ids, ABI selectors) flow through [`sha512_256`] with an
//!    explicit domain-separation prefix.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod pool;
pub mod round;

// Re-export primary types at crate root for ergonomic imports.
pub use address::{Address, ADDRESS_LEN, PUBLIC_KEY_LEN};
pub use amount::{MicroAlgos, MICROALGOS_PER_ALGO};
pub use error::ValidationError;
pub use hash::{sha512_256, sha512_256_prefixed};
pub use pool::PoolId;
pub use round::Round;
