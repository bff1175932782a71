//! # taskbank-escrow -- Task escrow pools on Algorand
//!
//! A pool is one deployed escrow application. Depositors lock funds for a
//! task with a memo; the funds are tracked per depositor in the pool's box
//! store and released with `withdraw`.
//!
//! ## Components
//!
//! - [`EscrowClient`]: validating façade for create, deposit, withdraw,
//!   and balance reads.
//! - [`EscrowContract`]: the contract seam, with [`AlgodEscrowContract`]
//!   as the network implementation and [`WalletSigner`] for signing.
//! - [`boxes`]: depositor box scan.
//! - [`LedgerReconciler`]: merges application calls and pool payments into
//!   typed deposit/withdrawal statements.
//! - [`Dashboard`]: selection, concurrent refresh with supersession, and
//!   derived view values.
//!
//! Collaborators are passed in explicitly. Nothing here holds keys or
//! global state.

pub mod abi;
pub mod artifact;
pub mod boxes;
pub mod client;
pub mod contract;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod signer;

pub use artifact::ContractArtifact;
pub use boxes::DepositorBalance;
pub use client::{parse_amount, EscrowClient};
pub use contract::{AlgodEscrowContract, EscrowContract, TxReceipt};
pub use dashboard::{Dashboard, DashboardView, Role};
pub use error::{BoxDecodeError, ContractError, EscrowError};
pub use ledger::{LedgerReconciler, Statement, StatementKind, TransactionSearch};
pub use signer::{SignerError, WalletSigner};
