//! # taskbank-cli -- Task escrow pools from the command line
//!
//! ## Subcommands
//!
//! - `pool create` / `pool address`: deploy a pool, print a pool's account.
//! - `deposit` / `withdraw`: move funds in and out of a pool as the acting
//!   account.
//! - `balances`: depositor balances and total value locked.
//! - `statements`: the acting account's deposit/withdrawal history.
//! - `watch`: refresh balances and statements until interrupted.
//!
//! Network endpoints come from `ALGO_*` / `INDEXER_*` / `KMD_*` environment
//! variables (see `AlgoNetworkConfig::from_env`). Signing goes through a
//! KMD wallet; read-only commands work without one.

pub mod context;
pub mod funds;
pub mod pool;
pub mod view;
