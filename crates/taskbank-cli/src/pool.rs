//! # Pool Subcommand
//!
//! - `create` deploys a new, empty pool from compiled approval/clear
//!   programs and prints its id and account address.
//! - `address` prints the derived account address of an existing pool.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use taskbank_escrow::ContractArtifact;

use crate::context::{Context, PoolArg};

/// Arguments for the `taskbank pool` subcommand.
#[derive(Args, Debug)]
pub struct PoolArgs {
    #[command(subcommand)]
    pub command: PoolCommand,
}

/// Pool subcommands.
#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// Deploy a new escrow pool owned by the acting account.
    Create {
        /// Compiled approval program.
        #[arg(long, env = "TASKBANK_APPROVAL")]
        approval: PathBuf,
        /// Compiled clear-state program.
        #[arg(long, env = "TASKBANK_CLEAR")]
        clear: PathBuf,
        /// Global state integers to allocate.
        #[arg(long, default_value_t = 0)]
        global_uints: u64,
        /// Global state byte slices to allocate.
        #[arg(long, default_value_t = 0)]
        global_bytes: u64,
    },

    /// Print a pool's account address.
    Address(PoolArg),
}

/// Execute the pool subcommand.
pub async fn run_pool(args: &PoolArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        PoolCommand::Create {
            approval,
            clear,
            global_uints,
            global_bytes,
        } => {
            let artifact = ContractArtifact::from_files(approval, clear)
                .context("loading contract programs")?
                .with_global_schema(*global_uints, *global_bytes);
            let creator = ctx.account().await?;
            let pool = ctx.escrow(Some(artifact)).create_pool(creator).await?;
            println!("OK: created pool {pool}");
            println!("  Address: {}", pool.address());
            Ok(0)
        }
        PoolCommand::Address(pool) => {
            println!("{}", pool.pool_id()?.address());
            Ok(0)
        }
    }
}
