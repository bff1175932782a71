//! # taskbank CLI entry point
//!
//! Parses command-line arguments, initializes logging, resolves the
//! network context, and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use taskbank_algo_client::Network;
use tracing_subscriber::EnvFilter;

use taskbank_cli::context::Context;
use taskbank_cli::funds::{run_deposit, run_withdraw, DepositArgs, WithdrawArgs};
use taskbank_cli::pool::{run_pool, PoolArgs};
use taskbank_cli::view::{
    run_balances, run_statements, run_watch, BalancesArgs, StatementsArgs, WatchArgs,
};

/// Task escrow pools on Algorand.
///
/// Lock funds against a task reference, release them to a receiver, and
/// inspect a pool's depositors and history.
#[derive(Parser, Debug)]
#[command(name = "taskbank", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Network to talk to (mainnet, testnet, localnet).
    #[arg(long, env = "ALGO_NETWORK", global = true)]
    network: Option<Network>,

    /// Acting account. Defaults to the wallet's first key.
    #[arg(long, env = "TASKBANK_ACCOUNT", global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy a pool or print a pool's account address.
    Pool(PoolArgs),

    /// Lock funds in a pool with a task memo.
    Deposit(DepositArgs),

    /// Release funds from a pool to a receiver.
    Withdraw(WithdrawArgs),

    /// List depositor balances and total value locked.
    Balances(BalancesArgs),

    /// Show the acting account's deposits and withdrawals.
    Statements(StatementsArgs),

    /// Refresh balances and statements on an interval.
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let ctx = match Context::load(cli.network, cli.account.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(network = %ctx.network, "taskbank starting");

    let result = match &cli.command {
        Commands::Pool(args) => run_pool(args, &ctx).await,
        Commands::Deposit(args) => run_deposit(args, &ctx).await,
        Commands::Withdraw(args) => run_withdraw(args, &ctx).await,
        Commands::Balances(args) => run_balances(args, &ctx).await,
        Commands::Statements(args) => run_statements(args, &ctx).await,
        Commands::Watch(args) => run_watch(args, &ctx).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
