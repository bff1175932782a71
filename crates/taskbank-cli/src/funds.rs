//! # Deposit and Withdraw Subcommands
//!
//! Both act as the resolved account, wait for confirmation, and print the
//! transaction's explorer link. Amounts are given in ALGO.

use anyhow::Result;
use clap::Args;
use taskbank_escrow::parse_amount;

use crate::context::{Context, PoolArg};

/// Arguments for `taskbank deposit`.
#[derive(Args, Debug)]
pub struct DepositArgs {
    #[command(flatten)]
    pub pool: PoolArg,
    /// Amount in ALGO, e.g. `150` or `0.5`.
    #[arg(long)]
    pub amount: String,
    /// Task reference recorded with the deposit.
    #[arg(long, default_value = "")]
    pub memo: String,
}

/// Arguments for `taskbank withdraw`.
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    #[command(flatten)]
    pub pool: PoolArg,
    /// Amount in ALGO.
    #[arg(long)]
    pub amount: String,
    /// Address that receives the released funds.
    #[arg(long)]
    pub receiver: String,
}

/// Execute `taskbank deposit`.
pub async fn run_deposit(args: &DepositArgs, ctx: &Context) -> Result<u8> {
    let amount = parse_amount(&args.amount)?;
    let depositor = ctx.account().await?;
    let receipt = ctx
        .escrow(None)
        .deposit(args.pool.pool, depositor, amount, &args.memo)
        .await?;
    println!(
        "OK: locked {} ALGO in pool {} (round {})",
        amount.to_algos_string(),
        args.pool.pool,
        receipt.confirmed_round
    );
    println!("  {}", ctx.network.explorer_tx_url(&receipt.tx_id));
    Ok(0)
}

/// Execute `taskbank withdraw`.
pub async fn run_withdraw(args: &WithdrawArgs, ctx: &Context) -> Result<u8> {
    let amount = parse_amount(&args.amount)?;
    let caller = ctx.account().await?;
    let receipt = ctx
        .escrow(None)
        .withdraw(args.pool.pool, caller, amount, &args.receiver)
        .await?;
    let receiver: String = args.receiver.trim().chars().take(8).collect();
    println!(
        "OK: released {} ALGO to {receiver}... (round {})",
        amount.to_algos_string(),
        receipt.confirmed_round
    );
    println!("  {}", ctx.network.explorer_tx_url(&receipt.tx_id));
    Ok(0)
}
