//! # Read-only Subcommands
//!
//! `balances`, `statements`, and `watch` all go through the dashboard so
//! that roles and totals are derived in one place. None of them needs a
//! wallet; without an account, rows are simply all `external` and
//! `statements` is unavailable.
//!
//! Read failures do not fail the command. The dashboard logs them and the
//! table shows whatever it still holds, with a note in place of the rows.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use taskbank_escrow::dashboard::{Applied, DepositorRow, StatementRow};
use taskbank_escrow::DashboardView;

use crate::context::{Context, PoolArg};

/// Arguments for `taskbank balances`.
#[derive(Args, Debug)]
pub struct BalancesArgs {
    #[command(flatten)]
    pub pool: PoolArg,
    /// Print the view as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `taskbank statements`.
#[derive(Args, Debug)]
pub struct StatementsArgs {
    #[command(flatten)]
    pub pool: PoolArg,
    /// Print the statements as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `taskbank watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub pool: PoolArg,
    /// Seconds between refreshes.
    #[arg(long, default_value_t = 10)]
    pub interval: u64,
}

/// Execute `taskbank balances`.
pub async fn run_balances(args: &BalancesArgs, ctx: &Context) -> Result<u8> {
    let dashboard = ctx.dashboard();
    dashboard.select_pool(Some(args.pool.pool_id()?));
    dashboard.set_viewer(ctx.viewer().await);

    let report = dashboard.refresh().await;
    let view = dashboard.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_depositors(&view, report.depositors));
    }
    Ok(0)
}

/// Execute `taskbank statements`.
pub async fn run_statements(args: &StatementsArgs, ctx: &Context) -> Result<u8> {
    let viewer = ctx.account().await?;
    let dashboard = ctx.dashboard();
    dashboard.select_pool(Some(args.pool.pool_id()?));
    dashboard.set_viewer(Some(viewer));
    dashboard.refresh().await;

    let view = dashboard.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view.statements)?);
    } else {
        print!("{}", render_statements(&view.statements));
    }
    Ok(0)
}

/// Execute `taskbank watch`: refresh on an interval until interrupted.
pub async fn run_watch(args: &WatchArgs, ctx: &Context) -> Result<u8> {
    if args.interval == 0 {
        bail!("--interval must be at least 1 second");
    }
    let dashboard = ctx.dashboard();
    dashboard.select_pool(Some(args.pool.pool_id()?));
    dashboard.set_viewer(ctx.viewer().await);

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = dashboard.refresh().await;
                tracing::debug!(?report, "refreshed");
                let view = dashboard.view();
                print!("{}", render_depositors(&view, report.depositors));
                if view.viewer.is_some() {
                    print!("{}", render_statements(&view.statements));
                }
                println!();
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                return Ok(0);
            }
        }
    }
}

/// Pool header, depositor table, and total value locked.
///
/// `scan` is the depositor half of the refresh that produced `view`.
pub fn render_depositors(view: &DashboardView, scan: Applied) -> String {
    let mut out = String::new();
    if let (Some(pool), Some(address)) = (view.pool, view.pool_address) {
        let _ = writeln!(out, "Pool {pool} ({address})");
    }
    let _ = writeln!(
        out,
        "Total value locked: {} ALGO",
        view.total_value_locked.to_algos_string_2dp()
    );
    if scan == Applied::Failed {
        let _ = writeln!(out, "  (depositor balances unavailable; see log)");
    } else if view.depositors.is_empty() {
        let _ = writeln!(out, "  (no depositors)");
    }
    for row in &view.depositors {
        let _ = writeln!(out, "{}", depositor_line(row));
    }
    out
}

fn depositor_line(row: &DepositorRow) -> String {
    format!(
        "  {:<58} {:>14} ALGO  {}",
        row.balance.depositor,
        row.balance.locked.to_algos_string_2dp(),
        row.role
    )
}

/// One line per statement, newest first, with explorer links.
pub fn render_statements(rows: &[StatementRow]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        let _ = writeln!(out, "  (no statements)");
    }
    for row in rows {
        let s = &row.statement;
        let when = s
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| format!("round {}", s.round.0));
        let _ = writeln!(
            out,
            "  {when}  {:<10} {:>14} ALGO  from {}... to {}...",
            s.kind,
            s.amount.to_algos_string(),
            s.sender.short(),
            s.receiver.short(),
        );
        let _ = writeln!(out, "    {}", row.explorer_url);
    }
    out
}
