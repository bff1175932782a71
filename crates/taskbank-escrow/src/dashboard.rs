//! # Dashboard
//!
//! Holds the selected pool and viewing account, refreshes statements and
//! depositor balances, and derives what a pool view shows: total value
//! locked, per-row roles, and explorer links.
//!
//! ## Supersession
//!
//! Every selection change bumps a generation counter. A refresh records the
//! generation it was issued for; its statement and depositor results are
//! each applied only if that generation is still current when they arrive.
//! A refresh overtaken by a selection change therefore never overwrites the
//! newer view.

use std::fmt;

use parking_lot::RwLock;
use serde::Serialize;
use taskbank_algo_client::Network;
use taskbank_core::{Address, MicroAlgos, PoolId};

use crate::boxes::{scan_depositors, DepositorBalance};
use crate::client::EscrowClient;
use crate::contract::{EscrowContract, TxReceipt};
use crate::error::EscrowError;
use crate::ledger::{LedgerReconciler, Statement, TransactionSearch};

/// Whose row this is, relative to the viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "self")]
    Own,
    External,
}

impl Role {
    fn of(address: Address, viewer: Option<Address>) -> Self {
        if viewer == Some(address) {
            Self::Own
        } else {
            Self::External
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Own => "self",
            Self::External => "external",
        })
    }
}

/// A statement with its display annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRow {
    #[serde(flatten)]
    pub statement: Statement,
    pub sender_role: Role,
    pub explorer_url: String,
}

/// A depositor balance with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositorRow {
    #[serde(flatten)]
    pub balance: DepositorBalance,
    pub role: Role,
}

/// Snapshot of what the dashboard currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub pool: Option<PoolId>,
    pub pool_address: Option<Address>,
    pub viewer: Option<Address>,
    pub statements: Vec<StatementRow>,
    /// Largest balance first.
    pub depositors: Vec<DepositorRow>,
    pub total_value_locked: MicroAlgos,
}

/// What happened to one half of a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Result stored.
    Applied,
    /// Selection changed while the read was in flight; result dropped.
    Superseded,
    /// Nothing to read for the current selection.
    Skipped,
    /// Read failed; previous data kept.
    Failed,
}

/// Outcome of [`Dashboard::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub statements: Applied,
    pub depositors: Applied,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    pool: Option<PoolId>,
    viewer: Option<Address>,
    statements: Vec<Statement>,
    depositors: Vec<DepositorBalance>,
}

/// Pool dashboard over an escrow contract and a transaction search.
#[derive(Debug)]
pub struct Dashboard<C, S> {
    escrow: EscrowClient<C>,
    ledger: LedgerReconciler<S>,
    network: Network,
    state: RwLock<State>,
}

impl<C: EscrowContract, S: TransactionSearch> Dashboard<C, S> {
    pub fn new(escrow: EscrowClient<C>, ledger: LedgerReconciler<S>, network: Network) -> Self {
        Self {
            escrow,
            ledger,
            network,
            state: RwLock::new(State::default()),
        }
    }

    /// The escrow client used for writes.
    pub fn escrow(&self) -> &EscrowClient<C> {
        &self.escrow
    }

    /// Select a pool, discarding data and in-flight reads for the old one.
    pub fn select_pool(&self, pool: Option<PoolId>) {
        let mut state = self.state.write();
        state.generation += 1;
        state.pool = pool;
        state.statements.clear();
        state.depositors.clear();
    }

    /// Set the viewing account, discarding data and in-flight reads.
    pub fn set_viewer(&self, viewer: Option<Address>) {
        let mut state = self.state.write();
        state.generation += 1;
        state.viewer = viewer;
        state.statements.clear();
        state.depositors.clear();
    }

    /// Currently selected pool.
    pub fn pool(&self) -> Option<PoolId> {
        self.state.read().pool
    }

    /// Current viewing account.
    pub fn viewer(&self) -> Option<Address> {
        self.state.read().viewer
    }

    /// Re-read statements and depositors concurrently.
    pub async fn refresh(&self) -> RefreshReport {
        let (generation, pool, viewer) = {
            let state = self.state.read();
            (state.generation, state.pool, state.viewer)
        };

        let Some(pool) = pool else {
            return RefreshReport {
                statements: Applied::Skipped,
                depositors: Applied::Skipped,
            };
        };

        let statements = async {
            let Some(viewer) = viewer else {
                return Applied::Skipped;
            };
            let statements = self.ledger.statements(pool, viewer).await;
            self.apply(generation, |state| state.statements = statements)
        };

        let depositors = async {
            match scan_depositors(self.escrow.contract(), pool).await {
                Ok(depositors) => self.apply(generation, |state| state.depositors = depositors),
                Err(e) => {
                    tracing::warn!(%pool, "depositor scan failed: {e}");
                    Applied::Failed
                }
            }
        };

        let (statements, depositors) = tokio::join!(statements, depositors);
        if statements == Applied::Superseded || depositors == Applied::Superseded {
            tracing::debug!(%pool, generation, "refresh superseded");
        }
        RefreshReport {
            statements,
            depositors,
        }
    }

    fn apply(&self, generation: u64, update: impl FnOnce(&mut State)) -> Applied {
        let mut state = self.state.write();
        if state.generation != generation {
            return Applied::Superseded;
        }
        update(&mut state);
        Applied::Applied
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> DashboardView {
        let state = self.state.read();
        let viewer = state.viewer;

        let statements = state
            .statements
            .iter()
            .map(|s| StatementRow {
                sender_role: Role::of(s.sender, viewer),
                explorer_url: self.network.explorer_tx_url(&s.id),
                statement: s.clone(),
            })
            .collect();

        let mut depositors: Vec<DepositorRow> = state
            .depositors
            .iter()
            .map(|b| DepositorRow {
                balance: *b,
                role: Role::of(b.depositor, viewer),
            })
            .collect();
        depositors.sort_by(|a, b| {
            b.balance
                .locked
                .cmp(&a.balance.locked)
                .then_with(|| a.balance.depositor.cmp(&b.balance.depositor))
        });

        DashboardView {
            pool: state.pool,
            pool_address: state.pool.map(PoolId::address),
            viewer,
            statements,
            total_value_locked: state.depositors.iter().map(|d| d.locked).sum(),
            depositors,
        }
    }

    /// Create a pool owned by the viewer, select it, and refresh.
    pub async fn create_pool(&self) -> Result<PoolId, EscrowError> {
        let viewer = self.viewer().ok_or(EscrowError::NoAccount)?;
        let pool = self.escrow.create_pool(viewer).await?;
        self.select_pool(Some(pool));
        self.refresh().await;
        Ok(pool)
    }

    /// Deposit from the viewer into the selected pool, then refresh.
    pub async fn deposit(&self, amount: MicroAlgos, memo: &str) -> Result<TxReceipt, EscrowError> {
        let (pool, viewer) = self.write_target()?;
        let receipt = self.escrow.deposit(pool, viewer, amount, memo).await?;
        self.refresh().await;
        Ok(receipt)
    }

    /// Withdraw from the viewer's balance in the selected pool, then refresh.
    pub async fn withdraw(
        &self,
        amount: MicroAlgos,
        receiver: &str,
    ) -> Result<TxReceipt, EscrowError> {
        let (pool, viewer) = self.write_target()?;
        let receipt = self.escrow.withdraw(pool, viewer, amount, receiver).await?;
        self.refresh().await;
        Ok(receipt)
    }

    fn write_target(&self) -> Result<(u64, Address), EscrowError> {
        let state = self.state.read();
        let viewer = state.viewer.ok_or(EscrowError::NoAccount)?;
        let pool = state.pool.map(PoolId::get).unwrap_or(0);
        Ok((pool, viewer))
    }
}
