//! # Escrow Client
//!
//! Validating façade over an [`EscrowContract`]. Every precondition is
//! checked before the contract is touched:
//!
//! | Operation | Checks | Failure |
//! |-----------|--------|---------|
//! | `create_pool` | none | `Deployment` |
//! | `deposit` | pool id non-zero, amount > 0, memo fits | `InvalidPool`, `InvalidAmount`, `InvalidMemo`, `RemoteRejection` |
//! | `withdraw` | pool id non-zero, amount > 0, receiver checksum | `InvalidPool`, `InvalidAmount`, `InvalidReceiver`, `RemoteRejection` |
//! | `get_balances` | pool id non-zero | `InvalidPool`, `Read` |
//!
//! Writes are sent once. Authorization for `withdraw` is left to the
//! contract.

use taskbank_core::{Address, MicroAlgos, PoolId};

use crate::abi::{StringTooLong, MAX_STRING_LEN};
use crate::boxes::{scan_depositors, DepositorBalance};
use crate::contract::{EscrowContract, TxReceipt};
use crate::error::EscrowError;

/// Validating client for escrow pools.
#[derive(Debug, Clone)]
pub struct EscrowClient<C> {
    contract: C,
}

impl<C: EscrowContract> EscrowClient<C> {
    pub fn new(contract: C) -> Self {
        Self { contract }
    }

    /// The underlying contract.
    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Deploy a new, empty pool.
    pub async fn create_pool(&self, creator: Address) -> Result<PoolId, EscrowError> {
        let (pool, receipt) = self
            .contract
            .create(creator)
            .await
            .map_err(|e| EscrowError::Deployment(e.remote_message()))?;
        tracing::info!(%pool, tx_id = %receipt.tx_id, creator = %creator.short(), "pool created");
        Ok(pool)
    }

    /// Lock `amount` from `depositor` in the pool.
    pub async fn deposit(
        &self,
        pool_id: u64,
        depositor: Address,
        amount: MicroAlgos,
        memo: &str,
    ) -> Result<TxReceipt, EscrowError> {
        let pool = validate_pool(pool_id)?;
        validate_amount(amount)?;
        validate_memo(memo)?;

        let receipt = self
            .contract
            .deposit(pool, depositor, amount, memo)
            .await
            .map_err(|e| EscrowError::RemoteRejection {
                message: e.remote_message(),
            })?;
        tracing::info!(
            %pool,
            tx_id = %receipt.tx_id,
            depositor = %depositor.short(),
            amount = %amount,
            memo,
            "deposit confirmed"
        );
        Ok(receipt)
    }

    /// Release `amount` of `caller`'s locked balance to `receiver`.
    ///
    /// `receiver` is the textual address as entered; it is checksum-verified
    /// before anything is sent.
    pub async fn withdraw(
        &self,
        pool_id: u64,
        caller: Address,
        amount: MicroAlgos,
        receiver: &str,
    ) -> Result<TxReceipt, EscrowError> {
        let pool = validate_pool(pool_id)?;
        validate_amount(amount)?;
        let receiver =
            Address::parse(receiver).map_err(|e| EscrowError::InvalidReceiver(e.to_string()))?;

        let receipt = self
            .contract
            .withdraw(pool, caller, amount, receiver)
            .await
            .map_err(|e| EscrowError::RemoteRejection {
                message: e.remote_message(),
            })?;
        tracing::info!(
            %pool,
            tx_id = %receipt.tx_id,
            caller = %caller.short(),
            receiver = %receiver.short(),
            amount = %amount,
            "withdrawal confirmed"
        );
        Ok(receipt)
    }

    /// Every depositor's locked balance. Empty for a fresh pool.
    pub async fn get_balances(&self, pool_id: u64) -> Result<Vec<DepositorBalance>, EscrowError> {
        let pool = validate_pool(pool_id)?;
        scan_depositors(&self.contract, pool).await
    }
}

/// Parse a display-unit amount ("150", "0.5") into microAlgos.
pub fn parse_amount(input: &str) -> Result<MicroAlgos, EscrowError> {
    let amount = MicroAlgos::from_algos_str(input)
        .map_err(|e| EscrowError::InvalidAmount(e.to_string()))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_pool(pool_id: u64) -> Result<PoolId, EscrowError> {
    PoolId::new(pool_id).map_err(|e| EscrowError::InvalidPool(e.to_string()))
}

fn validate_amount(amount: MicroAlgos) -> Result<(), EscrowError> {
    if amount.is_zero() {
        return Err(EscrowError::InvalidAmount("amount must be positive".into()));
    }
    Ok(())
}

fn validate_memo(memo: &str) -> Result<(), EscrowError> {
    if memo.len() > MAX_STRING_LEN {
        return Err(EscrowError::InvalidMemo(StringTooLong { len: memo.len() }));
    }
    Ok(())
}
