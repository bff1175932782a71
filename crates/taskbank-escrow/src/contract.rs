//! # Escrow Contract Seam
//!
//! [`EscrowContract`] is everything the escrow needs from the deployed
//! contract: bare create, the two ABI methods, and the box store. The
//! Escrow Client, the box scan, and the dashboard are generic over it, so
//! tests can run against an in-memory ledger.
//!
//! [`AlgodEscrowContract`] is the network implementation. It assembles
//! transactions, hands them to a [`WalletSigner`], submits the signed group
//! to algod once, and waits for confirmation.
//!
//! ## Call shapes
//!
//! | Operation | Group |
//! |-----------|-------|
//! | create | app call, `app_id = 0`, approval/clear programs |
//! | deposit | payment depositor → pool address, then `deposit(memo, pay)` with a box ref to the depositor |
//! | withdraw | `withdraw(amount, receiver)` with a box ref to the caller, receiver in accounts, +2000 µAlgo fee |

use std::future::Future;

use taskbank_algo_client::algod::DEFAULT_CONFIRMATION_ROUNDS;
use taskbank_algo_client::txn::{
    assign_group_id, ApplicationCall, BoxReference, Transaction,
};
use taskbank_algo_client::AlgoClient;
use taskbank_core::{Address, MicroAlgos, PoolId, Round};

use crate::abi;
use crate::artifact::ContractArtifact;
use crate::error::ContractError;
use crate::signer::WalletSigner;

/// Extra fee on `withdraw` covering the contract's inner payment.
pub const WITHDRAW_EXTRA_FEE: MicroAlgos = MicroAlgos(2_000);

/// A confirmed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Id of the application call in the submitted group.
    pub tx_id: String,
    pub confirmed_round: Round,
    pub logs: Vec<Vec<u8>>,
}

/// Operations exposed by a deployed escrow contract.
pub trait EscrowContract: Send + Sync {
    /// Deploy a new, empty pool owned by `creator`.
    fn create(
        &self,
        creator: Address,
    ) -> impl Future<Output = Result<(PoolId, TxReceipt), ContractError>> + Send;

    /// Lock `amount` from `depositor` in `pool`, tagged with `memo`.
    fn deposit(
        &self,
        pool: PoolId,
        depositor: Address,
        amount: MicroAlgos,
        memo: &str,
    ) -> impl Future<Output = Result<TxReceipt, ContractError>> + Send;

    /// Release `amount` of `caller`'s locked balance to `receiver`.
    fn withdraw(
        &self,
        pool: PoolId,
        caller: Address,
        amount: MicroAlgos,
        receiver: Address,
    ) -> impl Future<Output = Result<TxReceipt, ContractError>> + Send;

    /// Names of every box in the pool's store.
    fn box_names(
        &self,
        pool: PoolId,
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, ContractError>> + Send;

    /// Value of one box, `None` if it no longer exists.
    fn box_value(
        &self,
        pool: PoolId,
        name: &[u8],
    ) -> impl Future<Output = Result<Option<Vec<u8>>, ContractError>> + Send;
}

/// Escrow contract reached through algod, signed by a wallet provider.
#[derive(Debug, Clone)]
pub struct AlgodEscrowContract<S> {
    client: AlgoClient,
    signer: S,
    artifact: Option<ContractArtifact>,
    confirmation_rounds: u64,
}

impl<S: WalletSigner> AlgodEscrowContract<S> {
    /// Contract calls against existing pools. `create` needs
    /// [`with_artifact`](Self::with_artifact).
    pub fn new(client: AlgoClient, signer: S) -> Self {
        Self {
            client,
            signer,
            artifact: None,
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
        }
    }

    /// Programs used by `create`.
    pub fn with_artifact(mut self, artifact: ContractArtifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    /// Rounds to wait for confirmation before reporting failure.
    pub fn with_confirmation_rounds(mut self, rounds: u64) -> Self {
        self.confirmation_rounds = rounds;
        self
    }

    /// Group, sign, submit once, and wait for the last transaction.
    async fn send_group(&self, mut txns: Vec<Transaction>) -> Result<TxReceipt, ContractError> {
        if txns.len() > 1 {
            assign_group_id(&mut txns).map_err(taskbank_algo_client::AlgoApiError::from)?;
        }
        let tx_id = match txns.last() {
            Some(last) => last
                .id()
                .map_err(taskbank_algo_client::AlgoApiError::from)?
                .encode(),
            None => return Err(ContractError::Rejected("empty transaction group".into())),
        };

        let signed = self.signer.sign(&txns).await?;
        self.client.algod().submit_group(&signed).await?;
        tracing::debug!(%tx_id, txns = txns.len(), "group submitted");

        let pending = self
            .client
            .algod()
            .wait_for_confirmation(&tx_id, self.confirmation_rounds)
            .await?;
        let confirmed_round = pending.confirmed_round.unwrap_or_default();

        Ok(TxReceipt {
            tx_id,
            confirmed_round,
            logs: pending.logs,
        })
    }

    async fn send_create(&self, creator: Address) -> Result<(PoolId, TxReceipt), ContractError> {
        let artifact = self.artifact.as_ref().ok_or(ContractError::NoArtifact)?;
        let params = self.client.algod().suggested_params().await?;
        let call = Transaction::application_call(
            &params,
            creator,
            ApplicationCall {
                app_id: 0,
                approval_program: artifact.approval_program.clone(),
                clear_program: artifact.clear_program.clone(),
                global_schema: artifact.global_schema,
                local_schema: artifact.local_schema,
                extra_pages: artifact.extra_pages,
                ..ApplicationCall::default()
            },
        );
        let tx_id = call
            .id()
            .map_err(taskbank_algo_client::AlgoApiError::from)?
            .encode();

        let signed = self.signer.sign(std::slice::from_ref(&call)).await?;
        self.client.algod().submit_group(&signed).await?;
        let pending = self
            .client
            .algod()
            .wait_for_confirmation(&tx_id, self.confirmation_rounds)
            .await?;

        let app_id = pending
            .application_index
            .ok_or_else(|| ContractError::MissingApplicationId {
                tx_id: tx_id.clone(),
            })?;
        let pool = PoolId::new(app_id).map_err(|_| ContractError::MissingApplicationId {
            tx_id: tx_id.clone(),
        })?;

        Ok((
            pool,
            TxReceipt {
                tx_id,
                confirmed_round: pending.confirmed_round.unwrap_or_default(),
                logs: pending.logs,
            },
        ))
    }
}

impl<S: WalletSigner> EscrowContract for AlgodEscrowContract<S> {
    async fn create(&self, creator: Address) -> Result<(PoolId, TxReceipt), ContractError> {
        self.send_create(creator).await
    }

    async fn deposit(
        &self,
        pool: PoolId,
        depositor: Address,
        amount: MicroAlgos,
        memo: &str,
    ) -> Result<TxReceipt, ContractError> {
        let args = abi::deposit_args(memo)?;
        let params = self.client.algod().suggested_params().await?;
        let pay = Transaction::payment(&params, depositor, pool.address(), amount);
        let call = Transaction::application_call(
            &params,
            depositor,
            ApplicationCall {
                app_id: pool.get(),
                args,
                boxes: vec![BoxReference {
                    app_index: 0,
                    name: depositor.as_bytes().to_vec(),
                }],
                ..ApplicationCall::default()
            },
        );
        self.send_group(vec![pay, call]).await
    }

    async fn withdraw(
        &self,
        pool: PoolId,
        caller: Address,
        amount: MicroAlgos,
        receiver: Address,
    ) -> Result<TxReceipt, ContractError> {
        let params = self.client.algod().suggested_params().await?;
        let call = Transaction::application_call(
            &params,
            caller,
            ApplicationCall {
                app_id: pool.get(),
                args: abi::withdraw_args(amount, &receiver),
                accounts: vec![receiver],
                boxes: vec![BoxReference {
                    app_index: 0,
                    name: caller.as_bytes().to_vec(),
                }],
                ..ApplicationCall::default()
            },
        )
        .with_extra_fee(WITHDRAW_EXTRA_FEE);
        self.send_group(vec![call]).await
    }

    async fn box_names(&self, pool: PoolId) -> Result<Vec<Vec<u8>>, ContractError> {
        Ok(self.client.algod().application_boxes(pool).await?)
    }

    async fn box_value(&self, pool: PoolId, name: &[u8]) -> Result<Option<Vec<u8>>, ContractError> {
        let value = self.client.algod().application_box(pool, name).await?;
        Ok(value.map(|b| b.value))
    }
}
