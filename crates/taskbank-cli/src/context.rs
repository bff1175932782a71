//! Shared setup for every subcommand: network client, signer, acting
//! account, and the escrow/dashboard wiring over them.

use anyhow::{Context as _, Result};
use clap::Args;
use taskbank_algo_client::kmd::KmdClient;
use taskbank_algo_client::txn::Transaction;
use taskbank_algo_client::{AlgoClient, AlgoNetworkConfig, Network};
use taskbank_core::{Address, PoolId};
use taskbank_escrow::{
    AlgodEscrowContract, ContractArtifact, Dashboard, EscrowClient, LedgerReconciler,
    SignerError, WalletSigner,
};

/// The public TestNet pool used when none is given.
pub const DEFAULT_POOL_ID: u64 = 748154508;

/// Pool selection shared by pool-scoped subcommands.
#[derive(Args, Debug, Clone)]
pub struct PoolArg {
    /// Escrow pool (application id).
    #[arg(long, env = "TASKBANK_POOL", default_value_t = DEFAULT_POOL_ID)]
    pub pool: u64,
}

impl PoolArg {
    pub fn pool_id(&self) -> Result<PoolId> {
        PoolId::new(self.pool).with_context(|| format!("invalid pool id {}", self.pool))
    }
}

/// Signer that is absent when no wallet provider is configured.
#[derive(Debug, Clone)]
pub struct CliSigner(Option<KmdClient>);

impl WalletSigner for CliSigner {
    async fn sign(&self, txns: &[Transaction]) -> Result<Vec<Vec<u8>>, SignerError> {
        match &self.0 {
            Some(kmd) => kmd.sign(txns).await,
            None => Err(SignerError::NoWallet),
        }
    }
}

/// Contract used by the CLI.
pub type CliContract = AlgodEscrowContract<CliSigner>;

/// Resolved runtime context.
#[derive(Debug)]
pub struct Context {
    pub client: AlgoClient,
    pub network: Network,
    account: Option<Address>,
}

impl Context {
    /// Load configuration from the environment, optionally forcing a network.
    pub fn load(network: Option<Network>, account: Option<&str>) -> Result<Self> {
        let config = match network {
            Some(network) => AlgoNetworkConfig::from_env_for(network),
            None => AlgoNetworkConfig::from_env(),
        }
        .context("loading network configuration")?;
        tracing::debug!(?config, "network configuration");

        let account = account
            .map(|a| Address::parse(a).with_context(|| format!("invalid --account {a}")))
            .transpose()?;

        let network = config.network;
        let client = AlgoClient::new(config).context("building network client")?;
        Ok(Self {
            client,
            network,
            account,
        })
    }

    /// The acting account: `--account`, else the wallet's first key.
    pub async fn account(&self) -> Result<Address> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        let kmd = self
            .client
            .kmd()
            .context("no --account given and no wallet provider configured (set KMD_SERVER)")?;
        let keys = kmd
            .list_addresses()
            .await
            .context("listing wallet accounts")?;
        keys.first()
            .copied()
            .with_context(|| format!("wallet {} holds no accounts", kmd.wallet_name()))
    }

    /// The acting account if one can be resolved, without failing.
    pub async fn viewer(&self) -> Option<Address> {
        match self.account().await {
            Ok(account) => Some(account),
            Err(e) => {
                tracing::debug!("no viewing account: {e:#}");
                None
            }
        }
    }

    /// Contract over algod, signed by the configured wallet if any.
    pub fn contract(&self, artifact: Option<ContractArtifact>) -> CliContract {
        let signer = CliSigner(self.client.kmd().cloned());
        let contract = AlgodEscrowContract::new(self.client.clone(), signer);
        match artifact {
            Some(artifact) => contract.with_artifact(artifact),
            None => contract,
        }
    }

    pub fn escrow(&self, artifact: Option<ContractArtifact>) -> EscrowClient<CliContract> {
        EscrowClient::new(self.contract(artifact))
    }

    pub fn dashboard(&self) -> Dashboard<CliContract, taskbank_algo_client::indexer::IndexerClient> {
        Dashboard::new(
            self.escrow(None),
            LedgerReconciler::new(self.client.indexer().clone()),
            self.network,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_account_is_rejected_up_front() {
        let err = Context::load(Some(Network::TestNet), Some("not-an-address")).unwrap_err();
        assert!(format!("{err:#}").contains("invalid --account"));
    }

    #[test]
    fn zero_pool_is_rejected() {
        let arg = PoolArg { pool: 0 };
        assert!(arg.pool_id().is_err());
    }
}
