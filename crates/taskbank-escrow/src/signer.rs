//! Wallet signing seam.
//!
//! The escrow never holds private keys. Transactions are assembled here and
//! handed to a [`WalletSigner`], which returns their signed encodings. The
//! shipped signer is a KMD wallet.

use std::future::Future;

use taskbank_algo_client::kmd::KmdClient;
use taskbank_algo_client::txn::Transaction;
use taskbank_algo_client::AlgoApiError;

/// Signing failures.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// No wallet provider is configured.
    #[error("no wallet provider configured")]
    NoWallet,

    /// The wallet provider returned an error.
    #[error("wallet: {0}")]
    Wallet(#[from] AlgoApiError),

    /// The wallet returned a different number of signatures than requested.
    #[error("wallet signed {got} of {expected} transactions")]
    CountMismatch { expected: usize, got: usize },
}

/// Signs transactions on behalf of their senders.
pub trait WalletSigner: Send + Sync {
    /// Sign every transaction, returning signed encodings in input order.
    fn sign(
        &self,
        txns: &[Transaction],
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, SignerError>> + Send;
}

impl WalletSigner for KmdClient {
    async fn sign(&self, txns: &[Transaction]) -> Result<Vec<Vec<u8>>, SignerError> {
        let signed = self.sign_transactions(txns).await?;
        if signed.len() != txns.len() {
            return Err(SignerError::CountMismatch {
                expected: txns.len(),
                got: signed.len(),
            });
        }
        Ok(signed)
    }
}

impl<T: WalletSigner> WalletSigner for std::sync::Arc<T> {
    fn sign(
        &self,
        txns: &[Transaction],
    ) -> impl Future<Output = Result<Vec<Vec<u8>>, SignerError>> + Send {
        (**self).sign(txns)
    }
}
