//! # taskbank-algo-client -- Typed Rust client for Algorand services
//!
//! Provides typed access to the three services a task-escrow client talks to:
//! - **algod** for suggested parameters, group submission, confirmation
//!   polling, and application box reads
//! - **indexer** for paginated transaction search with a strict record schema
//! - **KMD** as the wallet provider that signs transactions
//!
//! Plus canonical msgpack transaction encoding ([`txn`]) so that groups can
//! be assembled, hashed, and handed to the wallet for signing.
//!
//! ## Headers
//!
//! Each service authenticates with its own header: `X-Algo-API-Token`,
//! `X-Indexer-API-Token`, `X-KMD-API-Token`. Public endpoints take an
//! empty token, in which case no header is sent.

pub mod algod;
pub mod config;
pub mod error;
pub(crate) mod http;
pub mod indexer;
pub mod kmd;
pub mod records;
pub mod txn;

pub use config::{AlgoNetworkConfig, KmdConfig, Network};
pub use error::AlgoApiError;

/// Top-level Algorand client. Holds one sub-client per service.
#[derive(Debug, Clone)]
pub struct AlgoClient {
    network: Network,
    algod: algod::AlgodClient,
    indexer: indexer::IndexerClient,
    kmd: Option<kmd::KmdClient>,
}

impl AlgoClient {
    /// Create a client from configuration.
    pub fn new(config: AlgoNetworkConfig) -> Result<Self, AlgoApiError> {
        let timeout = config.timeout_secs;
        let algod_http = http::build_http("x-algo-api-token", &config.algod_token, timeout)?;
        let indexer_http =
            http::build_http("x-indexer-api-token", &config.indexer_token, timeout)?;

        let kmd = match config.kmd {
            Some(kmd) => {
                let kmd_http = http::build_http("x-kmd-api-token", &kmd.token, timeout)?;
                Some(kmd::KmdClient::new(
                    kmd_http,
                    kmd.url,
                    kmd.wallet_name,
                    kmd.wallet_password,
                ))
            }
            None => None,
        };

        Ok(Self {
            network: config.network,
            algod: algod::AlgodClient::new(algod_http, config.algod_url),
            indexer: indexer::IndexerClient::new(indexer_http, config.indexer_url),
            kmd,
        })
    }

    /// Network the endpoints belong to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Access the algod client.
    pub fn algod(&self) -> &algod::AlgodClient {
        &self.algod
    }

    /// Access the indexer client.
    pub fn indexer(&self) -> &indexer::IndexerClient {
        &self.indexer
    }

    /// Access the KMD client, if a wallet provider is configured.
    pub fn kmd(&self) -> Option<&kmd::KmdClient> {
        self.kmd.as_ref()
    }
}
