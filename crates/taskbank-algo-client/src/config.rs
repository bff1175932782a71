//! Network client configuration.
//!
//! Configures base URLs and API tokens for the node (algod), the indexer,
//! and optionally a key management daemon (KMD). Defaults point to the
//! public TestNet endpoints. Override via environment variables or explicit
//! construction for LocalNet/testing.

use std::fmt;
use std::str::FromStr;

use url::Url;
use zeroize::Zeroizing;

/// Token used by every service of a default LocalNet sandbox.
pub const LOCALNET_TOKEN: &str =
    "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Wallet that LocalNet pre-funds with its genesis accounts.
pub const LOCALNET_WALLET: &str = "unencrypted-default-wallet";

/// Which Algorand network the endpoints belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    MainNet,
    TestNet,
    LocalNet,
}

impl Network {
    /// Lower-case network name used in explorer URLs and env vars.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainNet => "mainnet",
            Self::TestNet => "testnet",
            Self::LocalNet => "localnet",
        }
    }

    /// Explorer link for a transaction id.
    pub fn explorer_tx_url(self, tx_id: &str) -> String {
        format!("https://lora.algokit.io/{}/transaction/{tx_id}", self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::MainNet),
            "testnet" => Ok(Self::TestNet),
            "localnet" | "sandbox" => Ok(Self::LocalNet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Connection settings for a key management daemon acting as wallet provider.
///
/// Custom `Debug` redacts the token and the wallet password.
#[derive(Clone)]
pub struct KmdConfig {
    /// Base URL of the KMD REST API.
    pub url: Url,
    /// `X-KMD-API-Token` value.
    pub token: Zeroizing<String>,
    /// Name of the wallet whose keys sign transactions.
    pub wallet_name: String,
    /// Password unlocking that wallet.
    pub wallet_password: Zeroizing<String>,
}

impl fmt::Debug for KmdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmdConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("wallet_name", &self.wallet_name)
            .field("wallet_password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for connecting to an Algorand network.
///
/// Custom `Debug` implementation redacts the API tokens to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct AlgoNetworkConfig {
    /// Network the endpoints belong to.
    pub network: Network,
    /// Base URL for algod.
    pub algod_url: Url,
    /// `X-Algo-API-Token` value (empty for public endpoints).
    pub algod_token: Zeroizing<String>,
    /// Base URL for the indexer.
    pub indexer_url: Url,
    /// `X-Indexer-API-Token` value (empty for public endpoints).
    pub indexer_token: Zeroizing<String>,
    /// Optional wallet provider.
    pub kmd: Option<KmdConfig>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for AlgoNetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgoNetworkConfig")
            .field("network", &self.network)
            .field("algod_url", &self.algod_url)
            .field("algod_token", &"[REDACTED]")
            .field("indexer_url", &self.indexer_url)
            .field("indexer_token", &"[REDACTED]")
            .field("kmd", &self.kmd)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AlgoNetworkConfig {
    /// Public TestNet endpoints, no wallet provider.
    pub fn testnet() -> Result<Self, ConfigError> {
        Self::public(
            Network::TestNet,
            "https://testnet-api.algonode.cloud",
            "https://testnet-idx.algonode.cloud",
        )
    }

    /// Public MainNet endpoints, no wallet provider.
    pub fn mainnet() -> Result<Self, ConfigError> {
        Self::public(
            Network::MainNet,
            "https://mainnet-api.algonode.cloud",
            "https://mainnet-idx.algonode.cloud",
        )
    }

    /// Default LocalNet sandbox: algod on 4001, indexer on 8980, KMD on 4002.
    pub fn localnet() -> Result<Self, ConfigError> {
        Ok(Self {
            network: Network::LocalNet,
            algod_url: parse_url("algod", "http://localhost:4001")?,
            algod_token: Zeroizing::new(LOCALNET_TOKEN.to_string()),
            indexer_url: parse_url("indexer", "http://localhost:8980")?,
            indexer_token: Zeroizing::new(LOCALNET_TOKEN.to_string()),
            kmd: Some(KmdConfig {
                url: parse_url("kmd", "http://localhost:4002")?,
                token: Zeroizing::new(LOCALNET_TOKEN.to_string()),
                wallet_name: LOCALNET_WALLET.to_string(),
                wallet_password: Zeroizing::new(String::new()),
            }),
            timeout_secs: 30,
        })
    }

    fn public(network: Network, algod: &str, indexer: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            network,
            algod_url: parse_url("algod", algod)?,
            algod_token: Zeroizing::new(String::new()),
            indexer_url: parse_url("indexer", indexer)?,
            indexer_token: Zeroizing::new(String::new()),
            kmd: None,
            timeout_secs: 30,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ALGO_NETWORK` (`testnet` | `mainnet` | `localnet`, default: `testnet`)
    ///   selects the preset every other variable overrides.
    /// - `ALGOD_SERVER`, `ALGOD_TOKEN`
    /// - `INDEXER_SERVER`, `INDEXER_TOKEN`
    /// - `KMD_SERVER`, `KMD_TOKEN`, `KMD_WALLET`, `KMD_PASSWORD`. Setting
    ///   `KMD_SERVER` enables the wallet provider on any network.
    /// - `ALGO_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = match std::env::var("ALGO_NETWORK") {
            Ok(raw) => raw.parse()?,
            Err(_) => Network::TestNet,
        };
        Self::from_env_for(network)
    }

    /// Like [`from_env`](Self::from_env) with the preset chosen explicitly
    /// instead of from `ALGO_NETWORK`.
    pub fn from_env_for(network: Network) -> Result<Self, ConfigError> {
        let mut cfg = match network {
            Network::MainNet => Self::mainnet()?,
            Network::TestNet => Self::testnet()?,
            Network::LocalNet => Self::localnet()?,
        };

        if let Some(url) = env_url("ALGOD_SERVER")? {
            cfg.algod_url = url;
        }
        if let Ok(token) = std::env::var("ALGOD_TOKEN") {
            cfg.algod_token = Zeroizing::new(token);
        }
        if let Some(url) = env_url("INDEXER_SERVER")? {
            cfg.indexer_url = url;
        }
        if let Ok(token) = std::env::var("INDEXER_TOKEN") {
            cfg.indexer_token = Zeroizing::new(token);
        }

        if let Some(url) = env_url("KMD_SERVER")? {
            let previous = cfg.kmd.take();
            cfg.kmd = Some(KmdConfig {
                url,
                token: previous
                    .as_ref()
                    .map(|k| k.token.clone())
                    .unwrap_or_default(),
                wallet_name: previous
                    .as_ref()
                    .map(|k| k.wallet_name.clone())
                    .unwrap_or_else(|| LOCALNET_WALLET.to_string()),
                wallet_password: previous
                    .map(|k| k.wallet_password)
                    .unwrap_or_default(),
            });
        }
        if let Some(kmd) = cfg.kmd.as_mut() {
            if let Ok(token) = std::env::var("KMD_TOKEN") {
                kmd.token = Zeroizing::new(token);
            }
            if let Ok(wallet) = std::env::var("KMD_WALLET") {
                kmd.wallet_name = wallet;
            }
            if let Ok(password) = std::env::var("KMD_PASSWORD") {
                kmd.wallet_password = Zeroizing::new(password);
            }
        }

        cfg.timeout_secs = std::env::var("ALGO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Ok(cfg)
    }

    /// Create a configuration pointing to local mock servers (for testing):
    /// algod on `base_port`, indexer on `base_port + 1`, KMD on `base_port + 2`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed
    /// (should not occur for valid port numbers, but avoids `expect()`).
    pub fn local_mock(base_port: u16, token: &str) -> Result<Self, ConfigError> {
        let make_url = |port: u16| -> Result<Url, ConfigError> {
            parse_url("localhost", &format!("http://127.0.0.1:{port}"))
        };
        Ok(Self {
            network: Network::LocalNet,
            algod_url: make_url(base_port)?,
            algod_token: Zeroizing::new(token.to_string()),
            indexer_url: make_url(base_port + 1)?,
            indexer_token: Zeroizing::new(token.to_string()),
            kmd: Some(KmdConfig {
                url: make_url(base_port + 2)?,
                token: Zeroizing::new(token.to_string()),
                wallet_name: LOCALNET_WALLET.to_string(),
                wallet_password: Zeroizing::new(String::new()),
            }),
            timeout_secs: 5,
        })
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_url(var, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown network \"{0}\" (expected mainnet, testnet, or localnet)")]
    UnknownNetwork(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid header value for {0}")]
    InvalidToken(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = AlgoNetworkConfig::local_mock(9000, "test-token").unwrap();
        assert_eq!(cfg.algod_token.as_str(), "test-token");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.algod_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.indexer_url.as_str(), "http://127.0.0.1:9001/");
        assert_eq!(
            cfg.kmd.as_ref().map(|k| k.url.as_str()),
            Some("http://127.0.0.1:9002/")
        );
    }

    #[test]
    fn testnet_has_no_wallet_provider() {
        let cfg = AlgoNetworkConfig::testnet().unwrap();
        assert_eq!(cfg.network, Network::TestNet);
        assert!(cfg.kmd.is_none());
        assert!(cfg.algod_token.is_empty());
    }

    #[test]
    fn localnet_uses_sandbox_token_everywhere() {
        let cfg = AlgoNetworkConfig::localnet().unwrap();
        assert_eq!(cfg.algod_token.as_str(), LOCALNET_TOKEN);
        assert_eq!(cfg.indexer_token.as_str(), LOCALNET_TOKEN);
        let kmd = cfg.kmd.unwrap();
        assert_eq!(kmd.wallet_name, LOCALNET_WALLET);
    }

    #[test]
    fn debug_redacts_tokens() {
        let cfg = AlgoNetworkConfig::local_mock(9000, "super-secret").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!("TestNet".parse::<Network>().unwrap(), Network::TestNet);
        assert_eq!("sandbox".parse::<Network>().unwrap(), Network::LocalNet);
        assert!("betanet".parse::<Network>().is_err());
    }

    #[test]
    fn explorer_link_embeds_network_and_id() {
        assert_eq!(
            Network::TestNet.explorer_tx_url("ABC"),
            "https://lora.algokit.io/testnet/transaction/ABC"
        );
    }

    #[test]
    fn parse_url_rejects_invalid_url() {
        assert!(parse_url("TEST", "not a url").is_err());
    }
}
