//! App configuration - networks, contract address, connector project id.

use alloy_primitives::{address, Address, U64};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ConfigError;

pub const ENV_PROJECT_ID: &str = "USD_WITHDRAWER_PROJECT_ID";
pub const ENV_CONTRACT: &str = "USD_WITHDRAWER_CONTRACT";
pub const ENV_NETWORK: &str = "USD_WITHDRAWER_NETWORK";
pub const ENV_RPC_URL: &str = "USD_WITHDRAWER_RPC_URL";

/// Deployed USD withdrawer contract.
pub const DEFAULT_CONTRACT: Address = address!("b0e53957BCC04aeD42C69755070B5AfD187d53DA");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub chain_id: u64,
    pub slug: &'static str,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub explorer_name: &'static str,
    pub explorer_url: &'static str,
    pub testnet: bool,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            slug: "mainnet",
            name: "Ethereum",
            rpc_url: "https://cloudflare-eth.com",
            explorer_name: "Etherscan",
            explorer_url: "https://etherscan.io",
            testnet: false,
        }
    }

    pub fn arbitrum() -> Self {
        Self {
            chain_id: 42161,
            slug: "arbitrum",
            name: "Arbitrum One",
            rpc_url: "https://arb1.arbitrum.io/rpc",
            explorer_name: "Arbiscan",
            explorer_url: "https://arbiscan.io",
            testnet: false,
        }
    }

    pub fn scroll_sepolia() -> Self {
        Self {
            chain_id: 534351,
            slug: "scroll-sepolia",
            name: "Scroll Sepolia Testnet",
            rpc_url: "https://534351.rpc.thirdweb.com",
            explorer_name: "ScrollScan",
            explorer_url: "https://sepolia.scrollscan.com",
            testnet: true,
        }
    }

    pub fn holesky() -> Self {
        Self {
            chain_id: 17000,
            slug: "holesky",
            name: "Holesky",
            rpc_url: "https://1rpc.io/holesky",
            explorer_name: "Holesky Explorer",
            explorer_url: "https://holesky.beaconcha.in",
            testnet: true,
        }
    }

    /// All supported networks, in connector order.
    pub fn all() -> Vec<Network> {
        vec![Self::mainnet(), Self::arbitrum(), Self::scroll_sepolia(), Self::holesky()]
    }

    /// Look up by decimal chain id, `0x` chain id, or slug.
    pub fn find(key: &str) -> Option<Network> {
        let key = key.trim().to_ascii_lowercase();
        let id = if let Some(hex) = key.strip_prefix("0x") {
            u64::from_str_radix(hex, 16).ok()
        } else {
            key.parse::<u64>().ok()
        };
        Self::all()
            .into_iter()
            .find(|n| Some(n.chain_id) == id || n.slug == key)
    }

    /// `wallet_addEthereumChain` parameter object.
    pub fn to_add_chain_params(&self) -> Value {
        json!({
            "chainId": U64::from(self.chain_id),
            "chainName": self.name,
            "nativeCurrency": { "name": "Ethereum", "symbol": "ETH", "decimals": 18 },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
        })
    }
}

/// Client configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_id: Option<String>,
    pub contract: Address,
    pub networks: Vec<Network>,
    pub default_network: Network,
    pub rpc_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            contract: DEFAULT_CONTRACT,
            networks: Network::all(),
            default_network: Network::scroll_sepolia(),
            rpc_url: None,
        }
    }
}

impl AppConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self { project_id: Some(project_id.into()), ..Default::default() }
    }
    pub fn with_contract(mut self, contract: Address) -> Self { self.contract = contract; self }
    pub fn with_default_network(mut self, network: Network) -> Self { self.default_network = network; self }
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self { self.rpc_url = Some(url.into()); self }

    /// Read overrides from the process environment. Project id stays optional here;
    /// call [`AppConfig::require_project_id`] where a wallet connector needs it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary source (build-time `option_env!`, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.project_id = non_empty(ENV_PROJECT_ID);
        if let Some(raw) = non_empty(ENV_CONTRACT) {
            config.contract = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(raw.clone()))?;
        }
        if let Some(raw) = non_empty(ENV_NETWORK) {
            let network = Network::find(&raw).ok_or(ConfigError::UnknownNetwork(raw))?;
            config = config.with_default_network(network);
        }
        if let Some(url) = non_empty(ENV_RPC_URL) {
            config = config.with_rpc_url(url);
        }
        Ok(config)
    }

    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        self.project_id.as_deref().ok_or(ConfigError::MissingProjectId)
    }

    /// RPC endpoint for direct (non-wallet) access: explicit override or the network default.
    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(self.default_network.rpc_url)
    }

    pub fn network(&self, key: &str) -> Result<Network, ConfigError> {
        Network::find(key)
            .filter(|n| self.networks.iter().any(|m| m.chain_id == n.chain_id))
            .ok_or_else(|| ConfigError::UnknownNetwork(key.to_string()))
    }
}
