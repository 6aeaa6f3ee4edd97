use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub networks: HashMap<String, NetworkConfig>,
    pub default_network: String,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub transactions: TransactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub explorer_url: Option<String>,
    pub gas: GasConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    pub default_gas_limit: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Node-managed account transactions are sent from.
    pub default_account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    pub receipt_poll_interval_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval_ms: 1000,
        }
    }
}

impl TransactionConfig {
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = HashMap::new();

        networks.insert(
            "local".to_string(),
            NetworkConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                chain_id: 1337,
                explorer_url: None,
                gas: GasConfig {
                    default_gas_limit: 3_000_000,
                },
            },
        );

        networks.insert(
            "ethereum".to_string(),
            NetworkConfig {
                rpc_url: "https://eth-mainnet.g.alchemy.com/v2/demo".to_string(),
                chain_id: 1,
                explorer_url: Some("https://etherscan.io".to_string()),
                gas: GasConfig {
                    default_gas_limit: 100000,
                },
            },
        );

        networks.insert(
            "sepolia".to_string(),
            NetworkConfig {
                rpc_url: "https://eth-sepolia.g.alchemy.com/v2/demo".to_string(),
                chain_id: 11155111,
                explorer_url: Some("https://sepolia.etherscan.io".to_string()),
                gas: GasConfig {
                    default_gas_limit: 100000,
                },
            },
        );

        Self {
            networks,
            default_network: "local".to_string(),
            account: AccountConfig::default(),
            transactions: TransactionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars();
        config
    }

    pub fn network_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.networks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Gas limit of the selected network, used when no `--gas` is given.
    pub fn default_gas_limit(&self, network: Option<&str>) -> Result<u64> {
        let network_name = network.unwrap_or(&self.default_network);
        self.networks
            .get(network_name)
            .map(|n| n.gas.default_gas_limit)
            .ok_or_else(|| anyhow!("Network '{}' not configured", network_name))
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("ALCHEMY_API_KEY") {
            tracing::info!("Using ALCHEMY_API_KEY environment variable for RPC URLs");

            for (network_name, network_config) in &mut self.networks {
                if network_config.rpc_url.contains("alchemy.com/v2/demo") {
                    network_config.rpc_url = network_config
                        .rpc_url
                        .replace("/demo", &format!("/{}", api_key));
                    tracing::debug!("Updated {} RPC URL with API key", network_name);
                } else if network_config.rpc_url.contains("YOUR_API_KEY_HERE") {
                    network_config.rpc_url = network_config
                        .rpc_url
                        .replace("YOUR_API_KEY_HERE", &api_key);
                    tracing::debug!("Updated {} RPC URL with API key", network_name);
                }
            }
        } else {
            for (network_name, network_config) in &self.networks {
                if network_config.rpc_url.contains("/demo") {
                    tracing::debug!("Using demo RPC endpoint for {}, set ALCHEMY_API_KEY environment variable for better reliability", network_name);
                }
            }
        }

        if let Ok(account) = std::env::var("ETH_CONTRACTS_ACCOUNT") {
            tracing::debug!("Using ETH_CONTRACTS_ACCOUNT as default sending account");
            self.account.default_account = Some(account);
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("eth-contracts").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# eth-contracts configuration file

# Default network to use when none is specified
default_network = "local"

# Network configurations
[networks.local]
rpc_url = "http://127.0.0.1:8545"
chain_id = 1337

[networks.local.gas]
default_gas_limit = 3_000_000

[networks.sepolia]
rpc_url = "https://eth-sepolia.g.alchemy.com/v2/YOUR_API_KEY_HERE"
chain_id = 11155111
explorer_url = "https://sepolia.etherscan.io"

[networks.sepolia.gas]
default_gas_limit = 100000

# Account the node signs transactions for (eth_sendTransaction)
[account]
# default_account = "0x0000000000000000000000000000000000000000"

# Receipt polling
[transactions]
receipt_poll_interval_ms = 1000

# Environment variables that can be used:
# ALCHEMY_API_KEY - Your Alchemy API key (replace YOUR_API_KEY_HERE above)
# ETH_CONTRACTS_ACCOUNT - Overrides account.default_account
"#;
        sample_config.to_string()
    }
}
