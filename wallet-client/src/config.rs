//! Client configuration
//!
//! The client needs to know:
//! - Which Stacks network to talk to, and optionally a custom API endpoint
//! - Which deployment of the remittance contract to call
//! - How often to poll the exchange rate and the balance
//! - An optional address to watch when no signing wallet is attached

use naija_network::{ContractId, StacksAddress, StacksNetwork};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `contract_address`
pub const ENV_CONTRACT_ADDRESS: &str = "NAIJA_CONTRACT_ADDRESS";
/// Overrides `contract_name`
pub const ENV_CONTRACT_NAME: &str = "NAIJA_CONTRACT_NAME";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network type ("mainnet" or "testnet")
    #[serde(default = "default_network")]
    pub network: String,

    /// Stacks API base URL. The public API for `network` when unset.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Deployer address of the remittance contract
    #[serde(default)]
    pub contract_address: String,

    #[serde(default = "default_contract_name")]
    pub contract_name: String,

    #[serde(default = "default_exchange_rate_poll_secs")]
    pub exchange_rate_poll_secs: u64,

    #[serde(default = "default_balance_poll_secs")]
    pub balance_poll_secs: u64,

    /// Divisor applied to the contract's raw exchange rate
    #[serde(default = "default_rate_scale")]
    pub rate_scale: u32,

    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,

    /// Address to watch with the read-only wallet
    #[serde(default)]
    pub stx_address: Option<String>,
}

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_contract_name() -> String {
    "naija-transfer".to_string()
}

fn default_exchange_rate_poll_secs() -> u64 {
    60
}

fn default_balance_poll_secs() -> u64 {
    30
}

fn default_rate_scale() -> u32 {
    1
}

fn default_history_page_size() -> u32 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            api_url: None,
            contract_address: String::new(),
            contract_name: default_contract_name(),
            exchange_rate_poll_secs: default_exchange_rate_poll_secs(),
            balance_poll_secs: default_balance_poll_secs(),
            rate_scale: default_rate_scale(),
            history_page_size: default_history_page_size(),
            stx_address: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, creating the default file on first run,
    /// then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            log::info!("📝 Creating default config");
            let config = Config::default();
            config.save_to(&config_path)?;
            config
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("📁 Loading config from: {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        log::info!(
            "✅ Config loaded: network={}, contract={}.{}",
            config.network,
            config.contract_address,
            config.contract_name
        );
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        log::info!("💾 Config saved to: {}", path.display());
        Ok(())
    }

    /// Override the contract identifiers from `lookup`, normally the process
    /// environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_CONTRACT_ADDRESS).filter(|v| !v.trim().is_empty()) {
            log::info!("🔧 Contract address from {}", ENV_CONTRACT_ADDRESS);
            self.contract_address = address.trim().to_string();
        }
        if let Some(name) = lookup(ENV_CONTRACT_NAME).filter(|v| !v.trim().is_empty()) {
            log::info!("🔧 Contract name from {}", ENV_CONTRACT_NAME);
            self.contract_name = name.trim().to_string();
        }
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = Self::data_dir()?;
        path.push("config.toml");
        Ok(path)
    }

    /// Get base data directory
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        let mut path = home;
        path.push(".naija-transfer");
        Ok(path)
    }

    pub fn use_mainnet(&mut self) {
        self.network = "mainnet".to_string();
    }

    pub fn use_testnet(&mut self) {
        self.network = "testnet".to_string();
    }

    pub fn is_testnet(&self) -> bool {
        self.network == "testnet"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let network = self.stacks_network()?;

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidEndpoint(url.clone()));
            }
        }

        if self.exchange_rate_poll_secs == 0 {
            return Err(ConfigError::InvalidInterval("exchange_rate_poll_secs"));
        }
        if self.balance_poll_secs == 0 {
            return Err(ConfigError::InvalidInterval("balance_poll_secs"));
        }
        if self.rate_scale == 0 {
            return Err(ConfigError::InvalidRateScale);
        }
        if self.history_page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        let contract = self.contract_id()?;
        if contract.address.network() != network {
            return Err(ConfigError::NetworkMismatch(contract.address.to_string()));
        }

        if let Some(address) = self.watch_address()? {
            if address.network() != network {
                return Err(ConfigError::NetworkMismatch(address.to_string()));
            }
        }

        Ok(())
    }

    pub fn stacks_network(&self) -> Result<StacksNetwork, ConfigError> {
        self.network
            .parse()
            .map_err(|_| ConfigError::InvalidNetwork(self.network.clone()))
    }

    /// The configured remittance contract
    pub fn contract_id(&self) -> Result<ContractId, ConfigError> {
        if self.contract_address.trim().is_empty() {
            return Err(ConfigError::MissingContract);
        }
        let address: StacksAddress = self
            .contract_address
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", self.contract_address, e)))?;
        ContractId::new(address, self.contract_name.trim())
            .map_err(|e| ConfigError::InvalidContract(e.to_string()))
    }

    /// The watch-only address, if one is configured
    pub fn watch_address(&self) -> Result<Option<StacksAddress>, ConfigError> {
        match self.stx_address.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", s, e))),
        }
    }

    pub fn exchange_rate_period(&self) -> Duration {
        Duration::from_secs(self.exchange_rate_poll_secs)
    }

    pub fn balance_period(&self) -> Duration {
        Duration::from_secs(self.balance_poll_secs)
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Home directory not found")]
    NoHomeDir,

    #[error("Invalid network: {0} (must be 'mainnet' or 'testnet')")]
    InvalidNetwork(String),

    #[error("Invalid endpoint: {0} (must start with http:// or https://)")]
    InvalidEndpoint(String),

    #[error("Contract address not configured (set contract_address or NAIJA_CONTRACT_ADDRESS)")]
    MissingContract,

    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Address {0} belongs to a different network")]
    NetworkMismatch(String),

    #[error("{0} must be greater than zero")]
    InvalidInterval(&'static str),

    #[error("rate_scale must be greater than zero")]
    InvalidRateScale,

    #[error("history_page_size must be greater than zero")]
    InvalidPageSize,
}
