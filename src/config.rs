use crate::tokens::TokenRegistry;
use anyhow::{Context, Result};

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_TRANSFER_LOG_WINDOW: u64 = 10_000;
pub const DEFAULT_APPROVAL_LOG_WINDOW: u64 = 99;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub private_key: Option<String>,
    pub store: StoreConfig,
}

/// Settings the store itself needs; independent of how the chain is reached.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub expected_chain_id: u64,
    pub chain_name: String,
    pub native_symbol: String,
    pub tokens: TokenRegistry,
    pub transfer_log_window: u64,
    pub approval_log_window: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            expected_chain_id: SEPOLIA_CHAIN_ID,
            chain_name: "Sepolia".to_string(),
            native_symbol: "ETH".to_string(),
            tokens: TokenRegistry::default(),
            transfer_log_window: DEFAULT_TRANSFER_LOG_WINDOW,
            approval_log_window: DEFAULT_APPROVAL_LOG_WINDOW,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transfer_log_window == 0 {
            anyhow::bail!("TRANSFER_LOG_WINDOW must be greater than zero");
        }
        // Transfers are scanned far deeper than approvals.
        if self.approval_log_window >= self.transfer_log_window {
            anyhow::bail!(
                "APPROVAL_LOG_WINDOW ({}) must be smaller than TRANSFER_LOG_WINDOW ({})",
                self.approval_log_window,
                self.transfer_log_window
            );
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let json_rpc_urls: Vec<String> = var("JSON_RPC_URLS")
            .or_else(|| var("JSON_RPC_URL"))
            .context("JSON_RPC_URLS or JSON_RPC_URL must be set in .env")?
            .split(',')
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if json_rpc_urls.is_empty() {
            anyhow::bail!("JSON_RPC_URLS must contain at least one URL");
        }

        let defaults = StoreConfig::default();

        let expected_chain_id = match var("EXPECTED_CHAIN_ID") {
            Some(id) => id.parse().context("Invalid EXPECTED_CHAIN_ID")?,
            None => defaults.expected_chain_id,
        };

        let tokens = match var("TOKENS") {
            Some(entries) => TokenRegistry::parse(&entries).context("Invalid TOKENS")?,
            None => defaults.tokens,
        };

        let transfer_log_window = match var("TRANSFER_LOG_WINDOW") {
            Some(w) => w.parse().context("Invalid TRANSFER_LOG_WINDOW")?,
            None => defaults.transfer_log_window,
        };

        let approval_log_window = match var("APPROVAL_LOG_WINDOW") {
            Some(w) => w.parse().context("Invalid APPROVAL_LOG_WINDOW")?,
            None => defaults.approval_log_window,
        };

        let store = StoreConfig {
            expected_chain_id,
            chain_name: var("CHAIN_NAME").unwrap_or(defaults.chain_name),
            native_symbol: var("NATIVE_SYMBOL").unwrap_or(defaults.native_symbol),
            tokens,
            transfer_log_window,
            approval_log_window,
        };
        store.validate()?;

        Ok(Config {
            json_rpc_urls,
            private_key: var("PRIVATE_KEY").filter(|k| !k.is_empty()),
            store,
        })
    }
}
