use alloy_primitives::{Address, address};
use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// Ordered set of supported tokens, looked up by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRegistry {
    tokens: Vec<TokenConfig>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenConfig>) -> Result<Self> {
        if tokens.is_empty() {
            anyhow::bail!("At least one token must be configured");
        }
        for (i, token) in tokens.iter().enumerate() {
            if tokens[..i].iter().any(|t| t.symbol == token.symbol) {
                anyhow::bail!("Duplicate token symbol: {}", token.symbol);
            }
        }
        Ok(Self { tokens })
    }

    /// Parse `SYMBOL:ADDRESS:DECIMALS` entries separated by commas.
    pub fn parse(value: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            if parts.len() != 3 {
                anyhow::bail!("Invalid token entry '{}', expected SYMBOL:ADDRESS:DECIMALS", entry);
            }
            let address = Address::from_str(parts[1])
                .with_context(|| format!("Invalid token address for {}", parts[0]))?;
            let decimals = parts[2]
                .parse::<u8>()
                .with_context(|| format!("Invalid decimals for {}", parts[0]))?;
            tokens.push(TokenConfig {
                symbol: parts[0].to_string(),
                address,
                decimals,
            });
        }
        Self::new(tokens)
    }

    pub fn get(&self, symbol: &str) -> Option<&TokenConfig> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenConfig> {
        self.tokens.iter()
    }

    pub fn first(&self) -> &TokenConfig {
        // `new` and `Default` never build an empty registry.
        &self.tokens[0]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenRegistry {
    /// Sepolia test tokens.
    fn default() -> Self {
        Self {
            tokens: vec![
                TokenConfig {
                    symbol: "DAI".to_string(),
                    address: address!("0x1D70D57ccD2798323232B2dD027B3aBcA5C00091"),
                    decimals: 18,
                },
                TokenConfig {
                    symbol: "USDC".to_string(),
                    address: address!("0xC891481A0AaC630F4D89744ccD2C7D2C4215FD47"),
                    decimals: 6,
                },
            ],
        }
    }
}
