use super::{Store, TransactionState, TxKind};
use crate::client::ChainClient;
use crate::format::{format_token_amount, offset_amount};
use crate::tokens::{TokenConfig, TokenRegistry};
use alloy_primitives::Address;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub balance: Option<String>,
    /// Projection shown while a write is pending; equals `balance` after
    /// every successful fetch.
    pub optimistic_balance: Option<String>,
    pub symbol: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl TokenBalance {
    fn empty(symbol: &str, loading: bool) -> Self {
        TokenBalance {
            balance: None,
            optimistic_balance: None,
            symbol: symbol.to_string(),
            loading,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceState {
    pub tokens: BTreeMap<String, TokenBalance>,
    pub selected_token: String,
    pub transaction_state: TransactionState,
}

impl BalanceState {
    pub fn new(registry: &TokenRegistry) -> Self {
        BalanceState {
            tokens: registry
                .iter()
                .map(|t| (t.symbol.clone(), TokenBalance::empty(&t.symbol, true)))
                .collect(),
            selected_token: registry.first().symbol.clone(),
            transaction_state: TransactionState::Idle,
        }
    }

    pub fn selected(&self) -> Option<&TokenBalance> {
        self.tokens.get(&self.selected_token)
    }
}

impl<C: ChainClient> Store<C> {
    pub async fn fetch_token_balances(&self, address: Option<Address>) {
        let request = self.requests.balances.next();

        let Some(owner) = address else {
            self.update_if_latest(&self.requests.balances, request, |state| {
                for balance in state.balances.tokens.values_mut() {
                    *balance = TokenBalance::empty(&balance.symbol, false);
                }
            });
            return;
        };

        self.update(|state| {
            for balance in state.balances.tokens.values_mut() {
                balance.loading = true;
                balance.error = None;
            }
        });

        let reads = self.config.tokens.iter().map(|token| async move {
            let raw = self.client.token_balance(token.address, owner).await?;
            Ok::<_, anyhow::Error>((token.symbol.clone(), format_token_amount(raw, token.decimals)))
        });

        match try_join_all(reads).await {
            Ok(balances) => {
                info!("Fetched {} token balances for {}", balances.len(), owner);
                self.update_if_latest(&self.requests.balances, request, |state| {
                    for (symbol, formatted) in balances {
                        state.balances.tokens.insert(
                            symbol.clone(),
                            TokenBalance {
                                balance: Some(formatted.clone()),
                                optimistic_balance: Some(formatted),
                                symbol,
                                loading: false,
                                error: None,
                            },
                        );
                    }
                });
            }
            Err(e) => {
                error!("Error fetching token balances: {:#}", e);
                let applied = self.update_if_latest(&self.requests.balances, request, |state| {
                    for balance in state.balances.tokens.values_mut() {
                        balance.loading = false;
                        balance.error = Some("Failed".to_string());
                    }
                });
                if applied {
                    self.set_error(format!("Failed to fetch token balances: {e}"));
                }
            }
        }
    }

    fn selected_token_config(&self) -> Option<&TokenConfig> {
        let symbol = self.read(|state| state.balances.selected_token.clone());
        self.config.tokens.get(&symbol)
    }

    /// Project the selected token's balance after a pending write of `kind`.
    pub fn set_optimistic_balance(&self, amount: &str, kind: TxKind) {
        let Some(token) = self.selected_token_config() else {
            return;
        };
        let decimals = token.decimals;
        let symbol = token.symbol.clone();

        self.update(|state| {
            let Some(balance) = state.balances.tokens.get_mut(&symbol) else {
                return;
            };
            let projected = match kind {
                TxKind::Mint => offset_amount(balance.balance.as_deref(), amount, decimals, false),
                TxKind::Transfer => {
                    offset_amount(balance.balance.as_deref(), amount, decimals, true)
                }
                // approvals do not move the balance
                TxKind::Approve => {
                    balance.optimistic_balance = balance.balance.clone();
                    return;
                }
            };
            match projected {
                Ok(projected) => balance.optimistic_balance = Some(projected),
                Err(e) => warn!("Ignoring optimistic {:?} of '{}': {:#}", kind, amount, e),
            }
        });
    }

    pub fn reset_optimistic_balance(&self) {
        self.update(|state| {
            let selected = state.balances.selected_token.clone();
            if let Some(balance) = state.balances.tokens.get_mut(&selected) {
                balance.optimistic_balance = balance.balance.clone();
            }
        });
    }

    pub fn set_selected_token(&self, symbol: &str) {
        if self.config.tokens.get(symbol).is_none() {
            warn!("Ignoring selection of unknown token {}", symbol);
            return;
        }
        self.update(|state| state.balances.selected_token = symbol.to_string());
    }

    pub fn set_token_pending(&self, symbol: &str, pending: bool) {
        self.update(|state| {
            if let Some(balance) = state.balances.tokens.get_mut(symbol) {
                balance.loading = pending;
            }
        });
    }

    pub fn reset_transaction_state(&self) {
        self.update(|state| state.balances.transaction_state = TransactionState::Idle);
    }

    pub fn selected_token_balance(&self) -> Option<TokenBalance> {
        self.read(|state| state.balances.selected().cloned())
    }
}
