use super::Store;
use crate::client::ChainClient;
use crate::format::format_token_amount;
use alloy_primitives::{Address, U256};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileDetails {
    pub address: Option<Address>,
    pub chain: String,
    pub balance: String,
    pub ens_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileState {
    pub details: ProfileDetails,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Native balance rounded to four decimals, e.g. `"0.1235 ETH"`.
fn format_native_balance(raw: U256, symbol: &str) -> String {
    let formatted = format_token_amount(raw, 18);
    let amount: f64 = formatted.parse().unwrap_or_else(|e| {
        warn!("Unreadable native balance '{}': {}", formatted, e);
        0.0
    });
    format!("{amount:.4} {symbol}")
}

impl<C: ChainClient> Store<C> {
    pub async fn fetch_profile(&self, address: Option<Address>) {
        let request = self.requests.profile.next();

        let Some(address) = address else {
            self.update_if_latest(&self.requests.profile, request, |state| {
                state.profile = ProfileState::default();
            });
            return;
        };

        self.update(|state| {
            state.profile.is_loading = true;
            state.profile.error = None;
        });

        let result = futures::try_join!(
            self.client.native_balance(address),
            self.client.lookup_name(address)
        );

        match result {
            Ok((balance, ens_name)) => {
                let details = ProfileDetails {
                    address: Some(address),
                    chain: self.config.chain_name.clone(),
                    balance: format_native_balance(balance, &self.config.native_symbol),
                    ens_name: ens_name.unwrap_or_default(),
                };
                info!("Loaded profile for {}", address);
                self.update_if_latest(&self.requests.profile, request, |state| {
                    state.profile = ProfileState {
                        details,
                        is_loading: false,
                        error: None,
                    };
                });
            }
            Err(e) => {
                error!("Error fetching profile for {}: {:#}", address, e);
                self.update_if_latest(&self.requests.profile, request, |state| {
                    state.profile.is_loading = false;
                    state.profile.error = Some(e.to_string());
                });
            }
        }
    }
}
