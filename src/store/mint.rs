use super::{Store, TransactionState, TxKind};
use crate::client::ChainClient;
use crate::events::mintCall;
use crate::format::format_value_on_input_change;
use crate::validation::validate_amount;
use alloy::sol_types::SolCall;
use alloy_primitives::TxHash;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MintForm {
    pub amount: String,
    pub validation_errors: MintValidationErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MintValidationErrors {
    pub amount: String,
}

/// Partial update of the mint form's fields; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct MintFieldsUpdate {
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MintState {
    pub form: MintForm,
    pub transaction_state: TransactionState,
}

impl<C: ChainClient> Store<C> {
    /// Store a sanitized amount, capped at the selected token's decimals.
    pub fn set_mint_amount(&self, value: &str) {
        let decimals = self.selected_token_decimals();
        let amount = format_value_on_input_change(value, decimals);
        self.update(|state| {
            state.mint.form.amount = amount;
            TxKind::Mint.settle(state);
        });
    }

    pub fn set_mint_form_validation_errors(&self, errors: MintFieldsUpdate) {
        self.update(|state| {
            if let Some(amount) = errors.amount {
                state.mint.form.validation_errors.amount = amount;
            }
        });
    }

    pub fn set_mint_transaction_state(&self, transaction_state: TransactionState) {
        self.set_write_state(TxKind::Mint, transaction_state);
    }

    pub fn reset_mint_form(&self) {
        self.update(|state| state.mint = MintState::default());
    }

    /// Check the current amount and store the resulting message.
    pub fn validate_mint_form(&self) -> bool {
        let decimals = self.selected_token_decimals();
        let amount = self.read(|state| state.mint.form.amount.clone());
        let message = validate_amount(&amount, decimals, None);
        let valid = message.is_empty();
        self.set_mint_form_validation_errors(MintFieldsUpdate {
            amount: Some(message),
        });
        valid
    }

    /// Mint `amount` of `symbol` to the connected wallet.
    pub async fn mint_token(&self, symbol: &str, amount: &str) -> Option<TxHash> {
        let Some(owner) = self.read(|state| state.profile.details.address) else {
            let message = "Wallet address not found. Please connect your wallet.";
            error!("{}", message);
            self.fail_write(TxKind::Mint, message.to_string());
            return None;
        };

        self.submit_write(TxKind::Mint, symbol, amount, |parsed| {
            mintCall {
                to: owner,
                amount: parsed,
            }
            .abi_encode()
            .into()
        })
        .await
    }

    pub(crate) fn selected_token_decimals(&self) -> u8 {
        let symbol = self.read(|state| state.balances.selected_token.clone());
        self.config
            .tokens
            .get(&symbol)
            .unwrap_or_else(|| self.config.tokens.first())
            .decimals
    }
}
