use super::{Store, TransactionState, TxKind};
use crate::client::ChainClient;
use crate::events::approveCall;
use crate::format::format_token_amount;
use crate::validation::{validate_address, validate_amount};
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, TxHash};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproveForm {
    pub amount: String,
    pub spender_address: String,
    pub validation_errors: ApproveValidationErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproveValidationErrors {
    pub amount: String,
    pub spender_address: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApproveFieldsUpdate {
    pub amount: Option<String>,
    pub spender_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApproveState {
    /// Last allowance read for the connected wallet, formatted.
    pub allowance: String,
    pub form: ApproveForm,
    pub transaction_state: TransactionState,
}

impl<C: ChainClient> Store<C> {
    pub fn set_approve_form_values(&self, values: ApproveFieldsUpdate) {
        self.update(|state| {
            let form = &mut state.approve.form;
            if let Some(amount) = values.amount {
                form.amount = amount;
            }
            if let Some(spender_address) = values.spender_address {
                form.spender_address = spender_address;
            }
            TxKind::Approve.settle(state);
        });
    }

    pub fn set_approve_form_validation_errors(&self, errors: ApproveFieldsUpdate) {
        self.update(|state| {
            let validation_errors = &mut state.approve.form.validation_errors;
            if let Some(amount) = errors.amount {
                validation_errors.amount = amount;
            }
            if let Some(spender_address) = errors.spender_address {
                validation_errors.spender_address = spender_address;
            }
        });
    }

    pub fn set_approve_transaction_state(&self, transaction_state: TransactionState) {
        self.set_write_state(TxKind::Approve, transaction_state);
    }

    pub fn reset_approve_form(&self) {
        self.update(|state| {
            state.approve.form = ApproveForm::default();
            state.approve.transaction_state = TransactionState::Idle;
        });
    }

    /// Approvals may exceed the current balance, so only the format is checked.
    pub fn validate_approve_form(&self) -> bool {
        let decimals = self.selected_token_decimals();
        let (form, own) =
            self.read(|state| (state.approve.form.clone(), state.profile.details.address));

        let amount = validate_amount(&form.amount, decimals, None);
        let spender_address = validate_address(&form.spender_address, own);
        let valid = amount.is_empty() && spender_address.is_empty();
        self.set_approve_form_validation_errors(ApproveFieldsUpdate {
            amount: Some(amount),
            spender_address: Some(spender_address),
        });
        valid
    }

    pub async fn approve_token(
        &self,
        symbol: &str,
        spender: Address,
        amount: &str,
    ) -> Option<TxHash> {
        self.submit_write(TxKind::Approve, symbol, amount, |parsed| {
            approveCall {
                spender,
                amount: parsed,
            }
            .abi_encode()
            .into()
        })
        .await
    }

    /// Read how much `spender` may move of the connected wallet's `symbol`.
    pub async fn fetch_allowance(&self, symbol: &str, spender: Address) -> Option<String> {
        let request = self.requests.allowance.next();

        let Some(owner) = self.read(|state| state.profile.details.address) else {
            self.set_error("Wallet address not found. Please connect your wallet.");
            return None;
        };
        let Some(token) = self.config.tokens.get(symbol) else {
            self.set_error(format!("Unknown token: {symbol}"));
            return None;
        };

        match self
            .client
            .token_allowance(token.address, owner, spender)
            .await
        {
            Ok(raw) => {
                let allowance = format_token_amount(raw, token.decimals);
                info!("Allowance of {} for {}: {}", symbol, spender, allowance);
                let formatted = allowance.clone();
                self.update_if_latest(&self.requests.allowance, request, |state| {
                    state.approve.allowance = formatted;
                });
                Some(allowance)
            }
            Err(e) => {
                error!("Error fetching {} allowance: {:#}", symbol, e);
                self.set_error(format!("Failed to fetch {symbol} allowance: {e}"));
                None
            }
        }
    }
}
