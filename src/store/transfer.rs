use super::{Store, TransactionState, TxKind};
use crate::client::ChainClient;
use crate::events::transferCall;
use crate::validation::{validate_address, validate_amount};
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, TxHash};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferForm {
    pub amount: String,
    pub recipient_address: String,
    pub validation_errors: TransferValidationErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferValidationErrors {
    pub amount: String,
    pub recipient_address: String,
}

/// Partial update of the transfer form; used for values and for errors.
#[derive(Debug, Clone, Default)]
pub struct TransferFieldsUpdate {
    pub amount: Option<String>,
    pub recipient_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferState {
    pub form: TransferForm,
    pub transaction_state: TransactionState,
}

impl<C: ChainClient> Store<C> {
    pub fn set_transfer_form_values(&self, values: TransferFieldsUpdate) {
        self.update(|state| {
            let form = &mut state.transfer.form;
            if let Some(amount) = values.amount {
                form.amount = amount;
            }
            if let Some(recipient_address) = values.recipient_address {
                form.recipient_address = recipient_address;
            }
            TxKind::Transfer.settle(state);
        });
    }

    pub fn set_transfer_form_validation_errors(&self, errors: TransferFieldsUpdate) {
        self.update(|state| {
            let validation_errors = &mut state.transfer.form.validation_errors;
            if let Some(amount) = errors.amount {
                validation_errors.amount = amount;
            }
            if let Some(recipient_address) = errors.recipient_address {
                validation_errors.recipient_address = recipient_address;
            }
        });
    }

    pub fn set_transfer_transaction_state(&self, transaction_state: TransactionState) {
        self.set_write_state(TxKind::Transfer, transaction_state);
    }

    pub fn reset_transfer_form(&self) {
        self.update(|state| state.transfer = TransferState::default());
    }

    /// Amount must fit the selected token's optimistic balance.
    pub fn validate_transfer_form(&self) -> bool {
        let decimals = self.selected_token_decimals();
        let (form, available, own) = self.read(|state| {
            (
                state.transfer.form.clone(),
                state
                    .balances
                    .selected()
                    .and_then(|b| b.optimistic_balance.clone()),
                state.profile.details.address,
            )
        });

        let amount = validate_amount(&form.amount, decimals, available.as_deref());
        let recipient_address = validate_address(&form.recipient_address, own);
        let valid = amount.is_empty() && recipient_address.is_empty();
        self.set_transfer_form_validation_errors(TransferFieldsUpdate {
            amount: Some(amount),
            recipient_address: Some(recipient_address),
        });
        valid
    }

    pub async fn transfer_token(
        &self,
        symbol: &str,
        recipient: Address,
        amount: &str,
    ) -> Option<TxHash> {
        self.submit_write(TxKind::Transfer, symbol, amount, |parsed| {
            transferCall {
                to: recipient,
                amount: parsed,
            }
            .abi_encode()
            .into()
        })
        .await
    }
}
