use super::{AppState, Store};
use crate::client::ChainClient;
use crate::format::parse_token_amount;
use crate::tokens::TokenConfig;
use alloy_primitives::{Bytes, TxHash, U256};
use anyhow::Context;
use serde::Serialize;
use tracing::{error, info};

/// Lifecycle of one write operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail")]
pub enum TransactionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(TxHash),
    Failed(String),
}

impl TransactionState {
    pub fn loading(&self) -> bool {
        matches!(self, TransactionState::Submitting)
    }

    pub fn success(&self) -> bool {
        matches!(self, TransactionState::Succeeded(_))
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            TransactionState::Succeeded(hash) => Some(*hash),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TransactionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TransactionState::Succeeded(_) | TransactionState::Failed(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TxKind {
    Transfer,
    Approve,
    Mint,
}

impl TxKind {
    fn failure_message(self, token: &str) -> String {
        match self {
            TxKind::Mint => format!("Failed to mint {token}. Please try again."),
            TxKind::Transfer => {
                format!("Failed to transfer {token}. Please check details and balance.")
            }
            TxKind::Approve => format!("Failed to approve {token}. Please try again."),
        }
    }

    fn rejection_message(self) -> &'static str {
        match self {
            TxKind::Mint => "Mint transaction was rejected.",
            TxKind::Transfer => "Transfer transaction was rejected.",
            TxKind::Approve => "Approve transaction was rejected.",
        }
    }

    /// User-facing message for a failed write. Wallet rejections get their
    /// own wording.
    pub fn describe_failure(self, token: &str, err: &anyhow::Error) -> String {
        if format!("{err:#}").to_lowercase().contains("rejected") {
            self.rejection_message().to_string()
        } else {
            self.failure_message(token)
        }
    }

    /// Back to idle once the user touches a form after a finished write.
    pub(crate) fn settle(self, state: &mut AppState) {
        let transaction_state = self.transaction_state(state);
        if transaction_state.is_finished() {
            *transaction_state = TransactionState::Idle;
        }
    }

    fn transaction_state(self, state: &mut AppState) -> &mut TransactionState {
        match self {
            TxKind::Mint => &mut state.mint.transaction_state,
            TxKind::Transfer => &mut state.transfer.transaction_state,
            TxKind::Approve => &mut state.approve.transaction_state,
        }
    }
}

impl<C: ChainClient> Store<C> {
    pub(crate) fn set_write_state(&self, kind: TxKind, transaction_state: TransactionState) {
        self.update(|state| *kind.transaction_state(state) = transaction_state);
    }

    /// Record a failure both on the slice and in the global error slot.
    pub(crate) fn fail_write(&self, kind: TxKind, message: String) {
        self.set_write_state(kind, TransactionState::Failed(message.clone()));
        self.set_error(message);
    }

    /// Shared body of mint/transfer/approve: resolve the token, convert the
    /// amount, submit the call and track its lifecycle.
    pub(crate) async fn submit_write(
        &self,
        kind: TxKind,
        symbol: &str,
        amount: &str,
        calldata: impl FnOnce(U256) -> Bytes,
    ) -> Option<TxHash> {
        self.set_write_state(kind, TransactionState::Submitting);

        let result = async {
            let token: &TokenConfig = self
                .config
                .tokens
                .get(symbol)
                .with_context(|| format!("Unknown token: {symbol}"))?;
            let parsed = parse_token_amount(amount, token.decimals)?;
            self.client
                .write_contract(
                    token.address,
                    calldata(parsed),
                    self.config.expected_chain_id,
                )
                .await
        }
        .await;

        match result {
            Ok(tx_hash) => {
                info!("{:?} of {} {} submitted: {}", kind, amount, symbol, tx_hash);
                self.set_write_state(kind, TransactionState::Succeeded(tx_hash));
                Some(tx_hash)
            }
            Err(e) => {
                error!("Error during {:?} of {}: {:#}", kind, symbol, e);
                self.fail_write(kind, kind.describe_failure(symbol, &e));
                None
            }
        }
    }
}
