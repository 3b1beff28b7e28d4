use super::{Store, TxKind};
use crate::client::ChainClient;
use crate::events::{Approval, Transfer, decode_approval_event, decode_transfer_event};
use crate::format::format_token_amount;
use crate::tokens::TokenConfig;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, TxHash, U256};
use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenEvent {
    pub id: String,
    pub amount: String,
    pub from: Address,
    pub to: Address,
    pub status: EventStatus,
    pub token: String,
    pub transaction_hash: TxHash,
    pub kind: TxKind,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

impl TokenEvent {
    /// Event for a just-submitted write, shown until the next refetch.
    pub fn pending(
        token: &str,
        kind: TxKind,
        from: Address,
        to: Address,
        amount: &str,
        transaction_hash: TxHash,
    ) -> Self {
        TokenEvent {
            id: transaction_hash.to_string(),
            amount: amount.to_string(),
            from,
            to,
            status: EventStatus::Pending,
            token: token.to_string(),
            transaction_hash,
            kind,
            block_number: None,
            log_index: None,
        }
    }

    fn confirmed(
        token: &TokenConfig,
        kind: TxKind,
        from: Address,
        to: Address,
        value: U256,
        log: &Log,
        transaction_hash: TxHash,
    ) -> Self {
        TokenEvent {
            id: transaction_hash.to_string(),
            amount: format_token_amount(value, token.decimals),
            from,
            to,
            status: EventStatus::Success,
            token: token.symbol.clone(),
            transaction_hash,
            kind,
            block_number: log.block_number,
            log_index: log.log_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryState {
    pub events: Option<Vec<TokenEvent>>,
    pub optimistic_events: Option<Vec<TokenEvent>>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub fetch_error: bool,
    pub is_retrying: bool,
}

impl Default for HistoryState {
    fn default() -> Self {
        HistoryState {
            events: None,
            optimistic_events: None,
            is_loading: true,
            error_message: None,
            fetch_error: false,
            is_retrying: false,
        }
    }
}

/// Turn one token's Transfer and Approval logs into events involving `owner`.
///
/// Logs without a transaction hash or with a zero value are skipped, as are
/// logs that fail to decode. A transfer from the zero address is a mint.
pub fn events_from_logs(
    token: &TokenConfig,
    owner: Address,
    transfer_logs: &[Log],
    approval_logs: &[Log],
) -> Vec<TokenEvent> {
    let mut events = Vec::new();

    for log in transfer_logs {
        let transfer = match decode_transfer_event(log) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!("Failed to decode transfer event: {}", e);
                continue;
            }
        };
        let Some(tx_hash) = log.transaction_hash else {
            continue;
        };
        if transfer.value.is_zero() || (transfer.from != owner && transfer.to != owner) {
            continue;
        }

        let kind = if transfer.from == Address::ZERO {
            TxKind::Mint
        } else {
            TxKind::Transfer
        };
        events.push(TokenEvent::confirmed(
            token,
            kind,
            transfer.from,
            transfer.to,
            transfer.value,
            log,
            tx_hash,
        ));
    }

    for log in approval_logs {
        let approval = match decode_approval_event(log) {
            Ok(approval) => approval,
            Err(e) => {
                warn!("Failed to decode approval event: {}", e);
                continue;
            }
        };
        let Some(tx_hash) = log.transaction_hash else {
            continue;
        };
        if approval.value.is_zero() || (approval.owner != owner && approval.spender != owner) {
            continue;
        }

        events.push(TokenEvent::confirmed(
            token,
            TxKind::Approve,
            approval.owner,
            approval.spender,
            approval.value,
            log,
            tx_hash,
        ));
    }

    events
}

impl<C: ChainClient> Store<C> {
    pub async fn fetch_events(&self, address: Option<Address>, show_loading: bool) {
        let request = self.requests.events.next();

        let Some(owner) = address else {
            self.update_if_latest(&self.requests.events, request, |state| {
                state.history = HistoryState {
                    is_loading: false,
                    ..HistoryState::default()
                };
            });
            return;
        };

        self.update(|state| {
            state.history.is_loading = show_loading;
            state.history.error_message = None;
            state.history.fetch_error = false;
            state.history.is_retrying = true;
        });

        match self.collect_events(owner).await {
            Ok(events) => {
                info!("Reconstructed {} events for {}", events.len(), owner);
                self.update_if_latest(&self.requests.events, request, |state| {
                    state.history = HistoryState {
                        optimistic_events: Some(events.clone()),
                        events: Some(events),
                        is_loading: false,
                        error_message: None,
                        fetch_error: false,
                        is_retrying: false,
                    };
                });
            }
            Err(e) => {
                error!("Error fetching events: {:#}", e);
                self.update_if_latest(&self.requests.events, request, |state| {
                    state.history = HistoryState {
                        events: None,
                        optimistic_events: None,
                        is_loading: false,
                        error_message: Some(format!("Failed to fetch transaction history. {e}")),
                        fetch_error: true,
                        is_retrying: false,
                    };
                });
            }
        }
    }

    /// All-or-nothing scan of every token's recent Transfer and Approval logs,
    /// ordered by block and log index.
    async fn collect_events(&self, owner: Address) -> Result<Vec<TokenEvent>> {
        let latest = self.client.latest_block().await.map_err(|e| {
            error!("Error fetching block number: {:#}", e);
            anyhow::anyhow!("Failed to get current block number.")
        })?;

        let transfer_from = latest.saturating_sub(self.config.transfer_log_window);
        let approval_from = latest.saturating_sub(self.config.approval_log_window);

        let mut events = Vec::new();
        for token in self.config.tokens.iter() {
            let transfer_logs = self
                .client
                .logs(transfer_from, latest, token.address, Transfer::SIGNATURE_HASH)
                .await?;
            let approval_logs = self
                .client
                .logs(approval_from, latest, token.address, Approval::SIGNATURE_HASH)
                .await?;
            debug!(
                "{}: {} transfer logs, {} approval logs",
                token.symbol,
                transfer_logs.len(),
                approval_logs.len()
            );
            events.extend(events_from_logs(token, owner, &transfer_logs, &approval_logs));
        }

        events.sort_by_key(|e| (e.block_number, e.log_index));
        Ok(events)
    }

    pub fn set_optimistic_events(&self, event: TokenEvent) {
        self.update(|state| {
            state
                .history
                .optimistic_events
                .get_or_insert_with(Vec::new)
                .push(event);
        });
    }

    pub fn reset_optimistic_events(&self) {
        self.update(|state| state.history.optimistic_events = state.history.events.clone());
    }
}
