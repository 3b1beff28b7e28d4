//! Observable wallet state.
//!
//! [`Store`] owns one [`AppState`] made of per-concern slices and exposes
//! the actions of every slice. Each slice lives in its own module with its
//! state type and an `impl Store` block holding its actions.

pub mod approve;
pub mod balance;
pub mod error;
pub mod history;
pub mod mint;
pub mod network;
pub mod profile;
pub mod transaction;
pub mod transfer;

pub use approve::{ApproveFieldsUpdate, ApproveForm, ApproveState};
pub use balance::{BalanceState, TokenBalance};
pub use error::ErrorState;
pub use history::{EventStatus, HistoryState, TokenEvent, events_from_logs};
pub use mint::{MintFieldsUpdate, MintForm, MintState};
pub use network::NetworkState;
pub use profile::{ProfileDetails, ProfileState};
pub use transaction::{TransactionState, TxKind};
pub use transfer::{TransferFieldsUpdate, TransferForm, TransferState};

use crate::client::ChainClient;
use crate::config::StoreConfig;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub error: ErrorState,
    pub network: NetworkState,
    pub profile: ProfileState,
    pub balances: BalanceState,
    pub history: HistoryState,
    pub mint: MintState,
    pub transfer: TransferState,
    pub approve: ApproveState,
}

impl AppState {
    pub fn new(config: &StoreConfig) -> Self {
        AppState {
            error: ErrorState::default(),
            network: NetworkState::new(&config.chain_name),
            profile: ProfileState::default(),
            balances: BalanceState::new(&config.tokens),
            history: HistoryState::default(),
            mint: MintState::default(),
            transfer: TransferState::default(),
            approve: ApproveState::default(),
        }
    }
}

/// Monotonic id of the latest request of one kind. Responses carrying an
/// older id are dropped.
#[derive(Debug, Default)]
pub(crate) struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_latest(&self, id: u64) -> bool {
        self.0.load(Ordering::SeqCst) == id
    }
}

#[derive(Debug, Default)]
struct RequestTracker {
    profile: RequestCounter,
    balances: RequestCounter,
    events: RequestCounter,
    allowance: RequestCounter,
}

pub struct Store<C> {
    client: Arc<C>,
    config: StoreConfig,
    state: watch::Sender<AppState>,
    requests: RequestTracker,
}

impl<C: ChainClient> Store<C> {
    pub fn new(client: Arc<C>, config: StoreConfig) -> Self {
        let (state, _) = watch::channel(AppState::new(&config));
        Store {
            client,
            config,
            state,
            requests: RequestTracker::default(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    fn update(&self, f: impl FnOnce(&mut AppState)) {
        self.state.send_modify(f);
    }

    /// Apply `f` only if `id` is still the latest request on `counter`.
    fn update_if_latest(
        &self,
        counter: &RequestCounter,
        id: u64,
        f: impl FnOnce(&mut AppState),
    ) -> bool {
        self.state.send_if_modified(|state| {
            if !counter.is_latest(id) {
                return false;
            }
            f(state);
            true
        })
    }
}
