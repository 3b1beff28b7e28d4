use super::Store;
use crate::client::ChainClient;
use serde::Serialize;
use tracing::debug;

/// Single global error slot shown as a modal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub message: Option<String>,
    pub is_modal_open: bool,
}

impl<C: ChainClient> Store<C> {
    /// Overwrites any unacknowledged error.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Error slot set: {}", message);
        self.update(|state| {
            state.error = ErrorState {
                message: Some(message),
                is_modal_open: true,
            };
        });
    }

    pub fn clear_error(&self) {
        self.update(|state| state.error = ErrorState::default());
    }
}
