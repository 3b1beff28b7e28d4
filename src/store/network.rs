use super::Store;
use crate::client::ChainClient;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkState {
    pub network: String,
    pub is_wrong_network: bool,
}

impl NetworkState {
    pub fn new(network: &str) -> Self {
        NetworkState {
            network: network.to_string(),
            is_wrong_network: false,
        }
    }
}

impl<C: ChainClient> Store<C> {
    pub fn set_is_wrong_network(&self, is_wrong_network: bool) {
        self.update(|state| state.network.is_wrong_network = is_wrong_network);
    }

    /// Compare the client's chain with the expected one and record the result.
    pub async fn sync_network(&self) {
        match self.client.chain_id().await {
            Ok(chain_id) => {
                let expected = self.config.expected_chain_id;
                let wrong = chain_id != expected;
                if wrong {
                    warn!("Connected to chain {}, expected {}", chain_id, expected);
                } else {
                    info!("Connected to expected chain {}", chain_id);
                }
                self.set_is_wrong_network(wrong);
            }
            Err(e) => {
                error!("Error fetching chain id: {:#}", e);
                self.set_error(format!("Failed to detect the connected network: {e}"));
            }
        }
    }
}
