use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

/// Everything the store needs from the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    async fn latest_block(&self) -> Result<u64>;

    /// Logs emitted by `contract` with `topic0` in the inclusive block range.
    async fn logs(
        &self,
        from_block: u64,
        to_block: u64,
        contract: Address,
        topic0: B256,
    ) -> Result<Vec<Log>>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn token_allowance(&self, token: Address, owner: Address, spender: Address)
    -> Result<U256>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Reverse-resolve `owner` to a name. `Ok(None)` when no name is set.
    async fn lookup_name(&self, owner: Address) -> Result<Option<String>>;

    /// Submit a state-changing call and return its transaction hash.
    async fn write_contract(&self, contract: Address, calldata: Bytes, chain_id: u64)
    -> Result<TxHash>;
}
