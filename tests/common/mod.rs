#![allow(dead_code)]

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, Bytes, LogData, TxHash, U256, address};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallet_store::events::{Approval, Transfer};
use wallet_store::{ChainClient, Store, StoreConfig};

pub const OWNER: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const OTHER: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

/// In-memory chain with scripted responses.
#[derive(Default)]
pub struct MockChain {
    pub chain_id: u64,
    /// `None` makes `latest_block` fail.
    pub latest_block: Option<u64>,
    pub token_balances: HashMap<(Address, Address), U256>,
    pub failing_tokens: HashSet<Address>,
    pub allowances: HashMap<(Address, Address, Address), U256>,
    pub native_balance: U256,
    pub ens_name: Option<String>,
    pub fail_native_balance: bool,
    pub logs: HashMap<(Address, B256), Vec<Log>>,
    pub fail_logs: bool,
    /// Per-owner delay applied to token and native balance reads.
    pub balance_delays: HashMap<Address, Duration>,
    /// Delay taken by the first `latest_block` call only.
    pub first_block_delay: Mutex<Option<Duration>>,
    pub write_error: Option<String>,
    pub writes: Mutex<Vec<(Address, Bytes, u64)>>,
    pub log_queries: Mutex<Vec<(u64, u64, Address, B256)>>,
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn latest_block(&self) -> Result<u64> {
        let delay = self.first_block_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.latest_block
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }

    async fn logs(
        &self,
        from_block: u64,
        to_block: u64,
        contract: Address,
        topic0: B256,
    ) -> Result<Vec<Log>> {
        self.log_queries
            .lock()
            .unwrap()
            .push((from_block, to_block, contract, topic0));
        if self.fail_logs {
            anyhow::bail!("log query failed");
        }
        Ok(self
            .logs
            .get(&(contract, topic0))
            .cloned()
            .unwrap_or_default())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        if let Some(delay) = self.balance_delays.get(&owner) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_tokens.contains(&token) {
            anyhow::bail!("execution reverted");
        }
        Ok(self
            .token_balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        Ok(self
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        if let Some(delay) = self.balance_delays.get(&owner) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_native_balance {
            anyhow::bail!("rpc unavailable");
        }
        Ok(self.native_balance)
    }

    async fn lookup_name(&self, _owner: Address) -> Result<Option<String>> {
        Ok(self.ens_name.clone())
    }

    async fn write_contract(
        &self,
        contract: Address,
        calldata: Bytes,
        chain_id: u64,
    ) -> Result<TxHash> {
        if let Some(error) = &self.write_error {
            anyhow::bail!("{}", error);
        }
        let mut writes = self.writes.lock().unwrap();
        writes.push((contract, calldata, chain_id));
        Ok(TxHash::repeat_byte(writes.len() as u8))
    }
}

pub fn store_with(chain: MockChain) -> (Store<MockChain>, Arc<MockChain>) {
    let chain = Arc::new(chain);
    let store = Store::new(chain.clone(), StoreConfig::default());
    (store, chain)
}

pub fn token(symbol: &str) -> Address {
    StoreConfig::default().tokens.get(symbol).unwrap().address
}

fn log(data: LogData, block: u64, index: u64, tx: u8) -> Log {
    Log {
        inner: alloy_primitives::Log {
            address: Address::ZERO,
            data,
        },
        block_number: Some(block),
        log_index: Some(index),
        transaction_hash: Some(TxHash::repeat_byte(tx)),
        ..Default::default()
    }
}

pub fn transfer_log(from: Address, to: Address, value: U256, block: u64, tx: u8) -> Log {
    log(Transfer { from, to, value }.encode_log_data(), block, 0, tx)
}

pub fn approval_log(owner: Address, spender: Address, value: U256, block: u64, tx: u8) -> Log {
    log(
        Approval {
            owner,
            spender,
            value,
        }
        .encode_log_data(),
        block,
        1,
        tx,
    )
}
