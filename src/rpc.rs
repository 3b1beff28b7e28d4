use crate::client::ChainClient;
use crate::events::{
    ENS_REGISTRY, allowanceCall, balanceOfCall, nameCall, resolverCall, reverse_node,
};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use alloy::transports::TransportError;
use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120); // 2 minutes timeout per request

#[derive(Clone)]
pub struct RpcClient {
    providers: Vec<DynProvider>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    max_retries: usize,
    can_sign: bool,
}

impl RpcClient {
    pub fn new(rpc_urls: &[String], private_key: Option<&str>) -> Result<Self> {
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("At least one RPC URL must be provided"));
        }

        let wallet = private_key
            .map(|key| {
                key.trim()
                    .parse::<PrivateKeySigner>()
                    .context("Invalid PRIVATE_KEY")
                    .map(EthereumWallet::from)
            })
            .transpose()?;

        let mut providers = Vec::new();
        for url in rpc_urls {
            let parsed_url = url
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", url))?;
            let provider = match &wallet {
                Some(wallet) => ProviderBuilder::new()
                    .wallet(wallet.clone())
                    .connect_http(parsed_url)
                    .erased(),
                None => ProviderBuilder::new().connect_http(parsed_url).erased(),
            };
            providers.push(provider);
        }

        Ok(RpcClient {
            providers,
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            max_retries: 5,
            can_sign: wallet.is_some(),
        })
    }

    fn get_provider(&self) -> &DynProvider {
        let index = self.current_provider.load(Ordering::Relaxed) % self.providers.len();
        &self.providers[index]
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_provider.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_provider(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);

        if self.providers.len() > 1 {
            debug!("Rotating to RPC provider #{}", next);
        }
    }

    fn get_retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries)
    }

    fn handle_error(&self, error_str: &str) {
        let current_url = self.get_current_url();
        warn!(
            "RPC error on {}: {}, rotating provider",
            current_url, error_str
        );
        self.rotate_provider();
    }

    fn handle_timeout(&self) -> anyhow::Error {
        let current_url = self.get_current_url();
        warn!(
            "Request timeout after {} seconds on {}, rotating provider",
            REQUEST_TIMEOUT.as_secs(),
            current_url
        );
        self.rotate_provider();
        anyhow::anyhow!(
            "Request timeout after {} seconds",
            REQUEST_TIMEOUT.as_secs()
        )
    }

    /// Run a read request with timeout, retry and provider rotation.
    async fn with_retry<T, F, Fut>(&self, request: F) -> Result<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        Retry::spawn(self.get_retry_strategy(), || {
            let future = request(self.get_provider().clone());
            async move {
                match timeout(REQUEST_TIMEOUT, future).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => {
                        let error_str = e.to_string();
                        self.handle_error(&error_str);
                        Err(anyhow::anyhow!("{}", e))
                    }
                    Err(_) => Err(self.handle_timeout()),
                }
            }
        })
        .await
    }

    pub async fn call_contract<C: SolCall>(&self, address: Address, call: C) -> Result<C::Return> {
        let input = Bytes::from(call.abi_encode());
        let output = self
            .with_retry(|provider| {
                let tx = TransactionRequest::default()
                    .with_to(address)
                    .with_input(input.clone());
                async move { provider.call(tx).await }
            })
            .await?;
        let decoded = C::abi_decode_returns(&output)
            .with_context(|| format!("Failed to decode {} result", C::SIGNATURE))?;
        Ok(decoded)
    }

    async fn get_logs_internal(
        &self,
        from_block: u64,
        to_block: u64,
        contract_address: Address,
        topic0: B256,
    ) -> Result<Vec<Log>> {
        let client = self.clone();
        Retry::spawn(self.get_retry_strategy(), move || {
            let client = client.clone();
            async move {
                let provider = client.get_provider();
                let filter = Filter::new()
                    .address(contract_address)
                    .event_signature(topic0)
                    .from_block(from_block)
                    .to_block(to_block);

                match timeout(REQUEST_TIMEOUT, provider.get_logs(&filter)).await {
                    Ok(Ok(logs)) => Ok(Ok(logs)),
                    Ok(Err(e)) => {
                        let error_str = e.to_string();

                        if error_str.contains("exceeds max results") {
                            debug!(
                                "Max results exceeded for blocks {}-{}, will split range",
                                from_block, to_block
                            );
                            // not retried: the caller narrows the range instead
                            Ok(Err(anyhow::anyhow!("{}", e)))
                        } else {
                            client.handle_error(&error_str);
                            Err(anyhow::anyhow!("{}", e))
                        }
                    }
                    Err(_) => Err(client.handle_timeout()),
                }
            }
        })
        .await
        .and_then(|r| r)
    }

    fn parse_max_results_error(error_str: &str) -> Option<(u64, u64)> {
        let re = Regex::new(r"retry with the range (\d+)-(\d+)").ok()?;
        let captures = re.captures(error_str)?;

        let from = captures.get(1)?.as_str().parse().ok()?;
        let to = captures.get(2)?.as_str().parse().ok()?;

        Some((from, to))
    }

    pub async fn get_logs(
        &self,
        from_block: u64,
        to_block: u64,
        contract_address: Address,
        topic0: B256,
    ) -> Result<Vec<Log>> {
        let mut all_logs = Vec::new();
        let mut current_from = from_block;

        while current_from <= to_block {
            match self
                .get_logs_internal(current_from, to_block, contract_address, topic0)
                .await
            {
                Ok(logs) => {
                    all_logs.extend(logs);
                    break;
                }
                Err(e) => {
                    let error_str = e.to_string();
                    let suggested = if error_str.contains("exceeds max results") {
                        Self::parse_max_results_error(&error_str)
                    } else {
                        None
                    };

                    let Some((suggested_from, suggested_to)) = suggested else {
                        return Err(e);
                    };

                    info!(
                        "Hit max results limit for blocks {}-{}, splitting at block {}",
                        current_from, to_block, suggested_to
                    );

                    let logs = self
                        .get_logs_internal(suggested_from, suggested_to, contract_address, topic0)
                        .await?;

                    all_logs.extend(logs);
                    current_from = suggested_to + 1;
                }
            }
        }

        Ok(all_logs)
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn chain_id(&self) -> Result<u64> {
        self.with_retry(|provider| async move { provider.get_chain_id().await })
            .await
    }

    async fn latest_block(&self) -> Result<u64> {
        self.with_retry(|provider| async move { provider.get_block_number().await })
            .await
    }

    async fn logs(
        &self,
        from_block: u64,
        to_block: u64,
        contract: Address,
        topic0: B256,
    ) -> Result<Vec<Log>> {
        self.get_logs(from_block, to_block, contract, topic0).await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        self.call_contract(token, balanceOfCall { owner }).await
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        self.call_contract(token, allowanceCall { owner, spender })
            .await
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.with_retry(|provider| async move { provider.get_balance(owner).await })
            .await
    }

    async fn lookup_name(&self, owner: Address) -> Result<Option<String>> {
        let registry_code = self
            .with_retry(|provider| async move { provider.get_code_at(ENS_REGISTRY).await })
            .await?;
        if registry_code.is_empty() {
            debug!("No ENS registry on this chain, skipping name lookup");
            return Ok(None);
        }

        let node = reverse_node(owner);
        let resolver = self
            .call_contract(ENS_REGISTRY, resolverCall { node })
            .await?;
        if resolver == Address::ZERO {
            return Ok(None);
        }

        let name = self.call_contract(resolver, nameCall { node }).await?;
        Ok(Some(name).filter(|n| !n.is_empty()))
    }

    async fn write_contract(
        &self,
        contract: Address,
        calldata: Bytes,
        chain_id: u64,
    ) -> Result<TxHash> {
        if !self.can_sign {
            anyhow::bail!("No signer configured, set PRIVATE_KEY to send transactions");
        }

        let tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(calldata)
            .with_chain_id(chain_id);

        // Writes are never retried; a resend could broadcast twice.
        let pending = timeout(REQUEST_TIMEOUT, self.get_provider().send_transaction(tx))
            .await
            .map_err(|_| self.handle_timeout())??;

        let tx_hash = *pending.tx_hash();
        info!("Submitted transaction {} to {}", tx_hash, contract);
        Ok(tx_hash)
    }
}
