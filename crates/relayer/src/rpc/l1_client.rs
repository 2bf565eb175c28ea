//! L1 RPC client implementation.

use std::time::Duration;

use alloy_consensus::Transaction as _;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{Filter, Log};
use alloy_transport_http::{reqwest::Client, Http};
use async_trait::async_trait;
use backon::Retryable;
use url::Url;

use super::{
    error::{RpcError, RpcResult},
    traits::L1Client,
};
use crate::config::RetryConfig;
use crate::constants::DEFAULT_RPC_TIMEOUT;

/// Configuration for the L1 client.
#[derive(Debug, Clone)]
pub struct L1ClientConfig {
    /// RPC endpoint URL.
    pub endpoint: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl L1ClientConfig {
    /// Creates a new L1 client configuration with defaults.
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint, timeout: DEFAULT_RPC_TIMEOUT, retry_config: RetryConfig::default() }
    }

    /// Sets the request timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub const fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

/// L1 RPC client implementation using Alloy.
#[derive(Debug)]
pub struct L1ClientImpl {
    /// The underlying HTTP provider.
    provider: RootProvider,
    /// Retry configuration.
    retry_config: RetryConfig,
}

impl L1ClientImpl {
    /// Creates a new L1 client from the given configuration.
    pub fn new(config: L1ClientConfig) -> RpcResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Connection(format!("Failed to build HTTP client: {e}")))?;

        let http = Http::with_client(client, config.endpoint);
        let rpc_client = RpcClient::new(http, false);

        // Read-only operations, so no fillers are layered on.
        let provider = RootProvider::new(rpc_client);

        Ok(Self { provider, retry_config: config.retry_config })
    }
}

#[async_trait]
impl L1Client for L1ClientImpl {
    async fn chain_id(&self) -> RpcResult<u64> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_chain_id().await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L1Client::chain_id");
            })
            .await
    }

    async fn block_number(&self) -> RpcResult<u64> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_block_number().await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L1Client::block_number");
            })
            .await
    }

    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_logs(filter).await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L1Client::logs");
            })
            .await
    }

    async fn transaction_input(&self, hash: B256) -> RpcResult<Bytes> {
        let backoff = self.retry_config.to_backoff_builder();

        let tx = (|| async {
            self.provider.get_transaction_by_hash(hash).await.map_err(RpcError::from)
        })
        .retry(backoff)
        .when(|e| e.is_retryable())
        .notify(|err, dur| {
            tracing::debug!(error = %err, delay = ?dur, "Retrying L1Client::transaction_input");
        })
        .await?
        .ok_or_else(|| RpcError::TransactionNotFound(format!("Transaction not found: {hash}")))?;

        Ok(tx.input().clone())
    }

    async fn balance(&self, address: Address) -> RpcResult<U256> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_balance(address).await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L1Client::balance");
            })
            .await
    }
}
