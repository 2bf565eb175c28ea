//! L2 RPC client implementation.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{BlockId, EIP1186AccountProofResponse, Filter, Log};
use alloy_transport_http::{reqwest::Client, Http};
use async_trait::async_trait;
use backon::Retryable;
use url::Url;

use super::{
    error::{RpcError, RpcResult},
    traits::L2Client,
};
use crate::config::RetryConfig;
use crate::constants::DEFAULT_RPC_TIMEOUT;

/// Configuration for the L2 client.
#[derive(Debug, Clone)]
pub struct L2ClientConfig {
    /// RPC endpoint URL.
    pub endpoint: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl L2ClientConfig {
    /// Creates a new L2 client configuration with defaults.
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

/// L2 RPC client implementation using Alloy.
#[derive(Debug)]
pub struct L2ClientImpl {
    /// The underlying HTTP provider.
    provider: RootProvider,
    /// Retry configuration.
    retry_config: RetryConfig,
}

impl L2ClientImpl {
    /// Creates a new L2 client from the given configuration.
    pub fn new(config: L2ClientConfig) -> RpcResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Connection(format!("Failed to build HTTP client: {e}")))?;

        let http = Http::with_client(client, config.endpoint);
        let rpc_client = RpcClient::new(http, false);
        let provider = RootProvider::new(rpc_client);

        Ok(Self { provider, retry_config: config.retry_config })
    }
}

#[async_trait]
impl L2Client for L2ClientImpl {
    async fn chain_id(&self) -> RpcResult<u64> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_chain_id().await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L2Client::chain_id");
            })
            .await
    }

    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>> {
        let backoff = self.retry_config.to_backoff_builder();

        (|| async { self.provider.get_logs(filter).await.map_err(RpcError::from) })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                tracing::debug!(error = %err, delay = ?dur, "Retrying L2Client::logs");
            })
            .await
    }

    async fn proof(
        &self,
        address: Address,
        slot: B256,
        block_number: u64,
    ) -> RpcResult<EIP1186AccountProofResponse> {
        let backoff = self.retry_config.to_backoff_builder();

        let response = (|| async {
            self.provider
                .get_proof(address, vec![slot])
                .block_id(BlockId::number(block_number))
                .await
                .map_err(RpcError::from)
        })
        .retry(backoff)
        .when(|e| e.is_retryable())
        .notify(|err, dur| {
            tracing::debug!(error = %err, delay = ?dur, "Retrying L2Client::proof");
        })
        .await?;

        if response.storage_proof.is_empty() {
            return Err(RpcError::ProofNotFound(format!(
                "eth_getProof returned no storage proof for slot {slot} at block {block_number}"
            )));
        }

        Ok(response)
    }
}
