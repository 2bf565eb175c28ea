//! L1 cross-domain messenger view client.
//!
//! The messenger's `successfulMessages` set is the deduplication truth: it is
//! consulted before every submission, and the contract itself rejects double
//! relays. Submission lives in [`crate::contracts::submitter`].

use alloy_primitives::{Address, B256};
use alloy_provider::RootProvider;
use async_trait::async_trait;

use super::bindings::IL1CrossDomainMessenger;
use crate::error::RelayerError;

/// Async trait for the L1 messenger's view methods.
#[async_trait]
pub trait L1MessengerClient: Send + Sync {
    /// Returns true if the message with the given hash has already been relayed.
    async fn successful_messages(&self, message_hash: B256) -> Result<bool, RelayerError>;
}

/// Concrete implementation backed by Alloy's sol-generated contract bindings.
#[allow(missing_debug_implementations)]
pub struct L1MessengerContractClient {
    contract: IL1CrossDomainMessenger::IL1CrossDomainMessengerInstance<RootProvider>,
}

impl L1MessengerContractClient {
    /// Creates a new client for the given contract address and L1 RPC URL.
    pub fn new(address: Address, l1_rpc_url: url::Url) -> Self {
        let provider = RootProvider::new_http(l1_rpc_url);
        let contract =
            IL1CrossDomainMessenger::IL1CrossDomainMessengerInstance::new(address, provider);
        Self { contract }
    }
}

#[async_trait]
impl L1MessengerClient for L1MessengerContractClient {
    async fn successful_messages(&self, message_hash: B256) -> Result<bool, RelayerError> {
        self.contract.successfulMessages(message_hash).call().await.map_err(|e| {
            RelayerError::Contract(format!("successfulMessages({message_hash}) failed: {e}"))
        })
    }
}
