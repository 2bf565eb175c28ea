//! State commitment chain contract client.
//!
//! Only the `insideFraudProofWindow` view is ever called; appends are read
//! back out of event logs and transaction calldata by the batch index.

use alloy_primitives::{Address, B256};
use alloy_provider::RootProvider;
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use super::bindings::{BatchHeader, IStateCommitmentChain};
use crate::{error::RelayerError, types::StateBatchHeader};

/// Async trait for the state commitment chain's view methods.
#[async_trait]
pub trait StateCommitmentChain: Send + Sync {
    /// Returns true while the given batch can still be challenged.
    ///
    /// A batch exactly at the window boundary reports `false` and is therefore
    /// treated as finalized by callers.
    async fn inside_fraud_proof_window(
        &self,
        header: &StateBatchHeader,
    ) -> Result<bool, RelayerError>;
}

/// Concrete implementation backed by Alloy's sol-generated contract bindings.
#[allow(missing_debug_implementations)]
pub struct StateCommitmentChainContractClient {
    contract: IStateCommitmentChain::IStateCommitmentChainInstance<RootProvider>,
}

impl StateCommitmentChainContractClient {
    /// Creates a new client for the given contract address and L1 RPC URL.
    pub fn new(address: Address, l1_rpc_url: url::Url) -> Self {
        let provider = RootProvider::new_http(l1_rpc_url);
        let contract = IStateCommitmentChain::IStateCommitmentChainInstance::new(address, provider);
        Self { contract }
    }
}

#[async_trait]
impl StateCommitmentChain for StateCommitmentChainContractClient {
    async fn inside_fraud_proof_window(
        &self,
        header: &StateBatchHeader,
    ) -> Result<bool, RelayerError> {
        self.contract.insideFraudProofWindow(BatchHeader::from(header)).call().await.map_err(|e| {
            RelayerError::Contract(format!(
                "insideFraudProofWindow({}) failed: {e}",
                header.batch_index
            ))
        })
    }
}

/// Decodes `appendStateBatch(bytes32[] stateRoots, uint256 startElement)`
/// calldata into the state-root list and starting element.
pub fn decode_append_state_batch(input: &[u8]) -> Result<(Vec<B256>, u64), RelayerError> {
    let call = IStateCommitmentChain::appendStateBatchCall::abi_decode(input)
        .map_err(|e| RelayerError::Decode(format!("appendStateBatch calldata: {e}")))?;
    let start = call
        .startElement
        .try_into()
        .map_err(|_| RelayerError::Decode("appendStateBatch startElement overflows u64".into()))?;
    Ok((call.stateRoots, start))
}
