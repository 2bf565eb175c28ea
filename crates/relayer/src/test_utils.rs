//! Mock clients and fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{EIP1186AccountProofResponse, Filter, FilterBlockOption, Log};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde_json::json;

use crate::contracts::bindings::{ICrossDomainMessage, IL2CrossDomainMessenger, IStateCommitmentChain};
use crate::contracts::{L1MessengerClient, MessageSubmitter, StateCommitmentChain};
use crate::error::RelayerError;
use crate::rpc::{L1Client, L2Client, RpcError, RpcResult};
use crate::types::{MessageProof, SentMessage, StateBatchHeader};
use crate::merkle;

/// Builds a batch header whose roots and committed root are self-consistent.
pub(crate) fn test_batch(batch_index: u64, prev: u64, size: u64) -> StateBatchHeader {
    let state_roots: Vec<B256> =
        (0..size).map(|i| keccak256((prev + i).to_be_bytes())).collect();
    StateBatchHeader {
        batch_index,
        batch_root: merkle::compute_root(&state_roots),
        batch_size: size,
        prev_total_elements: prev,
        extra_data: Bytes::new(),
        state_roots,
    }
}

/// Encodes a `relayMessage` payload the way the L2 messenger emits it.
pub(crate) fn relay_payload(target: Address, nonce: u64) -> Bytes {
    Bytes::from(
        ICrossDomainMessage::relayMessageCall {
            target,
            sender: Address::repeat_byte(0x42),
            message: Bytes::from(vec![0x12, 0x34, 0x12, 0x34]),
            messageNonce: U256::from(nonce),
        }
        .abi_encode(),
    )
}

fn rpc_log(address: Address, data: alloy_primitives::LogData, block_number: u64, log_index: u64, tx_hash: B256) -> Log {
    Log {
        inner: alloy_primitives::Log { address, data },
        block_hash: None,
        block_number: Some(block_number),
        block_timestamp: None,
        transaction_hash: Some(tx_hash),
        transaction_index: None,
        log_index: Some(log_index),
        removed: false,
    }
}

/// Builds a `SentMessage` event log carrying the given payload.
pub(crate) fn sent_message_log(
    messenger: Address,
    payload: &Bytes,
    block_number: u64,
    log_index: u64,
) -> Log {
    let data = IL2CrossDomainMessenger::SentMessage { message: payload.clone() }.encode_log_data();
    rpc_log(messenger, data, block_number, log_index, B256::repeat_byte(0xFA))
}

fn extract_range(filter: &Filter) -> (u64, u64) {
    match filter.block_option {
        FilterBlockOption::Range { from_block, to_block } => (
            from_block.and_then(|b| b.as_number()).unwrap_or(0),
            to_block.and_then(|b| b.as_number()).unwrap_or(u64::MAX),
        ),
        FilterBlockOption::AtBlockHash(_) => (0, u64::MAX),
    }
}

/// Mock L1 endpoint serving `StateBatchAppended` logs and append calldata.
#[derive(Debug, Default)]
pub(crate) struct MockL1 {
    logs: Vec<Log>,
    inputs: HashMap<B256, Bytes>,
    pub(crate) log_queries: AtomicUsize,
}

impl MockL1 {
    /// Synthesizes one append event (and its transaction) per batch, placed
    /// at L1 block `batch_index`.
    pub(crate) fn with_batches(batches: &[StateBatchHeader]) -> Self {
        let mut logs = Vec::with_capacity(batches.len());
        let mut inputs = HashMap::new();
        for batch in batches {
            let tx_hash = keccak256(batch.batch_index.to_be_bytes());
            let event = IStateCommitmentChain::StateBatchAppended {
                batchIndex: U256::from(batch.batch_index),
                batchRoot: batch.batch_root,
                batchSize: U256::from(batch.batch_size),
                prevTotalElements: U256::from(batch.prev_total_elements),
                extraData: batch.extra_data.clone(),
            };
            logs.push(rpc_log(
                Address::repeat_byte(0x0C),
                event.encode_log_data(),
                batch.batch_index,
                0,
                tx_hash,
            ));
            let calldata = IStateCommitmentChain::appendStateBatchCall {
                stateRoots: batch.state_roots.clone(),
                startElement: U256::from(batch.prev_total_elements),
            }
            .abi_encode();
            inputs.insert(tx_hash, Bytes::from(calldata));
        }
        Self { logs, inputs, log_queries: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl L1Client for MockL1 {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(1)
    }

    async fn block_number(&self) -> RpcResult<u64> {
        Ok(1000)
    }

    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);
        let (from, to) = extract_range(filter);
        Ok(self
            .logs
            .iter()
            .filter(|log| log.block_number.is_some_and(|n| n >= from && n <= to))
            .cloned()
            .collect())
    }

    async fn transaction_input(&self, hash: B256) -> RpcResult<Bytes> {
        self.inputs
            .get(&hash)
            .cloned()
            .ok_or_else(|| RpcError::TransactionNotFound(hash.to_string()))
    }

    async fn balance(&self, _address: Address) -> RpcResult<U256> {
        Ok(U256::from(1_000_000_000_000_000_000u64))
    }
}

/// Mock L2 endpoint serving `SentMessage` logs and canned trie proofs.
#[derive(Debug)]
pub(crate) struct MockL2 {
    logs: Vec<Log>,
    account_nodes: Vec<Bytes>,
    storage_nodes: Vec<Bytes>,
    /// Block numbers `proof` was queried at.
    pub(crate) proof_blocks: Arc<Mutex<Vec<u64>>>,
}

impl MockL2 {
    pub(crate) fn with_logs(logs: Vec<Log>) -> Self {
        Self {
            logs,
            account_nodes: vec![Bytes::from(vec![0x0A])],
            storage_nodes: vec![Bytes::from(vec![0x0B])],
            proof_blocks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_proof_nodes(account_nodes: Vec<Bytes>, storage_nodes: Vec<Bytes>) -> Self {
        Self {
            logs: Vec::new(),
            account_nodes,
            storage_nodes,
            proof_blocks: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl L2Client for MockL2 {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(10)
    }

    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>> {
        let (from, to) = extract_range(filter);
        Ok(self
            .logs
            .iter()
            .filter(|log| log.block_number.is_some_and(|n| n >= from && n <= to))
            .cloned()
            .collect())
    }

    async fn proof(
        &self,
        address: Address,
        slot: B256,
        block_number: u64,
    ) -> RpcResult<EIP1186AccountProofResponse> {
        self.proof_blocks.lock().unwrap().push(block_number);
        let response = serde_json::from_value(json!({
            "address": address,
            "balance": "0x0",
            "codeHash": B256::ZERO,
            "nonce": "0x0",
            "storageHash": B256::ZERO,
            "accountProof": self.account_nodes,
            "storageProof": [{
                "key": slot,
                "value": "0x1",
                "proof": self.storage_nodes,
            }],
        }))?;
        Ok(response)
    }
}

/// Mock state commitment chain: a batch is outside the fraud-proof window
/// once its whole range lies below `finalized_below`.
#[derive(Debug)]
pub(crate) struct MockScc {
    finalized_below: Mutex<u64>,
}

impl MockScc {
    pub(crate) fn new(finalized_below: u64) -> Self {
        Self { finalized_below: Mutex::new(finalized_below) }
    }

    /// Moves the window so batches ending at or below `height` finalize.
    pub(crate) fn finalize_below(&self, height: u64) {
        *self.finalized_below.lock().unwrap() = height;
    }
}

#[async_trait]
impl StateCommitmentChain for MockScc {
    async fn inside_fraud_proof_window(
        &self,
        header: &StateBatchHeader,
    ) -> Result<bool, RelayerError> {
        Ok(header.next_height() > *self.finalized_below.lock().unwrap())
    }
}

/// Mock L1 messenger backed by a shared relayed-message set.
#[derive(Debug)]
pub(crate) struct MockMessenger {
    successful: Arc<Mutex<HashSet<B256>>>,
}

impl MockMessenger {
    pub(crate) fn new(successful: Arc<Mutex<HashSet<B256>>>) -> Self {
        Self { successful }
    }
}

#[async_trait]
impl L1MessengerClient for MockMessenger {
    async fn successful_messages(&self, message_hash: B256) -> Result<bool, RelayerError> {
        Ok(self.successful.lock().unwrap().contains(&message_hash))
    }
}

/// Mock submitter that marks relayed messages in the shared set, optionally
/// failing its first N submissions.
#[derive(Debug)]
pub(crate) struct MockSubmitter {
    successful: Arc<Mutex<HashSet<B256>>>,
    /// Every accepted relay, in submission order.
    pub(crate) relayed: Mutex<Vec<B256>>,
    failures_remaining: AtomicUsize,
}

impl MockSubmitter {
    pub(crate) fn new(successful: Arc<Mutex<HashSet<B256>>>) -> Self {
        Self { successful, relayed: Mutex::new(Vec::new()), failures_remaining: AtomicUsize::new(0) }
    }

    pub(crate) fn failing_first(successful: Arc<Mutex<HashSet<B256>>>, failures: usize) -> Self {
        Self {
            successful,
            relayed: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl MessageSubmitter for MockSubmitter {
    async fn relay_message(
        &self,
        message: &SentMessage,
        _proof: &MessageProof,
    ) -> Result<(), RelayerError> {
        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RelayerError::Contract("send_raw_transaction failed: connection reset".into()));
        }
        self.successful.lock().unwrap().insert(message.hash);
        self.relayed.lock().unwrap().push(message.hash);
        Ok(())
    }
}
