//! Async trait definitions for RPC clients.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{EIP1186AccountProofResponse, Filter, Log};
use async_trait::async_trait;

use super::error::RpcResult;

/// L1 RPC client trait for reads against the settlement chain.
#[async_trait]
pub trait L1Client: Send + Sync {
    /// Gets the chain id of the endpoint.
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Gets the latest block number.
    async fn block_number(&self) -> RpcResult<u64>;

    /// Queries historical logs matching the given filter.
    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>>;

    /// Gets the calldata of a mined transaction.
    async fn transaction_input(&self, hash: B256) -> RpcResult<Bytes>;

    /// Gets the ETH balance of an address at the latest block.
    async fn balance(&self, address: Address) -> RpcResult<U256>;
}

/// L2 RPC client trait for reads against the rollup chain.
#[async_trait]
pub trait L2Client: Send + Sync {
    /// Gets the chain id of the endpoint.
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Queries historical logs matching the given filter.
    async fn logs(&self, filter: &Filter) -> RpcResult<Vec<Log>>;

    /// Gets an account proof plus one storage proof via `eth_getProof`,
    /// evaluated against the state at `block_number`.
    async fn proof(
        &self,
        address: Address,
        slot: B256,
        block_number: u64,
    ) -> RpcResult<EIP1186AccountProofResponse>;
}
