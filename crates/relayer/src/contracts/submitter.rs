//! `MessageSubmitter` trait and implementations for L1 transaction submission.
//!
//! Supports two signing modes:
//! - **Local**: Signs with an in-process private key via [`EthereumWallet`].
//! - **Remote**: Calls a signer sidecar's `eth_signTransaction` JSON-RPC method.

use std::future::Future;
use std::sync::Arc;

use alloy_eips::Encodable2718;
use alloy_network::{Ethereum, EthereumWallet, NetworkWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use backon::Retryable;
use tokio::sync::OnceCell;
use tracing::info;
use url::Url;

use super::bindings::{IL1CrossDomainMessenger, MessageInclusionProof};
use crate::config::{RetryConfig, SigningConfig};
use crate::constants::RELAY_GAS_LIMIT;
use crate::error::RelayerError;
use crate::types::{MessageProof, SentMessage};

/// Encodes the calldata for `relayMessage(target, sender, message, nonce, proof)`.
pub fn encode_relay_calldata(message: &SentMessage, proof: &MessageProof) -> Bytes {
    let call = IL1CrossDomainMessenger::relayMessageCall {
        target: message.target,
        sender: message.sender,
        message: message.data.clone(),
        messageNonce: message.nonce,
        proof: MessageInclusionProof::from(proof),
    };
    Bytes::from(call.abi_encode())
}

/// Shared logic for building, signing, broadcasting, and confirming a relay
/// transaction.
///
/// The `sign_tx` closure parameterizes the signing step so that both local and
/// remote signing modes can reuse the same transaction-building code. The gas
/// limit is the fixed relay allowance, so no estimation round-trip is made.
async fn submit_relay<F, Fut>(
    provider: &RootProvider,
    from_address: Address,
    messenger_address: Address,
    calldata: Bytes,
    message_hash: B256,
    chain_id_cell: &OnceCell<u64>,
    sign_tx: F,
) -> Result<(), RelayerError>
where
    F: FnOnce(TransactionRequest) -> Fut,
    Fut: Future<Output = Result<Bytes, RelayerError>>,
{
    let nonce = provider
        .get_transaction_count(from_address)
        .await
        .map_err(|e| RelayerError::Contract(format!("get_transaction_count failed: {e}")))?;

    let chain_id = *chain_id_cell
        .get_or_try_init(|| async {
            provider
                .get_chain_id()
                .await
                .map_err(|e| RelayerError::Contract(format!("get_chain_id failed: {e}")))
        })
        .await?;

    let fees = provider
        .estimate_eip1559_fees()
        .await
        .map_err(|e| RelayerError::Contract(format!("estimate_eip1559_fees failed: {e}")))?;

    let mut tx = TransactionRequest::default()
        .from(from_address)
        .to(messenger_address)
        .input(TransactionInput::new(calldata))
        .nonce(nonce)
        .max_fee_per_gas(fees.max_fee_per_gas)
        .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
    tx.set_chain_id(chain_id);
    tx.set_gas_limit(RELAY_GAS_LIMIT);

    let signed_bytes = sign_tx(tx).await?;
    let pending = provider
        .send_raw_transaction(&signed_bytes)
        .await
        .map_err(|e| RelayerError::Contract(format!("send_raw_transaction failed: {e}")))?;

    let tx_hash = *pending.tx_hash();
    info!(%tx_hash, %message_hash, "Relay transaction sent, waiting for receipt");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| RelayerError::Contract(format!("get_receipt failed: {e}")))?;

    if !receipt.status() {
        return Err(RelayerError::Contract(format!("transaction {tx_hash} reverted")));
    }

    info!(
        %tx_hash,
        %message_hash,
        block_number = receipt.block_number,
        "Relay transaction confirmed"
    );
    Ok(())
}

/// Returns true if the error is retryable (i.e. not a revert).
///
/// A revert is left for the next tick's dedup check to re-evaluate: the
/// message may have been relayed by someone else in the meantime.
fn is_retryable(e: &RelayerError) -> bool {
    !matches!(e, RelayerError::Contract(msg) if msg.contains("reverted"))
}

/// Trait for submitting proven messages to the L1 messenger.
#[async_trait]
pub trait MessageSubmitter: Send + Sync {
    /// Submits a relay transaction to L1 and waits for inclusion.
    async fn relay_message(
        &self,
        message: &SentMessage,
        proof: &MessageProof,
    ) -> Result<(), RelayerError>;
}

/// Message submitter that signs transactions locally with a private key.
pub struct LocalMessageSubmitter {
    provider: RootProvider,
    wallet: EthereumWallet,
    messenger_address: Address,
    retry_config: RetryConfig,
    chain_id: OnceCell<u64>,
}

impl std::fmt::Debug for LocalMessageSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMessageSubmitter")
            .field("messenger_address", &self.messenger_address)
            .finish_non_exhaustive()
    }
}

impl LocalMessageSubmitter {
    /// Creates a new local submitter with the given signer.
    pub fn new(
        l1_rpc_url: Url,
        messenger_address: Address,
        signer: PrivateKeySigner,
        retry_config: RetryConfig,
    ) -> Self {
        let provider = RootProvider::new_http(l1_rpc_url);
        let wallet = EthereumWallet::from(signer);

        Self { provider, wallet, messenger_address, retry_config, chain_id: OnceCell::new() }
    }
}

#[async_trait]
impl MessageSubmitter for LocalMessageSubmitter {
    async fn relay_message(
        &self,
        message: &SentMessage,
        proof: &MessageProof,
    ) -> Result<(), RelayerError> {
        let calldata = encode_relay_calldata(message, proof);
        let messenger_address = self.messenger_address;
        let from = NetworkWallet::<Ethereum>::default_signer_address(&self.wallet);

        info!(
            message_hash = %message.hash,
            l2_height = message.height,
            messenger = %messenger_address,
            "Submitting relay via local signer"
        );

        (|| async {
            submit_relay(
                &self.provider,
                from,
                messenger_address,
                calldata.clone(),
                message.hash,
                &self.chain_id,
                |tx| async {
                    let envelope =
                        <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, &self.wallet)
                            .await
                            .map_err(|e| {
                                RelayerError::Contract(format!("sign_transaction failed: {e}"))
                            })?;
                    Ok(Bytes::from(Encodable2718::encoded_2718(&envelope)))
                },
            )
            .await
        })
        .retry(self.retry_config.to_backoff_builder())
        .when(is_retryable)
        .await
    }
}

/// Message submitter that signs transactions via a remote signer sidecar.
pub struct RemoteMessageSubmitter {
    provider: RootProvider,
    signer_client: jsonrpsee::http_client::HttpClient,
    signer_address: Address,
    messenger_address: Address,
    retry_config: RetryConfig,
    chain_id: OnceCell<u64>,
}

impl std::fmt::Debug for RemoteMessageSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMessageSubmitter")
            .field("signer_address", &self.signer_address)
            .field("messenger_address", &self.messenger_address)
            .finish_non_exhaustive()
    }
}

impl RemoteMessageSubmitter {
    /// Creates a new remote submitter.
    pub fn new(
        l1_rpc_url: Url,
        messenger_address: Address,
        signer_endpoint: Url,
        signer_address: Address,
        retry_config: RetryConfig,
    ) -> Result<Self, RelayerError> {
        let provider = RootProvider::new_http(l1_rpc_url);
        let signer_client = jsonrpsee::http_client::HttpClientBuilder::default()
            .build(signer_endpoint.as_str())
            .map_err(|e| RelayerError::Config(format!("failed to build signer client: {e}")))?;

        Ok(Self {
            provider,
            signer_client,
            signer_address,
            messenger_address,
            retry_config,
            chain_id: OnceCell::new(),
        })
    }
}

#[async_trait]
impl MessageSubmitter for RemoteMessageSubmitter {
    async fn relay_message(
        &self,
        message: &SentMessage,
        proof: &MessageProof,
    ) -> Result<(), RelayerError> {
        use jsonrpsee::core::client::ClientT;
        use jsonrpsee::core::params::ArrayParams;

        let calldata = encode_relay_calldata(message, proof);
        let messenger_address = self.messenger_address;

        info!(
            message_hash = %message.hash,
            l2_height = message.height,
            messenger = %messenger_address,
            signer = %self.signer_address,
            "Submitting relay via remote signer"
        );

        (|| async {
            submit_relay(
                &self.provider,
                self.signer_address,
                messenger_address,
                calldata.clone(),
                message.hash,
                &self.chain_id,
                |tx| async move {
                    let mut params = ArrayParams::new();
                    params.insert(&tx).map_err(|e| {
                        RelayerError::Contract(format!("failed to serialize tx: {e}"))
                    })?;

                    let signed: Bytes = self
                        .signer_client
                        .request("eth_signTransaction", params)
                        .await
                        .map_err(|e| {
                            RelayerError::Contract(format!("eth_signTransaction failed: {e}"))
                        })?;
                    Ok(signed)
                },
            )
            .await
        })
        .retry(self.retry_config.to_backoff_builder())
        .when(is_retryable)
        .await
    }
}

/// Creates a [`MessageSubmitter`] based on the signing configuration.
pub fn create_message_submitter(
    l1_rpc_url: Url,
    messenger_address: Address,
    signing_config: SigningConfig,
    retry_config: RetryConfig,
) -> Result<Arc<dyn MessageSubmitter>, RelayerError> {
    match signing_config {
        SigningConfig::Local { signer } => {
            let submitter =
                LocalMessageSubmitter::new(l1_rpc_url, messenger_address, signer, retry_config);
            Ok(Arc::new(submitter))
        }
        SigningConfig::Remote { endpoint, address } => {
            let submitter = RemoteMessageSubmitter::new(
                l1_rpc_url,
                messenger_address,
                endpoint,
                address,
                retry_config,
            )?;
            Ok(Arc::new(submitter))
        }
    }
}
