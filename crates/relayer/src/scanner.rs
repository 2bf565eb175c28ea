//! Scanner for `SentMessage` events on the L2 messenger.

use std::sync::Arc;

use alloy_primitives::{keccak256, Address};
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::{SolCall, SolEvent};
use tracing::warn;

use crate::contracts::bindings::{ICrossDomainMessage, IL2CrossDomainMessenger::SentMessage as SentMessageEvent};
use crate::error::RelayerError;
use crate::rpc::L2Client;
use crate::types::SentMessage;

/// Enumerates and decodes cross-domain messages sent on L2.
pub struct MessageScanner<L2> {
    l2: Arc<L2>,
    /// Address of the L2 cross-domain messenger.
    messenger: Address,
    /// Offset between L2 block numbers and state-commitment element indices.
    block_offset: u64,
}

impl<L2> std::fmt::Debug for MessageScanner<L2> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageScanner")
            .field("messenger", &self.messenger)
            .field("block_offset", &self.block_offset)
            .finish()
    }
}

impl<L2: L2Client> MessageScanner<L2> {
    /// Creates a new scanner against the given messenger.
    pub const fn new(l2: Arc<L2>, messenger: Address, block_offset: u64) -> Self {
        Self { l2, messenger, block_offset }
    }

    /// Returns every message sent between the given L2 heights, both bounds
    /// inclusive, ordered by `(block_number, log_index)`.
    ///
    /// The event payload is the encoded `relayMessage` calldata; a payload
    /// that fails to decode is logged and skipped rather than aborting the
    /// whole scan.
    pub async fn sent_messages(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> Result<Vec<SentMessage>, RelayerError> {
        debug_assert!(start_height <= end_height);

        let filter = Filter::new()
            .address(self.messenger)
            .event_signature(SentMessageEvent::SIGNATURE_HASH)
            .from_block(start_height + self.block_offset)
            .to_block(end_height + self.block_offset);
        let mut logs = self.l2.logs(&filter).await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));

        let mut messages = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(block_number) = log.block_number else {
                warn!(messenger = %self.messenger, "Skipping pending SentMessage log");
                continue;
            };

            let payload = match SentMessageEvent::decode_log(&log.inner) {
                Ok(event) => event.data.message,
                Err(e) => {
                    warn!(
                        block_number,
                        log_index = log.log_index,
                        error = %e,
                        "Skipping undecodable SentMessage event"
                    );
                    continue;
                }
            };

            let call = match ICrossDomainMessage::relayMessageCall::abi_decode(&payload) {
                Ok(call) => call,
                Err(e) => {
                    warn!(
                        block_number,
                        log_index = log.log_index,
                        error = %e,
                        "Skipping SentMessage with malformed relayMessage payload"
                    );
                    continue;
                }
            };

            messages.push(SentMessage {
                target: call.target,
                sender: call.sender,
                data: call.message,
                nonce: call.messageNonce,
                hash: keccak256(&payload),
                calldata: payload,
                height: block_number - self.block_offset,
            });
        }

        Ok(messages)
    }
}
