//! Index of appended state batches, keyed by the L2 heights they cover.
//!
//! The index caches every `StateBatchAppended` event it has seen and serves
//! lookups by binary search on `prevTotalElements`; a refresh scans only the
//! L1 blocks after the last event. Lookups are answered from the cache first,
//! so a height already covered costs no RPC round-trip.

use std::sync::Arc;

use alloy_primitives::Address;
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::SolEvent;
use tracing::debug;

use crate::contracts::bindings::IStateCommitmentChain::StateBatchAppended;
use crate::contracts::{decode_append_state_batch, StateCommitmentChain};
use crate::error::RelayerError;
use crate::rpc::L1Client;
use crate::types::StateBatchHeader;

/// Resolves L2 transaction heights to the state batches that contain them.
pub struct BatchIndex<L1, S> {
    l1: Arc<L1>,
    scc: Arc<S>,
    scc_address: Address,
    /// Cached headers, ordered by `prev_total_elements`.
    headers: Vec<StateBatchHeader>,
    /// First L1 block not yet scanned for append events.
    next_scan_block: u64,
}

impl<L1, S> std::fmt::Debug for BatchIndex<L1, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchIndex")
            .field("scc_address", &self.scc_address)
            .field("cached_batches", &self.headers.len())
            .field("next_scan_block", &self.next_scan_block)
            .finish()
    }
}

impl<L1, S> BatchIndex<L1, S>
where
    L1: L1Client,
    S: StateCommitmentChain,
{
    /// Creates a new index over the given state commitment chain.
    pub const fn new(l1: Arc<L1>, scc: Arc<S>, scc_address: Address) -> Self {
        Self { l1, scc, scc_address, headers: Vec::new(), next_scan_block: 0 }
    }

    /// Returns the header of the batch covering `height`, or `None` if no
    /// appended batch covers it yet.
    pub async fn state_batch_header(
        &mut self,
        height: u64,
    ) -> Result<Option<StateBatchHeader>, RelayerError> {
        if self.lookup(height).is_none() {
            self.refresh().await?;
        }
        Ok(self.lookup(height).cloned())
    }

    /// Returns true once the batch covering `height` exists and has exited its
    /// fraud-proof window. A height with no covering batch is not finalized.
    pub async fn is_transaction_finalized(&mut self, height: u64) -> Result<bool, RelayerError> {
        let Some(header) = self.state_batch_header(height).await? else {
            return Ok(false);
        };
        let inside = self.scc.inside_fraud_proof_window(&header).await?;
        Ok(!inside)
    }

    /// Number of batches currently cached.
    pub fn known_batches(&self) -> usize {
        self.headers.len()
    }

    fn lookup(&self, height: u64) -> Option<&StateBatchHeader> {
        let i = self.headers.partition_point(|h| h.prev_total_elements <= height);
        self.headers.get(i.checked_sub(1)?).filter(|h| h.covers(height))
    }

    /// Pulls any append events newer than the last scan into the cache.
    async fn refresh(&mut self) -> Result<(), RelayerError> {
        let filter = Filter::new()
            .address(self.scc_address)
            .event_signature(StateBatchAppended::SIGNATURE_HASH)
            .from_block(self.next_scan_block);
        let logs = self.l1.logs(&filter).await?;

        for log in logs {
            let event = StateBatchAppended::decode_log(&log.inner)
                .map_err(|e| RelayerError::Decode(format!("StateBatchAppended event: {e}")))?
                .data;
            let tx_hash = log.transaction_hash.ok_or_else(|| {
                RelayerError::Decode("StateBatchAppended log missing transaction hash".into())
            })?;

            let input = self.l1.transaction_input(tx_hash).await?;
            let (state_roots, _start_element) = decode_append_state_batch(&input)?;

            let batch_size: u64 = event.batchSize.try_into().map_err(|_| {
                RelayerError::Decode("StateBatchAppended batchSize overflows u64".into())
            })?;
            if state_roots.len() as u64 != batch_size {
                return Err(RelayerError::Decode(format!(
                    "batch {} claims {batch_size} roots but calldata carries {}",
                    event.batchIndex,
                    state_roots.len()
                )));
            }

            let header = StateBatchHeader {
                batch_index: event.batchIndex.try_into().map_err(|_| {
                    RelayerError::Decode("StateBatchAppended batchIndex overflows u64".into())
                })?,
                batch_root: event.batchRoot,
                batch_size,
                prev_total_elements: event.prevTotalElements.try_into().map_err(|_| {
                    RelayerError::Decode("StateBatchAppended prevTotalElements overflows u64".into())
                })?,
                extra_data: event.extraData,
                state_roots,
            };

            debug!(
                batch_index = header.batch_index,
                prev_total_elements = header.prev_total_elements,
                batch_size = header.batch_size,
                "Indexed appended state batch"
            );
            self.headers.push(header);

            if let Some(block_number) = log.block_number {
                self.next_scan_block = self.next_scan_block.max(block_number + 1);
            }
        }

        Ok(())
    }
}
