//! Core value types shared across the relayer.

use alloy_primitives::{Address, Bytes, B256, U256};

/// One state batch appended to the state commitment chain on L1.
///
/// A batch commits one state root per L2 block for the contiguous height range
/// `[prev_total_elements, prev_total_elements + batch_size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBatchHeader {
    /// Sequential index of the batch in the commitment chain.
    pub batch_index: u64,
    /// Merkle root over the batch's state roots.
    pub batch_root: B256,
    /// Number of state roots in the batch.
    pub batch_size: u64,
    /// L2 height of the batch's first element.
    pub prev_total_elements: u64,
    /// Opaque extra data carried by the append.
    pub extra_data: Bytes,
    /// The state roots committed by the batch, decoded from the appending
    /// transaction's calldata. `state_roots[i]` is the root for L2 height
    /// `prev_total_elements + i`.
    pub state_roots: Vec<B256>,
}

impl StateBatchHeader {
    /// Returns true if the batch covers the given L2 height.
    pub const fn covers(&self, height: u64) -> bool {
        height >= self.prev_total_elements && height < self.prev_total_elements + self.batch_size
    }

    /// The first L2 height after this batch.
    pub const fn next_height(&self) -> u64 {
        self.prev_total_elements + self.batch_size
    }

    /// The state root committed for the given L2 height, if covered.
    pub fn state_root_at(&self, height: u64) -> Option<B256> {
        self.covers(height)
            .then(|| self.state_roots.get((height - self.prev_total_elements) as usize).copied())
            .flatten()
    }
}

/// One cross-domain message emitted by the L2 messenger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// L1 contract the message will be delivered to.
    pub target: Address,
    /// L2 sender recorded by the messenger.
    pub sender: Address,
    /// Message body, executed on the target after relay.
    pub data: Bytes,
    /// Messenger-assigned nonce.
    pub nonce: U256,
    /// The full `relayMessage` calldata exactly as emitted in the event.
    pub calldata: Bytes,
    /// keccak-256 of `calldata`; the key of the L1 messenger's
    /// `successfulMessages` set.
    pub hash: B256,
    /// L2 height at which the message was sent, in state-commitment element
    /// space (event block number minus the configured block offset).
    pub height: u64,
}

/// Proof bundle submitted alongside a relay.
///
/// Combines the Merkle proof of the covering state root within its batch with
/// the account and storage trie witnesses from L2 execution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageProof {
    /// State root covering the message's L2 height.
    pub state_root: B256,
    /// The batch that committed `state_root`.
    pub batch_header: StateBatchHeader,
    /// Position of `state_root` within the batch's padded Merkle tree.
    pub index: u64,
    /// Sibling hashes, bottom-up.
    pub siblings: Vec<B256>,
    /// RLP-encoded account-trie proof nodes for the message passer.
    pub state_trie_witness: Bytes,
    /// RLP-encoded storage-trie proof nodes for the message slot.
    pub storage_trie_witness: Bytes,
}
