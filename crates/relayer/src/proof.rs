//! Proof construction for one sent message.
//!
//! A relay proof composes two independent layers: the Merkle proof of the
//! covering state root within its batch (see [`crate::merkle`]), and the
//! account/storage trie witnesses fetched from the L2 execution client via
//! `eth_getProof`.

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256};

use crate::error::RelayerError;
use crate::rpc::L2Client;
use crate::types::{MessageProof, SentMessage, StateBatchHeader};
use crate::{merkle, rpc::RpcError};

/// Computes the storage slot under which the L2 messenger records a sent
/// message in the message passer.
///
/// The messenger keys its `sentMessages` map (slot 0) by
/// `keccak256(calldata || messenger_address)`, so the slot is
/// `keccak256(keccak256(calldata || messenger) || bytes32(0))`.
pub fn message_storage_slot(calldata: &[u8], l2_messenger: Address) -> B256 {
    let mut preimage = Vec::with_capacity(calldata.len() + Address::len_bytes());
    preimage.extend_from_slice(calldata);
    preimage.extend_from_slice(l2_messenger.as_slice());
    let key = keccak256(&preimage);

    let mut slot_preimage = [0u8; 64];
    slot_preimage[..32].copy_from_slice(key.as_slice());
    keccak256(slot_preimage)
}

/// Builds [`MessageProof`]s for scanned messages.
pub struct ProofBuilder<L2> {
    l2: Arc<L2>,
    /// Address of the L2 cross-domain messenger (part of the slot preimage).
    l2_messenger: Address,
    /// Address of the L2-to-L1 message passer (the proven account).
    message_passer: Address,
    /// Offset between L2 block numbers and state-commitment element indices.
    block_offset: u64,
}

impl<L2> std::fmt::Debug for ProofBuilder<L2> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofBuilder")
            .field("l2_messenger", &self.l2_messenger)
            .field("message_passer", &self.message_passer)
            .field("block_offset", &self.block_offset)
            .finish()
    }
}

impl<L2: L2Client> ProofBuilder<L2> {
    /// Creates a new proof builder.
    pub const fn new(
        l2: Arc<L2>,
        l2_messenger: Address,
        message_passer: Address,
        block_offset: u64,
    ) -> Self {
        Self { l2, l2_messenger, message_passer, block_offset }
    }

    /// Assembles the full proof for `message` against its covering batch.
    ///
    /// The reconstructed Merkle root is checked against the batch's committed
    /// root before the proof is returned; a mismatch means the decoded batch
    /// would never verify on L1.
    pub async fn message_proof(
        &self,
        message: &SentMessage,
        batch: &StateBatchHeader,
    ) -> Result<MessageProof, RelayerError> {
        let slot = message_storage_slot(&message.calldata, self.l2_messenger);
        let response = self
            .l2
            .proof(self.message_passer, slot, message.height + self.block_offset)
            .await?;
        let storage_proof = response.storage_proof.first().ok_or_else(|| {
            RpcError::ProofNotFound(format!("no storage proof for slot {slot}"))
        })?;

        let state_root = batch.state_root_at(message.height).ok_or_else(|| {
            RelayerError::Proof(format!(
                "batch {} does not cover L2 height {}",
                batch.batch_index, message.height
            ))
        })?;

        let reconstructed = merkle::compute_root(&batch.state_roots);
        if reconstructed != batch.batch_root {
            return Err(RelayerError::Proof(format!(
                "reconstructed root {reconstructed} does not match committed batch root {} for batch {}",
                batch.batch_root, batch.batch_index
            )));
        }

        let index = message.height - batch.prev_total_elements;
        let siblings = merkle::inclusion_proof(&batch.state_roots, index).ok_or_else(|| {
            RelayerError::Proof(format!("state root index {index} out of range"))
        })?;

        Ok(MessageProof {
            state_root,
            batch_header: batch.clone(),
            index,
            siblings,
            state_trie_witness: Bytes::from(alloy_rlp::encode(&response.account_proof)),
            storage_trie_witness: Bytes::from(alloy_rlp::encode(&storage_proof.proof)),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;
    use crate::test_utils::{test_batch, MockL2};

    const L2_MESSENGER: Address = Address::repeat_byte(0x4D);
    const MESSAGE_PASSER: Address = Address::repeat_byte(0x4A);

    fn test_message(height: u64) -> SentMessage {
        let calldata = Bytes::from(vec![0xC0; 100]);
        SentMessage {
            target: Address::repeat_byte(0x04),
            sender: Address::repeat_byte(0x42),
            data: Bytes::from(vec![0x12]),
            nonce: U256::ZERO,
            hash: keccak256(&calldata),
            calldata,
            height,
        }
    }

    fn builder(l2: MockL2, block_offset: u64) -> ProofBuilder<MockL2> {
        ProofBuilder::new(Arc::new(l2), L2_MESSENGER, MESSAGE_PASSER, block_offset)
    }

    #[test]
    fn test_storage_slot_matches_messenger_layout() {
        let calldata = vec![0xAB; 36];
        let slot = message_storage_slot(&calldata, L2_MESSENGER);

        let mut preimage = calldata.clone();
        preimage.extend_from_slice(L2_MESSENGER.as_slice());
        let mut outer = [0u8; 64];
        outer[..32].copy_from_slice(keccak256(&preimage).as_slice());
        assert_eq!(slot, keccak256(outer));
    }

    #[test]
    fn test_storage_slot_depends_on_calldata_and_messenger() {
        let slot = message_storage_slot(&[0x01], L2_MESSENGER);
        assert_ne!(slot, message_storage_slot(&[0x02], L2_MESSENGER));
        assert_ne!(slot, message_storage_slot(&[0x01], Address::repeat_byte(0x99)));
    }

    #[tokio::test]
    async fn test_builds_proof_with_expected_shape() {
        let batch = test_batch(0, 5, 4);
        let l2 = MockL2::with_proof_nodes(
            vec![Bytes::from(vec![0x0A]), Bytes::from(vec![0x0B])],
            vec![Bytes::from(vec![0x0C])],
        );
        let proof = builder(l2, 0).message_proof(&test_message(7), &batch).await.unwrap();

        assert_eq!(proof.index, 2);
        assert_eq!(proof.state_root, batch.state_roots[2]);
        assert_eq!(proof.siblings.len(), 2);
        assert_eq!(proof.batch_header, batch);
        assert_eq!(
            proof.state_trie_witness,
            Bytes::from(alloy_rlp::encode(&vec![
                Bytes::from(vec![0x0A]),
                Bytes::from(vec![0x0B]),
            ]))
        );
        assert_eq!(
            proof.storage_trie_witness,
            Bytes::from(alloy_rlp::encode(&vec![Bytes::from(vec![0x0C])]))
        );

        // The proof must fold back to the committed batch root.
        assert_eq!(
            merkle::fold_proof(keccak256(proof.state_root), proof.index, &proof.siblings),
            batch.batch_root
        );
    }

    #[tokio::test]
    async fn test_requests_proof_at_offset_block() {
        let batch = test_batch(0, 0, 3);
        let l2 = MockL2::with_proof_nodes(vec![Bytes::from(vec![0x0A])], vec![]);
        let queried = l2.proof_blocks.clone();

        builder(l2, 5).message_proof(&test_message(1), &batch).await.unwrap();
        assert_eq!(*queried.lock().unwrap(), vec![6]);
    }

    #[tokio::test]
    async fn test_rejects_uncovered_height() {
        let batch = test_batch(0, 0, 3);
        let l2 = MockL2::with_proof_nodes(vec![Bytes::from(vec![0x0A])], vec![]);

        let err = builder(l2, 0).message_proof(&test_message(3), &batch).await.unwrap_err();
        assert!(matches!(err, RelayerError::Proof(_)));
    }

    #[tokio::test]
    async fn test_rejects_corrupted_batch_root() {
        let mut batch = test_batch(0, 0, 3);
        batch.batch_root = B256::repeat_byte(0xEE);
        let l2 = MockL2::with_proof_nodes(vec![Bytes::from(vec![0x0A])], vec![]);

        let err = builder(l2, 0).message_proof(&test_message(1), &batch).await.unwrap_err();
        assert!(matches!(err, RelayerError::Proof(_)));
    }
}
