//! `sol!` bindings for the contracts the relayer touches.
//!
//! The batch header and proof structs are shared between the state commitment
//! chain (which hands them to `insideFraudProofWindow`) and the L1 messenger
//! (which takes them in `relayMessage`), so all bindings live in one block.

use alloy_sol_types::sol;

use crate::types::{MessageProof, StateBatchHeader};

sol! {
    /// Batch header as the state commitment chain ABI encodes it.
    ///
    /// Unlike [`StateBatchHeader`], this carries no state-root list; the list
    /// only ever travels in `appendStateBatch` calldata.
    #[derive(Debug)]
    struct BatchHeader {
        uint256 batchIndex;
        bytes32 batchRoot;
        uint256 batchSize;
        uint256 prevTotalElements;
        bytes extraData;
    }

    /// Merkle inclusion proof of one state root within its batch.
    #[derive(Debug)]
    struct StateRootProof {
        uint256 index;
        bytes32[] siblings;
    }

    /// The proof bundle the L1 messenger verifies before executing a relay.
    #[derive(Debug)]
    struct MessageInclusionProof {
        bytes32 stateRoot;
        BatchHeader stateRootBatchHeader;
        StateRootProof stateRootProof;
        bytes stateTrieWitness;
        bytes storageTrieWitness;
    }

    /// State commitment chain: one state root per L2 block, appended in batches.
    #[sol(rpc)]
    interface IStateCommitmentChain {
        /// Emitted once per appended batch.
        event StateBatchAppended(
            uint256 indexed batchIndex,
            bytes32 batchRoot,
            uint256 batchSize,
            uint256 prevTotalElements,
            bytes extraData
        );

        /// Appends a batch of state roots. Decoded from calldata, never called.
        function appendStateBatch(bytes32[] calldata stateRoots, uint256 startElement) external;

        /// Returns true while the batch can still be challenged.
        function insideFraudProofWindow(BatchHeader memory batchHeader)
            external view returns (bool inside);
    }

    /// L1 cross-domain messenger: the relay target.
    #[sol(rpc)]
    interface IL1CrossDomainMessenger {
        /// Returns true if the message with the given hash has been relayed.
        function successfulMessages(bytes32 messageHash) external view returns (bool);

        /// Relays an L2-to-L1 message, verifying the inclusion proof.
        function relayMessage(
            address target,
            address sender,
            bytes memory message,
            uint256 messageNonce,
            MessageInclusionProof memory proof
        ) external;
    }

    /// L2 cross-domain messenger: only its event is consumed.
    interface IL2CrossDomainMessenger {
        /// Emitted per sent message; the payload is the full `relayMessage`
        /// calldata for the destination messenger.
        event SentMessage(bytes message);
    }

    /// Wire form of a cross-domain message: the four-argument `relayMessage`
    /// calldata the L2 messenger emits and the L1 side ultimately executes.
    interface ICrossDomainMessage {
        /// Encode/decode-only mirror of the relay entrypoint, without the proof.
        function relayMessage(
            address target,
            address sender,
            bytes memory message,
            uint256 messageNonce
        ) external;
    }
}

impl From<&StateBatchHeader> for BatchHeader {
    fn from(header: &StateBatchHeader) -> Self {
        Self {
            batchIndex: alloy_primitives::U256::from(header.batch_index),
            batchRoot: header.batch_root,
            batchSize: alloy_primitives::U256::from(header.batch_size),
            prevTotalElements: alloy_primitives::U256::from(header.prev_total_elements),
            extraData: header.extra_data.clone(),
        }
    }
}

impl From<&MessageProof> for MessageInclusionProof {
    fn from(proof: &MessageProof) -> Self {
        Self {
            stateRoot: proof.state_root,
            stateRootBatchHeader: BatchHeader::from(&proof.batch_header),
            stateRootProof: StateRootProof {
                index: alloy_primitives::U256::from(proof.index),
                siblings: proof.siblings.clone(),
            },
            stateTrieWitness: proof.state_trie_witness.clone(),
            storageTrieWitness: proof.storage_trie_witness.clone(),
        }
    }
}
