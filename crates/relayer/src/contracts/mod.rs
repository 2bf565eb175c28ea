//! Contract bindings and clients.
//!
//! One async trait per contract so the driver can be tested against mocks;
//! one concrete client per trait, each owning its own provider handle.

pub mod bindings;

mod l1_messenger;
pub use l1_messenger::{L1MessengerClient, L1MessengerContractClient};

mod state_commitment_chain;
pub use state_commitment_chain::{
    decode_append_state_batch, StateCommitmentChain, StateCommitmentChainContractClient,
};

mod submitter;
pub use submitter::{
    create_message_submitter, encode_relay_calldata, LocalMessageSubmitter, MessageSubmitter,
    RemoteMessageSubmitter,
};
