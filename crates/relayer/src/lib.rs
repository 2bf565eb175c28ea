//! Message relayer for legacy OP Stack chains.
//!
//! Watches the L2 cross-domain messenger for sent messages, waits until the
//! covering state batch has exited its fraud-proof window on L1, assembles the
//! two-level inclusion proof (batch Merkle proof plus account/storage trie
//! witnesses), and submits the relay transaction to the L1 messenger.
//!
//! This crate provides:
//! - Contract bindings and clients for the state commitment chain and the
//!   cross-domain messengers
//! - RPC clients for the L1 and L2 endpoints
//! - The batch index, message scanner, and proof builder
//! - The driver loop coordinating finalization, dedup, and submission

#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![deny(unused_must_use)]
#![deny(rust_2018_idioms)]

pub mod balance;
pub mod batch_index;
pub mod cli;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod driver;
pub mod error;
pub mod merkle;
pub mod metrics;
pub mod proof;
pub mod rpc;
pub mod scanner;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cli::Cli;
pub use config::RelayerConfig;
pub use error::{RelayerError, RelayerResult};
pub use types::{MessageProof, SentMessage, StateBatchHeader};
