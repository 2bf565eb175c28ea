//! RPC clients for the L1 and L2 endpoints.
//!
//! Each client is an async trait plus one HTTP implementation, so every
//! consumer can be exercised against mocks. The implementations wrap an alloy
//! [`RootProvider`](alloy_provider::RootProvider) with a request timeout and
//! retry transient failures with exponential backoff.

mod error;
pub use error::{RpcError, RpcResult};

mod l1_client;
pub use l1_client::{L1ClientConfig, L1ClientImpl};

mod l2_client;
pub use l2_client::{L2ClientConfig, L2ClientImpl};

mod traits;
pub use traits::{L1Client, L2Client};
