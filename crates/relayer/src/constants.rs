//! Constants used throughout the relayer.

use std::time::Duration;

/// Gas limit for every `relayMessage` transaction. Fixed; never estimated.
pub const RELAY_GAS_LIMIT: u64 = 2_000_000;

/// Default polling interval between driver ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Polling intervals below this are warned about at startup.
pub const MIN_RECOMMENDED_POLL_INTERVAL: Duration = Duration::from_millis(15_000);

/// Polling intervals above this are warned about at startup.
pub const MAX_RECOMMENDED_POLL_INTERVAL: Duration = Duration::from_millis(3_600_000);

/// Default maximum number of retry attempts for RPC operations.
pub const DEFAULT_RPC_MAX_RETRIES: u32 = 5;

/// Default initial delay for exponential backoff.
pub const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default maximum delay between retry attempts.
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default RPC request timeout.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);
