//! Prometheus metric names and helpers.

/// Gauge: relayer build info, labelled with `version`.
pub const INFO: &str = "message_relayer_info";

/// Gauge: relayer is running (set to 1 at startup).
pub const UP: &str = "message_relayer_up";

/// Counter: total messages relayed to L1 by this process.
pub const MESSAGES_RELAYED_TOTAL: &str = "message_relayer_messages_relayed_total";

/// Counter: total messages skipped because they were already relayed.
pub const MESSAGES_ALREADY_RELAYED_TOTAL: &str = "message_relayer_messages_already_relayed_total";

/// Counter: total failed relay submissions.
pub const RELAY_FAILURES_TOTAL: &str = "message_relayer_relay_failures_total";

/// Counter: total failed proof constructions.
pub const PROOF_FAILURES_TOTAL: &str = "message_relayer_proof_failures_total";

/// Gauge: lowest L2 height whose messages may still be pending.
pub const LAST_FINALIZED_HEIGHT: &str = "message_relayer_last_finalized_height";

/// Gauge: first L2 height not yet known to be finalized.
pub const NEXT_UNFINALIZED_HEIGHT: &str = "message_relayer_next_unfinalized_height";

/// Gauge: relay signer account balance in wei.
pub const ACCOUNT_BALANCE_WEI: &str = "message_relayer_account_balance_wei";

/// Label key for version.
pub const LABEL_VERSION: &str = "version";

/// Records startup metrics (INFO gauge with version label, UP gauge set to 1).
pub fn record_startup_metrics(version: &str) {
    metrics::gauge!(INFO, LABEL_VERSION => version.to_string()).set(1.0);
    metrics::gauge!(UP).set(1.0);
}
