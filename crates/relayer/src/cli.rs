//! CLI argument definitions for the relayer.

use std::{net::IpAddr, time::Duration};

use alloy_primitives::Address;
use clap::{ArgAction, Parser, ValueEnum};
use url::Url;

/// Message relayer - finalizes and relays L2 to L1 cross-domain messages.
#[derive(Debug, Clone, Parser)]
#[command(name = "message-relayer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Relayer configuration arguments.
    #[command(flatten)]
    pub relayer: RelayerArgs,

    /// Logging configuration arguments.
    #[command(flatten)]
    pub logging: LogArgs,

    /// Metrics configuration arguments.
    #[command(flatten)]
    pub metrics: MetricsArgs,
}

/// Core relayer configuration arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Relayer")]
pub struct RelayerArgs {
    /// URL of the L1 Ethereum RPC endpoint.
    #[arg(long = "l1-rpc-url", env = "RELAYER_L1_RPC_URL", value_parser = parse_url)]
    pub l1_rpc_url: Url,

    /// URL of the L2 RPC endpoint.
    #[arg(long = "l2-rpc-url", env = "RELAYER_L2_RPC_URL", value_parser = parse_url)]
    pub l2_rpc_url: Url,

    /// Address of the state commitment chain contract on L1.
    #[arg(
        long = "state-commitment-chain-addr",
        env = "RELAYER_STATE_COMMITMENT_CHAIN_ADDR",
        value_parser = parse_address
    )]
    pub state_commitment_chain_addr: Address,

    /// Address of the cross-domain messenger contract on L1.
    #[arg(
        long = "l1-messenger-addr",
        env = "RELAYER_L1_MESSENGER_ADDR",
        value_parser = parse_address
    )]
    pub l1_messenger_addr: Address,

    /// Address of the cross-domain messenger contract on L2.
    #[arg(
        long = "l2-messenger-addr",
        env = "RELAYER_L2_MESSENGER_ADDR",
        value_parser = parse_address
    )]
    pub l2_messenger_addr: Address,

    /// Address of the L2-to-L1 message passer predeploy.
    #[arg(
        long = "message-passer-addr",
        env = "RELAYER_MESSAGE_PASSER_ADDR",
        value_parser = parse_address
    )]
    pub message_passer_addr: Address,

    /// L2 height to start relaying from.
    #[arg(long = "l2-starting-height", env = "RELAYER_L2_STARTING_HEIGHT", default_value = "0")]
    pub l2_starting_height: u64,

    /// Offset between L2 block numbers and state-commitment element indices
    /// (the L2 genesis offset).
    #[arg(long = "block-offset", env = "RELAYER_BLOCK_OFFSET", default_value = "0")]
    pub block_offset: u64,

    /// Polling interval between ticks (e.g., "5s", "1m").
    #[arg(
        long = "poll-interval",
        env = "RELAYER_POLL_INTERVAL",
        default_value = "5s",
        value_parser = parse_duration
    )]
    pub poll_interval: Duration,

    /// RPC request timeout (e.g., "30s", "1m").
    #[arg(
        long = "rpc-timeout",
        env = "RELAYER_RPC_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration
    )]
    pub rpc_timeout: Duration,

    /// Maximum number of retry attempts for RPC operations.
    #[arg(long = "rpc-max-retries", env = "RELAYER_RPC_MAX_RETRIES", default_value = "5")]
    pub rpc_max_retries: u32,

    /// Initial delay for exponential backoff (e.g., "100ms", "1s").
    #[arg(
        long = "rpc-retry-initial-delay",
        env = "RELAYER_RPC_RETRY_INITIAL_DELAY",
        default_value = "100ms",
        value_parser = parse_duration
    )]
    pub rpc_retry_initial_delay: Duration,

    /// Maximum delay between retry attempts (e.g., "10s", "1m").
    #[arg(
        long = "rpc-retry-max-delay",
        env = "RELAYER_RPC_RETRY_MAX_DELAY",
        default_value = "10s",
        value_parser = parse_duration
    )]
    pub rpc_retry_max_delay: Duration,

    /// Private key for local transaction signing (hex-encoded, for development).
    /// Mutually exclusive with --signer-endpoint/--signer-address.
    #[arg(long = "private-key", env = "RELAYER_PRIVATE_KEY")]
    pub private_key: Option<String>,

    /// URL of the signer sidecar JSON-RPC endpoint (for production).
    /// Must be used together with --signer-address.
    #[arg(long = "signer-endpoint", env = "RELAYER_SIGNER_ENDPOINT", value_parser = parse_url)]
    pub signer_endpoint: Option<Url>,

    /// Address of the signer account on the signer sidecar.
    /// Must be used together with --signer-endpoint.
    #[arg(long = "signer-address", env = "RELAYER_SIGNER_ADDRESS", value_parser = parse_address)]
    pub signer_address: Option<Address>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Full format with timestamp, level, and target.
    #[default]
    Full,
    /// JSON format for structured logging.
    Json,
}

/// Logging configuration arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Increase logging verbosity (1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5=TRACE).
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        default_value = "3",
        env = "RELAYER_LOG_LEVEL",
        global = true
    )]
    pub level: u8,

    /// Log output format.
    #[arg(long = "log-format", default_value = "full", env = "RELAYER_LOG_FORMAT", global = true)]
    pub format: LogFormat,
}

impl LogArgs {
    /// Converts the verbosity count into a tracing level filter.
    pub const fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self.level {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Metrics server configuration arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Metrics")]
pub struct MetricsArgs {
    /// Enable metrics server.
    #[arg(
        id = "metrics_enabled",
        long = "metrics.enabled",
        env = "RELAYER_METRICS_ENABLED",
        default_value = "false"
    )]
    pub enabled: bool,

    /// Metrics server bind address.
    #[arg(
        id = "metrics_addr",
        long = "metrics.addr",
        env = "RELAYER_METRICS_ADDR",
        default_value = "0.0.0.0"
    )]
    pub addr: IpAddr,

    /// Metrics server port.
    #[arg(
        id = "metrics_port",
        long = "metrics.port",
        env = "RELAYER_METRICS_PORT",
        default_value = "7300"
    )]
    pub port: u16,
}

/// Parse a duration from a human-readable string.
fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Parse a URL string.
fn parse_url(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s)
}

/// Parse an Ethereum address from hex string.
fn parse_address(s: &str) -> Result<Address, alloy_primitives::hex::FromHexError> {
    s.parse()
}
