//! Configuration types and validation for the relayer.

use std::{net::IpAddr, time::Duration};

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use backon::ExponentialBuilder;
use thiserror::Error;
use url::Url;

use crate::cli::{Cli, LogArgs, MetricsArgs};
use crate::constants::{
    DEFAULT_RETRY_INITIAL_DELAY, DEFAULT_RETRY_MAX_DELAY, DEFAULT_RPC_MAX_RETRIES,
};

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid URL format.
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl {
        /// The field name that contains the invalid URL.
        field: &'static str,
        /// The reason the URL is invalid.
        reason: String,
    },
    /// A field value is out of the allowed range.
    #[error("{field} must be {constraint}, got {value}")]
    OutOfRange {
        /// The field name that is out of range.
        field: &'static str,
        /// The constraint description.
        constraint: &'static str,
        /// The actual value.
        value: String,
    },
    /// Invalid signing configuration.
    #[error("invalid signing config: {0}")]
    Signing(String),
    /// Invalid metrics configuration.
    #[error("invalid metrics config: {0}")]
    Metrics(String),
}

/// Signing configuration for relay submissions.
#[derive(Clone)]
pub enum SigningConfig {
    /// Local signing with an in-process private key (development).
    Local {
        /// The private key signer.
        signer: PrivateKeySigner,
    },
    /// Remote signing via a signer sidecar JSON-RPC endpoint (production).
    Remote {
        /// URL of the signer sidecar.
        endpoint: Url,
        /// Address of the signer account.
        address: Address,
    },
}

impl SigningConfig {
    /// The L1 address transactions will be sent from.
    pub fn signer_address(&self) -> Address {
        match self {
            Self::Local { signer } => signer.address(),
            Self::Remote { address, .. } => *address,
        }
    }
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { signer } => {
                f.debug_struct("Local").field("address", &signer.address()).finish()
            }
            Self::Remote { endpoint, address } => f
                .debug_struct("Remote")
                .field("endpoint", &endpoint.as_str())
                .field("address", address)
                .finish(),
        }
    }
}

/// Retry configuration for RPC operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,
    /// Initial delay for exponential backoff.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RPC_MAX_RETRIES,
            initial_delay: DEFAULT_RETRY_INITIAL_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryConfig {
    /// Creates a `backon` [`ExponentialBuilder`] from this configuration.
    pub fn to_backoff_builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts as usize)
            .with_jitter()
    }
}

/// Validated metrics server configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Metrics server bind address.
    pub addr: IpAddr,
    /// Metrics server port.
    pub port: u16,
}

impl From<MetricsArgs> for MetricsConfig {
    fn from(args: MetricsArgs) -> Self {
        Self { enabled: args.enabled, addr: args.addr, port: args.port }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: false, addr: "0.0.0.0".parse().unwrap(), port: 7300 }
    }
}

/// Validated relayer configuration.
#[derive(Debug, Clone)]
pub struct RelayerConfig {
    /// URL of the L1 Ethereum RPC endpoint.
    pub l1_rpc_url: Url,
    /// URL of the L2 RPC endpoint.
    pub l2_rpc_url: Url,
    /// Address of the state commitment chain contract on L1.
    pub state_commitment_chain_addr: Address,
    /// Address of the cross-domain messenger contract on L1.
    pub l1_messenger_addr: Address,
    /// Address of the cross-domain messenger contract on L2.
    pub l2_messenger_addr: Address,
    /// Address of the L2-to-L1 message passer predeploy.
    pub message_passer_addr: Address,
    /// L2 height to start relaying from.
    pub l2_starting_height: u64,
    /// Offset between L2 block numbers and state-commitment element indices.
    pub block_offset: u64,
    /// Polling interval between ticks.
    pub poll_interval: Duration,
    /// RPC request timeout.
    pub rpc_timeout: Duration,
    /// Retry configuration for RPC operations.
    pub retry: RetryConfig,
    /// Signing configuration for relay submissions.
    pub signing: SigningConfig,
    /// Logging configuration.
    pub log: LogArgs,
    /// Metrics server configuration.
    pub metrics: MetricsConfig,
}

impl RelayerConfig {
    /// Create a validated configuration from CLI arguments.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        validate_url(&cli.relayer.l1_rpc_url, "l1-rpc-url")?;
        validate_url(&cli.relayer.l2_rpc_url, "l2-rpc-url")?;

        if cli.relayer.poll_interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "poll-interval",
                constraint: "greater than 0",
                value: "0".to_string(),
            });
        }

        if cli.metrics.enabled && cli.metrics.port == 0 {
            return Err(ConfigError::Metrics(
                "metrics port must be non-zero when metrics are enabled".to_string(),
            ));
        }

        let signing = match (
            &cli.relayer.private_key,
            &cli.relayer.signer_endpoint,
            &cli.relayer.signer_address,
        ) {
            (Some(key), None, None) => {
                let signer = key.parse::<PrivateKeySigner>().map_err(|e| {
                    ConfigError::Signing(format!("failed to parse private key: {e}"))
                })?;
                SigningConfig::Local { signer }
            }
            (None, Some(endpoint), Some(address)) => {
                validate_url(endpoint, "signer-endpoint")?;
                SigningConfig::Remote { endpoint: endpoint.clone(), address: *address }
            }
            (None, None, None) => {
                return Err(ConfigError::Signing(
                    "either --private-key or --signer-endpoint with --signer-address is required"
                        .to_string(),
                ));
            }
            _ => {
                return Err(ConfigError::Signing(
                    "--private-key is mutually exclusive with --signer-endpoint/--signer-address, \
                     and the latter two must be given together"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            l1_rpc_url: cli.relayer.l1_rpc_url,
            l2_rpc_url: cli.relayer.l2_rpc_url,
            state_commitment_chain_addr: cli.relayer.state_commitment_chain_addr,
            l1_messenger_addr: cli.relayer.l1_messenger_addr,
            l2_messenger_addr: cli.relayer.l2_messenger_addr,
            message_passer_addr: cli.relayer.message_passer_addr,
            l2_starting_height: cli.relayer.l2_starting_height,
            block_offset: cli.relayer.block_offset,
            poll_interval: cli.relayer.poll_interval,
            rpc_timeout: cli.relayer.rpc_timeout,
            retry: RetryConfig {
                max_attempts: cli.relayer.rpc_max_retries,
                initial_delay: cli.relayer.rpc_retry_initial_delay,
                max_delay: cli.relayer.rpc_retry_max_delay,
            },
            signing,
            log: cli.logging,
            metrics: MetricsConfig::from(cli.metrics),
        })
    }
}

/// Validate that a URL has a scheme and host.
fn validate_url(url: &Url, field: &'static str) -> Result<(), ConfigError> {
    if url.scheme().is_empty() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing scheme".to_string() });
    }

    if url.host().is_none() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing host".to_string() });
    }

    Ok(())
}
