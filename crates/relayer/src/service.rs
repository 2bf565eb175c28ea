//! Full relayer service lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use eyre::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::balance::balance_monitor;
use crate::batch_index::BatchIndex;
use crate::cli::LogFormat;
use crate::config::RelayerConfig;
use crate::constants::{MAX_RECOMMENDED_POLL_INTERVAL, MIN_RECOMMENDED_POLL_INTERVAL};
use crate::contracts::{
    create_message_submitter, L1MessengerContractClient, StateCommitmentChainContractClient,
};
use crate::driver::{Driver, DriverConfig, DriverHandle, RelayerControl};
use crate::proof::ProofBuilder;
use crate::rpc::{L1Client, L1ClientConfig, L1ClientImpl, L2Client, L2ClientConfig, L2ClientImpl};
use crate::scanner::MessageScanner;

/// Runs the full relayer service lifecycle.
///
/// Steps:
/// 1. Initialise logging and metrics
/// 2. Create RPC clients (L1, L2) and contract clients
/// 3. Run sanity checks (chain ids, batch events, polling interval)
/// 4. Create the submitter and driver
/// 5. Start balance monitor (if metrics enabled)
/// 6. Start the driver loop
/// 7. Wait for SIGTERM or SIGINT
/// 8. Graceful shutdown in reverse order
pub async fn run(config: RelayerConfig) -> Result<()> {
    init_tracing(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Relayer starting");

    // ── 1. Global cancellation token and signal handler ──────────────────
    let cancel = CancellationToken::new();
    setup_signal_handler(cancel.clone());

    // ── 2. Metrics recorder and HTTP server (if enabled) ─────────────────
    if config.metrics.enabled {
        let addr = SocketAddr::new(config.metrics.addr, config.metrics.port);
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .expect("failed to install Prometheus recorder");
        info!(%addr, "Metrics server started");
    }

    // Record startup metrics (no-ops if no recorder installed).
    crate::metrics::record_startup_metrics(env!("CARGO_PKG_VERSION"));

    // ── 3. Create RPC clients ────────────────────────────────────────────
    let l1_config = L1ClientConfig::new(config.l1_rpc_url.clone())
        .with_timeout(config.rpc_timeout)
        .with_retry_config(config.retry.clone());
    let l1_client = Arc::new(L1ClientImpl::new(l1_config)?);
    info!(endpoint = %config.l1_rpc_url, "L1 client initialized");

    let l2_config = L2ClientConfig::new(config.l2_rpc_url.clone())
        .with_timeout(config.rpc_timeout)
        .with_retry_config(config.retry.clone());
    let l2_client = Arc::new(L2ClientImpl::new(l2_config)?);
    info!(endpoint = %config.l2_rpc_url, "L2 client initialized");

    // ── 4. Sanity checks ─────────────────────────────────────────────────
    // Both endpoints must answer before the loop starts; a dead endpoint is a
    // configuration error, not a transient one.
    let l1_chain_id = l1_client.chain_id().await?;
    let l2_chain_id = l2_client.chain_id().await?;
    info!(l1_chain_id, l2_chain_id, "Connected to both networks");

    if config.poll_interval < MIN_RECOMMENDED_POLL_INTERVAL {
        warn!(
            poll_interval = ?config.poll_interval,
            "Polling interval is shorter than recommended; this wastes RPC quota"
        );
    } else if config.poll_interval > MAX_RECOMMENDED_POLL_INTERVAL {
        warn!(
            poll_interval = ?config.poll_interval,
            "Polling interval is longer than recommended; relays will lag finalization"
        );
    }

    // ── 5. Create contract clients ───────────────────────────────────────
    let scc_client = Arc::new(StateCommitmentChainContractClient::new(
        config.state_commitment_chain_addr,
        config.l1_rpc_url.clone(),
    ));
    info!(address = %config.state_commitment_chain_addr, "StateCommitmentChain client initialized");

    let messenger_client = Arc::new(L1MessengerContractClient::new(
        config.l1_messenger_addr,
        config.l1_rpc_url.clone(),
    ));
    info!(address = %config.l1_messenger_addr, "L1 messenger client initialized");

    let mut batch_index =
        BatchIndex::new(Arc::clone(&l1_client), scc_client, config.state_commitment_chain_addr);
    if batch_index.state_batch_header(config.l2_starting_height).await?.is_none()
        && batch_index.known_batches() == 0
    {
        warn!("No state batches have been appended yet; waiting for the first batch");
    }

    // ── 6. Create submitter and driver ───────────────────────────────────
    let signer_address = config.signing.signer_address();
    let submitter = create_message_submitter(
        config.l1_rpc_url.clone(),
        config.l1_messenger_addr,
        config.signing.clone(),
        config.retry.clone(),
    )?;
    info!(signer = %signer_address, "Message submitter initialized");

    let driver_config = DriverConfig {
        poll_interval: config.poll_interval,
        starting_height: config.l2_starting_height,
    };
    let driver = Driver::new(
        driver_config,
        batch_index,
        MessageScanner::new(Arc::clone(&l2_client), config.l2_messenger_addr, config.block_offset),
        ProofBuilder::new(
            l2_client,
            config.l2_messenger_addr,
            config.message_passer_addr,
            config.block_offset,
        ),
        messenger_client,
        submitter,
        cancel.child_token(),
    );
    let driver_handle = DriverHandle::new(driver, cancel.clone());

    // ── 7. Start balance monitor (if metrics enabled) ────────────────────
    let balance_handle: Option<JoinHandle<()>> = if config.metrics.enabled {
        let handle =
            tokio::spawn(balance_monitor(Arc::clone(&l1_client), signer_address, cancel.clone()));
        info!(%signer_address, "Balance monitor started");
        Some(handle)
    } else {
        None
    };

    // ── 8. Start the driver loop ─────────────────────────────────────────
    driver_handle.start().await.map_err(|e| eyre::eyre!(e))?;

    info!(
        poll_interval = ?config.poll_interval,
        starting_height = config.l2_starting_height,
        "Service is ready"
    );

    // ── 9. Wait for shutdown signal ──────────────────────────────────────
    cancel.cancelled().await;
    info!("Shutdown signal received, stopping service...");

    // ── 10. Graceful shutdown (reverse initialisation order) ─────────────
    if driver_handle.is_running()
        && let Err(e) = driver_handle.stop().await
    {
        warn!(error = e, "Error stopping relayer driver");
    }

    if let Some(handle) = balance_handle {
        let _ = handle.await;
    }

    info!("Service stopped");
    Ok(())
}

/// Initializes the tracing subscriber from the configured verbosity.
fn init_tracing(config: &RelayerConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(config.log.level_filter().into())
        .from_env_lossy();

    match config.log.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(fmt::layer().json()).with(filter).init();
        }
        LogFormat::Full => {
            tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
        }
    }
}

/// Installs SIGTERM + SIGINT handlers that cancel the given token.
fn setup_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.expect("failed to listen for SIGINT");
                    info!("Received SIGINT");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.expect("failed to listen for SIGINT");
            info!("Received SIGINT");
        }

        cancel.cancel();
    });
}
