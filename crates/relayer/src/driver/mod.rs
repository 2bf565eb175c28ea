//! Driver loop for the relayer.
//!
//! The driver owns the finalization cursor and coordinates the batch index,
//! message scanner, proof builder, and submitter to relay each finalized
//! message exactly once.
//!
//! # Lifecycle control
//!
//! The [`Driver`] itself runs a single polling loop via [`Driver::run`].
//! [`DriverHandle`] wraps a `Driver` and exposes start/stop/is-running
//! semantics through the [`RelayerControl`] trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch_index::BatchIndex;
use crate::constants::DEFAULT_POLL_INTERVAL;
use crate::contracts::{L1MessengerClient, MessageSubmitter, StateCommitmentChain};
use crate::error::RelayerError;
use crate::metrics as relayer_metrics;
use crate::proof::ProofBuilder;
use crate::rpc::{L1Client, L2Client};
use crate::scanner::MessageScanner;
use crate::types::SentMessage;

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Polling interval between ticks.
    pub poll_interval: Duration,
    /// L2 height the cursor starts from.
    pub starting_height: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, starting_height: 0 }
    }
}

/// The finalization cursor.
///
/// `last_finalized` is the lowest height whose messages may still be pending;
/// `next_unfinalized` is the first height not yet known to be finalized. Both
/// only ever advance, and `last_finalized <= next_unfinalized` always holds.
/// `last_finalized` catches up to `next_unfinalized` only once every message
/// in between has been relayed or deduplicated, so a failed submission is
/// rescanned next tick and absorbed by the dedup check.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    last_finalized: u64,
    next_unfinalized: u64,
}

/// The main driver that coordinates message relaying.
pub struct Driver<L1, L2, S, M>
where
    L1: L1Client,
    L2: L2Client,
    S: StateCommitmentChain,
    M: L1MessengerClient,
{
    config: DriverConfig,
    batch_index: BatchIndex<L1, S>,
    scanner: MessageScanner<L2>,
    proof_builder: ProofBuilder<L2>,
    messenger: Arc<M>,
    submitter: Arc<dyn MessageSubmitter>,
    cancel: CancellationToken,
    cursor: Cursor,
}

impl<L1, L2, S, M> std::fmt::Debug for Driver<L1, L2, S, M>
where
    L1: L1Client,
    L2: L2Client,
    S: StateCommitmentChain,
    M: L1MessengerClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<L1, L2, S, M> Driver<L1, L2, S, M>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    S: StateCommitmentChain + 'static,
    M: L1MessengerClient + 'static,
{
    /// Creates a new driver with the given configuration.
    pub fn new(
        config: DriverConfig,
        batch_index: BatchIndex<L1, S>,
        scanner: MessageScanner<L2>,
        proof_builder: ProofBuilder<L2>,
        messenger: Arc<M>,
        submitter: Arc<dyn MessageSubmitter>,
        cancel: CancellationToken,
    ) -> Self {
        let cursor = Cursor {
            last_finalized: config.starting_height,
            next_unfinalized: config.starting_height,
        };
        Self { config, batch_index, scanner, proof_builder, messenger, submitter, cancel, cursor }
    }

    /// Replaces the cancellation token.
    ///
    /// Used by [`DriverHandle`] to create fresh sessions when the driver is
    /// restarted.
    pub(crate) fn set_cancel(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    /// Starts the driver loop.
    pub async fn run(&mut self) -> Result<()> {
        info!(starting_height = self.config.starting_height, "Starting relayer driver loop");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("Driver received shutdown signal");
                    break;
                }
                () = sleep(self.config.poll_interval) => {
                    if let Err(e) = self.step().await {
                        warn!(error = %e, "Driver step failed");
                    }
                }
            }
        }

        info!("Driver loop stopped");
        Ok(())
    }

    /// Performs a single driver step (one tick of the loop).
    async fn step(&mut self) -> Result<(), RelayerError> {
        self.advance_cursor().await?;

        let Cursor { last_finalized, next_unfinalized } = self.cursor;
        if last_finalized == next_unfinalized {
            debug!(height = next_unfinalized, "Did not find any newly finalized transactions");
            return Ok(());
        }

        metrics::gauge!(relayer_metrics::LAST_FINALIZED_HEIGHT).set(last_finalized as f64);
        metrics::gauge!(relayer_metrics::NEXT_UNFINALIZED_HEIGHT).set(next_unfinalized as f64);

        let messages =
            self.scanner.sent_messages(last_finalized, next_unfinalized - 1).await?;
        debug!(
            from = last_finalized,
            to = next_unfinalized,
            count = messages.len(),
            "Scanned finalized height range for sent messages"
        );

        let mut window_complete = true;
        for message in messages {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if !self.relay_one(&message).await {
                window_complete = false;
            }
        }

        // Only close the window once everything in it has been relayed or
        // deduplicated; a partial window is rescanned next tick.
        if window_complete {
            self.cursor.last_finalized = next_unfinalized;
        }

        Ok(())
    }

    /// Jumps the cursor over every newly finalized batch, one batch at a time.
    async fn advance_cursor(&mut self) -> Result<(), RelayerError> {
        while self.batch_index.is_transaction_finalized(self.cursor.next_unfinalized).await? {
            let height = self.cursor.next_unfinalized;
            let batch = self
                .batch_index
                .state_batch_header(height)
                .await?
                .ok_or(RelayerError::MissingBatch(height))?;
            info!(
                batch_index = batch.batch_index,
                batch_size = batch.batch_size,
                "Found finalized state batch"
            );
            self.cursor.next_unfinalized = height + batch.batch_size;
        }
        Ok(())
    }

    /// Attempts to relay one message. Returns true if the message needs no
    /// further attention (relayed now, or already relayed); failures are
    /// logged and left for the next tick.
    async fn relay_one(&mut self, message: &SentMessage) -> bool {
        debug!(
            message_hash = %message.hash,
            l2_height = message.height,
            target = %message.target,
            "Found a sent message"
        );

        match self.messenger.successful_messages(message.hash).await {
            Ok(true) => {
                debug!(message_hash = %message.hash, "Message has already been relayed, skipping");
                metrics::counter!(relayer_metrics::MESSAGES_ALREADY_RELAYED_TOTAL).increment(1);
                return true;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(message_hash = %message.hash, error = %e, "Dedup check failed");
                return false;
            }
        }

        let batch = match self.batch_index.state_batch_header(message.height).await {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                warn!(
                    message_hash = %message.hash,
                    l2_height = message.height,
                    "No batch covers a height the cursor considered finalized"
                );
                return false;
            }
            Err(e) => {
                warn!(message_hash = %message.hash, error = %e, "Batch lookup failed");
                return false;
            }
        };

        let proof = match self.proof_builder.message_proof(message, &batch).await {
            Ok(proof) => proof,
            Err(e) => {
                warn!(message_hash = %message.hash, error = %e, "Proof construction failed, skipping");
                metrics::counter!(relayer_metrics::PROOF_FAILURES_TOTAL).increment(1);
                return false;
            }
        };

        match self.submitter.relay_message(message, &proof).await {
            Ok(()) => {
                info!(
                    message_hash = %message.hash,
                    l2_height = message.height,
                    nonce = %message.nonce,
                    "Message relayed to L1"
                );
                metrics::counter!(relayer_metrics::MESSAGES_RELAYED_TOTAL).increment(1);
                true
            }
            Err(e) => {
                warn!(
                    message_hash = %message.hash,
                    error = %e,
                    "Relay attempt failed, will retry next tick"
                );
                metrics::counter!(relayer_metrics::RELAY_FAILURES_TOTAL).increment(1);
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RelayerControl trait and DriverHandle
// ---------------------------------------------------------------------------

/// Trait for controlling the relayer driver at runtime.
#[async_trait]
pub trait RelayerControl: Send + Sync {
    /// Start the driver loop.
    async fn start(&self) -> Result<(), String>;
    /// Stop the driver loop. The in-flight tick completes first.
    async fn stop(&self) -> Result<(), String>;
    /// Returns whether the driver loop is currently running.
    fn is_running(&self) -> bool;
}

/// Manages the lifecycle of a [`Driver`], allowing it to be started and
/// stopped at runtime.
///
/// Internally the driver is placed behind a [`TokioMutex`] so it can be moved
/// into a spawned task for the duration of a session.
pub struct DriverHandle<L1, L2, S, M>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    S: StateCommitmentChain + 'static,
    M: L1MessengerClient + 'static,
{
    driver: Arc<TokioMutex<Driver<L1, L2, S, M>>>,
    /// Cancel token for the *current* driver session (child of global).
    session_cancel: TokioMutex<CancellationToken>,
    /// Top-level cancel token (SIGTERM / SIGINT).
    global_cancel: CancellationToken,
    /// Join handle for the currently running driver task.
    task: TokioMutex<Option<JoinHandle<Result<()>>>>,
    /// Shared flag indicating whether the driver loop is active.
    running: Arc<AtomicBool>,
}

impl<L1, L2, S, M> std::fmt::Debug for DriverHandle<L1, L2, S, M>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    S: StateCommitmentChain + 'static,
    M: L1MessengerClient + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverHandle")
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<L1, L2, S, M> DriverHandle<L1, L2, S, M>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    S: StateCommitmentChain + 'static,
    M: L1MessengerClient + 'static,
{
    /// Wraps a [`Driver`] in a lifecycle-managed handle.
    ///
    /// The driver is **not** started automatically — call
    /// [`start`](RelayerControl::start) to begin the polling loop.
    pub fn new(driver: Driver<L1, L2, S, M>, global_cancel: CancellationToken) -> Self {
        let session_cancel = global_cancel.child_token();
        Self {
            driver: Arc::new(TokioMutex::new(driver)),
            session_cancel: TokioMutex::new(session_cancel),
            global_cancel,
            task: TokioMutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl<L1, L2, S, M> RelayerControl for DriverHandle<L1, L2, S, M>
where
    L1: L1Client + 'static,
    L2: L2Client + 'static,
    S: StateCommitmentChain + 'static,
    M: L1MessengerClient + 'static,
{
    async fn start(&self) -> Result<(), String> {
        if self.running.load(Ordering::SeqCst) {
            return Err("relayer is already running".into());
        }

        // Create a fresh session token (child of global, so SIGTERM still propagates).
        let cancel = self.global_cancel.child_token();
        {
            let mut driver = self.driver.lock().await;
            driver.set_cancel(cancel.clone());
        }
        *self.session_cancel.lock().await = cancel;

        let driver = Arc::clone(&self.driver);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let mut guard = driver.lock().await;
            let result = guard.run().await;
            running.store(false, Ordering::SeqCst);
            result
        });

        *self.task.lock().await = Some(handle);
        info!("Relayer driver started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), String> {
        if !self.running.load(Ordering::SeqCst) {
            return Err("relayer is not running".into());
        }

        // Cancel the current session (does not cancel the global token).
        self.session_cancel.lock().await.cancel();

        // Await the spawned task so the driver mutex is released cleanly.
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }

        info!("Relayer driver stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use alloy_primitives::{keccak256, Address, B256};
    use alloy_rpc_types_eth::Log;

    use super::*;
    use crate::test_utils::{
        relay_payload, sent_message_log, test_batch, MockL1, MockL2, MockMessenger, MockScc,
        MockSubmitter,
    };
    use crate::types::StateBatchHeader;

    const SCC: Address = Address::repeat_byte(0x0C);
    const L2_MESSENGER: Address = Address::repeat_byte(0x4D);
    const MESSAGE_PASSER: Address = Address::repeat_byte(0x4A);

    type TestDriver = Driver<MockL1, MockL2, MockScc, MockMessenger>;

    struct Harness {
        driver: TestDriver,
        successful: Arc<Mutex<HashSet<B256>>>,
        submitter: Arc<MockSubmitter>,
        scc: Arc<MockScc>,
    }

    fn harness_with(
        batches: Vec<StateBatchHeader>,
        logs: Vec<Log>,
        finalized_below: u64,
        starting_height: u64,
        failures: usize,
        successful: Arc<Mutex<HashSet<B256>>>,
    ) -> Harness {
        let l1 = Arc::new(MockL1::with_batches(&batches));
        let l2 = Arc::new(MockL2::with_logs(logs));
        let scc = Arc::new(MockScc::new(finalized_below));
        let submitter = Arc::new(MockSubmitter::failing_first(Arc::clone(&successful), failures));

        let driver = Driver::new(
            DriverConfig { poll_interval: Duration::from_secs(3600), starting_height },
            BatchIndex::new(l1, Arc::clone(&scc), SCC),
            MessageScanner::new(Arc::clone(&l2), L2_MESSENGER, 0),
            ProofBuilder::new(l2, L2_MESSENGER, MESSAGE_PASSER, 0),
            Arc::new(MockMessenger::new(Arc::clone(&successful))),
            Arc::clone(&submitter) as Arc<dyn MessageSubmitter>,
            CancellationToken::new(),
        );

        Harness { driver, successful, submitter, scc }
    }

    fn harness(
        batches: Vec<StateBatchHeader>,
        logs: Vec<Log>,
        finalized_below: u64,
    ) -> Harness {
        harness_with(batches, logs, finalized_below, 0, 0, Arc::new(Mutex::new(HashSet::new())))
    }

    #[tokio::test]
    async fn test_no_relay_before_finalization() {
        // One message, one batch of three roots, still inside the window.
        let payload = relay_payload(Address::repeat_byte(0x04), 0);
        let hash = keccak256(&payload);
        let mut h = harness(
            vec![test_batch(0, 0, 3)],
            vec![sent_message_log(L2_MESSENGER, &payload, 1, 0)],
            0,
        );

        h.driver.step().await.unwrap();

        assert!(!h.successful.lock().unwrap().contains(&hash));
        assert!(h.submitter.relayed.lock().unwrap().is_empty());
        assert_eq!(h.driver.cursor.next_unfinalized, 0);
    }

    #[tokio::test]
    async fn test_single_message_relayed_after_finalization() {
        let payload = relay_payload(Address::repeat_byte(0x04), 0);
        let hash = keccak256(&payload);
        let mut h = harness(
            vec![test_batch(0, 0, 3)],
            vec![sent_message_log(L2_MESSENGER, &payload, 1, 0)],
            3,
        );

        h.driver.step().await.unwrap();

        assert!(h.successful.lock().unwrap().contains(&hash));
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);
        assert_eq!(h.driver.cursor.last_finalized, 3);
        assert_eq!(h.driver.cursor.next_unfinalized, 3);

        // A second tick finds nothing new and submits nothing.
        h.driver.step().await.unwrap();
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ten_messages_across_ten_batches() {
        let batches: Vec<_> = (0..10).map(|i| test_batch(i, i, 1)).collect();
        let logs: Vec<_> = (0..10)
            .map(|i| {
                sent_message_log(L2_MESSENGER, &relay_payload(Address::repeat_byte(0x04), i), i, 0)
            })
            .collect();
        let hashes: Vec<B256> = (0..10)
            .map(|i| keccak256(&relay_payload(Address::repeat_byte(0x04), i)))
            .collect();
        let mut h = harness(batches, logs, 10);

        h.driver.step().await.unwrap();

        let successful = h.successful.lock().unwrap();
        for hash in &hashes {
            assert!(successful.contains(hash));
        }
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 10);
        assert_eq!(h.driver.cursor.next_unfinalized, 10);
    }

    #[tokio::test]
    async fn test_dedup_under_restart() {
        let payload = relay_payload(Address::repeat_byte(0x04), 0);
        let batches = vec![test_batch(0, 0, 3)];
        let logs = vec![sent_message_log(L2_MESSENGER, &payload, 1, 0)];
        let successful = Arc::new(Mutex::new(HashSet::new()));

        let mut h =
            harness_with(batches.clone(), logs.clone(), 3, 0, 0, Arc::clone(&successful));
        h.driver.step().await.unwrap();
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);

        // Restart from height 0 against the same chain state: the rescan hits
        // the dedup check and emits no new relay transaction.
        let mut restarted = harness_with(batches, logs, 3, 0, 0, successful);
        restarted.driver.step().await.unwrap();
        assert!(restarted.submitter.relayed.lock().unwrap().is_empty());
        assert_eq!(restarted.driver.cursor.last_finalized, 3);
    }

    #[tokio::test]
    async fn test_failed_submission_recovers_next_tick() {
        let payload = relay_payload(Address::repeat_byte(0x04), 0);
        let hash = keccak256(&payload);
        let mut h = harness_with(
            vec![test_batch(0, 0, 3)],
            vec![sent_message_log(L2_MESSENGER, &payload, 1, 0)],
            3,
            0,
            1,
            Arc::new(Mutex::new(HashSet::new())),
        );

        // First tick: submission fails, window stays open.
        h.driver.step().await.unwrap();
        assert!(h.submitter.relayed.lock().unwrap().is_empty());
        assert_eq!(h.driver.cursor.last_finalized, 0);
        assert_eq!(h.driver.cursor.next_unfinalized, 3);

        // Second tick: the same window is rescanned and the relay succeeds.
        h.driver.step().await.unwrap();
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);
        assert!(h.successful.lock().unwrap().contains(&hash));
        assert_eq!(h.driver.cursor.last_finalized, 3);
    }

    #[tokio::test]
    async fn test_gapless_cursor_over_consecutive_batches() {
        let payload = relay_payload(Address::repeat_byte(0x04), 0);
        let mut h = harness(
            vec![test_batch(0, 0, 5), test_batch(1, 5, 7)],
            vec![sent_message_log(L2_MESSENGER, &payload, 6, 0)],
            12,
        );

        h.driver.step().await.unwrap();

        assert_eq!(h.driver.cursor.last_finalized, 12);
        assert_eq!(h.driver.cursor.next_unfinalized, 12);
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);

        // The message is not re-relayed by later ticks.
        h.driver.step().await.unwrap();
        assert_eq!(h.submitter.relayed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_advances_as_batches_finalize() {
        let mut h = harness(vec![test_batch(0, 0, 5), test_batch(1, 5, 7)], vec![], 5);

        h.driver.step().await.unwrap();
        assert_eq!(h.driver.cursor.next_unfinalized, 5);

        h.scc.finalize_below(12);
        h.driver.step().await.unwrap();
        assert_eq!(h.driver.cursor.next_unfinalized, 12);
    }

    #[tokio::test]
    async fn test_messages_relayed_in_order() {
        let logs = vec![
            sent_message_log(L2_MESSENGER, &relay_payload(Address::repeat_byte(0x04), 1), 1, 1),
            sent_message_log(L2_MESSENGER, &relay_payload(Address::repeat_byte(0x04), 0), 1, 0),
            sent_message_log(L2_MESSENGER, &relay_payload(Address::repeat_byte(0x04), 2), 2, 0),
        ];
        let mut h = harness(vec![test_batch(0, 0, 3)], logs, 3);

        h.driver.step().await.unwrap();

        let expected: Vec<B256> = (0..3)
            .map(|i| keccak256(&relay_payload(Address::repeat_byte(0x04), i)))
            .collect();
        assert_eq!(*h.submitter.relayed.lock().unwrap(), expected);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_run_cancellation() {
        let cancel = CancellationToken::new();
        let mut h = harness(vec![], vec![], 0);
        h.driver.set_cancel(cancel.clone());

        let handle = tokio::spawn(async move { h.driver.run().await });

        cancel.cancel();

        let result = handle.await.expect("task should not panic");
        assert!(result.is_ok(), "run() should return Ok on cancellation");
    }

    // ---- DriverHandle tests ----

    fn test_driver_handle(
        global_cancel: CancellationToken,
    ) -> DriverHandle<MockL1, MockL2, MockScc, MockMessenger> {
        let mut h = harness(vec![], vec![], 0);
        h.driver.config.poll_interval = Duration::from_secs(3600);
        h.driver.set_cancel(global_cancel.child_token());
        DriverHandle::new(h.driver, global_cancel)
    }

    #[tokio::test]
    async fn test_driver_handle_start_stop() {
        let cancel = CancellationToken::new();
        let handle = test_driver_handle(cancel);

        assert!(!handle.is_running());

        let result = handle.start().await;
        assert!(result.is_ok());
        assert!(handle.is_running());

        let result = handle.stop().await;
        assert!(result.is_ok());
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_driver_handle_double_start_errors() {
        let cancel = CancellationToken::new();
        let handle = test_driver_handle(cancel);

        handle.start().await.unwrap();
        assert!(handle.is_running());

        let result = handle.start().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("already running"));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_driver_handle_stop_when_not_running() {
        let cancel = CancellationToken::new();
        let handle = test_driver_handle(cancel);

        let result = handle.stop().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not running"));
    }

    #[tokio::test]
    async fn test_driver_handle_restart() {
        let cancel = CancellationToken::new();
        let handle = test_driver_handle(cancel);

        handle.start().await.unwrap();
        handle.stop().await.unwrap();
        assert!(!handle.is_running());

        handle.start().await.unwrap();
        assert!(handle.is_running());

        handle.stop().await.unwrap();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_driver_handle_global_cancel_stops_driver() {
        let cancel = CancellationToken::new();
        let handle = test_driver_handle(cancel.clone());

        handle.start().await.unwrap();
        assert!(handle.is_running());

        cancel.cancel();

        // Give the spawned task a moment to observe the cancellation.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.is_running(), "driver should stop on global cancel");
    }
}
