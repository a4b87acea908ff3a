//! The heal daemon - lifecycle and worker pool

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use mend_core::{Healer, ReplicaStore};

use crate::config::DaemonConfig;
use crate::error::Result;
use crate::metrics::{DaemonMetrics, DaemonStats};
use crate::queue::HealQueue;
use crate::worker::HealWorker;

/// How long an idle worker waits before polling the queue again.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// How long `stop` waits for in-flight heals to finish.
const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// State of the heal daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    /// Daemon is stopped
    Stopped,
    /// Daemon is running
    Running,
    /// Daemon is shutting down
    ShuttingDown,
}

/// Background service that drains the heal queue with a worker pool.
///
/// Paths are fed in by the caller; the queue guarantees at most one heal
/// attempt in flight per path while distinct paths heal concurrently.
pub struct HealDaemon {
    config: DaemonConfig,
    healer: Arc<Healer>,
    queue: Arc<HealQueue>,
    metrics: Arc<DaemonMetrics>,
    state: RwLock<DaemonState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl HealDaemon {
    /// Create a daemon over a validated config and a shared store.
    pub fn new(config: DaemonConfig, store: Arc<dyn ReplicaStore>) -> Result<Self> {
        config.validate()?;
        let healer = Healer::new(
            store,
            config.replica_list(),
            config.parent_root.clone(),
            config.heal,
        )?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            healer: Arc::new(healer),
            queue: Arc::new(HealQueue::new()),
            metrics: Arc::new(DaemonMetrics::new()),
            state: RwLock::new(DaemonState::Stopped),
            config,
            shutdown_tx,
        })
    }

    /// Start the worker pool. A second start while running is a no-op.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != DaemonState::Stopped {
                return Ok(());
            }
            *state = DaemonState::Running;
        }

        info!(
            workers = self.config.worker_count,
            aggressive = self.config.heal.aggressive,
            dry_run = self.config.heal.dry_run,
            "Starting heal daemon"
        );
        let _worker_handles = self.spawn_workers();
        Ok(())
    }

    /// Stop the daemon, waiting briefly for in-flight heals to finish.
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            if *state != DaemonState::Running {
                return;
            }
            *state = DaemonState::ShuttingDown;
        }

        info!("Stopping heal daemon");
        let _ = self.shutdown_tx.send(());

        let start = Instant::now();
        while self.queue.in_flight_len() > 0 && start.elapsed() < STOP_TIMEOUT {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        *self.state.write() = DaemonState::Stopped;
        info!("Heal daemon stopped");
    }

    /// Queue a candidate path; duplicates of queued or in-flight work
    /// are dropped. Returns whether the path was accepted.
    pub fn enqueue(&self, path: impl Into<PathBuf>) -> bool {
        self.queue.push(path.into())
    }

    /// Wait until every queued path has been processed.
    pub async fn drain(&self) {
        while !self.queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Current daemon state.
    pub fn state(&self) -> DaemonState {
        *self.state.read()
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> DaemonStats {
        self.metrics.stats()
    }

    /// The shared queue.
    pub fn queue(&self) -> &HealQueue {
        &self.queue
    }

    fn spawn_workers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.config.worker_count);

        for worker_id in 0..self.config.worker_count {
            let worker = HealWorker::new(
                worker_id,
                self.queue.clone(),
                self.healer.clone(),
                self.metrics.clone(),
            );
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                loop {
                    if worker.process_one().is_some() {
                        // Yield between files so shutdown and peers get a
                        // chance to run.
                        tokio::task::yield_now().await;
                        if shutdown_rx.try_recv().is_ok() {
                            break;
                        }
                    } else {
                        tokio::select! {
                            _ = tokio::time::sleep(IDLE_WAIT) => {}
                            _ = shutdown_rx.recv() => break,
                        }
                    }
                }
                debug!(worker_id, "Worker stopped");
            });

            handles.push(handle);
        }

        handles
    }
}
