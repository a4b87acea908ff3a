//! Heal workers

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use mend_core::{Healer, Verdict};

use crate::metrics::DaemonMetrics;
use crate::queue::HealQueue;

/// Pulls paths off the queue and runs the heal pipeline on them.
pub struct HealWorker {
    id: usize,
    queue: Arc<HealQueue>,
    healer: Arc<Healer>,
    metrics: Arc<DaemonMetrics>,
}

impl HealWorker {
    /// Create a worker bound to the shared queue, healer and metrics.
    pub fn new(
        id: usize,
        queue: Arc<HealQueue>,
        healer: Arc<Healer>,
        metrics: Arc<DaemonMetrics>,
    ) -> Self {
        Self {
            id,
            queue,
            healer,
            metrics,
        }
    }

    /// Process one queued path. Returns the path and its final verdict,
    /// or `None` when the queue is empty.
    pub fn process_one(&self) -> Option<(PathBuf, Verdict)> {
        let path = self.queue.pop()?;
        debug!(worker = self.id, path = %path.display(), "Healing file");

        let verdict = self.healer.heal_file(&path);
        let verdict = if verdict.is_failure() && self.healer.options().aggressive {
            let salvaged = self.healer.salvage(&path, verdict);
            if salvaged.is_healed() {
                self.metrics.record_salvage();
            }
            salvaged
        } else {
            verdict
        };

        self.metrics.record_verdict(&verdict);
        match &verdict {
            Verdict::Healed { .. } => {
                info!(worker = self.id, path = %path.display(), verdict = %verdict, "Healed")
            }
            Verdict::NotNeeded => {
                debug!(worker = self.id, path = %path.display(), "No heal needed")
            }
            other => {
                warn!(worker = self.id, path = %path.display(), verdict = %other, "File not healed")
            }
        }

        self.queue.complete(&path);
        Some((path, verdict))
    }
}
