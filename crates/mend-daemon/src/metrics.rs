//! Heal daemon metrics collection

use std::sync::atomic::{AtomicU64, Ordering};

use mend_core::Verdict;

/// Per-verdict counters for daemon activity.
pub struct DaemonMetrics {
    /// Files taken off the queue
    files_processed: AtomicU64,

    /// Healed verdicts (including salvaged ones)
    healed: AtomicU64,

    /// Already-consistent files
    not_needed: AtomicU64,

    /// Conflict verdicts
    heal_failed: AtomicU64,

    /// Unsafe-to-heal verdicts
    unsafe_to_heal: AtomicU64,

    /// File-id mismatches
    file_id_mismatches: AtomicU64,

    /// Failed verdicts recovered by the salvage pass
    salvaged: AtomicU64,
}

impl DaemonMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self {
            files_processed: AtomicU64::new(0),
            healed: AtomicU64::new(0),
            not_needed: AtomicU64::new(0),
            heal_failed: AtomicU64::new(0),
            unsafe_to_heal: AtomicU64::new(0),
            file_id_mismatches: AtomicU64::new(0),
            salvaged: AtomicU64::new(0),
        }
    }

    /// Record the final verdict for one file.
    pub fn record_verdict(&self, verdict: &Verdict) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        let counter = match verdict {
            Verdict::Healed { .. } => &self.healed,
            Verdict::NotNeeded => &self.not_needed,
            Verdict::HealFailed(_) => &self.heal_failed,
            Verdict::UnsafeToHeal(_) => &self.unsafe_to_heal,
            Verdict::FileIdMismatch => &self.file_id_mismatches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that the salvage pass recovered a failed verdict.
    pub fn record_salvage(&self) {
        self.salvaged.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a statistics snapshot.
    pub fn stats(&self) -> DaemonStats {
        DaemonStats {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            healed: self.healed.load(Ordering::Relaxed),
            not_needed: self.not_needed.load(Ordering::Relaxed),
            heal_failed: self.heal_failed.load(Ordering::Relaxed),
            unsafe_to_heal: self.unsafe_to_heal.load(Ordering::Relaxed),
            file_id_mismatches: self.file_id_mismatches.load(Ordering::Relaxed),
            salvaged: self.salvaged.load(Ordering::Relaxed),
        }
    }
}

impl Default for DaemonMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of the daemon counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    /// Files taken off the queue
    pub files_processed: u64,

    /// Healed verdicts (including salvaged ones)
    pub healed: u64,

    /// Already-consistent files
    pub not_needed: u64,

    /// Conflict verdicts
    pub heal_failed: u64,

    /// Unsafe-to-heal verdicts
    pub unsafe_to_heal: u64,

    /// File-id mismatches
    pub file_id_mismatches: u64,

    /// Failed verdicts recovered by the salvage pass
    pub salvaged: u64,
}

impl DaemonStats {
    /// Fraction of processed files that needed intervention.
    pub fn failure_rate(&self) -> f64 {
        if self.files_processed == 0 {
            return 0.0;
        }
        let failed = self.heal_failed + self.unsafe_to_heal + self.file_id_mismatches;
        failed as f64 / self.files_processed as f64
    }
}
