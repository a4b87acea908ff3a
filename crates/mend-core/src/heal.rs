//! The per-file heal pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::changelog::FILE_ID_ATTR;
use crate::config::HealOptions;
use crate::detector;
use crate::error::Result;
use crate::matrix::{self, ScanOutcome};
use crate::remedy::RemediationExecutor;
use crate::replica::{Replica, ReplicaId, ReplicaSet};
use crate::resolver;
use crate::selector;
use crate::store::ReplicaStore;
use crate::verdict::Verdict;

/// Heals one file at a time across a fixed set of replica roots.
///
/// Each invocation builds a fresh replica set, so the same healer can be
/// driven concurrently for different paths; callers must not run two
/// heals of the same path at once.
pub struct Healer {
    store: Arc<dyn ReplicaStore>,
    template: ReplicaSet,
    parent_root: PathBuf,
    opts: HealOptions,
}

impl Healer {
    /// Bind a healer to a store, an ordered replica list and the
    /// caller-visible volume root.
    pub fn new(
        store: Arc<dyn ReplicaStore>,
        replicas: Vec<Replica>,
        parent_root: impl Into<PathBuf>,
        opts: HealOptions,
    ) -> Result<Self> {
        Ok(Self {
            store,
            template: ReplicaSet::new(replicas)?,
            parent_root: parent_root.into(),
            opts,
        })
    }

    /// Options this healer runs with.
    pub fn options(&self) -> &HealOptions {
        &self.opts
    }

    /// Run the full pipeline for one relative path.
    ///
    /// Unsafe and file-id-mismatch verdicts are produced without mutating
    /// any replica state; remediation runs only for a healed verdict.
    pub fn heal_file(&self, rel_path: &Path) -> Verdict {
        let mut replicas = self.template.clone();

        if self.opts.check_file_id {
            if let Some(verdict) = self.check_file_id(&replicas, rel_path) {
                return verdict;
            }
        }

        let matrix = match matrix::scan(self.store.as_ref(), &mut replicas, rel_path) {
            ScanOutcome::Unsafe(kind) => {
                warn!(path = %rel_path.display(), reason = %kind, "File is unsafe to heal");
                return Verdict::UnsafeToHeal(kind);
            }
            ScanOutcome::NotNeeded => {
                debug!(path = %rel_path.display(), "No heal needed (no accusations)");
                return Verdict::NotNeeded;
            }
            ScanOutcome::Ready(matrix) => matrix,
        };

        let order = replicas.ids();
        let matrix = if self.opts.aggressive {
            resolver::resolve(&matrix, &order)
        } else {
            matrix
        };

        if let Some(conflict) = detector::detect(&matrix, &order, self.opts.aggressive) {
            warn!(path = %rel_path.display(), reason = %conflict, "Split brain");
            return Verdict::HealFailed(conflict);
        }

        let source = match selector::select(&matrix, &replicas) {
            Ok(source) => source,
            Err(conflict) => {
                warn!(path = %rel_path.display(), reason = %conflict, "No usable heal source");
                return Verdict::HealFailed(conflict);
            }
        };

        info!(
            path = %rel_path.display(),
            source = %replicas.get(source).label,
            "Healing from authoritative source"
        );
        let executor = RemediationExecutor::new(self.store.as_ref(), self.opts);
        executor.apply(&replicas, rel_path, source, &self.parent_root);
        Verdict::Healed { source }
    }

    /// Last-resort recovery for a failed verdict in aggressive mode.
    ///
    /// When every present copy carries the same content digest the
    /// recorded conflict is moot: fix the file id first if that was the
    /// failure, then heal from the first replica. Returns the original
    /// verdict whenever salvage does not apply.
    pub fn salvage(&self, rel_path: &Path, verdict: Verdict) -> Verdict {
        if !self.opts.aggressive {
            return verdict;
        }
        match verdict {
            Verdict::HealFailed(_) | Verdict::FileIdMismatch => {}
            _ => return verdict,
        }

        let mut replicas = self.template.clone();
        for id in replicas.ids() {
            if self.store.exists(&replicas.get(id).copy_path(rel_path)) {
                replicas.mark_present(id);
            }
        }
        if !self.copies_converged(&replicas, rel_path) {
            info!(path = %rel_path.display(), "Copies diverge, salvage not possible");
            return verdict;
        }

        let executor = RemediationExecutor::new(self.store.as_ref(), self.opts);
        if matches!(verdict, Verdict::FileIdMismatch) {
            executor.repair_file_id(&replicas, rel_path);
        }
        let source = ReplicaId(0);
        info!(
            path = %rel_path.display(),
            source = %replicas.get(source).label,
            "Salvaging converged copies"
        );
        executor.apply(&replicas, rel_path, source, &self.parent_root);
        Verdict::Healed { source }
    }

    /// Returns the mismatch verdict when the file-id precheck fails.
    fn check_file_id(&self, replicas: &ReplicaSet, rel_path: &Path) -> Option<Verdict> {
        let mut reference: Option<Vec<u8>> = None;
        for (_, replica) in replicas.iter() {
            let copy = replica.copy_path(rel_path);
            let id = match self.store.get_attr(&copy, FILE_ID_ATTR) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    warn!(path = %copy.display(), "Missing file id attribute");
                    return Some(Verdict::FileIdMismatch);
                }
                Err(e) => {
                    warn!(path = %copy.display(), error = %e, "Failed to read file id");
                    return Some(Verdict::FileIdMismatch);
                }
            };
            match &reference {
                None => reference = Some(id),
                Some(first) if *first != id => {
                    warn!(path = %copy.display(), "File id mismatch");
                    return Some(Verdict::FileIdMismatch);
                }
                Some(_) => {}
            }
        }
        None
    }

    /// True when at least two copies are present and every present copy
    /// carries the same content digest.
    fn copies_converged(&self, replicas: &ReplicaSet, rel_path: &Path) -> bool {
        let mut reference: Option<[u8; 32]> = None;
        let mut seen = 0usize;
        for (_, replica) in replicas.iter() {
            if !replica.present {
                continue;
            }
            let copy = replica.copy_path(rel_path);
            let digest = match self.store.digest(&copy) {
                Ok(Some(digest)) => digest,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %copy.display(), error = %e, "Failed to digest copy");
                    return false;
                }
            };
            match reference {
                None => reference = Some(digest),
                Some(first) if first != digest => return false,
                Some(_) => {}
            }
            seen += 1;
        }
        seen >= 2
    }
}
