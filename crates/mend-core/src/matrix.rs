//! Accusation matrix construction
//!
//! One file's changelogs, read across every ordered (viewer, target) pair
//! of the replica set, form a square matrix of change counts. The scan
//! doubles as the unsafety gate: files with pending metadata or entry
//! operations, or with fewer than two present replicas, never reach the
//! resolver.

use std::path::Path;

use tracing::{debug, warn};

use crate::changelog::{changelog_attr, ChangeCount};
use crate::replica::{ReplicaId, ReplicaSet};
use crate::store::ReplicaStore;
use crate::verdict::UnsafeKind;

/// Square grid of change counts, one cell per ordered (viewer, target)
/// pair including the diagonal.
///
/// A non-zero diagonal cell means the viewer accuses itself; a non-zero
/// cross cell means the viewer accuses the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccusationMatrix {
    n: usize,
    cells: Vec<ChangeCount>,
}

impl AccusationMatrix {
    /// All-zero matrix for `n` replicas.
    pub fn zeroed(n: usize) -> Self {
        Self {
            n,
            cells: vec![ChangeCount::ZERO; n * n],
        }
    }

    fn idx(&self, viewer: ReplicaId, target: ReplicaId) -> usize {
        viewer.0 * self.n + target.0
    }

    /// Number of replicas the matrix covers.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix covers no replicas.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Full counts for one ordered pair.
    pub fn get(&self, viewer: ReplicaId, target: ReplicaId) -> ChangeCount {
        self.cells[self.idx(viewer, target)]
    }

    /// Replace the counts for one ordered pair.
    pub fn set(&mut self, viewer: ReplicaId, target: ReplicaId, counts: ChangeCount) {
        let idx = self.idx(viewer, target);
        self.cells[idx] = counts;
    }

    /// Data count for one ordered pair.
    pub fn data(&self, viewer: ReplicaId, target: ReplicaId) -> u32 {
        self.get(viewer, target).data
    }

    /// Overwrite the data count for one ordered pair, leaving the other
    /// fields untouched.
    pub fn set_data(&mut self, viewer: ReplicaId, target: ReplicaId, data: u32) {
        let idx = self.idx(viewer, target);
        self.cells[idx].data = data;
    }

    /// Number of cells with a non-zero data count.
    pub fn accusation_count(&self) -> usize {
        self.cells.iter().filter(|c| c.data != 0).count()
    }
}

/// Result of scanning one file's changelogs across the replica set.
#[derive(Debug)]
pub enum ScanOutcome {
    /// A pending metadata/entry count or a missing replica makes the
    /// file unsafe to touch.
    Unsafe(UnsafeKind),

    /// No accusations anywhere; the file is consistent.
    NotNeeded,

    /// Accusations exist; the matrix is ready for resolution.
    Ready(AccusationMatrix),
}

/// Build the accusation matrix for `rel_path`, marking replica presence
/// as a side effect.
///
/// A missing or unreadable changelog attribute degrades to a zero count
/// with a warning. The scan stops at the first non-zero metadata/entry
/// count: those states must never reach the resolver.
pub fn scan(
    store: &dyn ReplicaStore,
    replicas: &mut ReplicaSet,
    rel_path: &Path,
) -> ScanOutcome {
    let n = replicas.len();
    let mut matrix = AccusationMatrix::zeroed(n);
    let mut accusations = 0usize;

    for v in 0..n {
        let viewer = ReplicaId(v);
        let copy = replicas.get(viewer).copy_path(rel_path);
        if store.exists(&copy) {
            replicas.mark_present(viewer);
        }
        for t in 0..n {
            let target = ReplicaId(t);
            let attr = changelog_attr(&replicas.get(target).name);
            let counts = match store.get_attr(&copy, &attr) {
                Ok(Some(raw)) => match ChangeCount::decode(&raw) {
                    Ok(counts) => counts,
                    Err(e) => {
                        warn!(
                            path = %copy.display(),
                            attr = %attr,
                            error = %e,
                            "Undecodable changelog value, assuming zero"
                        );
                        ChangeCount::ZERO
                    }
                },
                Ok(None) => ChangeCount::ZERO,
                Err(e) => {
                    warn!(
                        path = %copy.display(),
                        attr = %attr,
                        error = %e,
                        "Failed to read changelog, assuming zero"
                    );
                    ChangeCount::ZERO
                }
            };
            debug!(
                viewer = %replicas.get(viewer).label,
                target = %replicas.get(target).label,
                data = counts.data,
                metadata = counts.metadata,
                entry = counts.entry,
                "Changelog entry"
            );
            if counts.metadata != 0 {
                return ScanOutcome::Unsafe(UnsafeKind::PendingMetadataOps {
                    viewer,
                    target,
                    count: counts.metadata,
                });
            }
            if counts.entry != 0 {
                return ScanOutcome::Unsafe(UnsafeKind::PendingEntryOps {
                    viewer,
                    target,
                    count: counts.entry,
                });
            }
            if counts.data != 0 {
                accusations += 1;
            }
            matrix.set(viewer, target, counts);
        }
    }

    let present = replicas.present_count();
    if present < 2 {
        return ScanOutcome::Unsafe(UnsafeKind::TooFewReplicas { present });
    }
    if accusations == 0 {
        return ScanOutcome::NotNeeded;
    }
    ScanOutcome::Ready(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::Replica;
    use crate::store::MemoryStore;

    fn replica_set() -> ReplicaSet {
        ReplicaSet::new(vec![
            Replica::new("client-0", "server-0:/export", "/b0"),
            Replica::new("client-1", "server-1:/export", "/b1"),
        ])
        .unwrap()
    }

    fn seed(store: &MemoryStore, cells: [ChangeCount; 4]) {
        let mut idx = 0;
        for root in ["/b0", "/b1"] {
            let path = format!("{root}/file");
            store.put_file(&path, b"x");
            for target in ["client-0", "client-1"] {
                store
                    .set_attr(
                        Path::new(&path),
                        &changelog_attr(target),
                        &cells[idx].encode(),
                    )
                    .unwrap();
                idx += 1;
            }
        }
    }

    #[test]
    fn test_scan_populates_all_pairs() {
        let store = MemoryStore::new();
        seed(
            &store,
            [
                ChangeCount::new(1, 0, 0),
                ChangeCount::new(2, 0, 0),
                ChangeCount::new(3, 0, 0),
                ChangeCount::new(4, 0, 0),
            ],
        );
        let mut replicas = replica_set();

        let outcome = scan(&store, &mut replicas, Path::new("file"));
        let matrix = match outcome {
            ScanOutcome::Ready(m) => m,
            other => panic!("expected a populated matrix, got {other:?}"),
        };
        assert_eq!(matrix.data(ReplicaId(0), ReplicaId(0)), 1);
        assert_eq!(matrix.data(ReplicaId(0), ReplicaId(1)), 2);
        assert_eq!(matrix.data(ReplicaId(1), ReplicaId(0)), 3);
        assert_eq!(matrix.data(ReplicaId(1), ReplicaId(1)), 4);
        assert_eq!(matrix.accusation_count(), 4);
        assert_eq!(replicas.present_count(), 2);
    }

    #[test]
    fn test_scan_short_circuits_on_metadata_count() {
        let store = MemoryStore::new();
        seed(
            &store,
            [
                ChangeCount::new(0, 2, 0),
                ChangeCount::ZERO,
                ChangeCount::ZERO,
                ChangeCount::ZERO,
            ],
        );
        let mut replicas = replica_set();

        match scan(&store, &mut replicas, Path::new("file")) {
            ScanOutcome::Unsafe(UnsafeKind::PendingMetadataOps { count: 2, .. }) => {}
            other => panic!("expected pending metadata ops, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_short_circuits_on_entry_count() {
        let store = MemoryStore::new();
        seed(
            &store,
            [
                ChangeCount::ZERO,
                ChangeCount::new(3, 0, 1),
                ChangeCount::ZERO,
                ChangeCount::ZERO,
            ],
        );
        let mut replicas = replica_set();

        match scan(&store, &mut replicas, Path::new("file")) {
            ScanOutcome::Unsafe(UnsafeKind::PendingEntryOps { count: 1, .. }) => {}
            other => panic!("expected pending entry ops, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_reports_missing_replicas() {
        let store = MemoryStore::new();
        store.put_file("/b0/file", b"x");
        let mut replicas = replica_set();

        match scan(&store, &mut replicas, Path::new("file")) {
            ScanOutcome::Unsafe(UnsafeKind::TooFewReplicas { present: 1 }) => {}
            other => panic!("expected too few replicas, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_reports_consistent_file() {
        let store = MemoryStore::new();
        seed(&store, [ChangeCount::ZERO; 4]);
        let mut replicas = replica_set();

        assert!(matches!(
            scan(&store, &mut replicas, Path::new("file")),
            ScanOutcome::NotNeeded
        ));
    }

    #[test]
    fn test_scan_imputes_zero_for_bad_values() {
        let store = MemoryStore::new();
        seed(
            &store,
            [
                ChangeCount::ZERO,
                ChangeCount::new(1, 0, 0),
                ChangeCount::ZERO,
                ChangeCount::ZERO,
            ],
        );
        // Truncated value on the other replica's own entry.
        store
            .set_attr(
                Path::new("/b1/file"),
                &changelog_attr("client-1"),
                &[0u8; 5],
            )
            .unwrap();
        let mut replicas = replica_set();

        let matrix = match scan(&store, &mut replicas, Path::new("file")) {
            ScanOutcome::Ready(m) => m,
            other => panic!("expected a populated matrix, got {other:?}"),
        };
        assert_eq!(matrix.data(ReplicaId(1), ReplicaId(1)), 0);
        assert_eq!(matrix.data(ReplicaId(0), ReplicaId(1)), 1);
    }
}
