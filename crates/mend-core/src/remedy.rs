//! Remediation actions applied after a positive verdict
//!
//! Individual I/O failures here are logged and swallowed: they leave the
//! file at most partially healed, and the next heal pass detects and
//! retries whatever remains.

use std::path::Path;

use tracing::{info, warn};

use crate::changelog::{changelog_attr, ChangeCount, FILE_ID_ATTR};
use crate::config::HealOptions;
use crate::replica::{ReplicaId, ReplicaSet};
use crate::store::ReplicaStore;

/// Applies the side-effecting half of a heal: duplicate removal,
/// changelog clearing and the post-heal refresh.
///
/// Under dry-run every write is replaced by a log line describing the
/// intended action.
pub struct RemediationExecutor<'a> {
    store: &'a dyn ReplicaStore,
    opts: HealOptions,
}

impl<'a> RemediationExecutor<'a> {
    /// Create an executor over the given store.
    pub fn new(store: &'a dyn ReplicaStore, opts: HealOptions) -> Self {
        Self { store, opts }
    }

    /// Full remediation for a healed file.
    pub fn apply(
        &self,
        replicas: &ReplicaSet,
        rel_path: &Path,
        source: ReplicaId,
        parent_root: &Path,
    ) {
        self.remove_duplicates(replicas, rel_path, source);
        self.clear_changelogs(replicas, rel_path);
        self.touch(parent_root, rel_path);
    }

    /// Delete every non-source replica's copy.
    pub fn remove_duplicates(&self, replicas: &ReplicaSet, rel_path: &Path, source: ReplicaId) {
        for (id, replica) in replicas.iter() {
            if id == source || !replica.present {
                continue;
            }
            let copy = replica.copy_path(rel_path);
            if self.opts.dry_run {
                info!(path = %copy.display(), "Dry run: would remove duplicate");
                continue;
            }
            if let Err(e) = self.store.remove(&copy) {
                warn!(path = %copy.display(), error = %e, "Could not remove duplicate");
            }
        }
    }

    /// Zero the data field of every per-target changelog entry on every
    /// replica's copy. Metadata and entry counts are written back as
    /// read; removed copies are skipped.
    pub fn clear_changelogs(&self, replicas: &ReplicaSet, rel_path: &Path) {
        for (_, holder) in replicas.iter() {
            let copy = holder.copy_path(rel_path);
            for (_, target) in replicas.iter() {
                let attr = changelog_attr(&target.name);
                let counts = match self.store.get_attr(&copy, &attr) {
                    Ok(Some(raw)) => match ChangeCount::decode(&raw) {
                        Ok(counts) => counts,
                        Err(e) => {
                            warn!(
                                path = %copy.display(),
                                attr = %attr,
                                error = %e,
                                "Undecodable changelog left in place"
                            );
                            continue;
                        }
                    },
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(path = %copy.display(), attr = %attr, error = %e, "Failed to read changelog");
                        continue;
                    }
                };
                if self.opts.dry_run {
                    info!(
                        path = %copy.display(),
                        attr = %attr,
                        "Dry run: would clear changelog data count"
                    );
                    continue;
                }
                let cleared = counts.with_data_cleared();
                if let Err(e) = self.store.set_attr(&copy, &attr, &cleared.encode()) {
                    warn!(path = %copy.display(), attr = %attr, error = %e, "Failed to clear changelog");
                }
            }
        }
    }

    /// Refresh the healed file at the caller-visible root.
    pub fn touch(&self, parent_root: &Path, rel_path: &Path) {
        let path = parent_root.join(rel_path);
        if self.opts.dry_run {
            info!(path = %path.display(), "Dry run: would refresh healed file");
            return;
        }
        if let Err(e) = self.store.touch(&path) {
            warn!(path = %path.display(), error = %e, "Post-heal refresh failed");
        }
    }

    /// Delete the copies whose file id diverges from the first replica's.
    ///
    /// Invoked only from the aggressive salvage flow; the normal verdict
    /// path never mutates a file-id-mismatched file.
    pub fn repair_file_id(&self, replicas: &ReplicaSet, rel_path: &Path) {
        let first = replicas.get(ReplicaId(0));
        let reference = match self.store.get_attr(&first.copy_path(rel_path), FILE_ID_ATTR) {
            Ok(Some(value)) => value,
            Ok(None) => {
                warn!(replica = %first.label, "Cannot repair file id (reference attribute missing)");
                return;
            }
            Err(e) => {
                warn!(replica = %first.label, error = %e, "Cannot repair file id");
                return;
            }
        };
        for (id, replica) in replicas.iter() {
            if id == ReplicaId(0) || !replica.present {
                continue;
            }
            let copy = replica.copy_path(rel_path);
            let diverged = match self.store.get_attr(&copy, FILE_ID_ATTR) {
                Ok(Some(value)) => value != reference,
                Ok(None) => true,
                Err(e) => {
                    warn!(path = %copy.display(), error = %e, "Failed to read file id");
                    continue;
                }
            };
            if !diverged {
                continue;
            }
            if self.opts.dry_run {
                info!(path = %copy.display(), "Dry run: would remove copy with divergent file id");
                continue;
            }
            if let Err(e) = self.store.remove(&copy) {
                warn!(path = %copy.display(), error = %e, "Could not remove copy with divergent file id");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::Replica;
    use crate::store::MemoryStore;

    fn replica_set() -> ReplicaSet {
        let mut set = ReplicaSet::new(vec![
            Replica::new("client-0", "server-0:/export", "/b0"),
            Replica::new("client-1", "server-1:/export", "/b1"),
        ])
        .unwrap();
        set.mark_present(ReplicaId(0));
        set.mark_present(ReplicaId(1));
        set
    }

    fn seed(store: &MemoryStore) {
        for root in ["/b0", "/b1"] {
            let path = format!("{root}/file");
            store.put_file(&path, root.as_bytes());
            for target in ["client-0", "client-1"] {
                store
                    .set_attr(
                        Path::new(&path),
                        &changelog_attr(target),
                        &ChangeCount::new(2, 0, 0).encode(),
                    )
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_apply_removes_duplicates_and_clears_counts() {
        let store = MemoryStore::new();
        seed(&store);
        let replicas = replica_set();

        let executor = RemediationExecutor::new(&store, HealOptions::default());
        executor.apply(&replicas, Path::new("file"), ReplicaId(0), Path::new("/vol"));

        assert!(store.exists(Path::new("/b0/file")));
        assert!(!store.exists(Path::new("/b1/file")));
        for target in ["client-0", "client-1"] {
            let raw = store
                .get_attr(Path::new("/b0/file"), &changelog_attr(target))
                .unwrap()
                .unwrap();
            assert_eq!(ChangeCount::decode(&raw).unwrap().data, 0);
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let store = MemoryStore::new();
        seed(&store);
        let replicas = replica_set();

        let opts = HealOptions {
            dry_run: true,
            ..Default::default()
        };
        let executor = RemediationExecutor::new(&store, opts);
        executor.apply(&replicas, Path::new("file"), ReplicaId(0), Path::new("/vol"));

        assert!(store.exists(Path::new("/b1/file")));
        let raw = store
            .get_attr(Path::new("/b0/file"), &changelog_attr("client-1"))
            .unwrap()
            .unwrap();
        assert_eq!(ChangeCount::decode(&raw).unwrap().data, 2);
    }

    #[test]
    fn test_clear_preserves_metadata_and_entry_fields() {
        let store = MemoryStore::new();
        store.put_file("/b0/file", b"x");
        store.put_file("/b1/file", b"x");
        store
            .set_attr(
                Path::new("/b0/file"),
                &changelog_attr("client-1"),
                &ChangeCount::new(4, 0, 0).encode(),
            )
            .unwrap();
        let replicas = replica_set();

        let executor = RemediationExecutor::new(&store, HealOptions::default());
        executor.clear_changelogs(&replicas, Path::new("file"));

        let raw = store
            .get_attr(Path::new("/b0/file"), &changelog_attr("client-1"))
            .unwrap()
            .unwrap();
        assert_eq!(ChangeCount::decode(&raw).unwrap(), ChangeCount::ZERO);
        // Absent attributes stay absent.
        assert_eq!(
            store
                .get_attr(Path::new("/b1/file"), &changelog_attr("client-0"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_repair_file_id_removes_divergent_copy() {
        let store = MemoryStore::new();
        store.put_file("/b0/file", b"x");
        store.put_file("/b1/file", b"x");
        store
            .set_attr(Path::new("/b0/file"), FILE_ID_ATTR, b"id-1")
            .unwrap();
        store
            .set_attr(Path::new("/b1/file"), FILE_ID_ATTR, b"id-2")
            .unwrap();
        let replicas = replica_set();

        let executor = RemediationExecutor::new(&store, HealOptions::default());
        executor.repair_file_id(&replicas, Path::new("file"));

        assert!(store.exists(Path::new("/b0/file")));
        assert!(!store.exists(Path::new("/b1/file")));
    }

    #[test]
    fn test_repair_file_id_keeps_matching_copy() {
        let store = MemoryStore::new();
        store.put_file("/b0/file", b"x");
        store.put_file("/b1/file", b"x");
        for root in ["/b0", "/b1"] {
            store
                .set_attr(
                    Path::new(&format!("{root}/file")),
                    FILE_ID_ATTR,
                    b"id-1",
                )
                .unwrap();
        }
        let replicas = replica_set();

        let executor = RemediationExecutor::new(&store, HealOptions::default());
        executor.repair_file_id(&replicas, Path::new("file"));

        assert!(store.exists(Path::new("/b1/file")));
    }
}
