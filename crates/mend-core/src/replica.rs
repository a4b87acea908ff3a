//! Replica identity and per-invocation replica sets

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Number of replicas in a mirrored set handled by this crate.
///
/// More than two-way replication would need cycle detection across the
/// full accusation graph, not just pairwise checks.
pub const REPLICA_COUNT: usize = 2;

/// Index-based identity of a replica within its set.
///
/// Identity is by position in the ordered set, never by pointer or by
/// comparing replica objects, so ids stay meaningful when replicas are
/// cloned across task boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaId(pub usize);

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "replica {}", self.0)
    }
}

/// One storage copy participating in file replication.
#[derive(Debug, Clone)]
pub struct Replica {
    /// Identity component of this replica's changelog attribute name.
    pub name: String,

    /// Human-readable location, e.g. `host:/export`, used in log output.
    pub label: String,

    /// Mount/access root for this replica's copies.
    pub root: PathBuf,

    /// Whether this replica currently has the file under heal. Set during
    /// matrix construction only.
    pub present: bool,
}

impl Replica {
    /// Create a replica description with the presence flag unset.
    pub fn new(name: impl Into<String>, label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            root: root.into(),
            present: false,
        }
    }

    /// Absolute path of this replica's copy of `rel_path`.
    pub fn copy_path(&self, rel_path: &Path) -> PathBuf {
        self.root.join(rel_path)
    }
}

/// Ordered, fixed-size set of replicas scoped to one heal invocation.
#[derive(Debug, Clone)]
pub struct ReplicaSet {
    replicas: Vec<Replica>,
}

impl ReplicaSet {
    /// Build a set from an ordered list of replicas.
    pub fn new(replicas: Vec<Replica>) -> Result<Self> {
        if replicas.len() != REPLICA_COUNT {
            return Err(Error::ReplicaCount {
                actual: replicas.len(),
            });
        }
        Ok(Self { replicas })
    }

    /// Number of replicas in the set.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Whether the set is empty. Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// The replica with the given id.
    pub fn get(&self, id: ReplicaId) -> &Replica {
        &self.replicas[id.0]
    }

    /// Iterate replicas in set order.
    pub fn iter(&self) -> impl Iterator<Item = (ReplicaId, &Replica)> + '_ {
        self.replicas
            .iter()
            .enumerate()
            .map(|(i, r)| (ReplicaId(i), r))
    }

    /// Ids in set order.
    pub fn ids(&self) -> Vec<ReplicaId> {
        (0..self.replicas.len()).map(ReplicaId).collect()
    }

    /// Record that a replica has the file under heal.
    pub fn mark_present(&mut self, id: ReplicaId) {
        self.replicas[id.0].present = true;
    }

    /// How many replicas have the file.
    pub fn present_count(&self) -> usize {
        self.replicas.iter().filter(|r| r.present).count()
    }
}
