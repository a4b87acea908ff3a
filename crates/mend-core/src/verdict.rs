//! Heal verdicts and their failure reasons

use std::fmt;

use crate::replica::ReplicaId;

/// Why a file must not be touched by the healer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeKind {
    /// A pending attribute-operation count was non-zero.
    PendingMetadataOps {
        /// Replica holding the changelog entry.
        viewer: ReplicaId,
        /// Replica the entry counts operations against.
        target: ReplicaId,
        /// The non-zero count.
        count: u32,
    },

    /// A pending directory-operation count was non-zero.
    PendingEntryOps {
        /// Replica holding the changelog entry.
        viewer: ReplicaId,
        /// Replica the entry counts operations against.
        target: ReplicaId,
        /// The non-zero count.
        count: u32,
    },

    /// Fewer than two replicas have the file.
    TooFewReplicas {
        /// How many replicas have the file.
        present: usize,
    },
}

impl fmt::Display for UnsafeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingMetadataOps {
                viewer,
                target,
                count,
            } => write!(
                f,
                "pending metadata ops ({viewer} counts {count} against {target})"
            ),
            Self::PendingEntryOps {
                viewer,
                target,
                count,
            } => write!(
                f,
                "pending entry ops ({viewer} counts {count} against {target})"
            ),
            Self::TooFewReplicas { present } => {
                write!(f, "too few replicas have the file ({present})")
            }
        }
    }
}

/// Why a conflict blocks automatic healing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two replicas accuse each other. Always fatal, in both modes.
    MutualAccusation {
        /// One side of the mutual accusation.
        a: ReplicaId,
        /// The other side.
        b: ReplicaId,
    },

    /// A replica accuses both itself and a peer. Fatal outside aggressive
    /// mode.
    SelfPlusOtherAccusation {
        /// The accusing replica.
        viewer: ReplicaId,
        /// The accused peer.
        target: ReplicaId,
    },

    /// A pristine candidate exists but carries no positive evidence of
    /// being ahead.
    AccusationsCancel,

    /// Every present replica is accused by someone.
    NoPristineSource,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MutualAccusation { a, b } => {
                write!(f, "{a} and {b} accuse each other")
            }
            Self::SelfPlusOtherAccusation { viewer, target } => {
                write!(f, "{viewer} accuses both itself and {target}")
            }
            Self::AccusationsCancel => write!(f, "accusations cancel out"),
            Self::NoPristineSource => write!(f, "no pristine source"),
        }
    }
}

/// Outcome of one per-file heal invocation. Produced exactly once per
/// invocation; never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The file is already consistent.
    NotNeeded,

    /// The file was healed from `source`.
    Healed {
        /// The authoritative replica the file was healed from.
        source: ReplicaId,
    },

    /// A conflict blocks automatic healing.
    HealFailed(ConflictKind),

    /// Pending non-data operations or missing replicas; a human must
    /// intervene.
    UnsafeToHeal(UnsafeKind),

    /// The file-id attribute diverges across replicas.
    FileIdMismatch,
}

impl Verdict {
    /// Whether the file ended up healed.
    pub fn is_healed(&self) -> bool {
        matches!(self, Self::Healed { .. })
    }

    /// Whether this verdict reports a failure to heal.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::HealFailed(_) | Self::UnsafeToHeal(_) | Self::FileIdMismatch
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNeeded => write!(f, "not needed"),
            Self::Healed { source } => write!(f, "healed from {source}"),
            Self::HealFailed(reason) => write!(f, "heal failed: {reason}"),
            Self::UnsafeToHeal(reason) => write!(f, "unsafe: {reason}"),
            Self::FileIdMismatch => write!(f, "file id mismatch"),
        }
    }
}
