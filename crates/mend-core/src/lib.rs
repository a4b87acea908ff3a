//! Replica divergence resolution for two-way mirrored volumes
//!
//! Decides, per file, whether the replicas ("bricks") of a mirrored
//! volume are consistent, healable, or in split-brain, by reading each
//! replica's per-peer changelog counters into an accusation matrix.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────┐   ┌───────────────┐   ┌─────────────────────┐
//! │  changelog scan  │──▶│ unsafety gate │──▶│ aggressive resolver │
//! │ (presence flags) │   │ (meta/entry,  │   │     (optional)      │
//! └──────────────────┘   │  <2 present)  │   └──────────┬──────────┘
//!                        └───────────────┘              │
//!                                                       ▼
//! ┌──────────────────┐   ┌───────────────┐   ┌─────────────────────┐
//! │   remediation    │◀──│    source     │◀──│     split-brain     │
//! │ (Healed only)    │   │   selector    │   │      detector       │
//! └──────────────────┘   └───────────────┘   └─────────────────────┘
//! ```
//!
//! In changelog terms a replica accusing nobody is INNOCENT (absent
//! changelogs impute zero), one accusing itself is a FOOL, one accusing
//! a peer is WISE. The regular path lets FOOL override WISE; aggressive
//! mode inverts that bias, which is what lets it heal cases the regular
//! path cannot.
//!
//! The pipeline is pure computation over a handful of synchronous
//! metadata reads; it holds no locks of its own. Callers may heal
//! different paths concurrently but must keep at most one heal attempt
//! in flight per path.

pub mod changelog;
pub mod config;
pub mod detector;
pub mod error;
pub mod heal;
pub mod matrix;
pub mod remedy;
pub mod replica;
pub mod resolver;
pub mod selector;
pub mod store;
pub mod verdict;

pub use changelog::ChangeCount;
pub use config::HealOptions;
pub use error::{Error, Result};
pub use heal::Healer;
pub use matrix::AccusationMatrix;
pub use remedy::RemediationExecutor;
pub use replica::{Replica, ReplicaId, ReplicaSet, REPLICA_COUNT};
pub use store::{MemoryStore, ReplicaStore};
pub use verdict::{ConflictKind, UnsafeKind, Verdict};
