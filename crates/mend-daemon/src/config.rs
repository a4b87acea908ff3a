//! Daemon configuration
//!
//! File-based (TOML) with validation. The orchestrator that discovers
//! the volume topology and mounts the replicas hands us the resulting
//! roots; this config only describes them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mend_core::{HealOptions, Replica, REPLICA_COUNT};

use crate::error::{Error, Result};

/// Location of one replica as named in the daemon config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Identity component of the replica's changelog attribute name.
    pub name: String,

    /// Human-readable location, e.g. `host:/export`.
    pub label: String,

    /// Mount/access root.
    pub root: PathBuf,
}

/// Configuration for the heal daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Number of parallel heal workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Options threaded through every heal invocation.
    #[serde(default)]
    pub heal: HealOptions,

    /// Replica locations, in changelog order.
    pub replicas: Vec<ReplicaConfig>,

    /// Caller-visible volume root used for the post-heal refresh.
    pub parent_root: PathBuf,
}

fn default_worker_count() -> usize {
    4
}

impl DaemonConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the rest of the daemon relies on.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Validation("worker_count must be at least 1".into()));
        }
        if self.replicas.len() != REPLICA_COUNT {
            return Err(Error::Validation(format!(
                "exactly {} replicas are supported, got {}",
                REPLICA_COUNT,
                self.replicas.len()
            )));
        }
        for replica in &self.replicas {
            if replica.name.is_empty() {
                return Err(Error::Validation("replica name must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Replica descriptions for the heal core, in config order.
    pub fn replica_list(&self) -> Vec<Replica> {
        self.replicas
            .iter()
            .map(|r| Replica::new(r.name.clone(), r.label.clone(), r.root.clone()))
            .collect()
    }
}
