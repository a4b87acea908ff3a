//! Asynchronous heal runner for mend
//!
//! Drives the per-file pipeline from `mend-core` across many candidate
//! paths with a bounded worker pool.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               Heal Daemon                       │
//! ├─────────────────────────────────────────────────┤
//! │  ┌─────────────┐     ┌──────────────┐          │
//! │  │  enqueue()  │────▶│  Heal Queue  │          │
//! │  │ (candidate  │     │ (pending +   │          │
//! │  │   paths)    │     │  in-flight)  │          │
//! │  └─────────────┘     └──────┬───────┘          │
//! │                             │                   │
//! │  ┌──────────────────────────▼────────────────┐ │
//! │  │           Heal Workers (N)                │ │
//! │  │  - run the per-file pipeline              │ │
//! │  │  - salvage failed verdicts (aggressive)   │ │
//! │  │  - record per-verdict metrics             │ │
//! │  └───────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The queue hands each path to at most one worker at a time; distinct
//! paths heal concurrently. Candidate discovery and volume mounting
//! belong to the orchestrator feeding the queue.

mod config;
mod daemon;
mod error;
mod metrics;
mod queue;
mod worker;

pub use config::{DaemonConfig, ReplicaConfig};
pub use daemon::{DaemonState, HealDaemon};
pub use error::{Error, Result};
pub use metrics::{DaemonMetrics, DaemonStats};
pub use queue::HealQueue;
pub use worker::HealWorker;
