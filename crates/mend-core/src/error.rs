//! Error types for mend-core

use std::io;

use thiserror::Error;

/// Result type for mend-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing replica state
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the underlying store
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Changelog attribute value with the wrong length
    #[error("changelog value is {actual} bytes, expected 12")]
    BadChangelogLength {
        /// Length of the value as read
        actual: usize,
    },

    /// Replica set of an unsupported size
    #[error("exactly two replicas are supported, got {actual}")]
    ReplicaCount {
        /// Number of replicas supplied
        actual: usize,
    },
}
