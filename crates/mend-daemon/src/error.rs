//! Error types for mend-daemon

use std::io;

use thiserror::Error;

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the daemon
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("invalid config: {0}")]
    Validation(String),

    /// Error from the heal core
    #[error(transparent)]
    Core(#[from] mend_core::Error),
}
