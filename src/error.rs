//! # Error Types
//!
//! Errors that can escape the streaming subsystem. Only construction-time
//! problems are surfaced this way; steady-state conditions such as a full chunk
//! table or a busy worker are absorbed and reported through counters instead.

use std::io;

use thiserror::Error;

/// Errors raised while configuring or constructing the streaming subsystem.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The configuration was rejected by [`StreamConfig::validate`](crate::config::StreamConfig::validate).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn chunk worker {index}: {source}")]
    WorkerSpawn {
        /// Index of the worker that could not be started.
        index: usize,
        /// The underlying spawn error.
        source: io::Error,
    },
}

/// Convenience alias used by fallible constructors in this crate.
pub type Result<T> = std::result::Result<T, StreamError>;

/// The chunk table is at capacity and cannot accept another chunk.
///
/// This is a soft limit: the caller simply retries on a later frame, after an
/// eviction has freed a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chunk table is full ({capacity} chunks)")]
pub struct TableFull {
    /// The configured capacity of the table.
    pub capacity: usize,
}
