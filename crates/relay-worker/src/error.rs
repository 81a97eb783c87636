//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors a worker can return from `do_work` or its run loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Could not reach the chat server. Fatal.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The chat server closed the connection. Fatal.
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A queued line could not be written. Reported to whoever queued it.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The work request was malformed or does not apply. Never fatal.
    #[error("invalid work: {0}")]
    InvalidWork(String),

    /// The worker was told to stop.
    #[error("the worker was instructed to stop")]
    Stopped,

    #[error("worker is already running")]
    AlreadyRunning,

    #[error("rpc error: {0}")]
    Rpc(#[from] relay_rpc::RpcError),
}
