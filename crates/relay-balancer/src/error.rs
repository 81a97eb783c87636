use relay_rpc::RpcError;
use thiserror::Error;

pub type BalancerResult<T> = Result<T, BalancerError>;

#[derive(Debug, Error)]
pub enum BalancerError {
    #[error("invalid node address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("failed to connect to node {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: RpcError,
    },

    /// The node rejected the work itself; the connection is fine.
    #[error("node {addr} rejected work: {message}")]
    InvalidWork { addr: String, message: String },

    #[error("rpc to node {addr} failed: {source}")]
    Rpc {
        addr: String,
        #[source]
        source: RpcError,
    },

    #[error("bad status from node {addr}: {source}")]
    Status {
        addr: String,
        #[source]
        source: relay_core::CoreError,
    },
}

impl BalancerError {
    pub fn is_invalid_work(&self) -> bool {
        matches!(self, BalancerError::InvalidWork { .. })
    }
}
