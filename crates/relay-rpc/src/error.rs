//! RPC error types.

use thiserror::Error;
use tonic::Code;

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid endpoint {addr}: {source}")]
    Endpoint {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("invalid method name {0:?}, expected Service.Method")]
    Method(String),

    #[error("rpc client closed")]
    Closed,

    #[error("remote error: {}: {}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rpc server error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl RpcError {
    /// The remote side rejected the work itself, not the transport.
    pub fn is_invalid_work(&self) -> bool {
        matches!(self, RpcError::Status(status) if status.code() == Code::InvalidArgument)
    }

    /// Message the remote side attached to its error status.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            RpcError::Status(status) => Some(status.message()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_is_invalid_work() {
        let err = RpcError::from(tonic::Status::invalid_argument("not joined to #rust"));
        assert!(err.is_invalid_work());
        assert_eq!(err.remote_message(), Some("not joined to #rust"));
        assert!(err.to_string().contains("not joined to #rust"));
    }

    #[test]
    fn other_codes_are_not_invalid_work() {
        assert!(!RpcError::from(tonic::Status::internal("boom")).is_invalid_work());
        assert!(!RpcError::from(tonic::Status::unavailable("gone")).is_invalid_work());
        assert!(!RpcError::Closed.is_invalid_work());
        assert_eq!(RpcError::Closed.remote_message(), None);
    }
}
