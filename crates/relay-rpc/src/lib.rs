//! relay-rpc — node-to-node calls for relaygrid.
//!
//! Every node serves the `NodeService` gRPC interface (`DoWork`,
//! `Status`), and readers and writers call their application peer once
//! per inbound chat line. Status travels as JSON inside a bytes field.
//!
//! # Architecture
//!
//! ```text
//! RpcClient (one tonic Channel, many concurrent callers)
//!   ├── do_work()  → NodeService/DoWork
//!   ├── status()   → NodeService/Status
//!   └── call(path) → any method taking WorkRequest, answering WorkReply
//!
//! RpcServer
//!   └── NodeServiceServer<S: NodeService>, stopped by a watch signal
//! ```
//!
//! Work the node rejects comes back as `INVALID_ARGUMENT`; see
//! `RpcError::is_invalid_work`.

pub mod client;
pub mod error;
pub mod server;

/// Generated protobuf types and gRPC service stubs.
pub mod proto {
    tonic::include_proto!("relaygrid");
}

/// Protobuf package every relaygrid service lives in.
pub const PROTO_PACKAGE: &str = "relaygrid";

/// Default method an application peer is called with.
pub const DEFAULT_PEER_METHOD: &str = "NodeService.DoWork";

pub use client::{method_path, RpcClient};
pub use error::{RpcError, RpcResult};
pub use proto::node_service_server::NodeService;
pub use server::RpcServer;
