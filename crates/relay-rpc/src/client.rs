//! RPC client — one gRPC channel shared by concurrent callers.
//!
//! The channel is dialled eagerly so an unreachable node fails at
//! `connect`. After `close` every call fails with `Closed`; the client
//! never redials on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, trace, warn};

use crate::error::{RpcError, RpcResult};
use crate::proto::node_service_client::NodeServiceClient;
use crate::proto::{StatusRequest, WorkReply, WorkRequest};
use crate::PROTO_PACKAGE;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve `Service.Method` to the gRPC path `/relaygrid.Service/Method`.
///
/// A name that already starts with `/` is taken as a full path.
pub fn method_path(method: &str) -> RpcResult<PathAndQuery> {
    let method = method.trim();
    let path = if method.starts_with('/') {
        method.to_string()
    } else {
        match method.split_once('.') {
            Some((service, name))
                if !service.is_empty() && !name.is_empty() && !name.contains('.') =>
            {
                format!("/{PROTO_PACKAGE}.{service}/{name}")
            }
            _ => return Err(RpcError::Method(method.to_string())),
        }
    };
    path.parse::<PathAndQuery>()
        .map_err(|_| RpcError::Method(method.to_string()))
}

/// A cheaply clonable handle to one node's gRPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    addr: Arc<str>,
    channel: Channel,
    closed: Arc<AtomicBool>,
}

impl RpcClient {
    /// Dial `addr` (`host:port`).
    pub async fn connect(addr: &str) -> RpcResult<Self> {
        let endpoint = Endpoint::from_shared(format!("http://{addr}"))
            .map_err(|source| RpcError::Endpoint {
                addr: addr.to_string(),
                source,
            })?
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_nodelay(true);

        let channel = endpoint.connect().await.map_err(|source| {
            warn!(%addr, error = %source, "failed to connect");
            RpcError::Connect {
                addr: addr.to_string(),
                source,
            }
        })?;

        debug!(%addr, "rpc client connected");
        Ok(Self {
            addr: Arc::from(addr),
            channel,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address this client was dialled with.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether calls can still be made through this handle.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// `NodeService/DoWork` on the remote node.
    pub async fn do_work(&self, work: &str) -> RpcResult<String> {
        self.ensure_open()?;
        trace!(addr = %self.addr, %work, "do work");
        let mut client = NodeServiceClient::new(self.channel.clone());
        let reply = client
            .do_work(WorkRequest {
                work: work.to_string(),
            })
            .await?;
        Ok(reply.into_inner().reply)
    }

    /// `NodeService/Status`, decoded from its JSON payload.
    pub async fn status(&self, requested_at_ms: u64) -> RpcResult<serde_json::Value> {
        self.ensure_open()?;
        let mut client = NodeServiceClient::new(self.channel.clone());
        let reply = client.status(StatusRequest { requested_at_ms }).await?;
        Ok(serde_json::from_slice(&reply.into_inner().data)?)
    }

    /// Send `work` to an arbitrary method taking a `WorkRequest` and
    /// answering a `WorkReply`. See `method_path`.
    pub async fn call(&self, path: &PathAndQuery, work: &str) -> RpcResult<String> {
        self.ensure_open()?;
        trace!(addr = %self.addr, %path, "rpc call");
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("channel not ready: {e}")))?;

        let codec: ProstCodec<WorkRequest, WorkReply> = ProstCodec::default();
        let request = tonic::Request::new(WorkRequest {
            work: work.to_string(),
        });
        let reply = grpc.unary(request, path.clone(), codec).await?;
        Ok(reply.into_inner().reply)
    }

    /// Fail every later call on this handle and its clones with `Closed`.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(addr = %self.addr, "rpc client closed");
        }
    }

    fn ensure_open(&self) -> RpcResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(RpcError::Closed)
        }
    }
}
