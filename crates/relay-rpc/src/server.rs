//! RPC server — serves a `NodeService` implementation over gRPC.
//!
//! Binding is split from serving so callers can bind port 0 and learn
//! the real address before the accept loop starts.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Server;
use tracing::info;

use crate::error::RpcResult;
use crate::proto::node_service_server::{NodeService, NodeServiceServer};

/// A bound, not yet serving, gRPC listener.
pub struct RpcServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RpcServer {
    /// Bind to `addr`. Port 0 picks a free port; see `local_addr`.
    pub async fn bind(addr: &str) -> RpcResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `service` until the shutdown signal fires.
    pub async fn serve<S: NodeService>(
        self,
        service: S,
        mut shutdown: watch::Receiver<bool>,
    ) -> RpcResult<()> {
        let addr = self.local_addr;
        let incoming =
            TcpIncoming::from_listener(self.listener, true, None).map_err(std::io::Error::other)?;

        info!(%addr, "gRPC server listening");
        Server::builder()
            .add_service(NodeServiceServer::new(service))
            .serve_with_incoming_shutdown(incoming, async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;

        info!(%addr, "gRPC server stopped");
        Ok(())
    }
}
