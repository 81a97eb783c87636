//! The application peer — where inbound chat lines go to be answered.

use async_trait::async_trait;
use relay_rpc::{method_path, RpcClient, RpcError};
use tonic::codegen::http::uri::PathAndQuery;
use tracing::debug;

/// Something that turns one inbound line into an (often empty) reply.
#[async_trait]
pub trait ApplicationPeer: Send + Sync + 'static {
    async fn call(&self, line: &str) -> Result<String, RpcError>;

    /// Stop accepting calls. Later calls fail.
    fn close(&self);
}

/// An application peer reached over gRPC.
pub struct RpcPeer {
    client: RpcClient,
    path: PathAndQuery,
}

impl RpcPeer {
    /// Dial `addr` and call `method` (`Service.Method`) once per line.
    pub async fn connect(addr: &str, method: &str) -> Result<Self, RpcError> {
        let path = method_path(method)?;
        let client = RpcClient::connect(addr).await?;
        Ok(Self { client, path })
    }

    pub fn new(client: RpcClient, method: &str) -> Result<Self, RpcError> {
        Ok(Self {
            client,
            path: method_path(method)?,
        })
    }
}

#[async_trait]
impl ApplicationPeer for RpcPeer {
    async fn call(&self, line: &str) -> Result<String, RpcError> {
        self.client.call(&self.path, line).await
    }

    fn close(&self) {
        debug!(addr = %self.client.addr(), path = %self.path, "closing application peer");
        self.client.close();
    }
}
