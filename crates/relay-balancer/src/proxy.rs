//! NodeProxy — the scheduler's RPC handle on one worker node.
//!
//! The gRPC channel is created on first use and dropped after any
//! failed call, so the next call redials. Remote invalid-work errors leave
//! the connection alone.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use relay_core::{epoch_millis, NodeStatus, WorkerRole};
use relay_rpc::{RpcClient, RpcError};
use tracing::{debug, warn};

use crate::connection::NodeConnection;
use crate::error::{BalancerError, BalancerResult};

pub struct NodeProxy {
    host: String,
    port: u16,
    jobs: AtomicI64,
    status: Mutex<NodeStatus>,
    client: tokio::sync::Mutex<Option<RpcClient>>,
}

impl NodeProxy {
    pub fn new(host: impl Into<String>, port: u16, role: WorkerRole) -> Self {
        Self {
            host: host.into(),
            port,
            jobs: AtomicI64::new(0),
            status: Mutex::new(NodeStatus::new(role)),
            client: tokio::sync::Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Dial the node now instead of on the first call.
    pub async fn connect(&self) -> BalancerResult<()> {
        self.client().await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.client
            .lock()
            .await
            .as_ref()
            .is_some_and(RpcClient::is_open)
    }

    /// Drop the RPC handle. The next call redials.
    pub async fn disconnect(&self) {
        if let Some(client) = self.client.lock().await.take() {
            client.close();
            debug!(node = %self.endpoint(), "disconnected from node");
        }
    }

    async fn client(&self) -> BalancerResult<RpcClient> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref().filter(|c| c.is_open()) {
            return Ok(client.clone());
        }

        let addr = self.endpoint();
        let client = RpcClient::connect(&addr).await.map_err(|source| {
            warn!(node = %addr, error = %source, "failed to connect");
            BalancerError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        debug!(node = %addr, "connected to node");
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Map a failed call. Anything but invalid work drops the cached
    /// channel so the next call redials.
    async fn fail(&self, method: &str, source: RpcError) -> BalancerError {
        if source.is_invalid_work() {
            return BalancerError::InvalidWork {
                addr: self.endpoint(),
                message: source.remote_message().unwrap_or_default().to_string(),
            };
        }
        warn!(node = %self.endpoint(), method, error = %source, "send error");
        if let Some(client) = self.client.lock().await.take() {
            client.close();
        }
        BalancerError::Rpc {
            addr: self.endpoint(),
            source,
        }
    }
}

#[async_trait]
impl NodeConnection for NodeProxy {
    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn send(&self, work: &str) -> BalancerResult<String> {
        let client = self.client().await?;
        match client.do_work(work).await {
            Ok(reply) => Ok(reply),
            Err(source) => Err(self.fail("DoWork", source).await),
        }
    }

    async fn update_status(&self) -> BalancerResult<()> {
        let client = self.client().await?;
        let raw = match client.status(epoch_millis()).await {
            Ok(raw) => raw,
            Err(source) => return Err(self.fail("Status", source).await),
        };
        self.status
            .lock()
            .expect("status lock")
            .update(raw)
            .map_err(|source| BalancerError::Status {
                addr: self.endpoint(),
                source,
            })
    }

    fn status(&self) -> NodeStatus {
        self.status.lock().expect("status lock").clone()
    }

    fn add_job(&self) {
        self.jobs.fetch_add(1, Ordering::SeqCst);
    }

    fn finish_job(&self) {
        self.jobs.fetch_sub(1, Ordering::SeqCst);
    }

    fn work_load(&self) -> i64 {
        self.jobs.load(Ordering::SeqCst)
    }
}
