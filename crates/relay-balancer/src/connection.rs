use async_trait::async_trait;
use relay_core::NodeStatus;

use crate::error::BalancerResult;

/// What a scheduler needs from a node it dispatches work to.
#[async_trait]
pub trait NodeConnection: Send + Sync {
    /// `host:port` the node serves RPC on.
    fn endpoint(&self) -> String;

    /// Forward one work string and return the node's reply.
    async fn send(&self, work: &str) -> BalancerResult<String>;

    /// Fetch a fresh status report into the cached copy.
    async fn update_status(&self) -> BalancerResult<()>;

    /// The last status fetched.
    fn status(&self) -> NodeStatus;

    fn add_job(&self);

    fn finish_job(&self);

    /// Jobs dispatched and not yet finished.
    fn work_load(&self) -> i64;
}
