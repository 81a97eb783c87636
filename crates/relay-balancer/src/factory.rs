use relay_core::WorkerRole;
use tracing::debug;

use crate::error::{BalancerError, BalancerResult};
use crate::proxy::NodeProxy;

/// Builds proxies for nodes of one role from `host:port` strings.
#[derive(Debug, Clone, Copy)]
pub struct NodeProxyFactory {
    role: WorkerRole,
}

impl NodeProxyFactory {
    pub fn new(role: WorkerRole) -> Self {
        Self { role }
    }

    /// Parse `addr` and return an unconnected proxy with a blank status.
    pub fn create(&self, addr: &str) -> BalancerResult<NodeProxy> {
        let invalid = |reason: &str| BalancerError::InvalidAddress {
            addr: addr.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = addr
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = match port.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(invalid("port is not a number in 1-65535")),
        };

        debug!(role = %self.role, %host, port, "creating node proxy");
        Ok(NodeProxy::new(host, port, self.role))
    }
}
