//! relay-balancer — the scheduler's handles on worker nodes.
//!
//! A scheduler keeps one `NodeProxy` per registered node. The proxy
//! dials lazily, forwards `DoWork` and `Status` calls, and keeps a job
//! counter the scheduler uses as a load estimate.
//!
//! ```text
//! scheduler ──► NodeProxyFactory::create("host:port") ──► NodeProxy
//!                                                           ├── send(work)    → NodeService/DoWork
//!                                                           ├── update_status → NodeService/Status
//!                                                           └── add_job / finish_job / work_load
//! ```

pub mod connection;
pub mod error;
pub mod factory;
pub mod proxy;

pub use connection::NodeConnection;
pub use error::{BalancerError, BalancerResult};
pub use factory::NodeProxyFactory;
pub use proxy::NodeProxy;
