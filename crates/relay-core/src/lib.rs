//! relay-core — shared building blocks for relaygrid nodes.
//!
//! - **`jobs`** — `JobGroup`, an any-of supervisor for long-lived tasks
//! - **`strset`** — `ConcurrentStringSet`, the lock-guarded channel list
//! - **`status`** — `NodeStatus`, the one status report every node returns
//! - **`config`** — `relay.toml` parsing and validation

pub mod config;
pub mod error;
pub mod jobs;
pub mod status;
pub mod strset;

pub use config::RelayConfig;
pub use error::{CoreError, CoreResult};
pub use jobs::JobGroup;
pub use status::{epoch_millis, NodeStatus, WorkerRole, WorkerState};
pub use strset::ConcurrentStringSet;
