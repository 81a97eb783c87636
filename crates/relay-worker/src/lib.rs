//! relay-worker — the nodes that hold chat connections open.
//!
//! Three roles share one `Worker` contract:
//!
//! - **`WriterWorker`** — sends `Do` payloads verbatim as protocol lines
//! - **`ReaderWorker`** — joins and parts channels on command
//! - **`AppWorker`** — the application peer; answers `PING` with `PONG`
//!
//! # Architecture
//!
//! ```text
//!                ┌──────────── chat server ────────────┐
//!                │                                     ▲
//!                ▼                                     │
//!          InboundPump ──► ApplicationPeer      LineSink (PASS, NICK, ...)
//!          (task per line)       │                     ▲
//!                                └── reply ──► Mailbox ┘
//!                                                 ▲
//!   WorkerServer (DoWork / Status) ───────────────┘
//! ```
//!
//! `Worker::work` runs until the connection fails (fatal) or the worker
//! is told to stop, and always ends in an error; `Stopped` is the clean
//! one.

pub mod activity;
pub mod app;
pub mod connection;
pub mod error;
pub mod inbound;
pub mod mailbox;
pub mod message;
pub mod peer;
pub mod reader;
pub mod service;
mod session;
pub mod writer;

use async_trait::async_trait;
use relay_core::{NodeStatus, WorkerRole};
use tokio::sync::watch;

pub use app::AppWorker;
pub use connection::ConnectionSettings;
pub use error::{WorkerError, WorkerResult};
pub use mailbox::{mailbox, LineSink, Mailbox, MailboxReceiver};
pub use message::Message;
pub use peer::{ApplicationPeer, RpcPeer};
pub use reader::ReaderWorker;
pub use service::WorkerServer;
pub use writer::WriterWorker;

/// The line sent to the chat server when a worker shuts down.
pub const QUIT_LINE: &str = "QUIT Shutting Down";

#[async_trait]
pub trait Worker: Send + Sync + 'static {
    fn role(&self) -> WorkerRole;

    /// Carry out one unit of work. The reply is empty for most roles.
    async fn do_work(&self, work: &str) -> WorkerResult<String>;

    /// A status report stamped with the caller's request time.
    fn status(&self, requested_at_ms: u64) -> NodeStatus;

    /// Run until fatal error or stop. Only one call may be active.
    async fn work(&self) -> WorkerResult<()>;

    /// Ask the worker to stop. Returns without waiting for `work` to end.
    async fn shutdown(&self);
}

/// Resolves once `shutdown` reads `true` or its sender is gone.
pub(crate) async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
