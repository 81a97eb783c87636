//! App worker — the application peer readers and writers call per line.
//!
//! Answers `PING` with the matching `PONG`; every other line gets an
//! empty reply, which the calling worker writes as a no-op.

use async_trait::async_trait;
use relay_core::{epoch_millis, NodeStatus, WorkerRole, WorkerState};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::activity::Activity;
use crate::error::{WorkerError, WorkerResult};
use crate::message::Message;
use crate::{stop_requested, Worker};

pub struct AppWorker {
    state: watch::Sender<WorkerState>,
    shutdown: watch::Sender<bool>,
    activity: Activity,
}

impl AppWorker {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(WorkerState::Connecting),
            shutdown: watch::Sender::new(false),
            activity: Activity::new(),
        }
    }
}

impl Default for AppWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for AppWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::App
    }

    async fn do_work(&self, work: &str) -> WorkerResult<String> {
        self.activity.record();
        let msg = Message::parse(work)
            .ok_or_else(|| WorkerError::InvalidWork(format!("not a protocol line: {work:?}")))?;
        debug!(command = %msg.command, "app line");

        if msg.command == "PING" {
            return Ok(Message::pong(&msg).to_string());
        }
        Ok(String::new())
    }

    fn status(&self, requested_at_ms: u64) -> NodeStatus {
        NodeStatus {
            role: WorkerRole::App,
            state: *self.state.borrow(),
            requested_at_ms,
            reported_at_ms: epoch_millis(),
            idle_ms: self.activity.idle_ms(),
            handled: self.activity.handled(),
            channels: Vec::new(),
        }
    }

    async fn work(&self) -> WorkerResult<()> {
        self.state.send_replace(WorkerState::Running);
        info!("app worker running");

        let mut shutdown = self.shutdown.subscribe();
        stop_requested(&mut shutdown).await;

        self.state.send_replace(WorkerState::Stopped);
        info!("app worker stopped");
        Err(WorkerError::Stopped)
    }

    async fn shutdown(&self) {
        self.state.send_if_modified(|state| {
            if *state == WorkerState::Stopped {
                return false;
            }
            *state = WorkerState::Stopping;
            true
        });
        self.shutdown.send_replace(true);
    }
}
