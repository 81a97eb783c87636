//! Writer worker — sends each `Do` payload to the chat server verbatim.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::{epoch_millis, NodeStatus, RelayConfig, WorkerRole, WorkerState};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::activity::Activity;
use crate::connection::ConnectionSettings;
use crate::error::{WorkerError, WorkerResult};
use crate::mailbox::{mailbox, Mailbox, MailboxReceiver};
use crate::peer::{ApplicationPeer, RpcPeer};
use crate::session::Session;
use crate::{Worker, QUIT_LINE};

pub struct WriterWorker {
    settings: ConnectionSettings,
    peer: Arc<dyn ApplicationPeer>,
    mailbox: Mailbox,
    inbox: Mutex<Option<MailboxReceiver>>,
    state: watch::Sender<WorkerState>,
    shutdown: watch::Sender<bool>,
    activity: Activity,
}

impl WriterWorker {
    pub fn new(settings: ConnectionSettings, peer: Arc<dyn ApplicationPeer>) -> Self {
        let (mailbox, inbox) = mailbox();
        Self {
            settings,
            peer,
            mailbox,
            inbox: Mutex::new(Some(inbox)),
            state: watch::Sender::new(WorkerState::Connecting),
            shutdown: watch::Sender::new(false),
            activity: Activity::new(),
        }
    }

    /// Build a writer whose application peer is the configured app node.
    pub async fn connect(config: &RelayConfig) -> WorkerResult<Self> {
        let peer = RpcPeer::connect(&config.address.app.to_string(), &config.app.method).await?;
        Ok(Self::new(ConnectionSettings::from(&config.irc), Arc::new(peer)))
    }

    /// Watch the connection lifecycle.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: WorkerState) {
        debug!(?state, "writer state");
        self.state.send_replace(state);
    }
}

#[async_trait]
impl Worker for WriterWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::Writer
    }

    async fn do_work(&self, work: &str) -> WorkerResult<String> {
        self.activity.record();
        self.mailbox.send(work).await?;
        Ok(String::new())
    }

    fn status(&self, requested_at_ms: u64) -> NodeStatus {
        NodeStatus {
            role: WorkerRole::Writer,
            state: *self.state.borrow(),
            requested_at_ms,
            reported_at_ms: epoch_millis(),
            idle_ms: self.activity.idle_ms(),
            handled: self.activity.handled(),
            channels: Vec::new(),
        }
    }

    async fn work(&self) -> WorkerResult<()> {
        let inbox = self
            .inbox
            .lock()
            .expect("inbox lock")
            .take()
            .ok_or(WorkerError::AlreadyRunning)?;

        info!(server = %self.settings.server, nickname = %self.settings.nickname, "writer starting");
        let err = Session {
            settings: &self.settings,
            peer: self.peer.clone(),
            mailbox: &self.mailbox,
            shutdown: &self.shutdown,
            state: &self.state,
        }
        .run(inbox)
        .await;

        // Stop any reply tasks still in flight.
        self.shutdown.send_replace(true);
        self.set_state(WorkerState::Stopped);
        match &err {
            WorkerError::Stopped => info!("writer stopped"),
            other => warn!(error = %other, "writer failed"),
        }
        Err(err)
    }

    async fn shutdown(&self) {
        info!("writer shutting down");
        self.peer.close();
        if self.mailbox.post(QUIT_LINE).is_err() {
            debug!("mailbox already closed, skipping quit");
        }
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
